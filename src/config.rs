//! Loads the [`Config`] for a build from a `pagewright.yaml` project file.
//! The project file is looked up from a starting directory upwards, so the
//! tool can be run from anywhere inside a project.
//!
//! ```yaml
//! site_url: https://example.org/
//! content_directory: content/blog   # optional, relative to the project file
//! listing_size: 3                   # optional
//! ```

use crate::render::DEFAULT_LISTING_SIZE;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE_NAME: &str = "pagewright.yaml";

const DEFAULT_CONTENT_DIRECTORY: &str = "content/blog";
const DEFAULT_OUTPUT_FILE: &str = "public/pages.yaml";

#[derive(Deserialize)]
struct ListingSize(usize);

impl Default for ListingSize {
    fn default() -> Self {
        ListingSize(DEFAULT_LISTING_SIZE)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    site_url: Url,

    #[serde(default)]
    content_directory: Option<PathBuf>,

    #[serde(default)]
    listing_size: ListingSize,
}

/// Everything a build needs to know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The directory holding the project file.
    pub project_root: PathBuf,

    /// The directory scanned for markdown documents. Slugs are derived
    /// relative to it.
    pub content_directory: PathBuf,

    /// The absolute URL the site is served from.
    pub site_url: Url,

    /// Where the manifest is written.
    pub output_file: PathBuf,

    /// The number of posts per category in the home page listing.
    pub listing_size: usize,

    /// The number of threads used to load documents.
    pub threads: usize,
}

impl Config {
    /// Searches `dir` and its ancestors for a project file and loads it.
    /// `output_file` overrides the default manifest location and `threads`
    /// defaults to the number of CPUs.
    pub fn from_directory(
        dir: &Path,
        output_file: Option<&Path>,
        threads: Option<usize>,
    ) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE_NAME);
            if path.is_file() {
                return Config::from_project_file(&path, output_file, threads);
            }
            current = dir.parent();
        }
        Err(Error::ProjectFileNotFound(dir.to_owned()))
    }

    /// Loads a specific project file. Relative paths in it are resolved
    /// against the directory containing it.
    pub fn from_project_file(
        path: &Path,
        output_file: Option<&Path>,
        threads: Option<usize>,
    ) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::OpenProjectFile {
            path: path.to_owned(),
            err,
        })?;
        let project: Project =
            serde_yaml::from_reader(file).map_err(|err| Error::ParseProjectFile {
                path: path.to_owned(),
                err,
            })?;

        let project_root = match path.parent() {
            Some(parent) => parent.to_owned(),
            None => return Err(Error::NoProjectRoot(path.to_owned())),
        };

        Ok(Config {
            content_directory: project_root.join(
                project
                    .content_directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIRECTORY)),
            ),
            output_file: match output_file {
                Some(output_file) => output_file.to_owned(),
                None => project_root.join(DEFAULT_OUTPUT_FILE),
            },
            site_url: project.site_url,
            listing_size: project.listing_size.0,
            threads: threads.unwrap_or_else(num_cpus::get),
            project_root,
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to load the project configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not find `{}` in `{}` or any parent directory", PROJECT_FILE_NAME, .0.display())]
    ProjectFileNotFound(PathBuf),

    #[error("opening project file `{}`: {}", .path.display(), .err)]
    OpenProjectFile {
        path: PathBuf,
        err: std::io::Error,
    },

    #[error("loading project file `{}`: {}", .path.display(), .err)]
    ParseProjectFile {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    #[error("can't get parent directory for project file `{}`", .0.display())]
    NoProjectRoot(PathBuf),
}
