//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: loading documents from the content directory
//! ([`crate::repository`]), planning pages ([`crate::plan`]), and writing the
//! manifest ([`crate::render`]).

use crate::config::Config;
use crate::index::ContentIndex;
use crate::plan::{self, plan_site, PageInstruction, PlannedPage};
use crate::render::{self, ManifestRenderer, Renderer};
use crate::repository::FsRepository;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// What a successful build produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildSummary {
    pub documents: usize,
    pub post_pages: usize,
    pub category_pages: usize,
    pub output_file: PathBuf,
}

/// Builds the site described by `config` and writes its manifest to
/// `config.output_file`. The manifest is written next to its destination and
/// moved into place only once it is complete, so a failed build leaves any
/// previous manifest untouched.
pub fn build_site(config: &Config) -> Result<BuildSummary> {
    let (index, pages) = plan_config(config)?;

    let post_pages = pages
        .iter()
        .filter(|p| matches!(p.instruction, PageInstruction::Post(_)))
        .count();
    let summary = BuildSummary {
        documents: index.len(),
        post_pages,
        category_pages: pages.len() - post_pages,
        output_file: config.output_file.clone(),
    };

    if let Some(dir) = config.output_file.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|err| Error::CreateOutputDirectory {
                path: dir.to_owned(),
                err,
            })?;
        }
    }

    let staging = staging_path(&config.output_file);
    let result = File::create(&staging)
        .map_err(Error::from)
        .and_then(|file| render_manifest(config, &index, &pages, BufWriter::new(file)))
        .and_then(|()| {
            std::fs::rename(&staging, &config.output_file).map_err(Error::from)
        });
    if let Err(e) = result {
        // The staging file is garbage either way.
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }

    tracing::info!(
        documents = summary.documents,
        post_pages = summary.post_pages,
        category_pages = summary.category_pages,
        output = %summary.output_file.display(),
        "Built site"
    );
    Ok(summary)
}

/// Writes the manifest for `config` to `w` instead of the output file.
pub fn write_manifest<W: Write>(config: &Config, w: W) -> Result<()> {
    let (index, pages) = plan_config(config)?;
    render_manifest(config, &index, &pages, w)
}

fn plan_config(config: &Config) -> Result<(ContentIndex, Vec<PlannedPage>)> {
    let repository = FsRepository::new(&config.content_directory).with_threads(config.threads);
    Ok(plan_site(&repository, &config.content_directory)?)
}

fn render_manifest<W: Write>(
    config: &Config,
    index: &ContentIndex,
    pages: &[PlannedPage],
    w: W,
) -> Result<()> {
    ManifestRenderer::new(w, &config.site_url)
        .with_listing_size(config.listing_size)
        .render(index, pages)?;
    Ok(())
}

fn staging_path(output_file: &Path) -> PathBuf {
    let mut file_name = output_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(".tmp");
    output_file.with_file_name(file_name)
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for errors loading documents or planning pages.
    #[error(transparent)]
    Plan(#[from] plan::Error),

    /// Returned for errors writing the manifest.
    #[error(transparent)]
    Render(#[from] render::Error),

    #[error("creating output directory `{}`: {}", .path.display(), .err)]
    CreateOutputDirectory {
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
