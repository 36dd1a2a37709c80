//! Defines the [`Slug`] type and [`derive`], which maps a document's source
//! path to the canonical URL path its post page is written to.
//!
//! The content root is stripped, the file extension is dropped, and
//! directory nesting becomes URL nesting. A file named `index` stands for its
//! directory, so `post-a/index.md` and `post-a.md` both derive `/post-a/`.
//! Every slug starts and ends with `/` so it can be joined onto a site URL
//! without further normalization.

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A canonical URL path for a document, e.g. `/2024/hello-world/`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives slugs relative to a fixed content root.
#[derive(Clone, Debug)]
pub struct SlugDeriver {
    content_root: PathBuf,
}

impl SlugDeriver {
    pub fn new(content_root: impl Into<PathBuf>) -> SlugDeriver {
        SlugDeriver {
            content_root: content_root.into(),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// See [`derive`].
    pub fn derive(&self, file_path: &Path) -> Result<Slug> {
        derive(&self.content_root, file_path)
    }
}

/// Derives the [`Slug`] for `file_path`, which must lie under
/// `content_root`. `.` segments are ignored on both sides, so `./blog/a.md`
/// is under `blog`. An empty root accepts every path.
///
/// Fails with [`Error::InvalidPath`] when the path is empty, lies outside the
/// root, names no file once the root is stripped, climbs out of the root with
/// `..`, or isn't valid UTF-8.
pub fn derive(content_root: &Path, file_path: &Path) -> Result<Slug> {
    if file_path.as_os_str().is_empty() {
        return Err(invalid(file_path, "path is empty"));
    }

    let root = without_cur_dirs(content_root);
    let path = without_cur_dirs(file_path);
    let relative = path
        .strip_prefix(&root)
        .map_err(|_| invalid(file_path, "path is outside the content root"))?;
    let mut segments: Vec<&str> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(
                segment
                    .to_str()
                    .ok_or_else(|| invalid(file_path, "path is not valid UTF-8"))?,
            ),
            Component::ParentDir => {
                return Err(invalid(file_path, "path escapes the content root"))
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    let file_name = segments
        .pop()
        .ok_or_else(|| invalid(file_path, "path names no file"))?;
    let stem = match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    };
    if stem != "index" {
        segments.push(stem);
    }

    let mut slug = String::from("/");
    for segment in segments {
        slug.push_str(segment);
        slug.push('/');
    }
    Ok(Slug(slug))
}

fn without_cur_dirs(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| *component != Component::CurDir)
        .collect()
}

fn invalid(path: &Path, reason: &'static str) -> Error {
    Error::InvalidPath {
        path: path.to_owned(),
        reason,
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to derive a [`Slug`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for empty or unparseable paths. No fallback slug is made up.
    #[error("invalid content path `{}`: {}", .path.display(), .reason)]
    InvalidPath { path: PathBuf, reason: &'static str },
}
