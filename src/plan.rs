//! The page planner. Turns a [`ContentIndex`] into the complete list of
//! [`PlannedPage`]s for a build: one post page per document and one category
//! page per category.
//!
//! Post pages link to their chronological neighbors. Adjacency always comes
//! from the ascending date order, independent of whatever order a listing
//! displays posts in, so "previous" is always the older post.
//!
//! Planning is all-or-nothing. Any error aborts the pass and no partial plan
//! is returned.

use crate::document::DocumentId;
use crate::index::{self, CategoryGroup, ContentIndex, Order};
use crate::repository::{self, ContentRepository};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// The URL prefix of category pages.
pub const CATEGORY_PATH_PREFIX: &str = "/category/";

/// A single page for a renderer to produce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageInstruction {
    Post(PostPage),
    Category(CategoryPage),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostPage {
    pub id: DocumentId,

    /// The next-older post, if any.
    pub previous: Option<DocumentId>,

    /// The next-newer post, if any.
    pub next: Option<DocumentId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryPage {
    pub category: String,
    pub total_count: usize,

    /// Ascending by date, like the post adjacency.
    pub members: Vec<DocumentId>,
}

/// A [`PageInstruction`] and the URL path it is rendered at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedPage {
    pub path: String,

    #[serde(flatten)]
    pub instruction: PageInstruction,
}

/// Returns the output path for a category, e.g. `/category/algo`. The
/// lowercased name must be usable as a single path segment.
pub fn category_path(category: &str) -> Result<String> {
    let segment = category.to_lowercase();
    if segment == "." || segment == ".." || segment.contains('/') {
        return Err(Error::InvalidCategory(category.to_owned()));
    }
    Ok(format!("{}{}", CATEGORY_PATH_PREFIX, segment))
}

/// Plans every page for `index`: post pages in ascending date order, then
/// category pages ordered by category name. An empty index yields an empty
/// plan; it is up to the caller to decide what an empty site looks like.
pub fn plan(index: &ContentIndex) -> Result<Vec<PlannedPage>> {
    let posts = index.sorted_by_date(Order::Ascending);
    let groups = index.group_by_category();

    let ids: Vec<&DocumentId> = posts.iter().map(|d| &d.id).collect();
    let mut pages = Vec::with_capacity(posts.len() + groups.len());
    for (instruction, document) in post_pages(&ids).zip(&posts) {
        pages.push(PlannedPage {
            path: document.slug.to_string(),
            instruction: PageInstruction::Post(instruction),
        });
    }
    pages.extend(category_pages(&groups)?);

    check_output_paths(&pages)?;
    tracing::debug!(
        posts = posts.len(),
        categories = groups.len(),
        "Planned pages"
    );
    Ok(pages)
}

/// Creates the post instructions for documents already in ascending date
/// order. The first has no `previous` and the last has no `next`.
fn post_pages<'a>(ids: &'a [&'a DocumentId]) -> impl Iterator<Item = PostPage> + 'a {
    ids.iter().enumerate().map(move |(i, id)| PostPage {
        id: (*id).clone(),
        previous: match i < 1 {
            true => None,
            false => Some(ids[i - 1].clone()),
        },
        next: match i + 1 >= ids.len() {
            true => None,
            false => Some(ids[i + 1].clone()),
        },
    })
}

/// Creates one category page per non-empty group. Category names are
/// case-sensitive but their paths are lowercased, so `Algo` and `algo` would
/// share a page; that is rejected rather than letting one overwrite the
/// other.
fn category_pages(groups: &[CategoryGroup]) -> Result<Vec<PlannedPage>> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(groups.len());
    let mut pages = Vec::with_capacity(groups.len());
    for group in groups.iter().filter(|g| !g.members.is_empty()) {
        let path = category_path(group.name)?;
        if let Some(first) = seen.insert(path.clone(), group.name) {
            return Err(Error::CategoryPathCollision {
                path,
                first: first.to_owned(),
                second: group.name.to_owned(),
            });
        }
        pages.push(PlannedPage {
            path,
            instruction: PageInstruction::Category(CategoryPage {
                category: group.name.to_owned(),
                total_count: group.total_count(),
                members: group.members.iter().map(|d| d.id.clone()).collect(),
            }),
        });
    }
    Ok(pages)
}

/// Makes sure no two pages are written to the same place. Slugs end in `/`
/// and category paths don't, so paths are compared without trailing slashes.
fn check_output_paths(pages: &[PlannedPage]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(pages.len());
    for page in pages {
        let key = match page.path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        if let Some(first) = seen.insert(key, page.path.as_str()) {
            return Err(Error::OutputPathCollision {
                first: first.to_owned(),
                second: page.path.clone(),
            });
        }
    }
    Ok(())
}

/// Loads every document from `repository`, indexes it, and plans its pages.
/// Errors from the repository are passed through untouched.
pub fn plan_site(
    repository: &dyn ContentRepository,
    content_root: &Path,
) -> Result<(ContentIndex, Vec<PlannedPage>)> {
    let sources = repository.documents()?;
    let index = ContentIndex::build(content_root, sources)?;
    if index.is_empty() {
        tracing::warn!(
            content_root = %content_root.display(),
            "No documents found; the plan is empty"
        );
    }
    let pages = plan(&index)?;
    Ok((index, pages))
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed planning pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The repository couldn't produce the documents.
    #[error(transparent)]
    Upstream(#[from] repository::Error),

    #[error(transparent)]
    Index(#[from] index::Error),

    /// Returned when two category names differ only in case and so would be
    /// written to the same path.
    #[error("categories `{first}` and `{second}` both map to the page `{path}`")]
    CategoryPathCollision {
        path: String,
        first: String,
        second: String,
    },

    /// Returned when a category name would not fit in one path segment.
    #[error("category `{0}` can't be used in a page path")]
    InvalidCategory(String),

    /// Returned when a post and a category page would share an output path.
    #[error("pages `{first}` and `{second}` would be written to the same path")]
    OutputPathCollision { first: String, second: String },
}
