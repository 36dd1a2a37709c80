//! Defines the [`Renderer`] seam the planner's output is handed to, and the
//! [`ManifestRenderer`], which writes the whole plan as a YAML manifest for an
//! external template engine to turn into HTML.
//!
//! The manifest has four top-level keys:
//!
//! * `site_url`: the absolute URL of the site root.
//! * `pages`: one entry per planned page with its `path`, absolute
//!   `permalink`, `kind` (`post` or `category`), and the instruction's fields.
//! * `documents`: every document keyed by id, so templates can resolve the
//!   ids a page refers to (its own, `previous`, `next`, category `members`).
//! * `home`: the home page listing: for each category, the ids of its newest
//!   posts, newest first.

use crate::document::{Document, DocumentId};
use crate::index::ContentIndex;
use crate::plan::PlannedPage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use url::Url;

/// Consumes a finished plan. A renderer only ever sees a complete plan; on
/// planning errors it isn't called at all.
pub trait Renderer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn render(
        &mut self,
        index: &ContentIndex,
        pages: &[PlannedPage],
    ) -> std::result::Result<(), Self::Error>;
}

/// The number of posts per category on the home page, unless configured
/// otherwise.
pub const DEFAULT_LISTING_SIZE: usize = 3;

/// Writes the plan as a YAML manifest to `W`.
pub struct ManifestRenderer<W> {
    writer: W,
    site_url: Url,
    listing_size: usize,
}

impl<W: Write> ManifestRenderer<W> {
    /// Page paths are resolved against `site_url`; a missing trailing slash
    /// is added so that a site hosted under a sub-path keeps its prefix.
    pub fn new(writer: W, site_url: &Url) -> ManifestRenderer<W> {
        ManifestRenderer {
            writer,
            site_url: directory_url(site_url),
            listing_size: DEFAULT_LISTING_SIZE,
        }
    }

    pub fn with_listing_size(mut self, listing_size: usize) -> ManifestRenderer<W> {
        self.listing_size = listing_size;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Appends the segments of `path` to the site URL. Each segment is
    /// percent-encoded, so `#` or `?` in a name stays part of the path.
    fn permalink(&self, path: &str) -> Result<String> {
        let mut url = self.site_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::CannotBeABase(self.site_url.clone()))?;
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
            if path.ends_with('/') {
                segments.push("");
            }
        }
        Ok(url.to_string())
    }

    fn manifest_document<'a>(&self, document: &'a Document) -> Result<ManifestDocument<'a>> {
        let metadata = &document.metadata;
        Ok(ManifestDocument {
            slug: document.slug.as_str(),
            permalink: self.permalink(document.slug.as_str())?,
            title: &metadata.title,
            description: &metadata.description,
            date: metadata
                .date
                .map(|date| date.format("%Y-%m-%dT%H:%M:%S").to_string()),
            display_date: metadata.display_date(),
            category: metadata.category.as_deref(),
            tags: &metadata.tags,
            excerpt: &document.excerpt,
        })
    }
}

fn directory_url(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl<W: Write> Renderer for ManifestRenderer<W> {
    type Error = Error;

    fn render(&mut self, index: &ContentIndex, pages: &[PlannedPage]) -> Result<()> {
        let mut manifest = Manifest {
            site_url: self.site_url.as_str(),
            pages: Vec::with_capacity(pages.len()),
            documents: BTreeMap::new(),
            home: index
                .listing(self.listing_size)
                .into_iter()
                .map(|section| ManifestSection {
                    category: section.category,
                    latest: section.latest.iter().map(|d| &d.id).collect(),
                })
                .collect(),
        };
        for page in pages {
            manifest.pages.push(ManifestPage {
                permalink: self.permalink(&page.path)?,
                page,
            });
        }
        for document in index.documents() {
            manifest
                .documents
                .insert(document.id.as_str(), self.manifest_document(document)?);
        }

        serde_yaml::to_writer(&mut self.writer, &manifest)?;
        self.writer.flush()?;
        tracing::debug!(pages = pages.len(), "Wrote manifest");
        Ok(())
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    site_url: &'a str,
    pages: Vec<ManifestPage<'a>>,
    documents: BTreeMap<&'a str, ManifestDocument<'a>>,
    home: Vec<ManifestSection<'a>>,
}

#[derive(Serialize)]
struct ManifestPage<'a> {
    permalink: String,

    #[serde(flatten)]
    page: &'a PlannedPage,
}

#[derive(Serialize)]
struct ManifestDocument<'a> {
    slug: &'a str,
    permalink: String,
    title: &'a str,
    description: &'a str,
    date: Option<String>,
    display_date: Option<String>,
    category: Option<&'a str>,
    tags: &'a [String],
    excerpt: &'a str,
}

#[derive(Serialize)]
struct ManifestSection<'a> {
    category: &'a str,
    latest: Vec<&'a DocumentId>,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to write the manifest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Returned when the site URL has no path to put pages under, e.g.
    /// `mailto:` URLs.
    #[error("site URL `{0}` can't have page paths")]
    CannotBeABase(Url),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::test::{index, source};
    use crate::plan::plan;
    use serde_yaml::Value;

    fn render(site_url: &str, listing_size: usize) -> Value {
        let index = index(vec![
            source("a", Some("2024-01-01"), Some("Algo")),
            source("b", Some("2024-02-01"), Some("Algo")),
            source("c", Some("2024-03-01"), None),
        ]);
        let pages = plan(&index).unwrap();
        let mut renderer = ManifestRenderer::new(Vec::new(), &Url::parse(site_url).unwrap())
            .with_listing_size(listing_size);
        renderer.render(&index, &pages).unwrap();
        serde_yaml::from_slice(&renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_render_pages() {
        let manifest = render("https://example.org/blog", 3);
        assert_eq!(
            Value::from("https://example.org/blog/"),
            manifest["site_url"]
        );

        let pages = manifest["pages"].as_sequence().unwrap();
        assert_eq!(4, pages.len());

        let b = &pages[1];
        assert_eq!(Value::from("/b/"), b["path"]);
        assert_eq!(Value::from("https://example.org/blog/b/"), b["permalink"]);
        assert_eq!(Value::from("post"), b["kind"]);
        assert_eq!(Value::from("a"), b["previous"]);
        assert_eq!(Value::from("c"), b["next"]);
        assert_eq!(Value::Null, pages[0]["previous"]);

        let algo = &pages[3];
        assert_eq!(Value::from("category"), algo["kind"]);
        assert_eq!(Value::from("/category/algo"), algo["path"]);
        assert_eq!(
            Value::from("https://example.org/blog/category/algo"),
            algo["permalink"]
        );
        assert_eq!(Some(2), algo["total_count"].as_u64());
    }

    #[test]
    fn test_render_encodes_category_permalink() {
        let index = index(vec![
            source("a", Some("2024-01-01"), Some("C#")),
            source("b", None, Some("Q&A?")),
        ]);
        let pages = plan(&index).unwrap();
        let mut renderer =
            ManifestRenderer::new(Vec::new(), &Url::parse("https://example.org/blog").unwrap());
        renderer.render(&index, &pages).unwrap();
        let manifest: Value = serde_yaml::from_slice(&renderer.into_inner()).unwrap();

        let pages = manifest["pages"].as_sequence().unwrap();
        assert_eq!(Value::from("/category/c#"), pages[2]["path"]);
        assert_eq!(
            Value::from("https://example.org/blog/category/c%23"),
            pages[2]["permalink"]
        );
        assert_eq!(
            Value::from("https://example.org/blog/category/q&a%3F"),
            pages[3]["permalink"]
        );
    }

    #[test]
    fn test_render_root_index_permalink() {
        let mut renderer =
            ManifestRenderer::new(Vec::new(), &Url::parse("https://example.org/blog/").unwrap());
        assert_eq!("https://example.org/blog/", renderer.permalink("/").unwrap());
        renderer.site_url = Url::parse("https://example.org/").unwrap();
        assert_eq!("https://example.org/a/b/", renderer.permalink("/a/b/").unwrap());
    }

    #[test]
    fn test_render_cannot_be_a_base() {
        let index = index(vec![source("a", None, None)]);
        let pages = plan(&index).unwrap();
        let mut renderer =
            ManifestRenderer::new(Vec::new(), &Url::parse("mailto:me@example.org").unwrap());
        assert!(matches!(
            renderer.render(&index, &pages),
            Err(Error::CannotBeABase(_))
        ));
    }

    #[test]
    fn test_render_documents() {
        let manifest = render("https://example.org/", 3);
        let a = &manifest["documents"]["a"];
        assert_eq!(Value::from("A"), a["title"]);
        assert_eq!(Value::from("/a/"), a["slug"]);
        assert_eq!(Value::from("2024-01-01T00:00:00"), a["date"]);
        assert_eq!(Value::from("January 01, 2024"), a["display_date"]);
        assert_eq!(Value::from("Algo"), a["category"]);
        assert_eq!(Value::Null, manifest["documents"]["c"]["category"]);
    }

    #[test]
    fn test_render_home_listing() {
        let manifest = render("https://example.org/", 1);
        let home = manifest["home"].as_sequence().unwrap();
        assert_eq!(1, home.len());
        assert_eq!(Value::from("Algo"), home[0]["category"]);
        assert_eq!(
            Value::Sequence(vec![Value::from("b")]),
            home[0]["latest"]
        );
    }
}
