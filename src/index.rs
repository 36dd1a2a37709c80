//! Defines the [`ContentIndex`], an immutable snapshot of every document in a
//! build, each tagged with its slug. The index answers the handful of
//! projections the planner and renderers need: documents sorted by date,
//! documents grouped by category, and the per-category listing shown on the
//! home page.

use crate::document::{Document, DocumentId, SourceDocument};
use crate::slug::{self, Slug, SlugDeriver};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// The direction of a date sort. Undated documents come last either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// The documents sharing a category, ascending by date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    pub name: &'a str,
    pub members: Vec<&'a Document>,
}

impl CategoryGroup<'_> {
    pub fn total_count(&self) -> usize {
        self.members.len()
    }
}

/// One category's section of the home page: the newest posts in the
/// category, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingSection<'a> {
    pub category: &'a str,
    pub latest: Vec<&'a Document>,
}

/// Every document of a build, keyed by id. Built once per build and dropped
/// at its end; there is no incremental update.
#[derive(Debug)]
pub struct ContentIndex {
    documents: Vec<Document>,
    by_id: HashMap<DocumentId, usize>,
}

impl ContentIndex {
    /// Derives every document's slug relative to `content_root` and builds
    /// the index. Fails on the first invalid path, duplicate id, or duplicate
    /// slug.
    pub fn build(content_root: &Path, sources: Vec<SourceDocument>) -> Result<ContentIndex> {
        let deriver = SlugDeriver::new(content_root);
        let documents = sources
            .into_iter()
            .map(|source| Document::new(source, &deriver))
            .collect::<slug::Result<Vec<Document>>>()?;
        ContentIndex::new(documents)
    }

    /// Builds the index from documents whose slugs are already derived.
    pub fn new(documents: Vec<Document>) -> Result<ContentIndex> {
        let mut by_id = HashMap::with_capacity(documents.len());
        let mut by_slug: HashMap<&Slug, &Document> = HashMap::with_capacity(documents.len());
        for (i, document) in documents.iter().enumerate() {
            if by_id.insert(document.id.clone(), i).is_some() {
                return Err(Error::DuplicateId(document.id.clone()));
            }
            if let Some(first) = by_slug.insert(&document.slug, document) {
                return Err(Error::DuplicateSlug {
                    slug: document.slug.clone(),
                    first: first.path.clone(),
                    second: document.path.clone(),
                });
            }
        }

        Ok(ContentIndex { documents, by_id })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The documents in the order the index was built from.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.by_id.get(id).map(|&i| &self.documents[i])
    }

    /// Returns every document ordered by publication date. Equal dates are
    /// ordered by id, and documents without a date follow all dated
    /// documents (also by id) regardless of `order`.
    pub fn sorted_by_date(&self, order: Order) -> Vec<&Document> {
        let mut documents: Vec<&Document> = self.documents.iter().collect();
        documents.sort_by(|a, b| compare_by_date(a, b, order));
        documents
    }

    /// Groups the documents by category, ordered by category name. Names are
    /// compared exactly as stored, so `Algo` and `algo` are distinct groups.
    /// Documents without a category belong to no group.
    pub fn group_by_category(&self) -> Vec<CategoryGroup<'_>> {
        let mut groups: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
        for document in self.sorted_by_date(Order::Ascending) {
            if let Some(category) = &document.metadata.category {
                groups.entry(category.as_str()).or_default().push(document);
            }
        }

        groups
            .into_iter()
            .map(|(name, members)| CategoryGroup { name, members })
            .collect()
    }

    /// Returns, for each category, its `per_category` newest documents,
    /// newest first.
    pub fn listing(&self, per_category: usize) -> Vec<ListingSection<'_>> {
        self.group_by_category()
            .into_iter()
            .map(|group| {
                let mut latest = group.members;
                latest.sort_by(|a, b| compare_by_date(a, b, Order::Descending));
                latest.truncate(per_category);
                ListingSection {
                    category: group.name,
                    latest,
                }
            })
            .collect()
    }
}

fn compare_by_date(a: &Document, b: &Document, order: Order) -> Ordering {
    let by_date = match (&a.metadata.date, &b.metadata.date) {
        (Some(x), Some(y)) => match order {
            Order::Ascending => x.cmp(y),
            Order::Descending => y.cmp(x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.id.cmp(&b.id))
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to build a [`ContentIndex`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Slug(#[from] slug::Error),

    /// Returned when two documents derive the same slug; one page would
    /// silently overwrite the other.
    #[error(
        "`{}` and `{}` both map to the page `{}`",
        .first.display(),
        .second.display(),
        .slug
    )]
    DuplicateSlug {
        slug: Slug,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("more than one document has the id `{0}`")]
    DuplicateId(DocumentId),
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::document::Metadata;
    use pretty_assertions::assert_eq;

    /// Builds a source document at `/blog/{id}.md`.
    pub(crate) fn source(id: &str, date: Option<&str>, category: Option<&str>) -> SourceDocument {
        let mut metadata = Metadata::titled(id.to_uppercase());
        if let Some(date) = date {
            metadata = metadata.with_date(date).unwrap();
        }
        if let Some(category) = category {
            metadata = metadata.with_category(category);
        }
        SourceDocument {
            id: DocumentId::new(id),
            path: PathBuf::from(format!("/blog/{}.md", id)),
            excerpt: String::new(),
            metadata,
        }
    }

    pub(crate) fn index(sources: Vec<SourceDocument>) -> ContentIndex {
        ContentIndex::build(Path::new("/blog"), sources).unwrap()
    }

    fn ids(documents: &[&Document]) -> Vec<String> {
        documents.iter().map(|d| d.id.to_string()).collect()
    }

    #[test]
    fn test_build_derives_slugs() {
        let index = index(vec![source("a", None, None)]);
        assert_eq!("/a/", index.get(&DocumentId::new("a")).unwrap().slug.as_str());
    }

    #[test]
    fn test_build_duplicate_slug() {
        let mut bundle = source("bundle", None, None);
        bundle.path = PathBuf::from("/blog/post-a/index.md");
        let mut flat = source("flat", None, None);
        flat.path = PathBuf::from("/blog/post-a.md");

        match ContentIndex::build(Path::new("/blog"), vec![bundle, flat]) {
            Err(Error::DuplicateSlug { slug, first, second }) => {
                assert_eq!("/post-a/", slug.as_str());
                assert_eq!(PathBuf::from("/blog/post-a/index.md"), first);
                assert_eq!(PathBuf::from("/blog/post-a.md"), second);
            }
            other => panic!("wanted DuplicateSlug; found {:?}", other),
        }
    }

    #[test]
    fn test_build_duplicate_id() {
        let mut copy = source("a", None, None);
        copy.path = PathBuf::from("/blog/elsewhere.md");
        let result = ContentIndex::build(Path::new("/blog"), vec![source("a", None, None), copy]);
        assert!(matches!(result, Err(Error::DuplicateId(_))));
    }

    #[test]
    fn test_build_invalid_path() {
        let mut empty = source("a", None, None);
        empty.path = PathBuf::new();
        let result = ContentIndex::build(Path::new("/blog"), vec![empty]);
        assert!(matches!(result, Err(Error::Slug(_))));
    }

    #[test]
    fn test_sorted_by_date_ascending() {
        let index = index(vec![
            source("undated-b", None, None),
            source("late", Some("2024-03-01"), None),
            source("tie-b", Some("2024-02-01"), None),
            source("undated-a", None, None),
            source("tie-a", Some("2024-02-01"), None),
            source("early", Some("2024-01-01"), None),
        ]);
        assert_eq!(
            vec!["early", "tie-a", "tie-b", "late", "undated-a", "undated-b"],
            ids(&index.sorted_by_date(Order::Ascending)),
        );
    }

    #[test]
    fn test_sorted_by_date_descending_keeps_undated_last() {
        let index = index(vec![
            source("undated", None, None),
            source("early", Some("2024-01-01"), None),
            source("tie-b", Some("2024-02-01"), None),
            source("tie-a", Some("2024-02-01"), None),
        ]);
        assert_eq!(
            vec!["tie-a", "tie-b", "early", "undated"],
            ids(&index.sorted_by_date(Order::Descending)),
        );
    }

    #[test]
    fn test_group_by_category() {
        let index = index(vec![
            source("c", Some("2024-03-01"), None),
            source("b", Some("2024-02-01"), Some("Algo")),
            source("d", Some("2024-01-15"), Some("algo")),
            source("a", Some("2024-01-01"), Some("Algo")),
        ]);
        let groups = index.group_by_category();

        let summary: Vec<(&str, usize, Vec<String>)> = groups
            .iter()
            .map(|g| (g.name, g.total_count(), ids(&g.members)))
            .collect();
        assert_eq!(
            vec![
                ("Algo", 2, vec![String::from("a"), String::from("b")]),
                ("algo", 1, vec![String::from("d")]),
            ],
            summary,
        );
    }

    #[test]
    fn test_listing() {
        let index = index(vec![
            source("a", Some("2024-01-01"), Some("Algo")),
            source("b", Some("2024-02-01"), Some("Algo")),
            source("c", Some("2024-03-01"), Some("Algo")),
            source("d", None, Some("Algo")),
            source("e", Some("2024-01-01"), Some("Life")),
        ]);
        let listing = index.listing(2);
        assert_eq!(2, listing.len());
        assert_eq!("Algo", listing[0].category);
        assert_eq!(vec!["c", "b"], ids(&listing[0].latest));
        assert_eq!(vec!["e"], ids(&listing[1].latest));
    }

    #[test]
    fn test_empty_index() {
        let index = index(Vec::new());
        assert!(index.is_empty());
        assert!(index.sorted_by_date(Order::Ascending).is_empty());
        assert!(index.group_by_category().is_empty());
    }
}
