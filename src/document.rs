//! Defines the [`Document`] family of types: the identifier, the structured
//! front-matter [`Metadata`], the [`SourceDocument`] a repository yields, and
//! the slug-tagged [`Document`] the index and planner operate on. Also
//! defines [`split_frontmatter`] and the validation that turns loosely-typed
//! YAML front matter into [`Metadata`].

use crate::slug::{self, Slug, SlugDeriver};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::path::PathBuf;

/// The format used for human-readable dates, e.g. `January 02, 2024`.
pub const DISPLAY_DATE_FORMAT: &str = "%B %d, %Y";

/// An opaque, stable identifier for a document. Identifiers are totally
/// ordered; the order breaks ties between documents with equal dates.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> DocumentId {
        DocumentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The validated front matter of a document.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawMetadata")]
pub struct Metadata {
    pub title: String,
    pub description: String,

    /// The publication date. Documents without one sort after all dated
    /// documents.
    pub date: Option<NaiveDateTime>,

    /// Never `Some("")`; blank categories are normalized to `None`.
    pub category: Option<String>,

    pub tags: Vec<String>,
}

impl Metadata {
    /// A metadata record with only a title, mostly useful for tests and
    /// embedders that build documents by hand.
    pub fn titled(title: impl Into<String>) -> Metadata {
        Metadata {
            title: title.into(),
            description: String::new(),
            date: None,
            category: None,
            tags: Vec::new(),
        }
    }

    pub fn with_date(mut self, date: &str) -> Result<Metadata> {
        self.date = Some(parse_date(date)?);
        Ok(self)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Metadata {
        self.category = normalize_category(Some(category.into()));
        self
    }

    /// The date formatted with [`DISPLAY_DATE_FORMAT`], if there is one.
    pub fn display_date(&self) -> Option<String> {
        self.date
            .map(|date| date.format(DISPLAY_DATE_FORMAT).to_string())
    }
}

/// Front matter exactly as it appears in the YAML.
#[derive(Deserialize)]
struct RawMetadata {
    title: String,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    date: Option<String>,

    #[serde(default)]
    category: Option<String>,

    #[serde(default)]
    tags: Option<RawTags>,
}

/// Tags may be written either as a YAML list or as a comma-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<RawTag>),
    Csv(String),
}

/// A list item; `tags: [2024, rust]` is as good as `tags: ["2024", rust]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTag {
    Text(String),
    Number(serde_yaml::Number),
    Bool(bool),
}

impl From<RawTag> for String {
    fn from(tag: RawTag) -> String {
        match tag {
            RawTag::Text(text) => text,
            RawTag::Number(number) => number.to_string(),
            RawTag::Bool(b) => b.to_string(),
        }
    }
}

impl RawTags {
    fn into_tags(self) -> Vec<String> {
        let items: Vec<String> = match self {
            RawTags::List(items) => items.into_iter().map(String::from).collect(),
            RawTags::Csv(csv) => csv.split(',').map(str::to_owned).collect(),
        };
        items
            .into_iter()
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

impl TryFrom<RawMetadata> for Metadata {
    type Error = Error;

    fn try_from(raw: RawMetadata) -> Result<Metadata> {
        Ok(Metadata {
            title: raw.title,
            description: raw.description.unwrap_or_default(),
            date: match raw.date {
                Some(date) => Some(parse_date(&date)?),
                None => None,
            },
            category: normalize_category(raw.category),
            tags: raw.tags.map(RawTags::into_tags).unwrap_or_default(),
        })
    }
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
}

/// Parses an ISO-8601 date. Offsets are normalized to UTC; bare dates are
/// taken to mean midnight.
pub fn parse_date(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
        return Ok(date_time.naive_utc());
    }
    for format in &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(date_time);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::InvalidDate(input.to_owned()))
}

/// Splits a source file into its YAML front matter and its body. The file
/// must begin with a `---` fence and the front matter ends at the next line
/// consisting of `---`.
pub fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    let input = input.trim_start_matches('\u{feff}');
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    let rest = &input[FENCE.len()..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == FENCE {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Parses the YAML front matter of a source file into [`Metadata`] and
/// returns it alongside the markdown body.
pub fn parse_source(input: &str) -> Result<(Metadata, &str)> {
    let (yaml, body) = split_frontmatter(input)?;
    let blank = yaml.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Err(Error::FrontmatterEmpty);
    }
    Ok((serde_yaml::from_str(yaml)?, body))
}

/// A document as yielded by a [`crate::repository::ContentRepository`], before
/// its slug is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub path: PathBuf,
    pub excerpt: String,
    pub metadata: Metadata,
}

/// A [`SourceDocument`] tagged with its [`Slug`]. Never mutated once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub path: PathBuf,
    pub slug: Slug,
    pub excerpt: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(source: SourceDocument, deriver: &SlugDeriver) -> slug::Result<Document> {
        Ok(Document {
            slug: deriver.derive(&source.path)?,
            id: source.id,
            path: source.path,
            excerpt: source.excerpt,
            metadata: source.metadata,
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem reading a document's front matter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("document must begin with `---`")]
    FrontmatterMissingStartFence,

    #[error("missing closing `---`")]
    FrontmatterMissingEndFence,

    #[error("front matter is empty: a `title` is required")]
    FrontmatterEmpty,

    /// Returned when the front matter isn't valid YAML or doesn't match the
    /// expected shape. Validation errors from [`Metadata`] surface here too.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    #[error("invalid date `{0}`: expected an ISO-8601 date")]
    InvalidDate(String),
}
