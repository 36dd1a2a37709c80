//! The library code for the `pagewright` static blog planner. A build is a
//! single pass through four steps:
//!
//! 1. Loading documents (markdown files with YAML front matter) from a
//!    content repository ([`crate::repository`])
//! 2. Deriving each document's URL path from its file path ([`crate::slug`])
//!    and indexing the documents ([`crate::index`])
//! 3. Planning the pages of the site ([`crate::plan`])
//! 4. Handing the plan to a renderer ([`crate::render`])
//!
//! The third step is the heart of it. Every document gets a post page linked
//! to the previous and next documents in chronological order, and every
//! category gets a page listing its documents. Planning is deterministic and
//! all-or-nothing: two documents that would be written to the same path, or
//! any error loading the documents, fail the whole build rather than
//! producing a partial site.
//!
//! The bundled renderer writes the plan as a YAML manifest. Turning that into
//! HTML is left to a template engine.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod document;
pub mod excerpt;
pub mod index;
pub mod plan;
pub mod render;
pub mod repository;
pub mod slug;
