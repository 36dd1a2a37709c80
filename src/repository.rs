//! Defines the [`ContentRepository`] trait, which yields the
//! [`SourceDocument`]s a build plans pages for, and its two implementations:
//! [`FsRepository`], which reads markdown files from a content directory, and
//! [`MemoryRepository`], which serves a fixed list.

use crate::document::{self, DocumentId, SourceDocument};
use crate::excerpt::{excerpt, DEFAULT_PRUNE_LENGTH};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A read-only source of documents. Implementations own their I/O and any
/// retry policy; callers treat every error as fatal for the current build.
pub trait ContentRepository {
    fn documents(&self) -> Result<Vec<SourceDocument>>;
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Reads documents from markdown files under a content directory. Each file
/// must begin with YAML front matter (see [`document::split_frontmatter`]).
/// A document's id is its path relative to the content directory, using `/`
/// as the separator.
pub struct FsRepository {
    content_directory: PathBuf,
    threads: usize,
    prune_length: usize,
}

impl FsRepository {
    pub fn new(content_directory: impl Into<PathBuf>) -> FsRepository {
        FsRepository {
            content_directory: content_directory.into(),
            threads: 1,
            prune_length: DEFAULT_PRUNE_LENGTH,
        }
    }

    /// Sets the number of threads used to read and parse files. Fewer than
    /// two means everything happens on the calling thread.
    pub fn with_threads(mut self, threads: usize) -> FsRepository {
        self.threads = threads;
        self
    }

    pub fn with_prune_length(mut self, prune_length: usize) -> FsRepository {
        self.prune_length = prune_length;
        self
    }

    pub fn content_directory(&self) -> &Path {
        &self.content_directory
    }

    /// Lists the markdown files under the content directory, in no
    /// particular order.
    fn source_files(&self) -> Result<Vec<PathBuf>> {
        if let Err(err) = std::fs::read_dir(&self.content_directory) {
            return Err(Error::Unavailable {
                path: self.content_directory.clone(),
                err,
            });
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.content_directory)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
        for result in walker {
            let entry = result?;
            if entry.file_type().is_file() && is_markdown(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn load(&self, path: &Path) -> Result<SourceDocument> {
        load_document(&self.content_directory, path, self.prune_length).map_err(|e| {
            Error::Annotated(format!("loading `{}`", path.display()), Box::new(e))
        })
    }

    fn load_singlethreaded(&self, files: Vec<PathBuf>) -> Result<Vec<SourceDocument>> {
        files.iter().map(|path| self.load(path)).collect()
    }

    /// Fans the files out to a pool of worker threads and joins every worker
    /// before returning, so callers only ever see the complete set.
    fn load_parallel(&self, files: Vec<PathBuf>) -> Result<Vec<SourceDocument>> {
        use crossbeam_channel::unbounded;
        use std::thread;

        let (tx, rx) = unbounded::<PathBuf>();
        for path in files {
            // Can't fail; `rx` is alive until the end of this function.
            let _ = tx.send(path);
        }
        drop(tx);

        thread::scope(|scope| {
            let workers: Vec<_> = (0..self.threads)
                .map(|_| {
                    let rx = rx.clone();
                    scope.spawn(move || -> Result<Vec<SourceDocument>> {
                        let mut documents = Vec::new();
                        for path in rx {
                            documents.push(self.load(&path)?);
                        }
                        Ok(documents)
                    })
                })
                .collect();

            let mut documents = Vec::new();
            let mut first_error = None;
            for worker in workers {
                match worker.join() {
                    Ok(Ok(loaded)) => documents.extend(loaded),
                    Ok(Err(e)) => {
                        first_error.get_or_insert(e);
                    }
                    Err(_) => {
                        first_error.get_or_insert(Error::WorkerPanicked);
                    }
                }
            }
            match first_error {
                Some(e) => Err(e),
                None => Ok(documents),
            }
        })
    }
}

impl ContentRepository for FsRepository {
    fn documents(&self) -> Result<Vec<SourceDocument>> {
        let files = self.source_files()?;
        tracing::debug!(
            directory = %self.content_directory.display(),
            files = files.len(),
            threads = self.threads,
            "Scanned content directory"
        );

        let mut documents = if self.threads < 2 || files.len() < 2 {
            self.load_singlethreaded(files)?
        } else {
            self.load_parallel(files)?
        };
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }
}

fn load_document(
    content_directory: &Path,
    path: &Path,
    prune_length: usize,
) -> Result<SourceDocument> {
    let contents = std::fs::read_to_string(path)?;
    let (metadata, body) = document::parse_source(&contents)?;
    let document = SourceDocument {
        id: document_id(content_directory, path)?,
        path: path.to_owned(),
        excerpt: excerpt(body, prune_length),
        metadata,
    };
    tracing::debug!(id = %document.id, title = %document.metadata.title, "Loaded document");
    Ok(document)
}

fn document_id(content_directory: &Path, path: &Path) -> Result<DocumentId> {
    // `path` always comes from walking `content_directory`.
    let relative = path.strip_prefix(content_directory).unwrap_or(path);
    let mut segments = Vec::new();
    for component in relative.components() {
        segments.push(
            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?,
        );
    }
    Ok(DocumentId::new(segments.join("/")))
}

fn is_hidden(file_name: &std::ffi::OsStr) -> bool {
    file_name.to_str().map_or(false, |name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| MARKDOWN_EXTENSIONS.contains(&ext))
}

/// Serves a fixed list of documents.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    documents: Vec<SourceDocument>,
}

impl MemoryRepository {
    pub fn new(documents: Vec<SourceDocument>) -> MemoryRepository {
        MemoryRepository { documents }
    }
}

impl ContentRepository for MemoryRepository {
    fn documents(&self) -> Result<Vec<SourceDocument>> {
        Ok(self.documents.clone())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to enumerate or read documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the content directory itself can't be listed.
    #[error("content directory `{}` is unavailable: {}", .path.display(), .err)]
    Unavailable {
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when a document's front matter is missing or invalid.
    #[error(transparent)]
    Document(#[from] document::Error),

    /// Returned when a source path isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("a document loader thread panicked")]
    WorkerPanicked,

    /// An error with an annotation, usually the offending file.
    #[error("{0}: {1}")]
    Annotated(String, Box<Error>),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "binary-search.md",
            "---\ntitle: Binary search\ndate: 2024-01-01\ncategory: Algo\n---\nHalve it.\n",
        );
        write(
            dir.path(),
            "graphs/dijkstra/index.md",
            "---\ntitle: Dijkstra\ndate: 2024-02-01\ncategory: Algo\ntags: graphs, paths\n---\nRelax edges.\n",
        );
        write(dir.path(), "graphs/dijkstra/figure.png", "not markdown");
        write(dir.path(), ".drafts/secret.md", "---\ntitle: Secret\n---\n");
        write(dir.path(), "notes.markdown", "---\ntitle: Notes\n---\n");
        dir
    }

    #[test]
    fn test_documents() -> Result<()> {
        let dir = fixture();
        let documents = FsRepository::new(dir.path()).documents()?;

        let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            vec!["binary-search.md", "graphs/dijkstra/index.md", "notes.markdown"],
            ids
        );
        assert_eq!("Relax edges.", documents[1].excerpt);
        assert_eq!(vec!["graphs", "paths"], documents[1].metadata.tags);
        assert_eq!(dir.path().join("graphs/dijkstra/index.md"), documents[1].path);
        Ok(())
    }

    #[test]
    fn test_documents_parallel_matches_singlethreaded() -> Result<()> {
        let dir = fixture();
        let single = FsRepository::new(dir.path()).documents()?;
        let parallel = FsRepository::new(dir.path()).with_threads(4).documents()?;
        assert_eq!(single, parallel);
        Ok(())
    }

    #[test]
    fn test_documents_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = FsRepository::new(dir.path().join("missing")).documents();
        assert!(matches!(result, Err(Error::Unavailable { .. })));
    }

    #[test]
    fn test_documents_annotates_bad_file() {
        let dir = fixture();
        write(dir.path(), "broken.md", "no front matter here");
        for threads in &[1, 3] {
            let err = FsRepository::new(dir.path())
                .with_threads(*threads)
                .documents()
                .unwrap_err();
            let message = err.to_string();
            assert!(message.contains("broken.md"), "{}", message);
            assert!(message.contains("`---`"), "{}", message);
        }
    }

    #[test]
    fn test_error_chain_reports_cause_once() {
        let dir = fixture();
        write(dir.path(), "broken.md", "no front matter here");
        let err = FsRepository::new(dir.path()).documents().unwrap_err();

        let mut chain = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            chain.push_str(&format!("\n{}", cause));
            source = cause.source();
        }
        assert_eq!(1, chain.matches("must begin with `---`").count(), "{}", chain);
    }

    #[test]
    fn test_memory_repository() -> Result<()> {
        let source = SourceDocument {
            id: DocumentId::new("a"),
            path: PathBuf::from("a.md"),
            excerpt: String::new(),
            metadata: document::Metadata::titled("A"),
        };
        let repository = MemoryRepository::new(vec![source.clone()]);
        assert_eq!(vec![source], repository.documents()?);
        Ok(())
    }
}
