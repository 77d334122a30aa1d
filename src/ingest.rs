use std::{
  fs,
  path::{Path, PathBuf},
};

use thiserror::Error;
use walkdir::WalkDir;

use crate::{document::Document, inventory::Inventory, key::ResourceKey};

/// YAML document separator used to split multi-document files
const DOCUMENT_SEPARATOR: &str = "\n---";

/// Pre-flight failures for a must-gather directory
///
/// These are fatal and are raised before any ingestion work begins.
#[derive(Debug, Error)]
pub enum MustGatherError {
  #[error("must-gather path cannot be empty")]
  EmptyPath,

  #[error("must-gather directory not found: {0}\nPlease verify the path exists and is accessible")]
  NotFound(PathBuf),

  #[error("must-gather path is not a directory: {0}\nPlease provide a path to a directory, not a file")]
  NotADirectory(PathBuf),

  #[error("cannot read must-gather directory: {path}\nError: {source}\nPlease check directory permissions")]
  Unreadable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("must-gather directory is empty: {0}\nPlease provide a valid must-gather directory with YAML files")]
  EmptyDirectory(PathBuf),
}

/// Validate that `path` is an existing, readable, non-empty directory
///
/// A directory without any `.yaml`/`.yml` files passes validation with a warning.
pub fn validate(path: &Path) -> Result<(), MustGatherError> {
  if path.as_os_str().is_empty() {
    return Err(MustGatherError::EmptyPath);
  }

  let metadata = match fs::metadata(path) {
    Ok(metadata) => metadata,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      return Err(MustGatherError::NotFound(path.to_path_buf()));
    }
    Err(source) => {
      return Err(MustGatherError::Unreadable {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  if !metadata.is_dir() {
    return Err(MustGatherError::NotADirectory(path.to_path_buf()));
  }

  let mut entries = fs::read_dir(path).map_err(|source| MustGatherError::Unreadable {
    path: path.to_path_buf(),
    source,
  })?;
  if entries.next().is_none() {
    return Err(MustGatherError::EmptyDirectory(path.to_path_buf()));
  }

  let has_yaml = WalkDir::new(path)
    .into_iter()
    .filter_map(Result::ok)
    .any(|entry| entry.file_type().is_file() && is_yaml(entry.path()));
  if !has_yaml {
    tracing::warn!(
      "No YAML files found in must-gather directory: {}. The directory will be processed, but no resources may be extracted",
      path.display()
    );
  }

  Ok(())
}

fn is_yaml(path: &Path) -> bool {
  matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}

/// A path that could not be visited or read, and why
#[derive(Clone, Debug)]
pub struct WalkIssue {
  pub path: PathBuf,
  pub error: String,
}

/// Result of ingesting a must-gather directory
#[derive(Debug, Default)]
pub struct Ingestion {
  pub inventory: Inventory,
  /// YAML files read successfully
  pub files_processed: usize,
  /// Documents (or list entries) that were malformed or could not be keyed
  pub dropped_documents: usize,
  /// Directories or files that were skipped, in traversal order
  pub issues: Vec<WalkIssue>,
}

/// Accumulates documents and traversal issues while walking the tree
#[derive(Default)]
struct Visitor {
  ingestion: Ingestion,
}

impl Visitor {
  fn issue(&mut self, path: PathBuf, error: impl ToString) {
    let error = error.to_string();
    tracing::warn!("Failed to access {}: {error}", path.display());
    self.ingestion.issues.push(WalkIssue { path, error });
  }

  fn visit_file(&mut self, path: &Path) {
    tracing::debug!("Processing file: {}", path.display());

    match fs::read(path) {
      Ok(bytes) => {
        let text = String::from_utf8_lossy(&bytes);
        self.visit_stream(&text);
        self.ingestion.files_processed += 1;
      }
      Err(err) => self.issue(path.to_path_buf(), err),
    }
  }

  fn visit_stream(&mut self, text: &str) {
    for candidate in text.split(DOCUMENT_SEPARATOR) {
      if is_blank_or_comment(candidate) {
        continue;
      }

      match Document::parse(candidate) {
        Ok(Some(doc)) => self.visit_document(doc),
        Ok(None) => self.drop_document("document is not a mapping"),
        Err(err) => self.drop_document(err),
      }
    }
  }

  fn visit_document(&mut self, doc: Document) {
    let (Some(api_version), Some(kind)) = (doc.api_version(), doc.kind()) else {
      self.drop_document("missing apiVersion or kind");
      return;
    };

    if doc.is_list() {
      for item in doc.items().unwrap_or_default() {
        self.visit_item(item);
      }
      return;
    }

    let key = ResourceKey::from_kind(api_version, kind);
    self.ingestion.inventory.push(key, doc);
  }

  /// List entries are keyed like standalone documents, except nested lists are not unwrapped
  fn visit_item(&mut self, item: Document) {
    match (item.api_version(), item.kind()) {
      (Some(api_version), Some(kind)) => {
        let key = ResourceKey::from_kind(api_version, kind);
        self.ingestion.inventory.push(key, item);
      }
      _ => self.drop_document("list entry missing apiVersion or kind"),
    }
  }

  fn drop_document(&mut self, reason: impl std::fmt::Display) {
    tracing::debug!("Dropping document: {reason}");
    self.ingestion.dropped_documents += 1;
  }
}

/// Whether a candidate document has no content beyond whitespace and `#` comments
fn is_blank_or_comment(candidate: &str) -> bool {
  candidate
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .all(|line| line.starts_with('#'))
}

/// Build an inventory from every YAML document found beneath `root`
///
/// Symlinks are followed. Unreadable directories, dangling links and unreadable files are
/// recorded as issues and skipped. Documents that fail to
/// parse or cannot be keyed are dropped and counted.
pub fn ingest(root: &Path) -> Ingestion {
  let mut visitor = Visitor::default();

  for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
    let entry = match entry {
      Ok(entry) => entry,
      Err(err) => {
        let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
        visitor.issue(path, err);
        continue;
      }
    };

    if entry.file_type().is_file() && is_yaml(entry.path()) {
      visitor.visit_file(entry.path());
    }
  }

  visitor.ingestion
}

/// Ingest a YAML stream directly, without touching the filesystem
pub fn ingest_str(text: &str) -> Ingestion {
  let mut visitor = Visitor::default();
  visitor.visit_stream(text);
  visitor.ingestion
}
