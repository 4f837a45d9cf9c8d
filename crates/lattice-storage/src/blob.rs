//! Raw document body storage.
//!
//! Bodies live outside the relational backend, one file per document under
//! the owning collection's documents directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Abstract store for raw document bodies.
///
/// Consumers depend on this trait rather than the filesystem so alternative
/// stores (object storage, in-memory test doubles) can be substituted.
pub trait DocumentBlobStore: Send + Sync {
    /// Writes a document body. Overwrites any existing body.
    fn put(&self, collection_dir: &str, doc_id: &str, bytes: &[u8]) -> Result<()>;

    /// Reads a document body. `None` when no body exists.
    fn get(&self, collection_dir: &str, doc_id: &str) -> Result<Option<Vec<u8>>>;

    /// Deletes a document body. Returns whether a body existed.
    fn delete(&self, collection_dir: &str, doc_id: &str) -> Result<bool>;
}

/// Filesystem-backed blob store: `<root>/<collection_dir>/<doc_id>.json`.
///
/// Absolute collection directories are used as-is; relative ones resolve
/// under the store's root.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, collection_dir: &str, doc_id: &str) -> PathBuf {
        let dir = Path::new(collection_dir);
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        };
        dir.join(format!("{doc_id}.json"))
    }
}

impl DocumentBlobStore for FsBlobStore {
    fn put(&self, collection_dir: &str, doc_id: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(collection_dir, doc_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!(?path, len = bytes.len(), "wrote document blob");
        Ok(())
    }

    fn get(&self, collection_dir: &str, doc_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(collection_dir, doc_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, collection_dir: &str, doc_id: &str) -> Result<bool> {
        let path = self.path_for(collection_dir, doc_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(?path, "deleted document blob");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
