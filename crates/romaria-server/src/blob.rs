//! Filesystem-backed receipt storage.

use std::path::{Component, Path, PathBuf};

use romaria_core::gateway::BlobStore;

/// Writes blobs under a root directory, creating parent directories on
/// demand. Names are relative paths like `receipts/<id>.html`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Resolve a blob name under the root, rejecting traversal components.
  pub fn resolve(&self, name: &str) -> std::io::Result<PathBuf> {
    let relative = Path::new(name);
    let safe = relative
      .components()
      .all(|c| matches!(c, Component::Normal(_)));
    if !safe || relative.as_os_str().is_empty() {
      return Err(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("unsafe blob name: {name}"),
      ));
    }
    Ok(self.root.join(relative))
  }
}

impl BlobStore for FsBlobStore {
  type Error = std::io::Error;

  async fn put(&self, name: &str, bytes: &[u8]) -> std::io::Result<()> {
    let path = self.resolve(name)?;
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, bytes).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("romaria-blob-{}", uuid::Uuid::new_v4()))
  }

  #[tokio::test]
  async fn put_creates_parent_directories() {
    let root = temp_root();
    let blobs = FsBlobStore::new(&root);
    blobs.put("receipts/abc.html", b"<html/>").await.unwrap();

    let written = tokio::fs::read(root.join("receipts/abc.html")).await.unwrap();
    assert_eq!(written, b"<html/>");
    tokio::fs::remove_dir_all(&root).await.unwrap();
  }

  #[tokio::test]
  async fn traversal_names_are_rejected() {
    let blobs = FsBlobStore::new(temp_root());
    assert!(blobs.put("../escape.html", b"x").await.is_err());
    assert!(blobs.put("/etc/passwd", b"x").await.is_err());
    assert!(blobs.put("", b"x").await.is_err());
  }
}
