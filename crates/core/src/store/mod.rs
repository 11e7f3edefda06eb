//! File-backed document store.
//!
//! One JSON file per Page/Post/TeamMember under `<root>/<kind>/<id>.json`;
//! single aggregate files for categories, redirects and site config.
//!
//! Reads tolerate missing or partially-written files by treating them as
//! absent. Writes are whole-document overwrites staged through a sibling
//! temp file and renamed into place, so a concurrent reader observes either
//! the old or the new document, never a torn one. There is no record-level
//! locking: concurrent writers to the same id race and the last `put` wins.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Document kinds stored file-per-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Page,
    Post,
    TeamMember,
}

impl DocumentKind {
    fn dir(self) -> &'static str {
        match self {
            DocumentKind::Page => "pages",
            DocumentKind::Post => "posts",
            DocumentKind::TeamMember => "team",
        }
    }
}

/// Aggregate record names (one JSON file each).
pub const CATEGORIES_FILE: &str = "categories";
pub const REDIRECTS_FILE: &str = "redirects";
pub const SITE_FILE: &str = "site";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the on-disk layout if it does not exist yet.
    pub async fn init(&self) -> EngineResult<()> {
        for kind in [DocumentKind::Page, DocumentKind::Post, DocumentKind::TeamMember] {
            tokio::fs::create_dir_all(self.root.join(kind.dir())).await?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, kind: DocumentKind, id: Uuid) -> PathBuf {
        self.root.join(kind.dir()).join(format!("{id}.json"))
    }

    fn aggregate_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Read one document. Missing and unparseable files are both absent.
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: DocumentKind,
        id: Uuid,
    ) -> EngineResult<Option<T>> {
        read_json(&self.document_path(kind, id)).await
    }

    /// Read every document of a kind. Corrupt files are skipped with a
    /// warning; they never fail the listing.
    pub async fn list<T: DeserializeOwned>(&self, kind: DocumentKind) -> EngineResult<Vec<T>> {
        let dir = self.root.join(kind.dir());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(EngineError::Storage(err)),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(document) = read_json::<T>(&path).await? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    /// Whole-document overwrite.
    pub async fn put<T: Serialize>(
        &self,
        kind: DocumentKind,
        id: Uuid,
        document: &T,
    ) -> EngineResult<()> {
        write_json(&self.document_path(kind, id), document).await
    }

    /// Delete one document. Returns false if it was already gone.
    pub async fn delete(&self, kind: DocumentKind, id: Uuid) -> EngineResult<bool> {
        match tokio::fs::remove_file(self.document_path(kind, id)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(EngineError::Storage(err)),
        }
    }

    /// Read an aggregate record, falling back to its default when absent.
    pub async fn read_aggregate<T: DeserializeOwned + Default>(
        &self,
        name: &str,
    ) -> EngineResult<T> {
        Ok(read_json(&self.aggregate_path(name))
            .await?
            .unwrap_or_default())
    }

    pub async fn write_aggregate<T: Serialize>(&self, name: &str, value: &T) -> EngineResult<()> {
        write_json(&self.aggregate_path(name), value).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> EngineResult<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(EngineError::Storage(err)),
    };

    match serde_json::from_slice(&bytes) {
        Ok(document) => Ok(Some(document)),
        Err(err) => {
            // Partially-written or corrupt records read as absent.
            warn!(path = %path.display(), error = %err, "unreadable document, treating as absent");
            Ok(None)
        }
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> EngineResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Doc {
        name: String,
        count: u32,
    }

    async fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.init().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let (_dir, store) = store().await;
        let id = Uuid::new_v4();
        let doc = Doc { name: "a".into(), count: 1 };

        store.put(DocumentKind::Page, id, &doc).await.unwrap();
        let loaded: Option<Doc> = store.get(DocumentKind::Page, id).await.unwrap();
        assert_eq!(loaded, Some(doc));
    }

    #[tokio::test]
    async fn missing_document_is_absent() {
        let (_dir, store) = store().await;
        let loaded: Option<Doc> = store.get(DocumentKind::Post, Uuid::new_v4()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn corrupt_document_reads_as_absent() {
        let (_dir, store) = store().await;
        let id = Uuid::new_v4();
        let path = store.root().join("pages").join(format!("{id}.json"));
        tokio::fs::write(&path, b"{\"name\": \"trunc").await.unwrap();

        let loaded: Option<Doc> = store.get(DocumentKind::Page, id).await.unwrap();
        assert!(loaded.is_none());

        // And listing skips it rather than failing.
        let all: Vec<Doc> = store.list(DocumentKind::Page).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn put_overwrites_whole_document() {
        let (_dir, store) = store().await;
        let id = Uuid::new_v4();
        store
            .put(DocumentKind::Page, id, &Doc { name: "a".into(), count: 1 })
            .await
            .unwrap();
        store
            .put(DocumentKind::Page, id, &Doc { name: "b".into(), count: 2 })
            .await
            .unwrap();

        let loaded: Doc = store.get(DocumentKind::Page, id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "b");

        // No temp file left behind.
        let tmp = store.root().join("pages").join(format!("{id}.json.tmp"));
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let (_dir, store) = store().await;
        let id = Uuid::new_v4();
        store
            .put(DocumentKind::TeamMember, id, &Doc::default())
            .await
            .unwrap();

        assert!(store.delete(DocumentKind::TeamMember, id).await.unwrap());
        assert!(!store.delete(DocumentKind::TeamMember, id).await.unwrap());
    }

    #[tokio::test]
    async fn aggregate_defaults_when_absent() {
        let (_dir, store) = store().await;
        let value: Doc = store.read_aggregate("categories").await.unwrap();
        assert_eq!(value, Doc::default());

        store
            .write_aggregate("categories", &Doc { name: "x".into(), count: 7 })
            .await
            .unwrap();
        let value: Doc = store.read_aggregate("categories").await.unwrap();
        assert_eq!(value.count, 7);
    }
}
