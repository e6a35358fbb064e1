use crate::adapters::parse_collection;
use crate::core::recommender::{CENTERS_COLLECTION, RULES_COLLECTION};
use crate::domain::ports::{RecordSource, Storage};
use crate::utils::error::{FinderError, Result};
use async_trait::async_trait;

/// Reads each collection from `<collection>.json` through a `Storage`.
#[derive(Debug, Clone)]
pub struct FileSource<S: Storage> {
    storage: S,
    label: String,
    centers_collection: String,
    rules_collection: String,
}

impl<S: Storage> FileSource<S> {
    pub fn new(storage: S, label: impl Into<String>) -> Self {
        Self {
            storage,
            label: label.into(),
            centers_collection: CENTERS_COLLECTION.to_string(),
            rules_collection: RULES_COLLECTION.to_string(),
        }
    }

    pub fn with_collections(mut self, centers: &str, rules: &str) -> Self {
        self.centers_collection = centers.to_string();
        self.rules_collection = rules.to_string();
        self
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<serde_json::Value>> {
        let file_name = format!("{}.json", collection);
        tracing::debug!("Reading collection '{}' from {}", collection, file_name);

        let bytes = self
            .storage
            .read_file(&file_name)
            .await
            .map_err(|e| FinderError::store_unavailable(&self.name(), format!("{}: {}", file_name, e)))?;

        let payload: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
            FinderError::store_unavailable(&self.name(), format!("{} is not valid JSON: {}", file_name, e))
        })?;

        parse_collection(&self.name(), collection, payload)
    }
}

#[async_trait]
impl<S: Storage> RecordSource for FileSource<S> {
    fn name(&self) -> String {
        format!("file:{}", self.label)
    }

    async fn fetch_centers(&self) -> Result<Vec<serde_json::Value>> {
        self.read_collection(&self.centers_collection).await
    }

    async fn fetch_rules(&self) -> Result<Vec<serde_json::Value>> {
        self.read_collection(&self.rules_collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.lock().await.get(path).cloned().ok_or_else(|| {
                FinderError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reads_configured_collections() {
        let storage = MockStorage::default();
        storage.put("centros.json", r#"[{"nombre": "A"}]"#).await;
        storage.put("reglas.json", r#"{"documents": []}"#).await;

        let source = FileSource::new(storage, "mock").with_collections("centros", "reglas");
        assert_eq!(source.fetch_centers().await.unwrap().len(), 1);
        assert!(source.fetch_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_invalid_files_are_store_errors() {
        let storage = MockStorage::default();
        storage.put("centers.json", "{not json").await;
        let source = FileSource::new(storage, "mock");

        let err = source.fetch_centers().await.unwrap_err();
        assert!(matches!(err, FinderError::StoreUnavailable { .. }));
        let err = source.fetch_rules().await.unwrap_err();
        assert!(matches!(err, FinderError::StoreUnavailable { .. }));
    }
}
