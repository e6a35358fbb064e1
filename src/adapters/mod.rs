// Adapters layer: concrete record sources for the document store.

pub mod file;
pub mod http;

pub use file::FileSource;
pub use http::HttpSource;

use crate::domain::ports::RecordSource;
use crate::utils::error::{FinderError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Accepts a bare array, `{"documents": [...]}`, or an id -> document map.
pub fn parse_collection(source_name: &str, collection: &str, payload: Value) -> Result<Vec<Value>> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("documents") {
            Some(Value::Array(items)) if obj.is_empty() => Ok(items),
            Some(documents) => {
                obj.insert("documents".to_string(), documents);
                documents_by_id(source_name, collection, obj)
            }
            None => documents_by_id(source_name, collection, obj),
        },
        other => Err(FinderError::store_unavailable(
            source_name,
            format!(
                "collection '{}' is not a list of documents (found {})",
                collection,
                if other.is_null() { "null" } else { "a scalar" }
            ),
        )),
    }
}

fn documents_by_id(
    source_name: &str,
    collection: &str,
    obj: serde_json::Map<String, Value>,
) -> Result<Vec<Value>> {
    if obj.values().all(Value::is_object) {
        Ok(obj.into_iter().map(|(_, doc)| doc).collect())
    } else {
        Err(FinderError::store_unavailable(
            source_name,
            format!("collection '{}' is an object but not a document map", collection),
        ))
    }
}

/// Collections held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    centers: Vec<Value>,
    rules: Vec<Value>,
}

impl StaticSource {
    pub fn new(centers: Vec<Value>, rules: Vec<Value>) -> Self {
        Self { centers, rules }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn name(&self) -> String {
        "memory".to_string()
    }

    async fn fetch_centers(&self) -> Result<Vec<Value>> {
        Ok(self.centers.clone())
    }

    async fn fetch_rules(&self) -> Result<Vec<Value>> {
        Ok(self.rules.clone())
    }
}
