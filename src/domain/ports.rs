use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The two reads the recommender needs from the document store.
///
/// Implementations report any failure to read a collection as
/// `FinderError::StoreUnavailable`; individual documents are returned
/// untouched and validated later.
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn name(&self) -> String;
    async fn fetch_centers(&self) -> Result<Vec<serde_json::Value>>;
    async fn fetch_rules(&self) -> Result<Vec<serde_json::Value>>;
}

#[async_trait]
impl<T: RecordSource + ?Sized> RecordSource for Box<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    async fn fetch_centers(&self) -> Result<Vec<serde_json::Value>> {
        (**self).fetch_centers().await
    }

    async fn fetch_rules(&self) -> Result<Vec<serde_json::Value>> {
        (**self).fetch_rules().await
    }
}
