use crate::core::recommender::{sort_from, Recommender};
use crate::core::rules::RulePolicy;
use crate::core::RecordSource;
use crate::domain::model::{GeoPoint, Query, Recommendation};
use crate::utils::error::{FinderError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Loads both collections once and answers queries from that snapshot
/// until `reload` is called.
pub struct RecommendationEngine<R: RecordSource> {
    source: R,
    policy: RulePolicy,
    default_location: Option<GeoPoint>,
    snapshot: RwLock<Option<Arc<Recommender>>>,
}

impl<R: RecordSource> RecommendationEngine<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            policy: RulePolicy::default(),
            default_location: None,
            snapshot: RwLock::new(None),
        }
    }

    pub fn with_policy(mut self, policy: RulePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reference point used when a query carries no location.
    pub fn with_default_location(mut self, location: Option<GeoPoint>) -> Self {
        self.default_location = location;
        self
    }

    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// The memoized recommender, loading it on first use.
    pub async fn recommender(&self) -> Result<Arc<Recommender>> {
        if let Some(current) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(current));
        }

        let mut guard = self.snapshot.write().await;
        // another caller may have loaded while we waited for the lock
        if let Some(current) = guard.as_ref() {
            return Ok(Arc::clone(current));
        }

        let loaded = Arc::new(self.load().await?);
        *guard = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Re-reads both collections. On failure the previous snapshot stays.
    pub async fn reload(&self) -> Result<Arc<Recommender>> {
        let loaded = Arc::new(self.load().await?);
        *self.snapshot.write().await = Some(Arc::clone(&loaded));
        tracing::info!("🔄 Reloaded records from {}", self.source.name());
        Ok(loaded)
    }

    pub async fn all_materials(&self) -> Result<Vec<String>> {
        Ok(self.recommender().await?.all_materials())
    }

    /// filter, then sort when a reference point is known, then inference.
    pub async fn recommend(&self, query: &Query) -> Result<Recommendation> {
        let recommender = self.recommender().await?;

        let mut centers = recommender.filter_by_materials(&query.materials);
        tracing::debug!(
            "{} of {} centers accept {:?}",
            centers.len(),
            recommender.centers().len(),
            query.materials
        );

        let reference = query.location.or(self.default_location);
        if let Some(origin) = reference {
            centers = sort_from(origin, &centers);
        }

        let conclusions = recommender.apply_rules(&centers);

        Ok(Recommendation {
            centers,
            conclusions,
            reference,
        })
    }

    async fn load(&self) -> Result<Recommender> {
        let name = self.source.name();
        tracing::info!("📥 Loading centers and rules from {}", name);

        let centers = self
            .source
            .fetch_centers()
            .await
            .map_err(|e| as_store_error(&name, e))?;
        let rules = self
            .source
            .fetch_rules()
            .await
            .map_err(|e| as_store_error(&name, e))?;

        Ok(Recommender::load_with_policy(centers, rules, self.policy))
    }
}

fn as_store_error(source_name: &str, error: FinderError) -> FinderError {
    match error {
        FinderError::StoreUnavailable { .. } => error,
        other => FinderError::store_unavailable(source_name, other.to_string()),
    }
}
