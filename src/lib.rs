pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::adapters::{FileSource, HttpSource, StaticSource};
pub use crate::config::{FinderSettings, LocalStorage, TomlConfig};
pub use crate::core::{engine::RecommendationEngine, recommender::Recommender};
pub use crate::domain::model::{Center, GeoPoint, Query, Recommendation, Rule};
pub use crate::utils::error::{FinderError, Result};
