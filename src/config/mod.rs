pub mod cli;
pub mod toml_config;

pub use cli::LocalStorage;
pub use toml_config::{SourceType, TomlConfig};

use crate::adapters::{FileSource, HttpSource};
use crate::core::engine::RecommendationEngine;
use crate::core::rules::RulePolicy;
use crate::core::RecordSource;
use crate::domain::model::GeoPoint;
#[cfg(feature = "cli")]
use crate::domain::model::Query;
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::error::FinderError;
use crate::utils::validation::{
    validate_collection_name, validate_path, validate_positive_number, validate_required_field,
    validate_url, Validate,
};
use std::time::Duration;

/// Effective settings after the config file and CLI flags are merged.
#[derive(Debug, Clone)]
pub struct FinderSettings {
    pub source_type: SourceType,
    pub data_dir: String,
    pub endpoint: Option<String>,
    pub centers_collection: String,
    pub rules_collection: String,
    pub timeout_seconds: u64,
    pub policy: RulePolicy,
    pub default_location: Option<GeoPoint>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl FinderSettings {
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        Ok(Self {
            source_type: config.source.r#type,
            data_dir: config.data_dir().to_string(),
            endpoint: config.source.endpoint.clone(),
            centers_collection: config.centers_collection().to_string(),
            rules_collection: config.rules_collection().to_string(),
            timeout_seconds: config.timeout_seconds(),
            policy: config.rules,
            default_location: config.default_location()?,
            log_level: config.log_level().map(str::to_string),
            json_logs: config.json_logs(),
        })
    }

    pub fn build_source(&self) -> Result<Box<dyn RecordSource>> {
        match self.source_type {
            SourceType::File => {
                let storage = LocalStorage::new(self.data_dir.clone());
                Ok(Box::new(
                    FileSource::new(storage, self.data_dir.clone())
                        .with_collections(&self.centers_collection, &self.rules_collection),
                ))
            }
            SourceType::Http => {
                let endpoint = validate_required_field("source.endpoint", &self.endpoint)?;
                let source =
                    HttpSource::with_timeout(endpoint, Duration::from_secs(self.timeout_seconds))?
                        .with_collections(&self.centers_collection, &self.rules_collection);
                Ok(Box::new(source))
            }
        }
    }

    pub fn build_engine(&self) -> Result<RecommendationEngine<Box<dyn RecordSource>>> {
        Ok(RecommendationEngine::new(self.build_source()?)
            .with_policy(self.policy)
            .with_default_location(self.default_location))
    }
}

impl Validate for FinderSettings {
    fn validate(&self) -> Result<()> {
        match self.source_type {
            SourceType::File => validate_path("source.path", &self.data_dir)?,
            SourceType::Http => {
                let endpoint = validate_required_field("source.endpoint", &self.endpoint)?;
                validate_url("source.endpoint", endpoint)?;
            }
        }
        validate_collection_name("source.centers_collection", &self.centers_collection)?;
        validate_collection_name("source.rules_collection", &self.rules_collection)?;
        validate_positive_number("source.timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use self::cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::*;
    use crate::app::OutputFormat;
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "recycle-finder")]
    #[command(about = "Find recycling centers that accept your materials")]
    pub struct CliConfig {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Directory holding <collection>.json files
        #[arg(long, conflicts_with = "endpoint")]
        pub data_dir: Option<String>,

        /// Base URL serving GET <endpoint>/<collection>
        #[arg(long)]
        pub endpoint: Option<String>,

        #[arg(long)]
        pub centers_collection: Option<String>,

        #[arg(long)]
        pub rules_collection: Option<String>,

        /// Materials the center must accept, comma separated
        #[arg(short, long, value_delimiter = ',')]
        pub materials: Vec<String>,

        #[arg(long, allow_hyphen_values = true)]
        pub lat: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        pub lon: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        pub format: OutputFormat,

        /// Write the result to this file instead of stdout
        #[arg(short, long)]
        pub output: Option<String>,

        /// Print every known material and exit
        #[arg(long)]
        pub list_materials: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl CliConfig {
        /// Config file first, then flags on top.
        pub fn settings(&self) -> Result<FinderSettings> {
            let file_config = match &self.config {
                Some(path) => {
                    let config = TomlConfig::from_file(path)?;
                    config.validate_local()?;
                    config
                }
                None => TomlConfig::default(),
            };

            let mut settings = FinderSettings::from_toml(&file_config)?;

            if let Some(dir) = &self.data_dir {
                settings.source_type = SourceType::File;
                settings.data_dir = dir.clone();
            }
            if let Some(endpoint) = &self.endpoint {
                settings.source_type = SourceType::Http;
                settings.endpoint = Some(endpoint.clone());
            }
            if let Some(centers) = &self.centers_collection {
                settings.centers_collection = centers.clone();
            }
            if let Some(rules) = &self.rules_collection {
                settings.rules_collection = rules.clone();
            }
            settings.json_logs |= self.json_logs;

            settings.validate()?;
            Ok(settings)
        }

        /// Coordinates are parsed here so a typo surfaces as `InvalidQuery`.
        pub fn query(&self) -> Result<Query> {
            let query = Query::new(self.materials.iter().cloned());
            match (&self.lat, &self.lon) {
                (Some(lat), Some(lon)) => Ok(query.near(GeoPoint::parse(lat, lon)?)),
                (None, None) => Ok(query),
                (Some(_), None) => Err(FinderError::invalid_query(
                    "longitude",
                    "",
                    "latitude and longitude must be given together",
                )),
                (None, Some(_)) => Err(FinderError::invalid_query(
                    "latitude",
                    "",
                    "latitude and longitude must be given together",
                )),
            }
        }
    }

}
