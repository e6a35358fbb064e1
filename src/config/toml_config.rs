use crate::adapters::http::DEFAULT_TIMEOUT_SECONDS;
use crate::config::FinderSettings;
use crate::core::recommender::{CENTERS_COLLECTION, RULES_COLLECTION};
use crate::core::rules::RulePolicy;
use crate::domain::model::GeoPoint;
use crate::utils::error::{FinderError, Result};
use crate::utils::validation::{validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATA_DIR: &str = "./data";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub rules: RulePolicy,
    pub query: Option<QueryConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub r#type: SourceType,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub centers_collection: Option<String>,
    pub rules_collection: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_latitude: Option<f64>,
    pub default_longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FinderError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FinderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FinderError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn data_dir(&self) -> &str {
        self.source.path.as_deref().unwrap_or(DEFAULT_DATA_DIR)
    }

    pub fn centers_collection(&self) -> &str {
        self.source
            .centers_collection
            .as_deref()
            .unwrap_or(CENTERS_COLLECTION)
    }

    pub fn rules_collection(&self) -> &str {
        self.source
            .rules_collection
            .as_deref()
            .unwrap_or(RULES_COLLECTION)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    /// `None` unless both coordinates are configured.
    pub fn default_location(&self) -> Result<Option<GeoPoint>> {
        let Some(query) = &self.query else {
            return Ok(None);
        };
        match (query.default_latitude, query.default_longitude) {
            (Some(lat), Some(lon)) => GeoPoint::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            (Some(_), None) => Err(FinderError::MissingConfigError {
                field: "query.default_longitude".to_string(),
            }),
            (None, Some(_)) => Err(FinderError::MissingConfigError {
                field: "query.default_latitude".to_string(),
            }),
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref()?.level.as_deref()
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }

    /// Full check: the file-local sections plus the source it describes.
    pub fn validate_config(&self) -> Result<()> {
        self.validate_local()?;
        FinderSettings::from_toml(self)?.validate()
    }

    /// `[query]` and `[logging]` only; the source may still be completed by CLI flags.
    pub fn validate_local(&self) -> Result<()> {
        if let Some(query) = &self.query {
            if let Some(lat) = query.default_latitude {
                validate_range("query.default_latitude", lat, -90.0, 90.0)?;
            }
            if let Some(lon) = query.default_longitude {
                validate_range("query.default_longitude", lon, -180.0, 180.0)?;
            }
        }
        if let Some(logging) = &self.logging {
            if let Some(level) = &logging.level {
                check_choice("logging.level", level, LOG_LEVELS)?;
            }
            if let Some(format) = &logging.format {
                check_choice("logging.format", format, LOG_FORMATS)?;
            }
        }
        Ok(())
    }
}

fn check_choice(field: &str, value: &str, choices: &[&str]) -> Result<()> {
    if choices.iter().any(|c| c.eq_ignore_ascii_case(value)) {
        return Ok(());
    }
    Err(FinderError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: format!("Valid values: {}", choices.join(", ")),
    })
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
