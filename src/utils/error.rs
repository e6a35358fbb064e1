use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Malformed record #{index} in '{collection}': {reason}")]
    RecordMalformed {
        collection: String,
        index: usize,
        reason: String,
    },

    #[error("Record store '{source_name}' unavailable: {message}")]
    StoreUnavailable { source_name: String, message: String },

    #[error("Invalid query value for '{field}' ({value}): {reason}")]
    InvalidQuery {
        field: String,
        value: String,
        reason: String,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Store,
    Query,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FinderError {
    pub fn store_unavailable(source_name: &str, message: impl Into<String>) -> Self {
        FinderError::StoreUnavailable {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_query(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        FinderError::InvalidQuery {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FinderError::RecordMalformed { .. } | FinderError::SerializationError(_) => {
                ErrorCategory::Data
            }
            FinderError::StoreUnavailable { .. } | FinderError::ApiError(_) => {
                ErrorCategory::Store
            }
            FinderError::InvalidQuery { .. } => ErrorCategory::Query,
            FinderError::ConfigValidationError { .. }
            | FinderError::InvalidConfigValueError { .. }
            | FinderError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FinderError::IoError(_) | FinderError::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // a single bad record never aborts a load
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Query => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Store => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FinderError::RecordMalformed { collection, .. } => {
                format!("Some entries in '{}' could not be read and were skipped", collection)
            }
            FinderError::StoreUnavailable { source_name, .. } => format!(
                "Recycling center data could not be loaded from '{}'",
                source_name
            ),
            FinderError::InvalidQuery { field, value, .. } => {
                format!("'{}' is not a valid {}", value, field)
            }
            FinderError::ApiError(_) => "The data service could not be reached".to_string(),
            FinderError::ConfigValidationError { field, .. }
            | FinderError::InvalidConfigValueError { field, .. }
            | FinderError::MissingConfigError { field } => {
                format!("Configuration problem with '{}'", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Data => "Check the offending documents in the record store",
            ErrorCategory::Store => {
                "Verify the data directory or endpoint is reachable and try again"
            }
            ErrorCategory::Query => {
                "Latitude must be within -90..90 and longitude within -180..180"
            }
            ErrorCategory::Configuration => "Review the configuration file and CLI flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
