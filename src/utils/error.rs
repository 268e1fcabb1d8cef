use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortageError {
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Unknown commune code: {code}")]
    UnknownCommuneCode { code: String },

    #[error("Reference data '{source_id}' unavailable: {reason}")]
    ReferenceDataUnavailable { source_id: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Reference,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl PortageError {
    pub fn invalid_parameter(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidParameter { .. } | Self::UnknownCommuneCode { .. } => ErrorCategory::Input,
            Self::ReferenceDataUnavailable { .. } => ErrorCategory::Reference,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Reference => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Short message safe to show to an end user. Never includes raw
    /// reference-dataset content or underlying library error text.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidParameter { field, reason } => {
                format!("Invalid value for {}: {}", field, reason)
            }
            Self::UnknownCommuneCode { .. } => {
                "The commune code is not in the reference database".to_string()
            }
            Self::ReferenceDataUnavailable { .. } => {
                "The commune code could not be verified right now".to_string()
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "The simulator configuration is invalid".to_string()
            }
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                "An internal error occurred while processing the request".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "Check the daily rate, days worked and percentage rates",
            Self::UnknownCommuneCode { .. } => "Check the INSEE code of the commune",
            Self::ReferenceDataUnavailable { .. } => {
                "Check that the reference dataset path in the configuration exists and is readable"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file and try again"
            }
            Self::CsvError(_) => "Check that the CSV file is well formed",
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Report this error with the input that triggered it",
        }
    }
}

pub type Result<T> = std::result::Result<T, PortageError>;
