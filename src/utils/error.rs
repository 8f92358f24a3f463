use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandicapError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API responded with status {status} for {endpoint}")]
    ApiStatus { status: u16, endpoint: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Differential is not a number: '{value}'")]
    InvalidDifferential { value: String },

    #[error("Invalid score: {message}")]
    InvalidScore { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, HandicapError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl HandicapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HandicapError::ApiError(_) | HandicapError::ApiStatus { .. } => ErrorCategory::Network,
            HandicapError::CsvError(_)
            | HandicapError::SerializationError(_)
            | HandicapError::InvalidDifferential { .. }
            | HandicapError::InvalidScore { .. }
            | HandicapError::ProcessingError { .. }
            | HandicapError::ValidationError { .. } => ErrorCategory::Data,
            HandicapError::ConfigError { .. }
            | HandicapError::ConfigValidationError { .. }
            | HandicapError::InvalidConfigValueError { .. }
            | HandicapError::MissingConfigError { .. } => ErrorCategory::Configuration,
            HandicapError::IoError(_) | HandicapError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路問題通常重試即可
            HandicapError::ApiError(_) | HandicapError::ApiStatus { .. } => ErrorSeverity::Medium,
            HandicapError::IoError(_) | HandicapError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HandicapError::ApiError(_) => "Check network connectivity and the source endpoint, then retry",
            HandicapError::ApiStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check the bearer token or authorization headers for the scorecard API"
            }
            HandicapError::ApiStatus { .. } => "Verify the endpoint URL and that the scorecard service is running",
            HandicapError::CsvError(_) => {
                "Make sure the CSV export has a header row with player_id, play_date and differential columns"
            }
            HandicapError::SerializationError(_) => {
                "Make sure the JSON source is an array of rounds or an object with a 'rounds' array"
            }
            HandicapError::InvalidDifferential { .. } => {
                "Fix or remove rounds whose differential is not a number"
            }
            HandicapError::InvalidScore { .. } => {
                "Check the gross, course_rating and slope_rating columns; slope must be positive"
            }
            HandicapError::ConfigError { .. }
            | HandicapError::ConfigValidationError { .. }
            | HandicapError::InvalidConfigValueError { .. }
            | HandicapError::MissingConfigError { .. } => {
                "Review the command line flags or the TOML configuration file"
            }
            HandicapError::IoError(_) => "Check that the paths exist and are writable",
            HandicapError::ZipError(_) => "Check free disk space and the bundle filename",
            HandicapError::ProcessingError { .. } | HandicapError::ValidationError { .. } => {
                "Inspect the source data; run with --verbose for details"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch rounds: {}", self),
            ErrorCategory::Data => format!("Round data could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}
