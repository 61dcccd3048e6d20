use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unknown {kind} '{value}'")]
    InvalidTagError { kind: &'static str, value: String },

    #[error("Malformed payload: {message}")]
    PayloadError { message: String },

    #[error("Not found: {message}")]
    NotFoundError { message: String },

    #[error("LLM endpoint returned {status}: {message}")]
    LlmError { status: u16, message: String },

    #[error("Could not interpret model response: {message}")]
    ModelResponseError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Input,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GradeError {
    pub fn validation(message: impl Into<String>) -> Self {
        GradeError::ValidationError {
            message: message.into(),
        }
    }

    pub fn payload(message: impl Into<String>) -> Self {
        GradeError::PayloadError {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GradeError::NotFoundError {
            message: message.into(),
        }
    }

    pub fn model_response(message: impl Into<String>) -> Self {
        GradeError::ModelResponseError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GradeError::HttpError(_) | GradeError::LlmError { .. } => ErrorCategory::Network,
            GradeError::IoError(_) | GradeError::CsvError(_) | GradeError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            GradeError::ConfigError { .. }
            | GradeError::InvalidConfigValueError { .. }
            | GradeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            GradeError::ValidationError { .. }
            | GradeError::InvalidTagError { .. }
            | GradeError::PayloadError { .. }
            | GradeError::NotFoundError { .. } => ErrorCategory::Input,
            GradeError::ModelResponseError { .. } => ErrorCategory::Model,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GradeError::NotFoundError { .. } => ErrorSeverity::Low,
            GradeError::HttpError(_)
            | GradeError::LlmError { .. }
            | GradeError::ModelResponseError { .. } => ErrorSeverity::Medium,
            GradeError::ValidationError { .. }
            | GradeError::InvalidTagError { .. }
            | GradeError::PayloadError { .. }
            | GradeError::CsvError(_)
            | GradeError::SerializationError(_) => ErrorSeverity::High,
            GradeError::IoError(_)
            | GradeError::ConfigError { .. }
            | GradeError::InvalidConfigValueError { .. }
            | GradeError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the command-line tools. 2 means a retry may succeed.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    /// 是否值得重試
    pub fn is_retryable(&self) -> bool {
        match self {
            GradeError::HttpError(_) => true,
            GradeError::LlmError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            GradeError::HttpError(_) => {
                "Check network connectivity and the [llm] base_url setting".to_string()
            }
            GradeError::LlmError { status: 401, .. } => {
                "Check that OPENAI_API_KEY (or [llm] api_key) is valid".to_string()
            }
            GradeError::LlmError { status: 404, .. } => {
                "Check the [llm] model name and base_url path".to_string()
            }
            GradeError::LlmError { .. } => "Retry later or lower batch concurrency".to_string(),
            GradeError::ModelResponseError { .. } => {
                "Retry grading or lower the [llm] temperature".to_string()
            }
            GradeError::IoError(_) => "Check file paths and permissions".to_string(),
            GradeError::CsvError(_) => {
                "Make sure the CSV has headers question_id,student_id,answer".to_string()
            }
            GradeError::SerializationError(_) | GradeError::PayloadError { .. } => {
                "Check the JSON payload structure".to_string()
            }
            GradeError::ConfigError { .. }
            | GradeError::InvalidConfigValueError { .. }
            | GradeError::MissingConfigError { .. } => {
                "Review the TOML configuration file".to_string()
            }
            GradeError::InvalidTagError { kind, .. } => {
                format!("Use a known {} name (see --help)", kind)
            }
            GradeError::ValidationError { .. } => "Fix the input values and retry".to_string(),
            GradeError::NotFoundError { .. } => "Check the requested id".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the grading model: {}", self),
            ErrorCategory::Storage => format!("Could not read or write data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Invalid input: {}", self),
            ErrorCategory::Model => format!("The grading model misbehaved: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, GradeError>;
