use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse fault classes used to decide how far an error may propagate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Malformed caller input, rejected before reaching the batch layer
    Validation,
    /// Referenced user or settings row missing
    NotFound,
    /// Store, network or mail collaborator unreachable
    TransientIo,
    /// Malformed output from an external generator
    Data,
    /// Anything else (configuration, programming errors)
    Internal,
}

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Validation errors for business rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Collaborator unreachable or an operation exceeded its time budget
    #[error("Transient I/O error: {0}")]
    Transient(String),

    /// Collaborator answered with something we could not interpret
    #[error("Data error: {0}")]
    Data(String),

    /// Email delivery errors
    #[error("Mail error: {0}")]
    Mail(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Data(_) => StatusCode::BAD_GATEWAY,
            AppError::Mail(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        AppError::Transient(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        AppError::Data(msg.into())
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        AppError::Mail(msg.into())
    }

    /// Classify this error for propagation decisions
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            AppError::Validation(_) | AppError::Unauthorized(_) => FaultKind::Validation,
            AppError::NotFound(_) => FaultKind::NotFound,
            AppError::Database(_)
            | AppError::Transient(_)
            | AppError::Mail(_)
            | AppError::HttpClient(_) => FaultKind::TransientIo,
            AppError::Data(_) | AppError::Json(_) => FaultKind::Data,
            AppError::Configuration(_) => FaultKind::Internal,
        }
    }
}
