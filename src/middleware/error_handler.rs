use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    web, Error, HttpRequest,
};

use crate::core::AppError;

/// Render malformed JSON bodies with the same error envelope as handler errors
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected JSON payload");
    AppError::validation(format!("Invalid request body: {}", err)).into()
}

/// Render malformed query strings with the same error envelope as handler errors
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected query string");
    AppError::validation(format!("Invalid query parameters: {}", err)).into()
}

/// Extractor configs wired with the handlers above
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}
