use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::core::AppError;

/// Header carrying the authenticated account id, set by the upstream auth gateway
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Authenticated account holder making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| CurrentUser(id.to_string()))
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()));

        ready(user_id)
    }
}
