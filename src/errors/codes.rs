use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Error codes for structured API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed path, query string or body
    #[serde(rename = "INVALID_REQUEST")]
    InvalidRequest,

    /// User ID or email not found
    #[serde(rename = "USER_NOT_FOUND")]
    UserNotFound,

    /// Database connection or query error
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,

    /// Internal server error
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "INVALID_REQUEST"),
            Self::UserNotFound => write!(f, "USER_NOT_FOUND"),
            Self::DatabaseError => write!(f, "DATABASE_ERROR"),
            Self::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

impl ErrorCode {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::UserNotFound => 404,
            Self::DatabaseError => 503,
            Self::InternalError => 500,
        }
    }
}
