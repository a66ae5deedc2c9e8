use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(e) = err.find::<ApiError>() {
        e.clone()
    } else if let Some(e) = err.find::<reject::MissingHeader>() {
        ApiError::new(ApiErrorCode::InvalidToken, e.to_string())
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::InvalidInput, e.to_string())
    } else if let Some(e) = err.find::<reject::InvalidQuery>() {
        ApiError::new(ApiErrorCode::InvalidInput, e.to_string())
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "route not found")
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::MethodNotAllowed, "method not allowed")
    } else {
        ApiError::internal(format!("unhandled rejection: {err:?}"))
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::failure(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiErrorCode {
    InvalidInput,
    InvalidOperation,
    InvalidCredentials,
    InvalidToken,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    UsernameTaken,
    StoreUnavailable,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidInput | ApiErrorCode::InvalidOperation => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials | ApiErrorCode::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::Conflict | ApiErrorCode::UsernameTaken => StatusCode::CONFLICT,
            ApiErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Details stay in the log; the client only learns that something broke.
    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        warn!("Internal error: {}", error);
        ApiError::new(ApiErrorCode::InternalError, "internal error")
    }

    pub fn store_unavailable<E: std::fmt::Display>(error: E) -> Self {
        warn!("Store unavailable: {}", error);
        ApiError::new(ApiErrorCode::StoreUnavailable, "store unavailable, retry later")
    }

    /// Any failure to authenticate a bearer token reads as an invalid token,
    /// except store failures which stay retryable.
    pub fn unauthorized(error: AuthError) -> Self {
        match error {
            AuthError::Store(e) => ApiError::store_unavailable(e),
            AuthError::InternalError(e) => ApiError::internal(e),
            other => ApiError::new(ApiErrorCode::InvalidToken, other.to_string()),
        }
    }
}

impl reject::Reject for ApiError {}

impl From<RelationError> for ApiError {
    fn from(error: RelationError) -> Self {
        match error {
            RelationError::InvalidOperation(_) => {
                ApiError::new(ApiErrorCode::InvalidOperation, error.to_string())
            }
            RelationError::Conflict => ApiError::new(ApiErrorCode::Conflict, error.to_string()),
            RelationError::NotFound => ApiError::new(ApiErrorCode::NotFound, error.to_string()),
            RelationError::StoreUnavailable(e) => ApiError::store_unavailable(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => {
                ApiError::new(ApiErrorCode::InvalidCredentials, error.to_string())
            }
            AuthError::UserExists => ApiError::new(ApiErrorCode::UsernameTaken, "username already taken"),
            AuthError::UserNotFound => ApiError::new(ApiErrorCode::NotFound, error.to_string()),
            AuthError::TokenInvalid | AuthError::TokenExpired => {
                ApiError::new(ApiErrorCode::InvalidToken, error.to_string())
            }
            AuthError::InvalidInput(_) => ApiError::new(ApiErrorCode::InvalidInput, error.to_string()),
            AuthError::Store(e) => ApiError::store_unavailable(e),
            AuthError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(error: PostError) -> Self {
        match error {
            PostError::InvalidInput(_) => ApiError::new(ApiErrorCode::InvalidInput, error.to_string()),
            PostError::PostNotFound | PostError::CommentNotFound => {
                ApiError::new(ApiErrorCode::NotFound, error.to_string())
            }
            PostError::Forbidden => ApiError::new(
                ApiErrorCode::Forbidden,
                "you can only delete your own comments",
            ),
            PostError::Store(e) => ApiError::store_unavailable(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_errors_map_to_http_status() {
        let cases = [
            (RelationError::InvalidOperation("self".into()), StatusCode::BAD_REQUEST),
            (RelationError::Conflict, StatusCode::CONFLICT),
            (RelationError::NotFound, StatusCode::NOT_FOUND),
            (
                RelationError::StoreUnavailable("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).code.status(), status);
        }
    }

    #[test]
    fn store_details_are_not_leaked() {
        let error = ApiError::from(RelationError::StoreUnavailable("password=hunter2".into()));
        assert_eq!(error.code, ApiErrorCode::StoreUnavailable);
        assert!(!error.message.contains("hunter2"));
    }

    #[test]
    fn token_failures_are_unauthorized() {
        for error in [AuthError::TokenExpired, AuthError::TokenInvalid, AuthError::UserNotFound] {
            assert_eq!(ApiError::unauthorized(error).code, ApiErrorCode::InvalidToken);
        }
        assert_eq!(
            ApiError::unauthorized(AuthError::Store("down".into())).code,
            ApiErrorCode::StoreUnavailable
        );
    }

    #[test]
    fn post_errors_map_to_http_status() {
        assert_eq!(
            ApiError::from(PostError::Forbidden).code.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(PostError::CommentNotFound).code.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AuthError::UserExists).code.status(),
            StatusCode::CONFLICT
        );
    }
}
