// error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every domain failure the API can report. Storage errors are wrapped and
/// surface as an opaque 500; nothing from sqlx crosses the boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("poll not found")]
    PollNotFound,
    #[error("this poll is no longer active")]
    PollInactive,
    #[error("this poll has expired")]
    PollExpired,
    #[error("choice does not belong to this poll")]
    ChoiceMismatch,
    #[error("you have already voted in this poll")]
    DuplicateVote,
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("only the poll owner may do that")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("internal error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::PollNotFound => "poll_not_found",
            ApiError::PollInactive => "poll_inactive",
            ApiError::PollExpired => "poll_expired",
            ApiError::ChoiceMismatch => "choice_mismatch",
            ApiError::DuplicateVote => "duplicate_vote",
            ApiError::AuthenticationRequired => "authentication_required",
            ApiError::Forbidden => "forbidden",
            ApiError::Validation(_) => "validation",
            ApiError::Database(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PollNotFound | ApiError::PollInactive => StatusCode::NOT_FOUND,
            ApiError::PollExpired
            | ApiError::ChoiceMismatch
            | ApiError::DuplicateVote
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Database(e) = &self {
            tracing::error!("storage error: {e}");
        }
        let body = json!({
            "error": { "code": self.code(), "message": self.to_string() }
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_polls_read_as_not_found() {
        assert_eq!(ApiError::PollNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::PollInactive.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn vote_rejections_are_bad_requests() {
        assert_eq!(ApiError::PollExpired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::DuplicateVote.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ChoiceMismatch.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ownership_and_auth_map_to_403_and_401() {
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::AuthenticationRequired.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn storage_errors_stay_opaque() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal error");
    }
}
