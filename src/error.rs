// region:    --- Imports
use crate::bidding::evaluator::BidRejection;
use crate::lifecycle::TransitionError;
use crate::listing::ListingError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

// endregion: --- Imports

// region:    --- Auction Error
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error(transparent)]
    Validation(#[from] ListingError),
    #[error(transparent)]
    Rejected(#[from] BidRejection),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("auction {0} not found")]
    NotFound(i64),
    #[error("access denied")]
    Unauthorized,
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<sqlx::Error> for AuctionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<JsonRejection> for AuctionError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AuctionError {
    fn from(rejection: QueryRejection) -> Self {
        Self::MalformedRequest(rejection.body_text())
    }
}

impl From<serde_json::Error> for AuctionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl AuctionError {
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::Validation(e) => e.code(),
            AuctionError::Rejected(e) => e.code(),
            AuctionError::Transition(_) => "INVALID_TRANSITION",
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::Unauthorized => "UNAUTHORIZED",
            AuctionError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AuctionError::Store(_) => "STORE_UNAVAILABLE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::Validation(_) | AuctionError::MalformedRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AuctionError::Rejected(_) | AuctionError::Transition(_) => StatusCode::CONFLICT,
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::Unauthorized => StatusCode::FORBIDDEN,
            AuctionError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuctionError::Store(detail) => {
                error!("{:<12} --> store failure: {}", "Response", detail);
                "temporary failure, please try again".to_string()
            }
            other => {
                warn!("{:<12} --> request refused: {}", "Response", other);
                other.to_string()
            }
        };
        (
            self.status_code(),
            Json(serde_json::json!({
                "error": message,
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
// endregion: --- Auction Error
