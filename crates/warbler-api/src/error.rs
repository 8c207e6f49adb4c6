use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

use warbler_types::api::{Flash, FlashCategory};

/// A flash raised while building an error response. `load_current_user`
/// moves it into the flash cookie.
#[derive(Debug, Clone)]
pub struct PendingFlash(pub Flash);

/// Handler failures that short-circuit to a fixed response.
///
/// Validation failures, conflicts and bad credentials are not here: those
/// re-render their form and are ordinary handler outcomes.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access unauthorized.")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                let mut resp = Redirect::to("/").into_response();
                resp.extensions_mut().insert(PendingFlash(Flash {
                    category: FlashCategory::Danger,
                    message: self.to_string(),
                }));
                resp
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            ApiError::Internal(e) => {
                error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
