use std::num::ParseIntError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

/// Failures the campaign handlers do not recover from locally.
#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("no authenticated principal in session")]
    Unauthenticated,

    #[error("invalid campaign id: {0:?}")]
    BadCampaignId(String),

    #[error("goal is not a valid integer: {0}")]
    InvalidGoal(#[from] ParseIntError),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Store failures, including `DbError::NotFound` lookup misses.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl CampaignError {
    pub fn status(&self) -> StatusCode {
        match self {
            CampaignError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CampaignError::BadCampaignId(_) => StatusCode::BAD_REQUEST,
            CampaignError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            CampaignError::InvalidGoal(_)
            | CampaignError::Join(_)
            | CampaignError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CampaignError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:#}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, status.canonical_reason().unwrap_or("Error")).into_response()
    }
}
