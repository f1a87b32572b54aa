use crate::lore::LoreError;
use crate::services::ProviderError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single relay request.
///
/// Each stage returns its own variant; the mapping to the wire format happens
/// once, in [`IntoResponse`].
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Initialization Error: Unable to retrieve Omni Console Knowledge Base.")]
    LoreInitialization(#[source] LoreError),

    #[error(transparent)]
    Upstream(#[from] ProviderError),
}

impl RelayError {
    /// Metric label for this error.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::MalformedRequest(_) => "malformed_request",
            RelayError::LoreInitialization(_) => "lore_error",
            RelayError::Upstream(_) => "upstream_error",
        }
    }
}

impl From<LoreError> for RelayError {
    fn from(err: LoreError) -> Self {
        RelayError::LoreInitialization(err)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn relay_failure(detail: impl std::fmt::Display) -> Self {
        Self {
            error: format!(
                "[SYSTEM_ERROR:: Relay connection failure (Serverless Function Error). {}] Unable to contact Prime Conduit.",
                detail
            ),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        if let RelayError::MethodNotAllowed = self {
            tracing::debug!("Rejected request method");
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"))],
            )
                .into_response();
        }

        match &self {
            RelayError::LoreInitialization(source) => {
                tracing::error!(error = %self, cause = %source, "Fatal error in relay handler");
            }
            _ => tracing::error!(error = %self, "Fatal error in relay handler"),
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::relay_failure(&self)),
        )
            .into_response()
    }
}
