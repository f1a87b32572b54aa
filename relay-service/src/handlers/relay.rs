//! The relay endpoint: browser message in, Omni Console reply out.

use crate::error::RelayError;
use crate::prompt::{OperatorProfile, PromptAssembly};
use crate::services::metrics;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[validate(length(min = 1, message = "message cannot be empty"))]
    pub message: String,
    pub operator_name: Option<String>,
    pub operator_faction: Option<String>,
    pub operator_region: Option<String>,
}

impl RelayRequest {
    pub fn parse(body: &[u8]) -> Result<Self, RelayError> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| RelayError::MalformedRequest(format!("invalid JSON body: {}", e)))?;
        request
            .validate()
            .map_err(|e| RelayError::MalformedRequest(e.to_string()))?;
        Ok(request)
    }

    pub fn operator_profile(&self) -> Option<OperatorProfile> {
        OperatorProfile::from_fields(
            self.operator_name.as_deref(),
            self.operator_faction.as_deref(),
            self.operator_region.as_deref(),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayReply {
    pub reply: String,
}

/// `OPTIONS /`
pub async fn preflight() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "message": "Preflight check passed." })),
    )
}

/// Any method other than `POST` or `OPTIONS` on `/`.
pub async fn reject_method() -> RelayError {
    RelayError::MethodNotAllowed
}

/// `POST /`
///
/// Body extraction failures (including bodies over the size limit) are
/// reported through [`RelayError`] like every other failure.
#[tracing::instrument(skip(state, body), fields(body_len))]
pub async fn relay(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RelayReply>, RelayError> {
    let result = match body {
        Ok(body) => {
            tracing::Span::current().record("body_len", body.len());
            process(&state, &body).await
        }
        Err(rejection) => Err(RelayError::MalformedRequest(format!(
            "unreadable request body: {}",
            rejection.body_text()
        ))),
    };

    metrics::record_relay_outcome(match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    });

    result.map(Json)
}

async fn process(state: &AppState, body: &[u8]) -> Result<RelayReply, RelayError> {
    let request = RelayRequest::parse(body)?;
    let operator = request.operator_profile();

    let lore = state.lore.get().await?;
    let rendered = lore.render()?;

    let prompt = PromptAssembly::build(&rendered, operator.as_ref(), &request.message);

    tracing::debug!(
        lore_format = rendered.format,
        has_operator = operator.is_some(),
        message_len = request.message.len(),
        "Prompt assembled"
    );

    let provider = &state.text_provider;
    let start = Instant::now();
    let result = provider.generate(prompt.turns()).await;
    metrics::record_upstream_latency(provider.model(), start.elapsed().as_secs_f64());

    let reply = result.inspect_err(|e| metrics::record_upstream_error(e.kind()))?;

    tracing::info!(
        model = %provider.model(),
        reply_len = reply.len(),
        "Relay reply received"
    );

    Ok(RelayReply { reply })
}
