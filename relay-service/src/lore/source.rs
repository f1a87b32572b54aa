use super::{LoreDocument, LoreError};
use reqwest::Client;
use service_core::observability::PropagateTrace;
use std::path::PathBuf;

/// Where the lore document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoreSource {
    /// JSON document fetched over HTTP.
    Remote { url: String },
    /// JSON document on local disk.
    JsonFile(PathBuf),
    /// Plain text document on local disk.
    TextFile(PathBuf),
    /// Text supplied directly through configuration.
    Inline(String),
}

impl LoreSource {
    /// Metric label for this source.
    pub fn kind(&self) -> &'static str {
        match self {
            LoreSource::Remote { .. } => "remote",
            LoreSource::JsonFile(_) => "json",
            LoreSource::TextFile(_) => "text",
            LoreSource::Inline(_) => "inline",
        }
    }

    pub async fn load(&self, client: &Client) -> Result<LoreDocument, LoreError> {
        match self {
            LoreSource::Remote { url } => fetch_remote(client, url).await,
            LoreSource::JsonFile(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| LoreError::Read {
                    path: path.clone(),
                    source,
                })?;
                Ok(LoreDocument::from_json(serde_json::from_slice(&bytes)?))
            }
            LoreSource::TextFile(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| LoreError::Read {
                        path: path.clone(),
                        source,
                    })?;
                Ok(LoreDocument::Text(text))
            }
            LoreSource::Inline(text) => {
                if text.trim().is_empty() {
                    return Err(LoreError::Empty);
                }
                Ok(LoreDocument::Text(text.clone()))
            }
        }
    }
}

async fn fetch_remote(client: &Client, url: &str) -> Result<LoreDocument, LoreError> {
    tracing::debug!(url = %url, "Fetching lore document");

    let fetch_error = |source: reqwest::Error| LoreError::Fetch {
        url: url.to_string(),
        source,
    };

    let response = client
        .get(url)
        .with_trace_context()
        .send()
        .await
        .map_err(fetch_error)?;

    if !response.status().is_success() {
        return Err(LoreError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let bytes = response.bytes().await.map_err(fetch_error)?;
    Ok(LoreDocument::from_json(serde_json::from_slice(&bytes)?))
}
