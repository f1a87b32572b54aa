use super::{LoreDocument, LoreError, LoreSource};
use crate::services::metrics;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

/// Process-wide lore cache.
///
/// The document is loaded on first use and never invalidated. A failed load
/// leaves the store empty, so the next request tries again. Concurrent first
/// requests wait on the same load.
pub struct LoreStore {
    source: LoreSource,
    client: Client,
    document: OnceCell<Arc<LoreDocument>>,
}

impl LoreStore {
    pub fn new(source: LoreSource, client: Client) -> Self {
        Self {
            source,
            client,
            document: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &LoreSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.document.initialized()
    }

    /// Return the cached document, loading it if this is the first call.
    pub async fn get(&self) -> Result<Arc<LoreDocument>, LoreError> {
        self.document
            .get_or_try_init(|| self.load())
            .await
            .map(Arc::clone)
    }

    async fn load(&self) -> Result<Arc<LoreDocument>, LoreError> {
        let start = Instant::now();
        let kind = self.source.kind();

        match self.source.load(&self.client).await {
            Ok(document) => {
                metrics::record_lore_load(kind, "success");
                tracing::info!(
                    source = kind,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Lore knowledge base loaded"
                );
                Ok(Arc::new(document))
            }
            Err(e) => {
                metrics::record_lore_load(kind, "error");
                tracing::error!(source = kind, error = %e, "Lore knowledge base failed to load");
                Err(e)
            }
        }
    }
}
