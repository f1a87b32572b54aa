//! Lore knowledge base: the world-building document handed to the model as
//! background context.
//!
//! A document is loaded once from its [`LoreSource`] and kept by the
//! [`LoreStore`] for the lifetime of the process.

mod source;
mod store;

pub use source::LoreSource;
pub use store::LoreStore;

use serde::Deserialize;
use std::path::PathBuf;

/// Error type for lore loading.
#[derive(Debug, thiserror::Error)]
pub enum LoreError {
    #[error("Failed to fetch lore from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Lore fetch from {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to read lore file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lore document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Inline lore text is empty")]
    Empty,
}

/// A loaded lore document.
#[derive(Debug, Clone, PartialEq)]
pub enum LoreDocument {
    /// Arbitrary JSON, passed to the model verbatim.
    Structured(serde_json::Value),
    /// JSON shaped as `{"sections": [...]}`, rendered as a readable digest.
    Sections(Vec<LoreSection>),
    /// Free text, passed to the model verbatim.
    Text(String),
}

/// One section of a sectioned document. A section with any other key leaves
/// the whole document [`LoreDocument::Structured`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoreSection {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub entries: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionedDocument {
    sections: Vec<LoreSection>,
}

/// Lore flattened into the single text block embedded in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLore {
    /// Short label shown in the prompt heading, e.g. `JSON FORMAT`.
    pub format: &'static str,
    pub body: String,
}

impl LoreDocument {
    /// Classify a parsed JSON document by shape.
    pub fn from_json(value: serde_json::Value) -> Self {
        match SectionedDocument::deserialize(&value) {
            Ok(doc) if !doc.sections.is_empty() => LoreDocument::Sections(doc.sections),
            _ => LoreDocument::Structured(value),
        }
    }

    pub fn render(&self) -> Result<RenderedLore, LoreError> {
        let rendered = match self {
            LoreDocument::Structured(value) => RenderedLore {
                format: "JSON FORMAT",
                body: serde_json::to_string_pretty(value)?,
            },
            LoreDocument::Sections(sections) => RenderedLore {
                format: "SECTIONED DIGEST",
                body: render_sections(sections),
            },
            LoreDocument::Text(text) => RenderedLore {
                format: "TEXT FORMAT",
                body: text.trim().to_string(),
            },
        };
        Ok(rendered)
    }
}

fn render_sections(sections: &[LoreSection]) -> String {
    let blocks: Vec<String> = sections
        .iter()
        .map(|section| {
            let mut block = format!("## {}", section.title.trim().to_uppercase());
            if let Some(content) = section.content.as_deref().map(str::trim) {
                if !content.is_empty() {
                    block.push('\n');
                    block.push_str(content);
                }
            }
            for entry in &section.entries {
                block.push_str("\n- ");
                block.push_str(entry.trim());
            }
            block
        })
        .collect();

    blocks.join("\n\n")
}
