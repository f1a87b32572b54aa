use crate::lore::LoreSource;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default lore document published alongside the relay.
pub const DEFAULT_LORE_URL: &str =
    "https://raw.githubusercontent.com/Quoy38/omni-gem-relay/refs/heads/main/netlify/functions/lore.json";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub lore: LoreSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub api_base: String,
    /// Model used for chat replies (e.g., gemini-2.5-flash)
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct LoreSettings {
    pub source: LoreSource,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(RelayConfig {
            common: common_config,
            gemini: GeminiSettings {
                api_key: get_env("GEMINI_API_KEY", None, is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), is_prod)?,
                model: get_env("GEMINI_MODEL", Some("gemini-2.5-flash"), is_prod)?,
                timeout_secs: parse_timeout_secs(&get_env(
                    "GEMINI_TIMEOUT_SECS",
                    Some(&DEFAULT_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?)?,
                temperature: optional_env("GEMINI_TEMPERATURE")?,
                max_output_tokens: optional_env("GEMINI_MAX_OUTPUT_TOKENS")?,
            },
            lore: LoreSettings {
                source: lore_source_from_env(is_prod)?,
            },
        })
    }
}

/// Resolve `LORE_SOURCE` and the variable that goes with it.
fn lore_source_from_env(is_prod: bool) -> Result<LoreSource, AppError> {
    let kind = get_env("LORE_SOURCE", Some("remote"), is_prod)?;

    match kind.as_str() {
        "remote" => Ok(LoreSource::Remote {
            url: get_env("LORE_URL", Some(DEFAULT_LORE_URL), is_prod)?,
        }),
        "json" => Ok(LoreSource::JsonFile(PathBuf::from(get_env(
            "LORE_PATH",
            Some("lore/lore.json"),
            is_prod,
        )?))),
        "text" => Ok(LoreSource::TextFile(PathBuf::from(get_env(
            "LORE_PATH",
            Some("lore/lore.txt"),
            is_prod,
        )?))),
        "inline" => Ok(LoreSource::Inline(get_env("LORE_INLINE_TEXT", None, is_prod)?)),
        other => Err(AppError::config(format!(
            "LORE_SOURCE must be one of remote, json, text, inline (got '{}')",
            other
        ))),
    }
}

fn parse_timeout_secs(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::config("GEMINI_TIMEOUT_SECS must be greater than zero")),
        Ok(secs) => Ok(secs),
        Err(e) => Err(AppError::config(format!("GEMINI_TIMEOUT_SECS is invalid: {}", e))),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::config(format!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::config(format!("{} is required but not set", key)))
            }
        }
    }
}

fn optional_env<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::config(format!("{} is invalid: {}", key, e))),
        _ => Ok(None),
    }
}
