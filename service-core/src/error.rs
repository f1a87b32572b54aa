use thiserror::Error;

/// Errors raised while bootstrapping a service: loading configuration,
/// building clients, binding listeners.
///
/// Request-level failures are modelled by each service's own error type and
/// mapped to HTTP responses there.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn config(message: impl std::fmt::Display) -> Self {
        AppError::ConfigError(anyhow::anyhow!("{}", message))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}
