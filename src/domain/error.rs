use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    /// `received` counts the bytes read before the upload was cut off, so it
    /// is a lower bound on the upload size.
    #[error("Upload too large: exceeds the {limit} byte limit ({received} bytes read)")]
    TooLarge { limit: usize, received: usize },
    #[error("No duplicates available to download")]
    NotAvailable,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl AppError {
    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError(_)
                | AppError::ParseError(_)
                | AppError::TooLarge { .. }
                | AppError::NotAvailable
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
