use crate::model::FavoriteKey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Error type shared by every component that talks to the backend.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Favorite change rejected: {0}")]
    Rejected(String),

    #[error("A favorite change for {0} is already in flight")]
    InFlight(FavoriteKey),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No element with id {0}")]
    UnknownElement(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Whether repeating the same action later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Http(_) | AppError::InFlight(_) => true,
            AppError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short message suitable for the status bar.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http(e) => format!("Network error: {}", e),
            AppError::Api { status, message } => {
                format!("Server error ({}): {}", status, message)
            }
            AppError::Decode { endpoint, .. } => {
                format!("Unexpected data from {}", endpoint)
            }
            AppError::Rejected(msg) => format!("Not saved: {}", msg),
            AppError::InFlight(key) => format!("Still saving {}", key),
            AppError::Url(e) => format!("Bad address: {}", e),
            AppError::Configuration(msg) => format!("Configuration error: {}", msg),
            AppError::UnknownElement(id) => format!("Nothing called {} on this page", id),
            AppError::Io(e) => format!("File system error: {}", e),
            AppError::Serialization(e) => format!("Data format error: {}", e),
        }
    }
}
