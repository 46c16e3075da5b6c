//! Closed error taxonomy for the gallery

use reqwest::StatusCode;
use thiserror::Error;

/// Every failure the data layer can report to its consumers.
///
/// Transport-specific errors never leave the HTTP client; they are mapped
/// into one of these kinds first. All of them are recoverable by the user.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A request URL could not be built or parsed
    #[error("invalid URL")]
    InvalidUrl,
    /// No access key configured; no request was sent
    #[error("missing access key")]
    MissingAccessKey,
    /// Transport failure or unexpected HTTP status
    #[error("network error")]
    Network,
    /// HTTP 401 or 403
    #[error("unauthorized")]
    Unauthorized,
    /// HTTP 429
    #[error("rate limited")]
    RateLimited,
    /// Response body could not be decoded
    #[error("decoding error")]
    Decoding,
}

impl ErrorKind {
    /// Map an HTTP status to an error kind. Returns `None` for 2xx.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }
        let kind = match status.as_u16() {
            401 | 403 => ErrorKind::Unauthorized,
            429 => ErrorKind::RateLimited,
            _ => ErrorKind::Network,
        };
        log::debug!("HTTP status {} mapped to {:?}", status, kind);
        Some(kind)
    }

    /// Message shown to the user when a load fails
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::MissingAccessKey => {
                "UNSPLASH_ACCESS_KEY is not set. Add an access key to the configuration."
            }
            ErrorKind::InvalidUrl => "The request address is invalid.",
            ErrorKind::Network => "Could not load photos. Check your connection and try again.",
            ErrorKind::Unauthorized => "The access key was rejected by the server.",
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.",
            ErrorKind::Decoding => "The server returned data that could not be read.",
        }
    }

    /// Whether simply retrying later can succeed without user action
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Network | ErrorKind::RateLimited)
    }
}

/// Result alias for gallery data operations
pub type Result<T> = std::result::Result<T, ErrorKind>;
