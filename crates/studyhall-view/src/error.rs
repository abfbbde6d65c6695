use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status and its error message.
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Base URL cannot carry a path: {0}")]
    BadBaseUrl(String),

    #[error("No group named {0:?}")]
    UnknownGroup(String),

    /// Summarizer called again before the cooldown elapsed.
    #[error("Please wait {0} seconds before summarizing again")]
    CoolingDown(u64),
}
