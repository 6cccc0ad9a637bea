//! Fault taxonomy of the resolution pipeline.
//!
//! Empty results are never errors: they come back as empty vectors. Only
//! transport and shape problems are faults, and both stop at the operation
//! boundary.

pub use provider_interface::ExtractError;

/// The upstream could not be reached or answered badly.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not read body from {url}: {reason}")]
    Body { url: String, reason: String },
}

impl FetchError {
    pub fn request(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Request { url: url.into(), reason: reason.to_string() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Fault {
    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error(transparent)]
    ShapeMismatch(#[from] ExtractError),

    #[error("no provider named `{0}`")]
    UnknownProvider(String),
}

impl Fault {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::Transport(_) => "transport",
            Fault::ShapeMismatch(_) => "shape",
            Fault::UnknownProvider(_) => "provider",
        }
    }
}
