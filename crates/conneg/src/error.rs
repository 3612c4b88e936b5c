use std::io;
use thiserror::Error;

/// Boxed error returned by content suppliers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised while rendering a negotiated response.
///
/// Negotiation itself never fails with an error: an unacceptable request is reported
/// as an absent [`Match`](crate::Match) instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("content supplier error: {source}")]
    Supplier { source: BoxError },

    #[error("encode error: {reason}")]
    Encode { reason: String },
}

impl RenderError {
    pub fn supplier<E: Into<BoxError>>(e: E) -> Self {
        Self::Supplier { source: e.into() }
    }

    pub fn encode<S: ToString>(str: S) -> Self {
        Self::Encode { reason: str.to_string() }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() { Self::Io { source: e.into() } } else { Self::encode(e) }
    }
}

impl From<csv::Error> for RenderError {
    fn from(e: csv::Error) -> Self {
        let reason = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(source) => Self::Io { source },
            _ => Self::Encode { reason },
        }
    }
}
