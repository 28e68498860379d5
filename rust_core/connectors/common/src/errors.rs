use std::time::Duration;

use thiserror::Error;

/// Failure of a single connector call. Always scoped to one exchange; the
/// aggregation layer recovers by leaving that exchange out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("pair {0} is not listed")]
    UnsupportedPair(String),

    #[error("{0} is not supported by this connector")]
    Unsupported(&'static str),

    #[error("result tagged {found:?} returned by connector {expected:?}")]
    SourceMismatch { expected: String, found: String },

    #[error("other: {0}")]
    Other(String),
}

impl ConnectorError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// A request that cannot be built at all, e.g. a malformed trading pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} {value:?} must be 1-16 ASCII letters or digits")]
    InvalidAsset { field: &'static str, value: String },

    #[error("base and quote are both {0}")]
    SameAsset(String),

    #[error("malformed pair {0:?}, expected BASE/QUOTE")]
    MalformedPair(String),
}
