use thiserror::Error;

/// Errors from the market-data service boundary.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Transport-level failure (timeout, connection reset, bad status).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response arrived but could not be parsed into the expected shape.
    #[error("malformed response from {endpoint}: {detail}")]
    Malformed { endpoint: &'static str, detail: String },

    /// Response parsed but a field failed its plausibility bounds.
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    /// The service answered but had no data for the request.
    #[error("no data for {0}")]
    Unavailable(String),
}

impl MarketDataError {
    #[must_use]
    pub fn malformed(endpoint: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint,
            detail: detail.into(),
        }
    }
}
