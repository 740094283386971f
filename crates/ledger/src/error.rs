use thiserror::Error;

/// Errors from CSV ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// IO error opening or writing a ledger file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row was present but one of its fields could not be parsed.
    #[error("malformed ledger row: {0}")]
    Malformed(String),
}

/// Errors from snapshot persistence operations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO error reading/writing the snapshot file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
