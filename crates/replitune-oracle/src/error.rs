use thiserror::Error;

/// Result type local to replitune-oracle.
pub type Result<T> = std::result::Result<T, OracleError>;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("cost query failed: {0}")]
    Query(String),

    #[error("oracle call timed out after {0} ms")]
    Timeout(u64),

    #[error("advisor failed: {0}")]
    Advisor(String),

    #[error("unknown query {0} on this oracle")]
    UnknownQuery(String),
}
