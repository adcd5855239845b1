//! Error types for the lease allocator.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants.

/// Errors that can occur while operating the lease allocator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (config file).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error (report export).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid allocator configuration.
    ///
    /// Returned by [`Config::validate`](crate::Config::validate) when the
    /// configuration contains invalid values (e.g., pool_start > pool_end).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The address pool is exhausted.
    ///
    /// Every address in the configured pool is leased. Consider expanding
    /// the pool or reducing the lease duration.
    #[error("No available addresses in pool")]
    PoolExhausted,

    /// The client already holds an active lease.
    ///
    /// A client keeps its address until it releases it or the lease expires;
    /// a second allocation for the same client is rejected without consuming
    /// an address.
    #[error("Client {0} already holds a lease")]
    AlreadyLeased(String),

    /// No lease exists for the specified client.
    ///
    /// Returned when releasing or querying a client that holds no lease.
    /// Releasing an already-released client is recoverable, not a fault.
    #[error("Client {0} holds no lease")]
    NoSuchLease(String),
}

/// A specialized Result type for lease operations.
pub type Result<T> = std::result::Result<T, Error>;
