//! Error types for the protocol layer.
//!
//! Each crate in Tokenward defines its own error enum. A `ProtocolError`
//! always means a record could not be turned into bytes or back, never a
//! signing or caching problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a record failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing a record failed.
    ///
    /// Common causes: a store entry written by an older version with a
    /// different shape, or a truncated value.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The bytes parsed but the record violates a data-model rule.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
