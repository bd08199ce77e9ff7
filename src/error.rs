use std::sync::Arc;

use thiserror::Error;

/// Result type of every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by rollout operations.
///
/// Validation errors are raised at the point of misuse. Reads of unknown features are not errors
/// (they evaluate to "not enabled"), writes to unknown features are.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Feature names must be non-empty.
    #[error("feature name should be a non-empty string")]
    InvalidName,

    /// Percentage is not a number or is outside `0..=100`.
    #[error("percentage should be a number between 0 and 100, got {0:?}")]
    InvalidPercentage(String),

    /// The operation references a feature the backend does not know about.
    #[error("feature <{0}> does not exist")]
    UnknownFeature(String),

    /// The backend does not implement the operation.
    #[error("{0} is not supported by this backend")]
    NotSupported(&'static str),

    /// A guard could not resolve the subject of the call.
    #[error("unable to resolve the identifier of the current subject")]
    MissingIdentifier,

    /// A guard rejected the call because the feature is not enabled for its subject.
    #[error("feature <{0}> is not enabled for the caller")]
    FeatureDisabled(String),

    /// The feature reads an attribute the subject does not expose.
    #[error("subject has no attribute {attribute:?} required by feature <{feature}>")]
    MissingAttribute {
        /// Name of the feature.
        feature: String,
        /// Attribute the feature reads.
        attribute: String,
    },

    /// The feature's extractor could not produce an identifier for the subject.
    #[error("extractor of feature <{0}> returned no identifier")]
    UnresolvedIdentifier(String),

    /// A rule pattern failed to compile.
    #[error("invalid rule pattern")]
    InvalidRule(#[source] regex::Error),

    /// A stored record could not be decoded.
    #[error("corrupt record at {key:?}: {record:?}")]
    CorruptRecord {
        /// Key the record was read from.
        key: String,
        /// The raw record.
        record: String,
    },

    /// The value contains a record delimiter and cannot be persisted.
    #[error("{0:?} contains a reserved delimiter ('|' or ',')")]
    Unencodable(String),

    /// The feature name would collide with whitelist set keys in Redis.
    #[error("feature name {0:?} uses the reserved \"users:\" prefix")]
    ReservedName(String),

    /// The Redis client failed.
    // redis::RedisError is not clonable, so we're wrapping it in an Arc.
    #[error(transparent)]
    Redis(Arc<redis::RedisError>),
}

impl From<redis::RedisError> for Error {
    fn from(value: redis::RedisError) -> Self {
        Self::Redis(Arc::new(value))
    }
}

impl From<regex::Error> for Error {
    fn from(value: regex::Error) -> Self {
        Self::InvalidRule(value)
    }
}
