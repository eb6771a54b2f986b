use tributary_core::address::AddressError;

use crate::transport::TransportError;

/// Fatal conditions of a resolution run. The first of these aborts the whole
/// run; there is no retry and no partial-tree recovery.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("fetch for '{id}' failed with status {status}: {reason}")]
    FetchFailed {
        id: String,
        status: u16,
        reason: String,
    },

    #[error("transport error while fetching '{id}': {source}")]
    Transport {
        id: String,
        #[source]
        source: TransportError,
    },

    #[error("response for '{id}' is not valid JSON: {source}")]
    InvalidBody {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A declared address does not match the payload shape; points at a
    /// configuration/schema mismatch, not a transient condition.
    #[error("while resolving '{id}': {source}")]
    Address {
        id: String,
        #[source]
        source: AddressError,
    },

    #[error("extraction for '{id}': {source}")]
    Extraction {
        id: String,
        #[source]
        source: ExtractError,
    },

    #[error("extraction for '{id}' feeds '{child}', which is not a declared dependent template")]
    UnknownChild { id: String, child: String },

    #[error("path template '{id}' has no binding for parameter '{name}'")]
    UnboundParameter { id: String, name: String },

    #[error("parameter '{name}' for '{id}' is not a scalar value")]
    NonScalarParameter { id: String, name: String },

    #[error("invalid request url for '{id}': {source}")]
    InvalidUrl {
        id: String,
        #[source]
        source: url::ParseError,
    },

    #[error("resolution task panicked: {0}")]
    TaskJoin(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("value at {address} is not a list of records")]
    NotAList { address: String },

    #[error("record {index} at {address} is not an object")]
    NotARecord { address: String, index: usize },

    #[error("record {index} at {address} has no field '{key}'")]
    MissingRecordKey {
        address: String,
        index: usize,
        key: String,
    },

    #[error("field '{key}' of record {index} at {address} cannot parametrize a path (not a scalar)")]
    NonScalar {
        address: String,
        index: usize,
        key: String,
    },
}
