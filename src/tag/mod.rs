//! Tag client layer
//!
//! The tag service hosts named, typed, timestamped values. Every backend
//! implements the [`TagStore`] trait; writers, selections and subscriptions
//! are built on top of it and work with any backend.

pub(crate) mod connection;
pub(crate) mod http;
#[cfg(test)]
pub(crate) mod memory;
pub(crate) mod selection;
pub(crate) mod subscription;
pub(crate) mod types;
pub(crate) mod writer;

use thiserror::Error;

pub(crate) use connection::{Connection, ConnectionError, ConnectionSettings, Locality};
pub(crate) use http::HttpTagStore;
pub(crate) use selection::Selection;
pub(crate) use subscription::Subscription;
pub(crate) use types::{DataType, ReadResult, TagData, TagValue, TagWrite, format_timestamp};
pub(crate) use writer::BufferedWriter;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Tag service returned HTTP {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Tag \"{path}\" does not exist")]
    NotFound { path: String },

    #[error("Tag \"{path}\" is {actual}, not {expected}")]
    TypeMismatch {
        path: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("Invalid {data_type} value \"{raw}\"")]
    InvalidValue { data_type: DataType, raw: String },
}

/// Tag store backend
pub(crate) trait TagStore: Send + Sync {
    /// Look up a tag, creating it first when `create` is set.
    ///
    /// Creating an existing tag of the same type is a no-op; a different
    /// type is reported as [`StoreError::TypeMismatch`].
    fn open(&self, path: &str, data_type: DataType, create: bool) -> Result<TagData, StoreError>;

    /// Resolve glob-style path patterns to the tags that currently exist
    fn query(&self, patterns: &[String]) -> Result<Vec<TagData>, StoreError>;

    /// Current value of a tag, `None` when it has never been written
    fn read(&self, path: &str) -> Result<Option<ReadResult>, StoreError>;

    /// Apply a batch of value updates in order
    fn write_batch(&self, writes: &[TagWrite]) -> Result<(), StoreError>;
}
