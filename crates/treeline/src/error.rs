//! Error types for the tree model and view.
//!
//! Every failure here is local and recoverable: a rejected operation leaves
//! the model exactly as it was and fires no notification.

use thiserror::Error;

/// Errors returned by model operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The item handle is stale or was never attached to this model.
    #[error("item is not attached to this model")]
    InvalidItem,

    /// An index was outside the valid range.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A range was empty, reversed, or ran past the end.
    #[error("invalid range {first}..={last} (count {count})")]
    InvalidRange {
        first: usize,
        last: usize,
        count: usize,
    },

    /// The model does not support the requested capability.
    #[error("model does not support writing")]
    NotWritable,

    /// The operation would make an item its own ancestor.
    #[error("cannot move an item under itself or its own descendant")]
    CycleDetected,

    /// Memory for a new node could not be reserved.
    #[error("allocation failed while inserting an item")]
    AllocationFailed,
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors returned by view operations.
#[derive(Error, Debug)]
pub enum ViewError {
    /// A forwarded model operation failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The host refused a drop, or the dropped payload could not be applied.
    #[error("drop rejected")]
    DropRejected,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

/// Result type for view operations.
pub type ViewResult<T> = Result<T, ViewError>;
