//! Translation errors.
//!
//! Every variant aborts the current `translate` call; no partial document
//! is ever returned.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Two different nodes were registered under the same id in one run.
    #[error("duplicate schema id '{id}'")]
    DuplicateId { id: String },

    /// A link pointed at an id that was never registered in this run.
    #[error("link target '{id}' was never registered")]
    UnresolvedLink { id: String },

    /// A `when`/`switch`/conditional block has an incompatible shape.
    #[error("malformed conditional: {reason}")]
    MalformedConditional { reason: String },

    /// An object rule named a key that is not one of the object's children.
    #[error("'{rule}' rule references unknown key '{key}'")]
    UnknownCombinatorKey { rule: &'static str, key: String },

    /// The target format tag is not one this engine can emit.
    #[error("unsupported target format '{0}'")]
    UnsupportedTarget(String),

    /// The authoring surface named a node kind the engine has no mapping for.
    #[error("unsupported node kind '{kind}' at {path}")]
    UnsupportedNodeKind { kind: String, path: String },

    /// The authoring document could not be deserialized.
    #[error("authoring error at JSON path {path} → {reason}")]
    Authoring { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedConditional { reason: reason.into() }
    }
}
