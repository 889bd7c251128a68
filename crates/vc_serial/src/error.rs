use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Error

/// Result alias used by every fallible serialization operation.
pub type SerialResult<T> = Result<T, SerialError>;

/// A failure that ends the current (de)serialization session.
///
/// Data-shape mismatches are not errors: they are logged through the
/// session's [`DebugContext`](crate::context::DebugContext) and a default is
/// substituted instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerialError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Abort(#[from] AbortError),

    #[error("i/o failure of the underlying stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde implementation failed: {0}")]
    Serde(String),
}

impl SerialError {
    /// Returns `true` if this is the abort signal.
    #[inline]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }
}

/// Structural misuse of the node stack or an unsalvageable stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("tried to pop node with name {expected:?} but current node's name is {actual:?}")]
    NodeNameMismatch {
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("tried to pop a node when the node stack is empty")]
    EmptyNodeStack,

    #[error("tried to pop an array when the current node is not an array")]
    NotInArray,

    #[error("tried to pop a node while an array is still open")]
    ArrayNotClosed,

    #[error("stream ended with {0} unclosed node(s)")]
    Unbalanced(usize),

    #[error("invalid binary entry tag {0:#04x}")]
    InvalidTag(u8),

    #[error("malformed stream: {0}")]
    Malformed(String),
}

/// The abort signal: the session cannot continue on this platform or for this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AbortError {
    #[error(
        "no compiled serializer exists for type `{type_path}`{generics} and weak fallback is \
         not allowed; derive `Serial` for it or enable `allow_weak_fallback`"
    )]
    MissingCompiledSupport { type_path: String, generics: String },

    #[error(
        "no compiled formatter exists for type `{type_path}`{generics} and weak fallback is \
         not allowed"
    )]
    MissingCompiledFormatter { type_path: String, generics: String },

    #[error("type `{0}` cannot be instantiated: it provides no default constructor")]
    NotConstructible(String),
}
