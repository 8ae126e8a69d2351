//! Common error types used throughout glimpse.
//!
//! The variants mirror the engine's failure taxonomy: a reference that cannot
//! be turned into any URL, a definitive not-found across all candidates,
//! transient network trouble, decoder rejection, and exhausted candidates.
//!
//! Variants carry plain `String` payloads and the enum is `Clone` so a single
//! fetch outcome can be handed to every coalesced waiter.

/// Common error type for glimpse.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The raw path could not be normalized into any candidate URL.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Every candidate responded with a definitive "does not exist" status.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A network-level failure (timeout, connection reset, 5xx).
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The chosen strategy's decoder rejected the content.
    #[error("Unsupported content: {0}")]
    Unsupported(String),

    /// All candidates exhausted without a definitive not-found.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Create a new InvalidReference error.
    pub fn invalid_reference<S: Into<String>>(msg: S) -> Self {
        Self::InvalidReference(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Transient error.
    pub fn transient<S: Into<String>>(msg: S) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a new Unsupported error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a new Unavailable error.
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Io error from a message.
    pub fn io<S: Into<String>>(msg: S) -> Self {
        Self::Io(msg.into())
    }

    /// Whether this error is terminal for a resolution (no further retry).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Transient(_))
    }
}

// The enum must stay Clone for waiter broadcast, so io::Error is flattened
// to its message instead of being wrapped with #[from].
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
