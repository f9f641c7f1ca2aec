use thiserror::Error;

/// Canonical result for core and the operators built on it.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Key sort configured before any key level exists.
    #[error("no key level registered; add a key before setting its sort")]
    NoKeyLevel,

    /// Dictionary-style lookup found no such field.
    #[error("field '{field}' not found in record")]
    MissingField { field: String },

    /// Attribute-style lookup found no such attribute.
    #[error("attribute '{attr}' not found on record")]
    MissingAttribute { attr: String },

    /// Error raised by a caller-supplied key function or rollup.
    #[error("callback failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Rollup error: {0}")]
    Rollup(String),

    #[error("Serialization error: {0}")]
    Serde(String),

    // Core does no I/O of its own except loading config documents.
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    /// Wrap an arbitrary callback error so it travels through `map`/`entries`
    /// untouched (recover it with `downcast_ref` on the source).
    pub fn callback<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Callback(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serde(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serde(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
