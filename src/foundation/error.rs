/// Result alias used across the crate.
pub type ScanResult<T> = Result<T, ScanError>;

/// Error taxonomy for scene building, rendering, encoding and delivery.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Caller supplied an invalid value (dimensions, empty request, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// The source image could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A drawing surface or scratch buffer could not be acquired.
    #[error("surface error: {0}")]
    Surface(String),

    /// An encoder failed or produced no output.
    #[error("encode error: {0}")]
    Encode(String),

    /// Handing artifacts to the share/download target failed.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// The settings store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, usually IO with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    /// Build a [`ScanError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScanError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ScanError::Surface`].
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Build a [`ScanError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ScanError::Delivery`].
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Build a [`ScanError::Storage`].
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build a [`ScanError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
