/// Convenience result type used across cutout.
pub type CutoutResult<T> = Result<T, CutoutError>;

/// Top-level error taxonomy used by editor, pipeline and relay APIs.
#[derive(thiserror::Error, Debug)]
pub enum CutoutError {
    /// Invalid user-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// An image could not be re-encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The mask layer could not be serialized for upload.
    #[error("mask export failed: {0}")]
    MaskExport(String),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, decoded lossily as text.
        body: String,
    },

    /// An operation needed a loaded source image and none was present.
    #[error("Upload or use the sample image first.")]
    NoSource,

    /// A request is already outstanding.
    #[error("a request is already in progress")]
    Busy,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CutoutError {
    /// Build a [`CutoutError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CutoutError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`CutoutError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CutoutError::MaskExport`] value.
    pub fn mask_export(msg: impl Into<String>) -> Self {
        Self::MaskExport(msg.into())
    }

    /// Build a [`CutoutError::Network`] value.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Build a [`CutoutError::Http`] value.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Build a [`CutoutError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True when the failure signals an oversized upload: HTTP 413, or a body that says
    /// "entity too large" in any casing.
    pub fn is_payload_too_large(&self) -> bool {
        match self {
            Self::Http { status, body } => {
                *status == 413 || body.to_ascii_lowercase().contains("entity too large")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
