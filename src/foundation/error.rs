/// Convenience result type used across collagekit.
pub type CollageResult<T> = Result<T, CollageError>;

/// Top-level error taxonomy used by parsing, layout and rendering APIs.
#[derive(thiserror::Error, Debug)]
pub enum CollageError {
    /// Malformed or absent structured input.
    #[error("parse error: {0}")]
    Parse(String),

    /// The document declares a format version other than the supported one.
    #[error("unsupported collage version: {0}")]
    UnsupportedVersion(u32),

    /// The document theme is in the configured rejection list.
    #[error("unsupported collage theme: {0}")]
    UnsupportedTheme(String),

    /// A required attribute or element is absent.
    #[error("missing attribute: {0}")]
    MissingAttribute(String),

    /// An attribute is present but cannot be interpreted.
    #[error("malformed attribute: {0}")]
    MalformedAttribute(String),

    /// A color string is not exactly eight hex digits.
    #[error("malformed color: {0}")]
    MalformedColor(String),

    /// A caller-supplied argument is out of range (e.g. render width).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Canvas allocation or rasterization failure.
    #[error("rendering backend error: {0}")]
    RenderingBackend(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollageError {
    /// Build a [`CollageError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`CollageError::MissingAttribute`] value.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingAttribute(name.into())
    }

    /// Build a [`CollageError::MalformedAttribute`] value.
    pub fn malformed(name: impl Into<String>) -> Self {
        Self::MalformedAttribute(name.into())
    }

    /// Build a [`CollageError::InvalidArgument`] value.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build a [`CollageError::RenderingBackend`] value.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::RenderingBackend(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
