/// Convenience result type used across trialkit.
pub type TrialkitResult<T> = Result<T, TrialkitError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TrialkitError {
    /// Invalid tree mutation or declaration (duplicate sibling name, scene added as a child,
    /// conflicting constraints, bad options).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A lookup by name or handle found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed action description, rejected when the action is built.
    #[error("animation error: {0}")]
    Animation(String),

    /// A layout pass could not be completed (dependency cycle).
    #[error("layout error: {0}")]
    Layout(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or host code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrialkitError {
    /// Build a [`TrialkitError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`TrialkitError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`TrialkitError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`TrialkitError::Layout`] value.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Build a [`TrialkitError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this is a [`TrialkitError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this is a [`TrialkitError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
