use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type `{input}` at offset {position}: {reason}")]
pub struct TypeParseError {
    pub input: String,
    pub position: usize,
    pub reason: String,
}

/// A field of an untyped document was missing or had the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: expected {expected}, found {found}")]
pub struct DecodeError {
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl DecodeError {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// A value did not conform to a [`crate::TypeDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub path: String,
    pub expected: String,
    pub found: String,
}
