use bridge_core::{DecodeError, TypeMismatch, TypeParseError};
use std::path::PathBuf;
use thiserror::Error;

/// A schema set that cannot be loaded. Loading is all-or-nothing.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("{source_label}: invalid JSON: {error}")]
    Json {
        source_label: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("{source_label}: {error}")]
    Decode {
        source_label: String,
        #[source]
        error: DecodeError,
    },
    #[error("{source_label}: unknown document type `{kind}`")]
    UnknownDocumentType { source_label: String, kind: String },
    #[error("{source_label}: duplicate key at {path}")]
    DuplicateKey { source_label: String, path: String },
    #[error("`{name}` is defined in both {first} and {second}")]
    DuplicateDefinition {
        name: String,
        first: String,
        second: String,
    },
    #[error("facade `{facade}` declares method `{method}` more than once")]
    DuplicateMethod { facade: String, method: String },
    #[error("`{owner}` declares parameter `{param}` more than once")]
    DuplicateParameter { owner: String, param: String },
    #[error("struct `{structure}` declares field `{field}` more than once")]
    DuplicateField { structure: String, field: String },
    #[error("`{owner}` parameter #{index} must be a single-key mapping")]
    MalformedParameter { owner: String, index: usize },
    #[error("facade `{facade}` has no {side}")]
    EmptyRoleSet { facade: String, side: &'static str },
    #[error("facade `{facade}` lists an invalid role `{role}`")]
    InvalidRole { facade: String, role: String },
    #[error("`{owner}`: `{first}` and `{second}` map to the same Rust name")]
    IdentifierCollision {
        owner: String,
        first: String,
        second: String,
    },
    #[error("`{name}` is not a valid identifier")]
    InvalidIdentifier { name: String },
    #[error("`{owner}`: {error}")]
    InvalidType {
        owner: String,
        #[source]
        error: TypeParseError,
    },
    #[error("`{owner}` references unknown type `{name}`")]
    UnresolvedType { owner: String, name: String },
    #[error("`{owner}` uses `{ty}` as a map key; only string and number keys are allowed")]
    InvalidMapKey { owner: String, ty: String },
    #[error("`{owner}` uses void outside a return type")]
    MisplacedVoid { owner: String },
}

/// Call arguments that do not match a method signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("{facade}.{method} takes {expected} argument(s), got {found}")]
    Count {
        facade: String,
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("{facade}.{method} argument `{param}`: {mismatch}")]
    Type {
        facade: String,
        method: String,
        param: String,
        mismatch: TypeMismatch,
    },
}
