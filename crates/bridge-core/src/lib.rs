mod check;
mod decode;
mod envelope;
mod error;
mod model;
mod types;

pub use check::{check_value, check_value_at, NamedType, TypeResolver};
pub use decode::{value_kind, Decode, Document};
pub use envelope::{ErrorPayload, Outcome, RequestEnvelope, RequestId, ResponseEnvelope};
pub use error::{DecodeError, TypeMismatch, TypeParseError};
pub use model::*;
pub use types::{Primitive, TypeDescriptor};
