use crate::HandlerError;
use bridge_core::{DecodeError, RequestId, Role};
use bridge_schema::ArgumentError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("unknown facade `{facade}`")]
    UnknownFacade { facade: String },
    #[error("role `{role}` is not a receiver of facade `{facade}`")]
    RoleNotPermitted { facade: String, role: Role },
    #[error("implementation of `{facade}` is missing: {}", .missing.join(", "))]
    IncompleteImplementation { facade: String, missing: Vec<String> },
    #[error("facade `{facade}` already has an implementation")]
    AlreadyRegistered { facade: String },
}

/// Reasons a request envelope is answered with an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown facade `{facade}`")]
    UnknownFacade { facade: String },
    #[error("facade `{facade}` has no registered implementation")]
    NoImplementation { facade: String },
    #[error("unknown method `{facade}.{method}`")]
    UnknownMethod { facade: String, method: String },
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    #[error("request id `{request_id}` is already in flight")]
    DuplicateRequest { request_id: RequestId },
    /// The implementation returned an error; its kind is passed through.
    #[error(transparent)]
    Handler(HandlerError),
    #[error("{message}")]
    HandlerExecution { message: String },
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(DecodeError),
}

impl DispatchError {
    /// Error kind carried in the response envelope.
    pub fn kind(&self) -> &str {
        match self {
            Self::Handler(err) => &err.kind,
            Self::UnknownFacade { .. } | Self::NoImplementation { .. } => "UnknownFacadeError",
            Self::UnknownMethod { .. } => "UnknownMethodError",
            Self::Arguments(ArgumentError::Count { .. }) => "ArgumentCountError",
            Self::Arguments(ArgumentError::Type { .. }) => "ArgumentTypeError",
            Self::DuplicateRequest { .. } => "DuplicateRequestError",
            Self::HandlerExecution { .. } => "HandlerExecutionError",
            Self::MalformedEnvelope(_) => "MalformedEnvelopeError",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Handler(err) => err.message.clone(),
            other => other.to_string(),
        }
    }
}
