use bridge_core::{RequestId, Role};
use bridge_schema::ArgumentError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("unknown facade `{facade}`")]
    UnknownFacade { facade: String },
    #[error("unknown method `{facade}.{method}`")]
    UnknownMethod { facade: String, method: String },
    #[error("role `{role}` may not call facade `{facade}`")]
    RoleNotPermitted { facade: String, role: Role },
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The receiving side answered with an error envelope.
    #[error("{kind}: {message}")]
    Remote { kind: String, message: String },
    #[error("call {request_id} timed out")]
    Timeout { request_id: RequestId },
    #[error("call {request_id} was dropped before a response arrived")]
    Disconnected { request_id: RequestId },
    #[error("failed to decode result: {0}")]
    Decode(String),
}
