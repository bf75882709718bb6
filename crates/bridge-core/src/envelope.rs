use crate::{value_kind, Decode, DecodeError, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Opaque token correlating a response with its request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts the string form, or a number rendered as its decimal text.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(value) => Some(Self(value.clone())),
            Value::Number(number) => Some(Self(number.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub facade: String,
    pub method: String,
    pub args: Vec<Value>,
    pub request_id: RequestId,
}

impl RequestEnvelope {
    pub fn new(
        facade: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        request_id: impl Into<RequestId>,
    ) -> Self {
        Self {
            facade: facade.into(),
            method: method.into(),
            args,
            request_id: request_id.into(),
        }
    }

    /// Recovers only the correlation token from a document that may be otherwise malformed.
    pub fn peek_request_id(value: &Value) -> Option<RequestId> {
        value.get("requestId").and_then(RequestId::from_value)
    }
}

impl Decode for RequestEnvelope {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        let doc = Document::new(value)?;
        let request_id = match doc.get("requestId") {
            Some(raw) => RequestId::from_value(raw).ok_or_else(|| {
                DecodeError::new(doc.child_path("requestId"), "string or number", value_kind(raw))
            })?,
            None => {
                return Err(DecodeError::new(
                    doc.child_path("requestId"),
                    "string or number",
                    "nothing",
                ))
            }
        };

        Ok(Self {
            facade: doc.require_str("facade")?.to_string(),
            method: doc.require_str("method")?.to_string(),
            args: doc.require_array("args")?.to_vec(),
            request_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "result")]
    Success(Value),
    #[serde(rename = "error")]
    Failure(ErrorPayload),
}

/// Wire form is `{requestId, result}` or `{requestId, error: {kind, message}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub request_id: RequestId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ResponseEnvelope {
    pub fn success(request_id: RequestId, result: Value) -> Self {
        Self {
            request_id,
            outcome: Outcome::Success(result),
        }
    }

    pub fn failure(
        request_id: RequestId,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            outcome: Outcome::Failure(ErrorPayload {
                kind: kind.into(),
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorPayload> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestEnvelope, RequestId, ResponseEnvelope};
    use crate::Decode;
    use serde_json::json;

    #[test]
    fn response_wire_shape() {
        let ok = ResponseEnvelope::success(RequestId::from("r1"), json!(true));
        assert_eq!(
            serde_json::to_value(&ok).expect("serialized"),
            json!({ "requestId": "r1", "result": true })
        );

        let err = ResponseEnvelope::failure(RequestId::from("r2"), "UnknownMethodError", "nope");
        assert_eq!(
            serde_json::to_value(&err).expect("serialized"),
            json!({ "requestId": "r2", "error": { "kind": "UnknownMethodError", "message": "nope" } })
        );
    }

    #[test]
    fn response_parses_from_wire() {
        let parsed: ResponseEnvelope =
            serde_json::from_value(json!({ "requestId": "r3", "result": null })).expect("parsed");
        assert_eq!(parsed.result(), Some(&json!(null)));

        let parsed: ResponseEnvelope = serde_json::from_value(
            json!({ "requestId": "r4", "error": { "kind": "X", "message": "m" } }),
        )
        .expect("parsed");
        assert_eq!(parsed.error().map(|e| e.kind.as_str()), Some("X"));
    }

    #[test]
    fn decodes_request_with_numeric_id() {
        let envelope = RequestEnvelope::decode(&json!({
            "facade": "MobileSystemFacade",
            "method": "openLink",
            "args": ["https://example.com"],
            "requestId": 42
        }))
        .expect("decoded");
        assert_eq!(envelope.request_id.as_str(), "42");
        assert_eq!(envelope.args, vec![json!("https://example.com")]);
    }

    #[test]
    fn decode_rejects_missing_args() {
        let err = RequestEnvelope::decode(&json!({
            "facade": "MobileSystemFacade",
            "method": "openLink",
            "requestId": "r1"
        }))
        .expect_err("missing args");
        assert_eq!(err.path, "$.args");
    }
}
