use crate::{CallError, Transport};
use bridge_core::{Outcome, RequestEnvelope, RequestId, ResponseEnvelope, Role};
use bridge_schema::SchemaRegistry;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type Pending = Mutex<HashMap<RequestId, oneshot::Sender<ResponseEnvelope>>>;

/// Drops the pending entry if the call ends without a response (timeout,
/// send failure, or the caller giving up on the future).
struct PendingGuard<'a> {
    pending: &'a Pending,
    request_id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.request_id);
    }
}

/// Caller side of the bridge: turns facade calls into request envelopes and
/// resolves them with the correlated response.
pub struct FacadeClient {
    registry: Arc<SchemaRegistry>,
    role: Role,
    transport: Arc<dyn Transport>,
    pending: Pending,
    timeout: Option<Duration>,
}

impl FacadeClient {
    pub fn new(registry: Arc<SchemaRegistry>, role: Role, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            role,
            transport,
            pending: Mutex::new(HashMap::new()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Number of calls waiting for a response.
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn call(
        &self,
        facade: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, CallError> {
        let definition = self
            .registry
            .facade(facade)
            .ok_or_else(|| CallError::UnknownFacade {
                facade: facade.to_string(),
            })?;
        if !definition.can_send(&self.role) {
            return Err(CallError::RoleNotPermitted {
                facade: facade.to_string(),
                role: self.role.clone(),
            });
        }
        let method_definition =
            definition
                .method(method)
                .ok_or_else(|| CallError::UnknownMethod {
                    facade: facade.to_string(),
                    method: method.to_string(),
                })?;
        self.registry
            .check_arguments(definition, method_definition, &args)?;

        let request_id = RequestId::generate();
        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_id.clone(), sender);
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id: request_id.clone(),
        };

        tracing::debug!(%request_id, facade, method, "sending call");
        self.transport
            .send(RequestEnvelope::new(facade, method, args, request_id.clone()))
            .await?;

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, receiver)
                .await
                .map_err(|_| CallError::Timeout {
                    request_id: request_id.clone(),
                })?,
            None => receiver.await,
        }
        .map_err(|_| CallError::Disconnected {
            request_id: request_id.clone(),
        })?;

        match response.outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(CallError::Remote {
                kind: error.kind,
                message: error.message,
            }),
        }
    }

    pub async fn call_typed<T>(
        &self,
        facade: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, CallError>
    where
        T: DeserializeOwned,
    {
        let value = self.call(facade, method, args).await?;
        serde_json::from_value(value).map_err(|err| CallError::Decode(err.to_string()))
    }

    /// Handle bound to one facade this role may call.
    pub fn stub(self: &Arc<Self>, facade: &str) -> Result<FacadeStub, CallError> {
        let definition = self
            .registry
            .facade(facade)
            .ok_or_else(|| CallError::UnknownFacade {
                facade: facade.to_string(),
            })?;
        if !definition.can_send(&self.role) {
            return Err(CallError::RoleNotPermitted {
                facade: facade.to_string(),
                role: self.role.clone(),
            });
        }

        Ok(FacadeStub {
            client: self.clone(),
            facade: facade.to_string(),
        })
    }

    /// Completes the pending call with the same request id. Returns false for
    /// responses nobody is waiting for.
    pub fn handle_response(&self, response: ResponseEnvelope) -> bool {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&response.request_id);

        match sender {
            Some(sender) => sender.send(response).is_ok(),
            None => {
                tracing::warn!(request_id = %response.request_id, "response for unknown request");
                false
            }
        }
    }

    /// Feeds responses from `responses` into [`FacadeClient::handle_response`]
    /// until the channel closes.
    pub fn listen(
        self: &Arc<Self>,
        mut responses: mpsc::UnboundedReceiver<ResponseEnvelope>,
    ) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            while let Some(response) = responses.recv().await {
                client.handle_response(response);
            }
            tracing::debug!("response channel closed");
        })
    }
}

#[derive(Clone)]
pub struct FacadeStub {
    client: Arc<FacadeClient>,
    facade: String,
}

impl FacadeStub {
    pub fn facade(&self) -> &str {
        &self.facade
    }

    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, CallError> {
        self.client.call(&self.facade, method, args).await
    }

    pub async fn call_typed<T>(&self, method: &str, args: Vec<Value>) -> Result<T, CallError>
    where
        T: DeserializeOwned,
    {
        self.client.call_typed(&self.facade, method, args).await
    }
}
