use crate::{DispatchError, FacadeHandler, RegistrationError};
use bridge_core::{Decode, DecodeError, RequestEnvelope, RequestId, ResponseEnvelope, Role};
use bridge_schema::SchemaRegistry;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

type InFlight = Arc<Mutex<HashSet<RequestId>>>;

/// Releases a claimed request id when dropped, including on handler panic.
struct InFlightGuard {
    table: InFlight,
    request_id: RequestId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.request_id);
    }
}

/// Routes request envelopes addressed to the local role to registered handlers.
///
/// Share it behind an `Arc`: `dispatch` takes `&self` and any number of calls
/// may be in flight at once. Responses are correlated only by request id.
pub struct Dispatcher {
    registry: Arc<SchemaRegistry>,
    role: Role,
    handlers: RwLock<HashMap<String, Arc<dyn FacadeHandler>>>,
    in_flight: InFlight,
    permits: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SchemaRegistry>, role: Role) -> Self {
        Self {
            registry,
            role,
            handlers: RwLock::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            permits: None,
        }
    }

    /// Caps concurrently running handlers; further calls wait for a permit.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.permits = Some(Arc::new(Semaphore::new(max.max(1))));
        self
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Number of request ids currently claimed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn register_handler(
        &self,
        facade_name: &str,
        handler: Arc<dyn FacadeHandler>,
    ) -> Result<(), RegistrationError> {
        let facade =
            self.registry
                .facade(facade_name)
                .ok_or_else(|| RegistrationError::UnknownFacade {
                    facade: facade_name.to_string(),
                })?;

        if !facade.can_receive(&self.role) {
            return Err(RegistrationError::RoleNotPermitted {
                facade: facade_name.to_string(),
                role: self.role.clone(),
            });
        }

        let implemented = handler.implemented_methods();
        let missing: Vec<String> = facade
            .method_names()
            .filter(|name| !implemented.contains(*name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(RegistrationError::IncompleteImplementation {
                facade: facade_name.to_string(),
                missing,
            });
        }

        for extra in implemented.iter().filter(|name| facade.method(name).is_none()) {
            tracing::warn!(facade = facade_name, method = %extra, "handler implements undeclared method");
        }

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.contains_key(facade_name) {
            return Err(RegistrationError::AlreadyRegistered {
                facade: facade_name.to_string(),
            });
        }
        handlers.insert(facade_name.to_string(), handler);

        tracing::info!(facade = facade_name, role = %self.role, "registered facade handler");
        Ok(())
    }

    /// Handles one request. Every failure is reported in the returned envelope.
    pub async fn dispatch(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let request_id = envelope.request_id.clone();
        let facade = envelope.facade.clone();
        let method = envelope.method.clone();

        match self.run(envelope).await {
            Ok(result) => {
                tracing::debug!(%request_id, %facade, %method, "call completed");
                ResponseEnvelope::success(request_id, result)
            }
            Err(err) => {
                tracing::warn!(%request_id, %facade, %method, kind = err.kind(), "call failed: {err}");
                ResponseEnvelope::failure(request_id, err.kind(), err.message())
            }
        }
    }

    /// Decodes an untyped request first.
    ///
    /// A document whose request id can be recovered is always answered; one
    /// without a usable id cannot be correlated and the decode error is
    /// returned instead.
    pub async fn dispatch_value(&self, value: &Value) -> Result<ResponseEnvelope, DecodeError> {
        match RequestEnvelope::decode(value) {
            Ok(envelope) => Ok(self.dispatch(envelope).await),
            Err(err) => match RequestEnvelope::peek_request_id(value) {
                Some(request_id) => {
                    let err = DispatchError::MalformedEnvelope(err);
                    tracing::warn!(%request_id, "rejected malformed envelope: {err}");
                    Ok(ResponseEnvelope::failure(request_id, err.kind(), err.message()))
                }
                None => Err(err),
            },
        }
    }

    async fn run(&self, envelope: RequestEnvelope) -> Result<Value, DispatchError> {
        let guard = self.claim(&envelope.request_id)?;
        let handler = self.validate(&envelope)?;
        let permit = self.acquire_permit().await?;

        let RequestEnvelope {
            method,
            args,
            request_id,
            ..
        } = envelope;

        let task = tokio::spawn(async move {
            let _guard = guard;
            let _permit = permit;
            handler.call(&method, args).await
        });

        match task.await {
            Ok(result) => result.map_err(DispatchError::Handler),
            Err(join_err) => {
                if join_err.is_panic() {
                    tracing::error!(%request_id, "facade handler panicked");
                }
                Err(DispatchError::HandlerExecution {
                    message: format!("handler did not complete: {join_err}"),
                })
            }
        }
    }

    fn claim(&self, request_id: &RequestId) -> Result<InFlightGuard, DispatchError> {
        let mut table = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !table.insert(request_id.clone()) {
            return Err(DispatchError::DuplicateRequest {
                request_id: request_id.clone(),
            });
        }
        Ok(InFlightGuard {
            table: self.in_flight.clone(),
            request_id: request_id.clone(),
        })
    }

    fn validate(&self, envelope: &RequestEnvelope) -> Result<Arc<dyn FacadeHandler>, DispatchError> {
        let facade = self
            .registry
            .facade(&envelope.facade)
            .ok_or_else(|| DispatchError::UnknownFacade {
                facade: envelope.facade.clone(),
            })?;

        let method = facade
            .method(&envelope.method)
            .ok_or_else(|| DispatchError::UnknownMethod {
                facade: envelope.facade.clone(),
                method: envelope.method.clone(),
            })?;

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&envelope.facade)
            .cloned()
            .ok_or_else(|| DispatchError::NoImplementation {
                facade: envelope.facade.clone(),
            })?;

        self.registry
            .check_arguments(facade, method, &envelope.args)?;

        Ok(handler)
    }

    async fn acquire_permit(&self) -> Result<Option<OwnedSemaphorePermit>, DispatchError> {
        match &self.permits {
            None => Ok(None),
            Some(permits) => permits.clone().acquire_owned().await.map(Some).map_err(|_| {
                DispatchError::HandlerExecution {
                    message: "dispatcher is shutting down".to_string(),
                }
            }),
        }
    }
}
