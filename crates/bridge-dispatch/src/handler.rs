use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

const HANDLER_EXECUTION_ERROR: &str = "HandlerExecutionError";

/// Failure raised by a facade implementation.
///
/// `kind` travels to the caller unchanged, so implementations can report
/// domain-specific kinds (`FileNotFoundError`, `PermissionError`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    pub kind: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(HANDLER_EXECUTION_ERROR, message)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::execution(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::execution(format!("json error: {err}"))
    }
}

/// Local implementation of one facade.
///
/// Completeness is checked against the schema when the handler is registered,
/// so `call` is only ever invoked with declared method names and arguments that
/// already match the declared signature.
#[async_trait]
pub trait FacadeHandler: Send + Sync {
    fn implemented_methods(&self) -> BTreeSet<String>;

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, HandlerError>;
}

type MethodFn = Arc<dyn Fn(Vec<Value>) -> BoxFuture<Result<Value, HandlerError>> + Send + Sync>;

/// [`FacadeHandler`] assembled from one closure per method.
#[derive(Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, MethodFn>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        let handler: MethodFn = Arc::new(move |args| Box::pin(handler(args)));
        self.methods.insert(name.into(), handler);
        self
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.implemented_methods())
            .finish()
    }
}

#[async_trait]
impl FacadeHandler for MethodTable {
    fn implemented_methods(&self) -> BTreeSet<String> {
        self.methods.keys().cloned().collect()
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, HandlerError> {
        let handler = self
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| HandlerError::new("UnknownMethodError", format!("no handler for `{method}`")))?;
        handler(args).await
    }
}
