use crate::TransportError;
use async_trait::async_trait;
use bridge_core::{RequestEnvelope, ResponseEnvelope};
use bridge_dispatch::Dispatcher;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Carries request envelopes to the receiving role.
///
/// Responses travel back out of band; whoever reads them off the wire hands
/// them to [`crate::FacadeClient::handle_response`] (or feeds the channel
/// consumed by [`crate::FacadeClient::listen`]).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: RequestEnvelope) -> Result<(), TransportError>;
}

/// In-process transport that serializes envelopes to JSON and dispatches them
/// against a local [`Dispatcher`], one task per request.
pub struct LoopbackTransport {
    dispatcher: Arc<Dispatcher>,
    responses: mpsc::UnboundedSender<ResponseEnvelope>,
}

impl LoopbackTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> (Self, mpsc::UnboundedReceiver<ResponseEnvelope>) {
        let (responses, receiver) = mpsc::unbounded_channel();
        (
            Self {
                dispatcher,
                responses,
            },
            receiver,
        )
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, envelope: RequestEnvelope) -> Result<(), TransportError> {
        if self.responses.is_closed() {
            return Err(TransportError::Closed);
        }

        let wire = serde_json::to_value(&envelope)
            .map_err(|err| TransportError::Encode(err.to_string()))?;
        let dispatcher = self.dispatcher.clone();
        let responses = self.responses.clone();

        tokio::spawn(async move {
            let response = match dispatcher.dispatch_value(&wire).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::error!("loopback dropped undecodable request: {err}");
                    return;
                }
            };

            let decoded = serde_json::to_value(&response)
                .and_then(serde_json::from_value::<ResponseEnvelope>);
            match decoded {
                Ok(response) => {
                    if responses.send(response).is_err() {
                        tracing::debug!("loopback response receiver closed");
                    }
                }
                Err(err) => tracing::error!("loopback failed to encode response: {err}"),
            }
        });

        Ok(())
    }
}
