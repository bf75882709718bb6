mod client;
mod error;
mod transport;

pub use client::{FacadeClient, FacadeStub};
pub use error::{CallError, TransportError};
pub use transport::{LoopbackTransport, Transport};
