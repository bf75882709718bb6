mod dispatcher;
mod error;
mod handler;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, RegistrationError};
pub use handler::{BoxFuture, FacadeHandler, HandlerError, MethodTable};
