mod codegen;
mod error;
mod keys;
mod loader;
mod registry;

pub use codegen::{render_facade_module, render_facade_trait, render_struct, rust_type, snake_case};
pub use error::{ArgumentError, SchemaError};
pub use loader::SchemaLoader;
pub use registry::SchemaRegistry;
