use bridge_core::FacadeDefinition;
use bridge_dispatch::MethodTable;
use serde_json::Value;

/// Implements every method of `facade` by returning its first argument, or
/// null for methods without parameters.
pub fn handler(facade: &FacadeDefinition) -> MethodTable {
    facade
        .method_names()
        .fold(MethodTable::new(), |table, name| {
            table.method(name, |args: Vec<Value>| async move {
                Ok(args.into_iter().next().unwrap_or(Value::Null))
            })
        })
}
