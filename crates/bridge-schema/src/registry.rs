use crate::{ArgumentError, SchemaError, SchemaLoader};
use bridge_core::{
    check_value_at, FacadeDefinition, MethodDefinition, NamedType, Role, StructDefinition,
    TypeRefDefinition, TypeResolver,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Immutable set of facades and the named types they reference.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    facades: BTreeMap<String, FacadeDefinition>,
    structs: BTreeMap<String, StructDefinition>,
    typerefs: BTreeMap<String, TypeRefDefinition>,
}

impl SchemaRegistry {
    pub(crate) fn new(
        facades: BTreeMap<String, FacadeDefinition>,
        structs: BTreeMap<String, StructDefinition>,
        typerefs: BTreeMap<String, TypeRefDefinition>,
    ) -> Self {
        Self {
            facades,
            structs,
            typerefs,
        }
    }

    pub fn from_documents<'a, I>(documents: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut loader = SchemaLoader::new();
        for (index, document) in documents.into_iter().enumerate() {
            loader.add_document(&format!("document #{index}"), document)?;
        }
        loader.finish()
    }

    pub fn from_dir(dir: &Path) -> Result<Self, SchemaError> {
        let mut loader = SchemaLoader::new();
        loader.add_dir(dir)?;
        loader.finish()
    }

    pub fn facade(&self, name: &str) -> Option<&FacadeDefinition> {
        self.facades.get(name)
    }

    pub fn facades(&self) -> impl Iterator<Item = &FacadeDefinition> {
        self.facades.values()
    }

    pub fn structure(&self, name: &str) -> Option<&StructDefinition> {
        self.structs.get(name)
    }

    pub fn structures(&self) -> impl Iterator<Item = &StructDefinition> {
        self.structs.values()
    }

    pub fn typeref(&self, name: &str) -> Option<&TypeRefDefinition> {
        self.typerefs.get(name)
    }

    pub fn resolves(&self, name: &str) -> bool {
        self.structs.contains_key(name) || self.typerefs.contains_key(name)
    }

    pub fn facades_for_sender<'a>(
        &'a self,
        role: &'a Role,
    ) -> impl Iterator<Item = &'a FacadeDefinition> + 'a {
        self.facades().filter(move |facade| facade.can_send(role))
    }

    pub fn facades_for_receiver<'a>(
        &'a self,
        role: &'a Role,
    ) -> impl Iterator<Item = &'a FacadeDefinition> + 'a {
        self.facades().filter(move |facade| facade.can_receive(role))
    }

    pub fn len(&self) -> usize {
        self.facades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facades.is_empty()
    }

    /// Checks call arguments against a method signature: count first, then
    /// each value in declared order.
    pub fn check_arguments(
        &self,
        facade: &FacadeDefinition,
        method: &MethodDefinition,
        args: &[Value],
    ) -> Result<(), ArgumentError> {
        if args.len() != method.arity() {
            return Err(ArgumentError::Count {
                facade: facade.name.clone(),
                method: method.name.clone(),
                expected: method.arity(),
                found: args.len(),
            });
        }

        for (param, arg) in method.params.iter().zip(args) {
            check_value_at(&param.ty, arg, self, &param.name).map_err(|mismatch| {
                ArgumentError::Type {
                    facade: facade.name.clone(),
                    method: method.name.clone(),
                    param: param.name.clone(),
                    mismatch,
                }
            })?;
        }

        Ok(())
    }
}

impl TypeResolver for SchemaRegistry {
    fn resolve(&self, name: &str) -> Option<NamedType<'_>> {
        if let Some(structure) = self.structs.get(name) {
            return Some(NamedType::Struct(structure));
        }
        self.typerefs.get(name).map(|_| NamedType::Opaque)
    }
}
