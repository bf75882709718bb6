use crate::TypeDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Open tag naming one side of a process boundary, e.g. `web`, `ios`, `android`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

impl ParamDefinition {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDefinition {
    pub name: String,
    pub params: Vec<ParamDefinition>,
    pub ret: TypeDescriptor,
    pub doc: Option<String>,
}

impl MethodDefinition {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param(&self, name: &str) -> Option<&ParamDefinition> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Human-readable signature, e.g. `openLink(uri: string) -> boolean`.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|param| format!("{}: {}", param.name, param.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params}) -> {}", self.name, self.ret)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeDefinition {
    pub name: String,
    pub senders: BTreeSet<Role>,
    pub receivers: BTreeSet<Role>,
    pub doc: Option<String>,
    pub methods: BTreeMap<String, MethodDefinition>,
}

impl FacadeDefinition {
    pub fn method(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.get(name)
    }

    pub fn can_send(&self, role: &Role) -> bool {
        self.senders.contains(role)
    }

    pub fn can_receive(&self, role: &Role) -> bool {
        self.receivers.contains(role)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

/// Record type referenced by name from parameters, return values and other structs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDefinition {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<ParamDefinition>,
}

impl StructDefinition {
    pub fn field(&self, name: &str) -> Option<&ParamDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Named type defined outside the schema set; values are passed through unchecked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRefDefinition {
    pub name: String,
    pub doc: Option<String>,
    pub location: Option<serde_json::Value>,
}
