use crate::codegen::rust_ident;
use crate::keys::find_duplicate_key;
use crate::{SchemaError, SchemaRegistry};
use bridge_core::{
    DecodeError, Document, FacadeDefinition, MethodDefinition, ParamDefinition, Primitive, Role,
    StructDefinition, TypeDescriptor, TypeRefDefinition,
};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub(crate) enum Definition {
    Facade(FacadeDefinition),
    Struct(StructDefinition),
    TypeRef(TypeRefDefinition),
}

impl Definition {
    fn name(&self) -> &str {
        match self {
            Self::Facade(facade) => &facade.name,
            Self::Struct(structure) => &structure.name,
            Self::TypeRef(typeref) => &typeref.name,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Loaded {
    pub source_label: String,
    pub definition: Definition,
}

/// Collects schema documents and validates them as one set.
///
/// Each document is decoded as it is added; cross-document checks (unique
/// names, type resolution) run in [`SchemaLoader::finish`].
#[derive(Debug, Default)]
pub struct SchemaLoader {
    loaded: Vec<Loaded>,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, source_label: &str, value: &Value) -> Result<(), SchemaError> {
        let definition = decode_definition(source_label, value)?;
        tracing::debug!(source = source_label, name = definition.name(), "decoded schema document");
        self.loaded.push(Loaded {
            source_label: source_label.to_string(),
            definition,
        });
        Ok(())
    }

    pub fn add_json_str(&mut self, source_label: &str, text: &str) -> Result<(), SchemaError> {
        let value: Value = serde_json::from_str(text).map_err(|error| SchemaError::Json {
            source_label: source_label.to_string(),
            error,
        })?;

        let duplicate = find_duplicate_key(text).map_err(|error| SchemaError::Json {
            source_label: source_label.to_string(),
            error,
        })?;
        if let Some(path) = duplicate {
            return Err(classify_duplicate(source_label, &value, path));
        }

        self.add_document(source_label, &value)
    }

    pub fn add_file(&mut self, path: &Path) -> Result<(), SchemaError> {
        let text = fs::read_to_string(path).map_err(|error| SchemaError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        self.add_json_str(&path.display().to_string(), &text)
    }

    /// Adds every `*.json` file directly inside `dir`, in file name order.
    pub fn add_dir(&mut self, dir: &Path) -> Result<usize, SchemaError> {
        let io_error = |error| SchemaError::Io {
            path: dir.to_path_buf(),
            error,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        for file in &files {
            self.add_file(file)?;
        }

        tracing::info!(dir = %dir.display(), documents = files.len(), "loaded schema directory");
        Ok(files.len())
    }

    pub fn finish(self) -> Result<SchemaRegistry, SchemaError> {
        let mut origins: BTreeMap<String, String> = BTreeMap::new();
        let mut facades = BTreeMap::new();
        let mut structs = BTreeMap::new();
        let mut typerefs = BTreeMap::new();

        for loaded in self.loaded {
            let name = loaded.definition.name().to_string();
            if let Some(first) = origins.get(&name) {
                return Err(SchemaError::DuplicateDefinition {
                    name,
                    first: first.clone(),
                    second: loaded.source_label,
                });
            }
            origins.insert(name.clone(), loaded.source_label);

            match loaded.definition {
                Definition::Facade(facade) => {
                    facades.insert(name, facade);
                }
                Definition::Struct(structure) => {
                    structs.insert(name, structure);
                }
                Definition::TypeRef(typeref) => {
                    typerefs.insert(name, typeref);
                }
            }
        }

        let registry = SchemaRegistry::new(facades, structs, typerefs);
        validate_types(&registry)?;
        Ok(registry)
    }
}

fn classify_duplicate(source_label: &str, value: &Value, path: Vec<String>) -> SchemaError {
    let owner = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(source_label)
        .to_string();

    match path.as_slice() {
        [section, method] if section == "methods" => SchemaError::DuplicateMethod {
            facade: owner,
            method: method.clone(),
        },
        [section, field] if section == "fields" => SchemaError::DuplicateField {
            structure: owner,
            field: field.clone(),
        },
        [section, method, arg, index, _] if section == "methods" && arg == "arg" => {
            SchemaError::MalformedParameter {
                owner: format!("{owner}.{method}"),
                index: index.parse().unwrap_or_default(),
            }
        }
        _ => SchemaError::DuplicateKey {
            source_label: source_label.to_string(),
            path: path.join("."),
        },
    }
}

fn decode_definition(source_label: &str, value: &Value) -> Result<Definition, SchemaError> {
    let doc = Document::new(value).map_err(decode_err(source_label))?;
    let kind = doc.require_str("type").map_err(decode_err(source_label))?;
    match kind {
        "facade" => decode_facade(source_label, &doc).map(Definition::Facade),
        "struct" => decode_struct(source_label, &doc).map(Definition::Struct),
        "typeref" => decode_typeref(source_label, &doc).map(Definition::TypeRef),
        other => Err(SchemaError::UnknownDocumentType {
            source_label: source_label.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn decode_err(source_label: &str) -> impl Fn(DecodeError) -> SchemaError + '_ {
    move |error| SchemaError::Decode {
        source_label: source_label.to_string(),
        error,
    }
}

fn decode_facade(source_label: &str, doc: &Document<'_>) -> Result<FacadeDefinition, SchemaError> {
    let name = doc.require_str("name").map_err(decode_err(source_label))?;
    require_identifier(name)?;

    let senders = decode_roles(source_label, doc, name, "senders")?;
    let receivers = decode_roles(source_label, doc, name, "receivers")?;

    let mut methods = BTreeMap::new();
    let methods_doc = doc.require_object("methods").map_err(decode_err(source_label))?;
    for (method_name, method_value) in methods_doc.entries() {
        require_identifier(method_name)?;
        let method_doc = Document::at(method_value, methods_doc.child_path(method_name))
            .map_err(decode_err(source_label))?;
        let owner = format!("{name}.{method_name}");

        let mut params = Vec::new();
        let args = method_doc.require_array("arg").map_err(decode_err(source_label))?;
        for (index, arg) in args.iter().enumerate() {
            let arg_doc = Document::at(arg, format!("{}[{index}]", method_doc.child_path("arg")))
                .map_err(decode_err(source_label))?;
            let mut entries = arg_doc.entries();
            let (Some((param_name, _)), None) = (entries.next(), entries.next()) else {
                return Err(SchemaError::MalformedParameter { owner, index });
            };
            require_identifier(param_name)?;
            if params.iter().any(|param: &ParamDefinition| param.name == param_name) {
                return Err(SchemaError::DuplicateParameter {
                    owner,
                    param: param_name.to_string(),
                });
            }
            let type_text = arg_doc.require_str(param_name).map_err(decode_err(source_label))?;
            params.push(ParamDefinition::new(
                param_name,
                parse_type(&format!("{owner}({param_name})"), type_text)?,
            ));
        }

        require_distinct_idents(&owner, params.iter().map(|param| param.name.as_str()))?;

        let ret_text = method_doc.require_str("ret").map_err(decode_err(source_label))?;
        let ret = parse_type(&format!("{owner} return"), ret_text)?;

        methods.insert(
            method_name.to_string(),
            MethodDefinition {
                name: method_name.to_string(),
                params,
                ret,
                doc: method_doc
                    .optional_str("doc")
                    .map_err(decode_err(source_label))?
                    .map(str::to_string),
            },
        );
    }

    require_distinct_idents(name, methods.keys().map(String::as_str))?;

    Ok(FacadeDefinition {
        name: name.to_string(),
        senders,
        receivers,
        doc: doc.optional_str("doc").map_err(decode_err(source_label))?.map(str::to_string),
        methods,
    })
}

fn decode_roles(
    source_label: &str,
    doc: &Document<'_>,
    facade: &str,
    side: &'static str,
) -> Result<BTreeSet<Role>, SchemaError> {
    let raw = doc.require_str_list(side).map_err(decode_err(source_label))?;
    if raw.is_empty() {
        return Err(SchemaError::EmptyRoleSet {
            facade: facade.to_string(),
            side,
        });
    }

    raw.into_iter()
        .map(|role| {
            let trimmed = role.trim();
            if trimmed.is_empty() || trimmed != role {
                Err(SchemaError::InvalidRole {
                    facade: facade.to_string(),
                    role: role.to_string(),
                })
            } else {
                Ok(Role::new(trimmed))
            }
        })
        .collect()
}

fn decode_struct(source_label: &str, doc: &Document<'_>) -> Result<StructDefinition, SchemaError> {
    let name = doc.require_str("name").map_err(decode_err(source_label))?;
    require_identifier(name)?;

    let fields_doc = doc.require_object("fields").map_err(decode_err(source_label))?;
    let mut fields = Vec::with_capacity(fields_doc.len());
    for (field_name, _) in fields_doc.entries() {
        require_identifier(field_name)?;
        let type_text = fields_doc.require_str(field_name).map_err(decode_err(source_label))?;
        fields.push(ParamDefinition::new(
            field_name,
            parse_type(&format!("{name}.{field_name}"), type_text)?,
        ));
    }

    require_distinct_idents(name, fields.iter().map(|field| field.name.as_str()))?;

    Ok(StructDefinition {
        name: name.to_string(),
        doc: doc.optional_str("doc").map_err(decode_err(source_label))?.map(str::to_string),
        fields,
    })
}

fn decode_typeref(source_label: &str, doc: &Document<'_>) -> Result<TypeRefDefinition, SchemaError> {
    let name = doc.require_str("name").map_err(decode_err(source_label))?;
    require_identifier(name)?;

    Ok(TypeRefDefinition {
        name: name.to_string(),
        doc: doc.optional_str("doc").map_err(decode_err(source_label))?.map(str::to_string),
        location: doc.get("location").cloned(),
    })
}

fn parse_type(owner: &str, text: &str) -> Result<TypeDescriptor, SchemaError> {
    TypeDescriptor::parse(text).map_err(|error| SchemaError::InvalidType {
        owner: owner.to_string(),
        error,
    })
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern")
    })
}

fn require_identifier(name: &str) -> Result<(), SchemaError> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Names that would render as the same Rust identifier cannot share a scope.
fn require_distinct_idents<'a>(
    owner: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), SchemaError> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for name in names {
        if let Some(first) = seen.insert(rust_ident(name), name) {
            return Err(SchemaError::IdentifierCollision {
                owner: owner.to_string(),
                first: first.to_string(),
                second: name.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_types(registry: &SchemaRegistry) -> Result<(), SchemaError> {
    for facade in registry.facades() {
        for method in facade.methods.values() {
            let owner = format!("{}.{}", facade.name, method.name);
            for param in &method.params {
                let param_owner = format!("{owner}({})", param.name);
                if param.ty.contains_void() {
                    return Err(SchemaError::MisplacedVoid { owner: param_owner });
                }
                validate_type(registry, &param_owner, &param.ty)?;
            }

            if method.ret.contains_void() && !method.ret.is_void() {
                return Err(SchemaError::MisplacedVoid {
                    owner: format!("{owner} return"),
                });
            }
            validate_type(registry, &format!("{owner} return"), &method.ret)?;
        }
    }

    for structure in registry.structures() {
        for field in &structure.fields {
            let owner = format!("{}.{}", structure.name, field.name);
            if field.ty.contains_void() {
                return Err(SchemaError::MisplacedVoid { owner });
            }
            validate_type(registry, &owner, &field.ty)?;
        }
    }

    Ok(())
}

fn validate_type(
    registry: &SchemaRegistry,
    owner: &str,
    ty: &TypeDescriptor,
) -> Result<(), SchemaError> {
    for name in ty.named_refs() {
        if !registry.resolves(name) {
            return Err(SchemaError::UnresolvedType {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
    }

    for key in ty.map_keys() {
        if !matches!(
            key,
            TypeDescriptor::Primitive(Primitive::String | Primitive::Number)
        ) {
            return Err(SchemaError::InvalidMapKey {
                owner: owner.to_string(),
                ty: key.to_string(),
            });
        }
    }

    Ok(())
}
