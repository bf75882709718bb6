//! Rust source rendering for facades and the structs they reference.
//!
//! Output is meant to be written to a file and included by the implementing
//! process. [`render_facade_module`] emits the `use` lines it needs; the
//! trait and struct renderers assume `async_trait`, `serde` and
//! `bridge_dispatch::HandlerError` are in scope. `bytes` values stay in their
//! wire form, a standard base64 `String`.

use crate::SchemaRegistry;
use bridge_core::{FacadeDefinition, Primitive, StructDefinition, TypeDescriptor};
use std::collections::BTreeSet;
use std::fmt::Write;

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "yield",
];

// Not usable as raw identifiers.
const PATH_KEYWORDS: &[&str] = &["crate", "self", "super"];

/// `openLink` -> `open_link`, `getURLForFile` -> `get_url_for_file`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (index, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let prev = index.checked_sub(1).map(|i| chars[i]);
            let next = chars.get(index + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// Field, parameter or method name as it appears in generated code.
pub(crate) fn rust_ident(name: &str) -> String {
    let snake = snake_case(name);
    if PATH_KEYWORDS.contains(&snake.as_str()) {
        format!("{snake}_")
    } else if RUST_KEYWORDS.contains(&snake.as_str()) {
        format!("r#{snake}")
    } else {
        snake
    }
}

pub fn rust_type(ty: &TypeDescriptor) -> String {
    match ty {
        TypeDescriptor::Primitive(Primitive::String) => "String".to_string(),
        TypeDescriptor::Primitive(Primitive::Boolean) => "bool".to_string(),
        TypeDescriptor::Primitive(Primitive::Number) => "f64".to_string(),
        TypeDescriptor::Primitive(Primitive::Bytes) => "String".to_string(),
        TypeDescriptor::Primitive(Primitive::Void) => "()".to_string(),
        TypeDescriptor::List(inner) => format!("Vec<{}>", rust_type(inner)),
        TypeDescriptor::Map(key, value) => {
            let key = match key.as_ref() {
                TypeDescriptor::Primitive(Primitive::Number) => "i64".to_string(),
                other => rust_type(other),
            };
            format!("BTreeMap<{key}, {}>", rust_type(value))
        }
        TypeDescriptor::Named(name) => name.clone(),
        TypeDescriptor::Nullable(inner) => format!("Option<{}>", rust_type(inner)),
    }
}

fn mentions_bytes(ty: &TypeDescriptor) -> bool {
    match ty {
        TypeDescriptor::Primitive(primitive) => *primitive == Primitive::Bytes,
        TypeDescriptor::List(inner) | TypeDescriptor::Nullable(inner) => mentions_bytes(inner),
        TypeDescriptor::Map(key, value) => mentions_bytes(key) || mentions_bytes(value),
        TypeDescriptor::Named(_) => false,
    }
}

fn write_doc(out: &mut String, indent: &str, doc: Option<&str>) {
    let Some(doc) = doc.map(str::trim).filter(|doc| !doc.is_empty()) else {
        return;
    };
    for line in doc.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            let _ = writeln!(out, "{indent}///");
        } else {
            let _ = writeln!(out, "{indent}/// {line}");
        }
    }
}

pub fn render_struct(structure: &StructDefinition) -> String {
    let mut out = String::new();
    write_doc(&mut out, "", structure.doc.as_deref());
    out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
    let _ = writeln!(out, "pub struct {} {{", structure.name);
    for field in &structure.fields {
        let ident = rust_ident(&field.name);
        if mentions_bytes(&field.ty) {
            out.push_str("    /// Base64 text (standard alphabet).\n");
        }
        if ident.trim_start_matches("r#") != field.name {
            let _ = writeln!(out, "    #[serde(rename = \"{}\")]", field.name);
        }
        if matches!(field.ty, TypeDescriptor::Nullable(_)) {
            out.push_str("    #[serde(default)]\n");
        }
        let _ = writeln!(out, "    pub {ident}: {},", rust_type(&field.ty));
    }
    out.push_str("}\n");
    out
}

pub fn render_facade_trait(facade: &FacadeDefinition) -> String {
    let mut out = String::new();
    write_doc(&mut out, "", facade.doc.as_deref());
    out.push_str("#[async_trait]\n");
    let _ = writeln!(out, "pub trait {}: Send + Sync {{", facade.name);

    for (index, method) in facade.methods.values().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_doc(&mut out, "    ", method.doc.as_deref());
        let mut params = String::from("&self");
        for param in &method.params {
            let _ = write!(params, ", {}: {}", rust_ident(&param.name), rust_type(&param.ty));
        }
        let _ = writeln!(
            out,
            "    async fn {}({params}) -> Result<{}, HandlerError>;",
            rust_ident(&method.name),
            rust_type(&method.ret)
        );
    }

    out.push_str("}\n");
    out
}

/// Trait for `facade` plus every struct it reaches, directly or through other structs.
pub fn render_facade_module(facade: &FacadeDefinition, registry: &SchemaRegistry) -> String {
    let mut pending: Vec<String> = facade
        .methods
        .values()
        .flat_map(|method| {
            method
                .params
                .iter()
                .map(|param| &param.ty)
                .chain(std::iter::once(&method.ret))
        })
        .flat_map(|ty| ty.named_refs())
        .map(str::to_string)
        .collect();

    let mut reached = BTreeSet::new();
    while let Some(name) = pending.pop() {
        if !reached.insert(name.clone()) {
            continue;
        }
        if let Some(structure) = registry.structure(&name) {
            for field in &structure.fields {
                pending.extend(field.ty.named_refs().into_iter().map(str::to_string));
            }
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "// Generated from facade `{}`.", facade.name);
    out.push_str("use async_trait::async_trait;\n");
    out.push_str("use bridge_dispatch::HandlerError;\n");
    out.push_str("use serde::{Deserialize, Serialize};\n");
    out.push_str("use std::collections::BTreeMap;\n\n");

    for name in &reached {
        if let Some(structure) = registry.structure(name) {
            out.push_str(&render_struct(structure));
            out.push('\n');
        }
    }
    out.push_str(&render_facade_trait(facade));
    out
}

#[cfg(test)]
mod tests {
    use super::{render_facade_trait, render_struct, rust_ident, rust_type, snake_case};
    use bridge_core::{
        FacadeDefinition, MethodDefinition, ParamDefinition, Role, StructDefinition,
        TypeDescriptor,
    };
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn converts_method_names() {
        assert_eq!(snake_case("openLink"), "open_link");
        assert_eq!(snake_case("getURLForFile"), "get_url_for_file");
        assert_eq!(snake_case("ipcVersion2Check"), "ipc_version2_check");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn maps_types() {
        let ty = TypeDescriptor::parse("Map<string, List<NativeContact?>>").expect("valid");
        assert_eq!(rust_type(&ty), "BTreeMap<String, Vec<Option<NativeContact>>>");
        assert_eq!(rust_type(&TypeDescriptor::parse("Map<number, bytes>").expect("valid")), "BTreeMap<i64, String>");
    }

    #[test]
    fn escapes_keywords() {
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("crate"), "crate_");
        assert_eq!(rust_ident("super"), "super_");
        assert_eq!(rust_ident("self"), "self_");
        assert_eq!(rust_ident("Self"), "self_");
        assert_eq!(rust_ident("mailAddress"), "mail_address");
    }

    #[test]
    fn bytes_fields_stay_base64_text() {
        let structure = StructDefinition {
            name: "FileContent".to_string(),
            doc: None,
            fields: vec![
                ParamDefinition::new("data", TypeDescriptor::parse("bytes").expect("valid")),
                ParamDefinition::new("self", TypeDescriptor::string()),
            ],
        };
        let rendered = render_struct(&structure);
        assert!(rendered.contains("    /// Base64 text (standard alphabet).\n    pub data: String,"));
        assert!(rendered.contains("    #[serde(rename = \"self\")]\n    pub self_: String,"));

        #[derive(Debug, serde::Deserialize)]
        struct FileContent {
            data: String,
        }
        let decoded: FileContent =
            serde_json::from_value(serde_json::json!({ "data": "aGVsbG8=" })).expect("decodes");
        assert_eq!(decoded.data, "aGVsbG8=");
    }

    #[test]
    fn renders_trait_with_docs() {
        let mut methods = BTreeMap::new();
        methods.insert(
            "openLink".to_string(),
            MethodDefinition {
                name: "openLink".to_string(),
                params: vec![ParamDefinition::new("uri", TypeDescriptor::string())],
                ret: TypeDescriptor::boolean(),
                doc: Some("Open a URI in the system browser.".to_string()),
            },
        );
        let facade = FacadeDefinition {
            name: "MobileSystemFacade".to_string(),
            senders: BTreeSet::from([Role::new("web")]),
            receivers: BTreeSet::from([Role::new("ios"), Role::new("android")]),
            doc: None,
            methods,
        };

        let rendered = render_facade_trait(&facade);
        assert!(rendered.contains("pub trait MobileSystemFacade: Send + Sync {"));
        assert!(rendered.contains("    /// Open a URI in the system browser.\n"));
        assert!(rendered
            .contains("    async fn open_link(&self, uri: String) -> Result<bool, HandlerError>;"));
    }

    #[test]
    fn renders_struct_renames() {
        let structure = StructDefinition {
            name: "NativeContact".to_string(),
            doc: None,
            fields: vec![
                ParamDefinition::new("mailAddress", TypeDescriptor::string()),
                ParamDefinition::new("type", TypeDescriptor::nullable(TypeDescriptor::number())),
            ],
        };
        let rendered = render_struct(&structure);
        assert!(rendered.contains("    #[serde(rename = \"mailAddress\")]\n    pub mail_address: String,"));
        assert!(rendered.contains("    #[serde(default)]\n    pub r#type: Option<f64>,"));
    }
}
