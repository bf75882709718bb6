use crate::{value_kind, Primitive, StructDefinition, TypeDescriptor, TypeMismatch};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

/// What a named type reference resolves to.
#[derive(Debug, Clone, Copy)]
pub enum NamedType<'a> {
    Struct(&'a StructDefinition),
    /// Declared elsewhere; values are not inspected.
    Opaque,
}

pub trait TypeResolver {
    fn resolve(&self, name: &str) -> Option<NamedType<'_>>;
}

pub fn check_value(
    ty: &TypeDescriptor,
    value: &Value,
    resolver: &dyn TypeResolver,
) -> Result<(), TypeMismatch> {
    check_value_at(ty, value, resolver, "$")
}

/// Checks `value` against `ty`, reporting the first mismatch relative to `path`.
pub fn check_value_at(
    ty: &TypeDescriptor,
    value: &Value,
    resolver: &dyn TypeResolver,
    path: &str,
) -> Result<(), TypeMismatch> {
    match (ty, value) {
        (TypeDescriptor::Nullable(_), Value::Null) => Ok(()),
        (TypeDescriptor::Nullable(inner), _) => check_value_at(inner, value, resolver, path),
        (TypeDescriptor::Primitive(primitive), _) => check_primitive(*primitive, value, path),
        (TypeDescriptor::List(inner), Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                check_value_at(inner, item, resolver, &format!("{path}[{index}]"))?;
            }
            Ok(())
        }
        (TypeDescriptor::Map(key, inner), Value::Object(entries)) => {
            for (entry_key, entry_value) in entries {
                let entry_path = format!("{path}[{entry_key:?}]");
                check_map_key(key, entry_key, &entry_path)?;
                check_value_at(inner, entry_value, resolver, &entry_path)?;
            }
            Ok(())
        }
        (TypeDescriptor::Named(name), _) => match resolver.resolve(name) {
            Some(NamedType::Opaque) => Ok(()),
            Some(NamedType::Struct(definition)) => check_struct(definition, value, resolver, path),
            None => Err(mismatch(path, ty, "an unresolved type reference")),
        },
        (_, other) => Err(mismatch(path, ty, value_kind(other))),
    }
}

fn check_primitive(primitive: Primitive, value: &Value, path: &str) -> Result<(), TypeMismatch> {
    let ok = match (primitive, value) {
        (Primitive::String, Value::String(_)) => true,
        (Primitive::Boolean, Value::Bool(_)) => true,
        (Primitive::Number, Value::Number(_)) => true,
        (Primitive::Void, Value::Null) => true,
        (Primitive::Bytes, Value::String(encoded)) => {
            if STANDARD.decode(encoded).is_err() {
                return Err(TypeMismatch {
                    path: path.to_string(),
                    expected: "bytes (base64)".to_string(),
                    found: "a string that is not valid base64".to_string(),
                });
            }
            true
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(TypeMismatch {
            path: path.to_string(),
            expected: primitive.as_str().to_string(),
            found: value_kind(value).to_string(),
        })
    }
}

fn check_map_key(key: &TypeDescriptor, raw: &str, path: &str) -> Result<(), TypeMismatch> {
    match key {
        TypeDescriptor::Primitive(Primitive::String) => Ok(()),
        TypeDescriptor::Primitive(Primitive::Number) if is_integer_key(raw) => Ok(()),
        other => Err(TypeMismatch {
            path: path.to_string(),
            expected: format!("map key of type {other}"),
            found: format!("key {raw:?}"),
        }),
    }
}

/// Number keys are decimal integers that fit an `i64`: `"7"`, `"-3"`.
fn is_integer_key(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) && raw.parse::<i64>().is_ok()
}

fn check_struct(
    definition: &StructDefinition,
    value: &Value,
    resolver: &dyn TypeResolver,
    path: &str,
) -> Result<(), TypeMismatch> {
    let Value::Object(fields) = value else {
        return Err(TypeMismatch {
            path: path.to_string(),
            expected: definition.name.clone(),
            found: value_kind(value).to_string(),
        });
    };

    for field in &definition.fields {
        let field_path = format!("{path}.{}", field.name);
        match fields.get(&field.name) {
            Some(field_value) => check_value_at(&field.ty, field_value, resolver, &field_path)?,
            None if matches!(field.ty, TypeDescriptor::Nullable(_)) => {}
            None => {
                return Err(TypeMismatch {
                    path: field_path,
                    expected: field.ty.to_string(),
                    found: "nothing".to_string(),
                })
            }
        }
    }

    Ok(())
}

fn mismatch(path: &str, ty: &TypeDescriptor, found: &str) -> TypeMismatch {
    TypeMismatch {
        path: path.to_string(),
        expected: ty.to_string(),
        found: found.to_string(),
    }
}
