use crate::TypeParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    String,
    Boolean,
    Number,
    Bytes,
    Void,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            "number" => Some(Self::Number),
            "bytes" => Some(Self::Bytes),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Bytes => "bytes",
            Self::Void => "void",
        }
    }
}

/// Type grammar used by facade parameters, return values and struct fields.
///
/// The textual form is what schema documents carry: `string`, `List<T>`,
/// `Map<K, V>`, `NativeContact`, `T?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TypeDescriptor {
    Primitive(Primitive),
    List(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Named(String),
    Nullable(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        let mut parser = TypeParser {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }

    pub fn string() -> Self {
        Self::Primitive(Primitive::String)
    }

    pub fn boolean() -> Self {
        Self::Primitive(Primitive::Boolean)
    }

    pub fn number() -> Self {
        Self::Primitive(Primitive::Number)
    }

    pub fn void() -> Self {
        Self::Primitive(Primitive::Void)
    }

    pub fn list(inner: TypeDescriptor) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn nullable(inner: TypeDescriptor) -> Self {
        Self::Nullable(Box::new(inner))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Void))
    }

    /// True if `void` appears anywhere inside this descriptor, including at the top.
    pub fn contains_void(&self) -> bool {
        match self {
            Self::Primitive(primitive) => *primitive == Primitive::Void,
            Self::List(inner) | Self::Nullable(inner) => inner.contains_void(),
            Self::Map(key, value) => key.contains_void() || value.contains_void(),
            Self::Named(_) => false,
        }
    }

    /// Every named reference in this descriptor, in textual order.
    pub fn named_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Primitive(_) => {}
            Self::List(inner) | Self::Nullable(inner) => inner.collect_named(out),
            Self::Map(key, value) => {
                key.collect_named(out);
                value.collect_named(out);
            }
            Self::Named(name) => out.push(name),
        }
    }

    /// Every map key type in this descriptor.
    pub fn map_keys(&self) -> Vec<&TypeDescriptor> {
        let mut out = Vec::new();
        self.collect_map_keys(&mut out);
        out
    }

    fn collect_map_keys<'a>(&'a self, out: &mut Vec<&'a TypeDescriptor>) {
        match self {
            Self::Primitive(_) | Self::Named(_) => {}
            Self::List(inner) | Self::Nullable(inner) => inner.collect_map_keys(out),
            Self::Map(key, value) => {
                out.push(key);
                key.collect_map_keys(out);
                value.collect_map_keys(out);
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => f.write_str(primitive.as_str()),
            Self::List(inner) => write!(f, "List<{inner}>"),
            Self::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            Self::Named(name) => f.write_str(name),
            Self::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

struct TypeParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn parse_type(&mut self) -> Result<TypeDescriptor, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        let name = self.ident()?;
        self.skip_ws();

        let base = if self.eat(b'<') {
            let mut args = vec![self.parse_type()?];
            self.skip_ws();
            while self.eat(b',') {
                args.push(self.parse_type()?);
                self.skip_ws();
            }
            if !self.eat(b'>') {
                return Err(self.error("expected `>`"));
            }
            self.generic(start, name, args)?
        } else {
            match (Primitive::from_name(name), name) {
                (Some(primitive), _) => TypeDescriptor::Primitive(primitive),
                (None, "List" | "Map") => {
                    return Err(self.error_at(start, "missing type arguments"));
                }
                (None, _) => TypeDescriptor::Named(name.to_string()),
            }
        };

        self.skip_ws();
        if self.eat(b'?') {
            self.skip_ws();
            if self.peek() == Some(b'?') {
                return Err(self.error("nullable marker repeated"));
            }
            return Ok(TypeDescriptor::Nullable(Box::new(base)));
        }

        Ok(base)
    }

    fn generic(
        &self,
        start: usize,
        name: &str,
        mut args: Vec<TypeDescriptor>,
    ) -> Result<TypeDescriptor, TypeParseError> {
        match (name, args.len()) {
            ("List", 1) => Ok(TypeDescriptor::List(Box::new(args.remove(0)))),
            ("Map", 2) => {
                let value = args.remove(1);
                let key = args.remove(0);
                Ok(TypeDescriptor::Map(Box::new(key), Box::new(value)))
            }
            ("List", n) => Err(self.error_at(start, &format!("List takes 1 type argument, got {n}"))),
            ("Map", n) => Err(self.error_at(start, &format!("Map takes 2 type arguments, got {n}"))),
            (other, _) => Err(self.error_at(start, &format!("`{other}` is not a generic type"))),
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeParseError> {
        let start = self.pos;
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.pos += 1,
            Some(_) => return Err(self.error("expected type name")),
            None => return Err(self.error("expected type name, found end of input")),
        }
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(&self.input[start..self.pos])
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, reason: &str) -> TypeParseError {
        self.error_at(self.pos, reason)
    }

    fn error_at(&self, position: usize, reason: &str) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            position,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Primitive, TypeDescriptor};

    #[test]
    fn parses_primitives_and_named() {
        assert_eq!(
            TypeDescriptor::parse("boolean").expect("parsed"),
            TypeDescriptor::Primitive(Primitive::Boolean)
        );
        assert_eq!(
            TypeDescriptor::parse("NativeContact").expect("parsed"),
            TypeDescriptor::Named("NativeContact".to_string())
        );
    }

    #[test]
    fn parses_nested_generics_and_nullable() {
        let parsed = TypeDescriptor::parse(" Map< string ,List<NativeContact?> >? ").expect("parsed");
        assert_eq!(
            parsed,
            TypeDescriptor::nullable(TypeDescriptor::Map(
                Box::new(TypeDescriptor::string()),
                Box::new(TypeDescriptor::list(TypeDescriptor::nullable(
                    TypeDescriptor::Named("NativeContact".to_string())
                ))),
            ))
        );
        assert_eq!(parsed.to_string(), "Map<string, List<NativeContact?>>?");
        assert_eq!(parsed.named_refs(), vec!["NativeContact"]);
    }

    #[test]
    fn rejects_malformed_text() {
        for input in ["", "List", "List<string", "Map<string>", "Foo<string>", "string??", "string extra", "1abc"] {
            let err = TypeDescriptor::parse(input).expect_err(input);
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn detects_nested_void() {
        assert!(TypeDescriptor::parse("void").expect("parsed").is_void());
        assert!(TypeDescriptor::parse("List<void>").expect("parsed").contains_void());
        assert!(!TypeDescriptor::parse("List<string>").expect("parsed").contains_void());
    }

    #[test]
    fn serde_uses_textual_form() {
        let ty: TypeDescriptor = serde_json::from_str("\"List<number>\"").expect("deserialized");
        assert_eq!(ty, TypeDescriptor::list(TypeDescriptor::number()));
        assert_eq!(serde_json::to_string(&ty).expect("serialized"), "\"List<number>\"");
    }
}
