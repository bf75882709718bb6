//! Duplicate object key detection.
//!
//! `serde_json::Value` keeps only the last of several identical keys, so a
//! facade that declares the same method twice would load silently. Source
//! text is scanned once before decoding to catch that.

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

/// Returns the path of the first repeated key, e.g. `["methods", "openLink"]`.
pub(crate) fn find_duplicate_key(text: &str) -> Result<Option<Vec<String>>, serde_json::Error> {
    let found = RefCell::new(None);
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let scan = KeyScan {
        path: Vec::new(),
        found: &found,
    };

    match scan.deserialize(&mut deserializer) {
        Ok(()) => {
            deserializer.end()?;
            Ok(None)
        }
        Err(err) => match found.into_inner() {
            Some(path) => Ok(Some(path)),
            None => Err(err),
        },
    }
}

struct KeyScan<'a> {
    path: Vec<String>,
    found: &'a RefCell<Option<Vec<String>>>,
}

impl<'a> KeyScan<'a> {
    fn child(&self, segment: String) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            path,
            found: self.found,
        }
    }
}

impl<'de, 'a> DeserializeSeed<'de> for KeyScan<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'a> Visitor<'de> for KeyScan<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, _: bool) -> Result<(), E> {
        Ok(())
    }

    fn visit_i64<E>(self, _: i64) -> Result<(), E> {
        Ok(())
    }

    fn visit_u64<E>(self, _: u64) -> Result<(), E> {
        Ok(())
    }

    fn visit_f64<E>(self, _: f64) -> Result<(), E> {
        Ok(())
    }

    fn visit_str<E>(self, _: &str) -> Result<(), E> {
        Ok(())
    }

    fn visit_unit<E>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut index = 0_usize;
        while seq.next_element_seed(self.child(index.to_string()))?.is_some() {
            index += 1;
        }
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            if !seen.insert(key.clone()) {
                let mut path = self.path.clone();
                path.push(key.clone());
                *self.found.borrow_mut() = Some(path);
                return Err(de::Error::custom(format!("duplicate key `{key}`")));
            }
            map.next_value_seed(self.child(key))?;
        }
        Ok(())
    }
}
