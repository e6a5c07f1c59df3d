//! Render context: the variable bindings shared by every template in a run.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// API level at which native handles switch from 32-bit to 64-bit.
pub const WIDE_POINTER_API_LEVEL: u32 = 21;

/// A bound template value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Immutable name → value bindings, built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    vars: BTreeMap<String, Value>,
}

impl RenderContext {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RenderContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Build the bindings for `api_level`: `apiLevel`, `ptrClass` and
/// `ptrClassBoxed`.
///
/// From [`WIDE_POINTER_API_LEVEL`] on, handles are `long`/`Long`; below it
/// they are `int`/`Integer`.
pub fn build_context(api_level: u32) -> RenderContext {
    let (ptr_class, ptr_class_boxed) = if api_level >= WIDE_POINTER_API_LEVEL {
        ("long", "Long")
    } else {
        ("int", "Integer")
    };

    [
        ("apiLevel", Value::Int(i64::from(api_level))),
        ("ptrClass", Value::from(ptr_class)),
        ("ptrClassBoxed", Value::from(ptr_class_boxed)),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr_names(ctx: &RenderContext) -> (String, String) {
        (
            ctx.get("ptrClass").unwrap().to_string(),
            ctx.get("ptrClassBoxed").unwrap().to_string(),
        )
    }

    #[test]
    fn wide_from_threshold() {
        for level in [21, 22, 28, 34] {
            let ctx = build_context(level);
            assert_eq!(ptr_names(&ctx), ("long".into(), "Long".into()), "level {level}");
        }
    }

    #[test]
    fn narrow_below_threshold() {
        for level in [0, 16, 19, 20] {
            let ctx = build_context(level);
            assert_eq!(ptr_names(&ctx), ("int".into(), "Integer".into()), "level {level}");
        }
    }

    #[test]
    fn carries_api_level_as_integer() {
        let ctx = build_context(23);
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("apiLevel"), Some(&Value::Int(23)));
    }

    #[test]
    fn deterministic() {
        assert_eq!(build_context(20), build_context(20));
        assert_ne!(build_context(20), build_context(21));
    }
}
