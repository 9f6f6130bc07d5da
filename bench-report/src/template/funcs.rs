//! Helper registry and builtin functions
//!
//! Helpers are registered by name and called with already-evaluated
//! arguments. Builtins work on borrowed values so that `index` into a
//! per-request column does not copy the column.

use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Result of a helper call; the error message becomes an execution error
pub type HelperResult = std::result::Result<Value, String>;

/// A named function callable from templates
pub type Helper = Arc<dyn Fn(&[&Value]) -> HelperResult + Send + Sync>;

const BUILTINS: [&str; 11] = [
    "and", "or", "not", "len", "index", "eq", "ne", "lt", "le", "gt", "ge",
];

pub(crate) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Registry of helper functions available to a template
///
/// Helpers take precedence over builtins of the same name.
#[derive(Clone, Default)]
pub struct FuncMap {
    helpers: HashMap<String, Helper>,
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a helper
    pub fn insert<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[&Value]) -> HelperResult + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Registered helper names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncMap")
            .field("helpers", &self.names())
            .finish()
    }
}

/// Check the argument count of a helper call
pub fn expect_args<'a>(name: &str, args: &[&'a Value], count: usize) -> Result<Vec<&'a Value>, String> {
    if args.len() != count {
        return Err(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            count,
            args.len()
        ));
    }
    Ok(args.to_vec())
}

/// Short type name used in error messages
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

/// Template truth: false, 0, nil and empty strings/arrays/maps are false
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

pub(crate) fn call_builtin<'d>(
    name: &str,
    mut args: Vec<Cow<'d, Value>>,
) -> Result<Cow<'d, Value>, String> {
    match name {
        "and" | "or" => {
            if args.is_empty() {
                return Err(format!("wrong number of args for {}: want at least 1 got 0", name));
            }
            let want = name == "or";
            let last = args.len() - 1;
            let pick = args
                .iter()
                .position(|v| truthy(v) == want)
                .unwrap_or(last);
            Ok(args.swap_remove(pick))
        }
        "not" => {
            let [value] = fixed_args::<1>(name, args)?;
            Ok(Cow::Owned(Value::Bool(!truthy(&value))))
        }
        "len" => {
            let [value] = fixed_args::<1>(name, args)?;
            let len = match value.as_ref() {
                Value::Array(a) => a.len(),
                Value::Object(m) => m.len(),
                Value::String(s) => s.len(),
                other => return Err(format!("len of type {}", kind(other))),
            };
            Ok(Cow::Owned(Value::from(len)))
        }
        "index" => {
            if args.is_empty() {
                return Err("wrong number of args for index: want at least 1 got 0".to_string());
            }
            let mut keys = args.split_off(1);
            let mut current = args.swap_remove(0);
            for key in keys.drain(..) {
                current = index_value(current, &key)?;
            }
            Ok(current)
        }
        "eq" => {
            if args.len() < 2 {
                return Err(format!("wrong number of args for eq: want at least 2 got {}", args.len()));
            }
            let first = &args[0];
            let mut found = false;
            for other in &args[1..] {
                if values_equal(first, other)? {
                    found = true;
                    break;
                }
            }
            Ok(Cow::Owned(Value::Bool(found)))
        }
        "ne" => {
            let [a, b] = fixed_args::<2>(name, args)?;
            Ok(Cow::Owned(Value::Bool(!values_equal(&a, &b)?)))
        }
        "lt" | "le" | "gt" | "ge" => {
            let [a, b] = fixed_args::<2>(name, args)?;
            let ordering = compare(&a, &b)?;
            let result = match name {
                "lt" => ordering == Ordering::Less,
                "le" => ordering != Ordering::Greater,
                "gt" => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Cow::Owned(Value::Bool(result)))
        }
        _ => Err(format!("function {:?} not defined", name)),
    }
}

fn fixed_args<'d, const N: usize>(
    name: &str,
    args: Vec<Cow<'d, Value>>,
) -> Result<[Cow<'d, Value>; N], String> {
    let got = args.len();
    args.try_into()
        .map_err(|_| format!("wrong number of args for {}: want {} got {}", name, N, got))
}

/// Index into an array by position or into a map by key; borrowed input stays borrowed
fn index_value<'d>(container: Cow<'d, Value>, key: &Value) -> Result<Cow<'d, Value>, String> {
    match container {
        Cow::Borrowed(value) => index_ref(value, key).map(|found| match found {
            Some(v) => Cow::Borrowed(v),
            None => Cow::Owned(Value::Null),
        }),
        Cow::Owned(value) => {
            let found = index_ref(&value, key)?.cloned();
            Ok(Cow::Owned(found.unwrap_or(Value::Null)))
        }
    }
}

/// `Ok(None)` means a missing map key, which evaluates to nil
fn index_ref<'v>(container: &'v Value, key: &Value) -> Result<Option<&'v Value>, String> {
    match container {
        Value::Array(items) => {
            let idx = key
                .as_i64()
                .ok_or_else(|| format!("cannot index array with {}", kind(key)))?;
            usize::try_from(idx)
                .ok()
                .and_then(|i| items.get(i))
                .map(Some)
                .ok_or_else(|| format!("index out of range: {}", idx))
        }
        Value::Object(map) => {
            let name = match key {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => return Err(format!("cannot index map with {}", kind(other))),
            };
            Ok(map.get(&name))
        }
        Value::Null => Err("index of untyped nil".to_string()),
        other => Err(format!("can't index item of type {}", kind(other))),
    }
}

fn values_equal(a: &Value, b: &Value) -> Result<bool, String> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => Ok(compare(a, b)? == Ordering::Equal),
        (Value::Array(_), _) | (Value::Object(_), _) | (_, Value::Array(_)) | (_, Value::Object(_)) => {
            Err(format!("non-comparable types {} and {}", kind(a), kind(b)))
        }
        _ => Ok(a == b),
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, String> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Ok(x.cmp(&y));
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return Ok(x.cmp(&y));
            }
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y)
                .ok_or_else(|| "cannot compare NaN".to_string())
        }
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(format!("incompatible types for comparison: {} and {}", kind(a), kind(b))),
    }
}
