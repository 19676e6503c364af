//! Argument value model.
//!
//! Memoized functions are keyed by their arguments, so arguments need a shape
//! that can be normalized, printed canonically, and stored next to the result.
//! [`Arg`] is that shape; [`CallArgs`] is one invocation's positional tuple plus
//! keyword mapping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MemoraError, Result};

/// A single argument value.
///
/// `List` and `Tuple` are positional: their element order is part of the value.
/// `Map` is an unordered mapping and is re-sorted during key derivation, while
/// `OrderedMap` keeps its insertion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Arg {
    /// Absence of a value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(#[serde(with = "hex")] Vec<u8>),
    /// Positional sequence.
    List(Vec<Arg>),
    /// Fixed positional group.
    Tuple(Vec<Arg>),
    /// Unordered mapping.
    Map(Vec<(Arg, Arg)>),
    /// Mapping whose entry order is significant.
    OrderedMap(Vec<(Arg, Arg)>),
}

impl Arg {
    /// Builds a `List` from anything convertible.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arg>,
    {
        Arg::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a `Tuple` from anything convertible.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arg>,
    {
        Arg::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds an unordered `Map`.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        Arg::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds an `OrderedMap`, keeping the given entry order.
    pub fn ordered_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        Arg::OrderedMap(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps raw bytes.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Arg::Bytes(data.into())
    }

    /// Lifts any serializable value through its JSON form.
    ///
    /// Structs and JSON objects become unordered `Map`s.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Arg::from)
            .map_err(|e| MemoraError::InvalidArgument(e.to_string()))
    }

    /// Stable type bucket used when ordering mapping keys.
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Null => "null",
            Arg::Bool(_) => "bool",
            Arg::Int(_) => "int",
            Arg::Float(_) => "float",
            Arg::Str(_) => "str",
            Arg::Bytes(_) => "bytes",
            Arg::List(_) => "list",
            Arg::Tuple(_) => "tuple",
            Arg::Map(_) => "map",
            Arg::OrderedMap(_) => "ordered_map",
        }
    }

    /// Canonical string representation.
    ///
    /// Two values print identically iff they are structurally equal with the
    /// same entry order, so normalizing before printing is what makes the
    /// output order-independent for `Map`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        match self {
            Arg::Null => out.push_str("null"),
            Arg::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Arg::Int(i) => out.push_str(&i.to_string()),
            Arg::Float(f) => out.push_str(&format!("{f:?}")),
            Arg::Str(s) => out.push_str(&format!("{s:?}")),
            Arg::Bytes(b) => {
                out.push_str("b'");
                out.push_str(&hex::encode(b));
                out.push('\'');
            }
            Arg::List(items) => {
                out.push('[');
                write_seq(items, out);
                out.push(']');
            }
            Arg::Tuple(items) => {
                out.push('(');
                write_seq(items, out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Arg::Map(entries) => {
                out.push('{');
                write_entries(entries, out);
                out.push('}');
            }
            Arg::OrderedMap(entries) => {
                out.push_str("ordered{");
                write_entries(entries, out);
                out.push('}');
            }
        }
    }

    /// Returns the integer, if this is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Arg::Int(i) => Some(*i),
            _ => None,
        }
    }
}

fn write_seq(items: &[Arg], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out);
    }
}

fn write_entries(entries: &[(Arg, Arg)], out: &mut String) {
    for (i, (k, v)) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        k.write_repr(out);
        out.push_str(": ");
        v.write_repr(out);
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(f64::from(v))
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Str(v.clone())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Arg::Null)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(v: Vec<T>) -> Self {
        Arg::list(v)
    }
}

impl From<serde_json::Value> for Arg {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;

        match v {
            Value::Null => Arg::Null,
            Value::Bool(b) => Arg::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map(Arg::Int)
                .or_else(|| n.as_f64().map(Arg::Float))
                .unwrap_or_else(|| Arg::Str(n.to_string())),
            Value::String(s) => Arg::Str(s),
            Value::Array(items) => Arg::list(items),
            Value::Object(map) => Arg::Map(
                map.into_iter()
                    .map(|(k, v)| (Arg::Str(k), Arg::from(v)))
                    .collect(),
            ),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALL ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// One invocation's arguments: a positional tuple and a keyword mapping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    /// Positional arguments, in call order.
    pub args: Vec<Arg>,
    /// Keyword arguments. Names are unique; order carries no meaning.
    pub kwargs: Vec<(String, Arg)>,
}

impl CallArgs {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument set with only positional arguments.
    pub fn positional(args: Vec<Arg>) -> Self {
        Self {
            args,
            kwargs: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Arg>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing an earlier value under the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.kwargs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.kwargs.push((name, value)),
        }
        self
    }

    /// Positional argument at `index`.
    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    /// Keyword argument named `name`.
    pub fn get_kw(&self, name: &str) -> Option<&Arg> {
        self.kwargs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Returns a copy without the ignored positions and keyword names.
    ///
    /// Positions refer to the original call; remaining arguments keep their
    /// relative order.
    pub fn filtered(&self, ignore_positionals: &[usize], ignore_kw: &[String]) -> CallArgs {
        let args = self
            .args
            .iter()
            .enumerate()
            .filter(|(i, _)| !ignore_positionals.contains(i))
            .map(|(_, a)| a.clone())
            .collect();
        let kwargs = self
            .kwargs
            .iter()
            .filter(|(k, _)| !ignore_kw.iter().any(|ignored| ignored == k))
            .cloned()
            .collect();
        CallArgs { args, kwargs }
    }

    /// Returns true when there are no arguments at all.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}
