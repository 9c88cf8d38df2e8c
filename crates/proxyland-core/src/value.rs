#![forbid(unsafe_code)]

//! Dynamic values stored in a reactive data tree.
//!
//! A [`Value`] is either a scalar (null, boolean, number, string) or a shared
//! handle to an observable container ([`ObservableList`], [`ObservableMap`]).
//! Cloning a `Value` never copies a container: both clones refer to the same
//! node, so identity and structural sharing survive reads.
//!
//! # Canonical text
//!
//! Bindings render values through [`Value::to_text`]:
//!
//! | Value | Text |
//! |-------|------|
//! | `Null` | absent (`None`) |
//! | `Bool` | `true` / `false` |
//! | integer | digits |
//! | float of magnitude in `[1e-6, 1e21)` | shortest round-trip decimal, no trailing `.0` |
//! | other float | shortest digits in exponent form (`1e+21`, `1.5e-7`) |
//! | `String` | verbatim |
//! | `List` | elements joined with `,`, `Null` elements empty, nested lists flattened |
//! | `Map` | compact JSON |

use std::fmt;

use serde_json::Number;

use crate::tree::{ObservableList, ObservableMap};

/// A node in a reactive data tree.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Explicit absence.
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Ordered sequence.
    List(ObservableList),
    /// Keyed structure.
    Map(ObservableMap),
}

impl Value {
    /// Whether this value is `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value is a list or a map.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&ObservableList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&ObservableMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Read a field. `None` when the field is missing or this is not a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Read an element. `None` when out of range or this is not a list.
    #[must_use]
    pub fn index(&self, index: usize) -> Option<Value> {
        self.as_list().and_then(|list| list.get(index))
    }

    /// Look up a nested value by JSON pointer (`/nested/list/0`).
    ///
    /// The empty pointer addresses `self`. Tokens use the RFC 6901 escapes
    /// `~1` for `/` and `~0` for `~`.
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<Value> {
        if pointer.is_empty() {
            return Some(self.clone());
        }
        let rest = pointer.strip_prefix('/')?;
        rest.split('/').try_fold(self.clone(), |node, token| {
            let token = token.replace("~1", "/").replace("~0", "~");
            match &node {
                Self::Map(map) => map.get(&token),
                Self::List(list) => parse_index(&token).and_then(|i| list.get(i)),
                _ => None,
            }
        })
    }

    /// Canonical text form, or `None` for `Null`.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Deep snapshot into a plain `serde_json` value.
    ///
    /// Cyclic containers are not supported and recurse without bound.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(list) => list.to_json(),
            Self::Map(map) => map.to_json(),
        }
    }
}

fn parse_index(token: &str) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Render a number the way bindings display it.
#[must_use]
pub fn format_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            return format_float(f);
        }
    }
    n.to_string()
}

/// Positional notation for decimal exponents in `-6..21`, exponent form
/// outside it. `-0` prints as `0`.
fn format_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_owned();
    }
    // `{:e}` yields the shortest round-trip digits, e.g. `-1.2345e-7`.
    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exponent + 1;

    let mut out = String::new();
    if f.is_sign_negative() {
        out.push('-');
    }
    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', (n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-n) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let sign = if n > 0 { '+' } else { '-' };
        out.push_str(&format!("e{sign}{}", (n - 1).abs()));
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(n)),
            Self::String(s) => f.write_str(s),
            Self::List(list) => f.write_str(&list.join(",")),
            Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => numbers_equal(a, b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        match (self, other) {
            (Self::Null, serde_json::Value::Null) => true,
            (Self::Bool(a), serde_json::Value::Bool(b)) => a == b,
            (Self::Number(a), serde_json::Value::Number(b)) => numbers_equal(a, b),
            (Self::String(a), serde_json::Value::String(b)) => a == b,
            (Self::List(list), serde_json::Value::Array(items)) => list.with(|own| {
                own.len() == items.len() && own.iter().zip(items).all(|(a, b)| a == b)
            }),
            (Self::Map(map), serde_json::Value::Object(fields)) => map.with(|own| {
                own.len() == fields.len()
                    && own
                        .iter()
                        .all(|(k, v)| fields.get(k).is_some_and(|other| v == other))
            }),
            _ => false,
        }
    }
}

/// `1` and `1.0` are the same number once displayed.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Self::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Self::Null, Self::Number)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::from(f64::from(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(ObservableList::from_values(items))
    }
}

impl From<ObservableList> for Value {
    fn from(list: ObservableList) -> Self {
        Self::List(list)
    }
}

impl From<ObservableMap> for Value {
    fn from(map: ObservableMap) -> Self {
        Self::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    /// Converts into fresh, detached containers.
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::List(ObservableList::from_values(items)),
            serde_json::Value::Object(fields) => {
                Self::Map(ObservableMap::from_entries(fields.into_iter()))
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(raw: &serde_json::Value) -> Self {
        Self::from(raw.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
