//! Values stored in reactive records and passed as props.
//!
//! A [`Value`] is either plain data (any JSON value), an event [`Handler`],
//! or a reference to a host node. Data compares structurally; handlers
//! compare by identity, so re-rendering with the same handler is not a prop
//! change while a freshly created closure is.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::error::Result;
use crate::host::HostNode;

type HandlerFn = dyn Fn() -> Result<()> + Send + Sync;

/// A shared event callback.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    /// Wrap a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self) -> Result<()> {
        (self.0)()
    }

    /// Check whether two handlers wrap the same callback.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// A value held by a reactive record, a state bag, or a prop.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Plain data.
    Data(Json),
    /// An event callback.
    Handler(Handler),
    /// A mounted host node.
    Node(HostNode),
}

impl Value {
    /// The JSON `null` value.
    pub fn null() -> Self {
        Value::Data(Json::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Data(Json::Null))
    }

    pub fn as_data(&self) -> Option<&Json> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(Json::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_data().and_then(Json::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_data().and_then(Json::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(Json::as_str)
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<HostNode> {
        match self {
            Value::Node(node) => Some(*node),
            _ => None,
        }
    }

    /// Render the value as text content.
    ///
    /// Strings are emitted without quotes and `null` as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Data(Json::Null) => String::new(),
            Value::Data(Json::String(s)) => s.clone(),
            Value::Data(other) => other.to_string(),
            Value::Handler(_) => "[handler]".to_string(),
            Value::Node(node) => node.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

macro_rules! impl_from_data {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Data(Json::from(value))
                }
            }
        )*
    };
}

impl_from_data!(i32, i64, u32, u64, usize, f64, bool, String, &str);

impl From<Json> for Value {
    fn from(value: Json) -> Self {
        Value::Data(value)
    }
}

impl From<Handler> for Value {
    fn from(handler: Handler) -> Self {
        Value::Handler(handler)
    }
}

impl From<HostNode> for Value {
    fn from(node: HostNode) -> Self {
        Value::Node(node)
    }
}

/// An insertion-ordered property bag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props(IndexMap<String, Value>);

impl Props {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Snapshot of the data props as a JSON object. Handlers and node
    /// references are left out.
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.0
                .iter()
                .filter_map(|(k, v)| v.as_data().map(|data| (k.clone(), data.clone())))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for Props
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Build a [`Props`] bag.
///
/// ```rust,ignore
/// let props = props! { "id" => "app", "count" => 3 };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Props::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::Props::new();
        $(props.insert($key, $value);)+
        props
    }};
}
