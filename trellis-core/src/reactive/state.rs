//! State bags returned by component setup.
//!
//! A component's setup may return plain data or a reactive record. Both are
//! accessed through the same `get`/`set` interface; only the reactive store
//! records dependencies and re-runs effects.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::object::ReactiveObject;
use crate::error::Result;
use crate::value::Value;

/// A key-value store with either plain or tracked backing.
#[derive(Clone, Debug)]
pub enum State {
    /// Untracked record. Writes never re-run anything.
    Plain(Arc<RwLock<IndexMap<String, Value>>>),
    /// Tracked record.
    Reactive(ReactiveObject),
}

impl State {
    /// An empty plain store.
    pub fn plain() -> Self {
        State::Plain(Arc::new(RwLock::new(IndexMap::new())))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            State::Plain(fields) => fields.read().get(key).cloned(),
            State::Reactive(object) => object.get(key),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            State::Plain(fields) => fields.read().contains_key(key),
            State::Reactive(object) => object.contains_key(key),
        }
    }

    /// Write a key. For reactive state this re-runs dependents.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        match self {
            State::Plain(fields) => {
                fields.write().insert(key.into(), value.into());
                Ok(())
            }
            State::Reactive(object) => object.set(key, value),
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, State::Reactive(_))
    }

    pub fn as_reactive(&self) -> Option<&ReactiveObject> {
        match self {
            State::Reactive(object) => Some(object),
            State::Plain(_) => None,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::plain()
    }
}

impl From<ReactiveObject> for State {
    fn from(object: ReactiveObject) -> Self {
        State::Reactive(object)
    }
}

impl<K, V> FromIterator<(K, V)> for State
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        State::Plain(Arc::new(RwLock::new(fields)))
    }
}
