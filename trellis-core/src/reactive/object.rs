//! Reactive Objects
//!
//! A [`ReactiveObject`] is a key-value record whose property accesses are
//! observable. It behaves exactly like the plain record it wraps, with two
//! side effects:
//!
//! - a read of `k` while an effect is running makes that effect a dependent
//!   of `(object, k)`;
//! - a write of `k` with a different value re-runs every dependent of
//!   `(object, k)` before returning.
//!
//! Reads of missing keys are tracked too, so an effect that looked for a key
//! re-runs once the key is written.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value as Json};

use super::id::ObjectId;
use super::tracker::Tracker;
use crate::error::Result;
use crate::value::Value;

struct ObjectInner {
    id: ObjectId,
    fields: RwLock<IndexMap<String, Value>>,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        Tracker::release_object(self.id);
    }
}

/// A tracked key-value record.
///
/// Clones share the same fields and identity.
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Arc<ObjectInner>,
}

impl ReactiveObject {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: ObjectId::new(),
                fields: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Builder-style initial field. Does not trigger anything.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.fields.write().insert(key.into(), value.into());
        self
    }

    /// Get the object's identity.
    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    /// Read a property, registering the running effect as a dependent.
    pub fn get(&self, key: &str) -> Option<Value> {
        Tracker::track(self.inner.id, key);
        self.get_untracked(key)
    }

    /// Read a property without tracking.
    pub fn get_untracked(&self, key: &str) -> Option<Value> {
        self.inner.fields.read().get(key).cloned()
    }

    /// Check for a property, registering the running effect as a dependent.
    pub fn contains_key(&self, key: &str) -> bool {
        Tracker::track(self.inner.id, key);
        self.inner.fields.read().contains_key(key)
    }

    /// Write a property and re-run its dependents.
    ///
    /// Writing a value equal to the stored one does not re-run anything.
    /// The value is stored even if a dependent fails; the first failure is
    /// returned.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        let changed = {
            let mut fields = self.inner.fields.write();
            match fields.get(&key) {
                Some(current) if *current == value => false,
                _ => {
                    fields.insert(key.clone(), value);
                    true
                }
            }
        };

        if changed {
            Tracker::trigger(self.inner.id, &key)
        } else {
            Ok(())
        }
    }

    /// Write a property computed from its current value.
    pub fn update<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let next = {
            let fields = self.inner.fields.read();
            f(fields.get(key))
        };
        self.set(key, next)
    }

    /// Remove a property and re-run its dependents if it existed.
    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        let removed = self.inner.fields.write().shift_remove(key);
        if removed.is_some() {
            Tracker::trigger(self.inner.id, key)?;
        }
        Ok(removed)
    }

    /// Property names in insertion order. Not tracked.
    pub fn keys(&self) -> Vec<String> {
        self.inner.fields.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.read().is_empty()
    }

    /// Snapshot the data fields as a JSON object. Handlers and node
    /// references are skipped. Not tracked.
    pub fn to_json(&self) -> Json {
        let fields = self.inner.fields.read();
        let map: Map<String, Json> = fields
            .iter()
            .filter_map(|(k, v)| v.as_data().map(|data| (k.clone(), data.clone())))
            .collect();
        Json::Object(map)
    }
}

impl Default for ReactiveObject {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ReactiveObject
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ReactiveObject::new(), |object, (k, v)| object.with(k, v))
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("id", &self.inner.id)
            .field("fields", &*self.inner.fields.read())
            .finish()
    }
}
