//! The Value type - a persistent, structurally shared tree.
//!
//! Containers are `imbl` collections: cloning a `Value` is cheap, and every
//! write returns a new tree that shares all untouched branches with the old
//! one. That sharing is what [`Same`] observes.

use std::fmt;
use std::ops::ControlFlow;

use arbor_cursor::{Same, Tree};
use imbl::{OrdMap, Vector};

use crate::{Key, ValueError};

/// Arrays up to this length are compared element by element when their
/// storage differs.
const ELEMENTWISE_SAME_LIMIT: usize = 8;

/// A tree-shaped value addressed by cursors.
///
/// It maps directly to JSON. Maps keep their entries sorted by key, so
/// iteration order is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value. Distinct from "path doesn't exist".
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vector<Value>),
    Map(OrdMap<String, Value>),
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(OrdMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vector::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Number of direct children; zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => 0,
        }
    }

    /// Check if this value has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A direct child, borrowed.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        child(self, &key.into())
    }

    /// A new value with `value` stored under `key`.
    ///
    /// # Errors
    ///
    /// Same as [`Tree::set_in`] for a one-key path.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<Value, ValueError> {
        self.set_in(&[key.into()], value.into())
    }

    /// A new value without the child under `key`.
    pub fn without(&self, key: impl Into<Key>) -> Value {
        match self.delete_in(&[key.into()]) {
            Ok(value) => value,
            Err(_) => self.clone(),
        }
    }
}

fn child<'a>(value: &'a Value, key: &Key) -> Option<&'a Value> {
    match value {
        Value::Map(map) => map.get(key.as_name().as_ref()),
        Value::Array(items) => items.get(key.as_index()?),
        _ => None,
    }
}

impl Same for Value {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.ptr_eq(b)
                    || (a.len() == b.len()
                        && a.len() <= ELEMENTWISE_SAME_LIMIT
                        && a.iter().zip(b.iter()).all(|(x, y)| x.same(y)))
            }
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b) || (a.is_empty() && b.is_empty()),
            _ => false,
        }
    }
}

impl Tree for Value {
    type Key = Key;
    type Error = ValueError;

    fn get_in(&self, path: &[Key]) -> Option<Value> {
        let mut current = self;
        for key in path {
            current = child(current, key)?;
        }
        Some(current.clone())
    }

    /// Missing map entries along the way are created as empty maps. An array
    /// index equal to the length appends.
    fn set_in(&self, path: &[Key], value: Value) -> Result<Value, ValueError> {
        let Some((key, rest)) = path.split_first() else {
            return Ok(value);
        };

        match self {
            Value::Map(map) => {
                let name = key.as_name();
                let updated = match map.get(name.as_ref()) {
                    Some(existing) => {
                        let updated = existing.set_in(rest, value)?;
                        if updated.same(existing) {
                            return Ok(self.clone());
                        }
                        updated
                    }
                    None => Value::map().set_in(rest, value)?,
                };
                Ok(Value::Map(map.update(name.into_owned(), updated)))
            }
            Value::Array(items) => {
                let index = key
                    .as_index()
                    .ok_or_else(|| ValueError::InvalidIndex { key: key.clone() })?;
                match items.get(index) {
                    Some(existing) => {
                        let updated = existing.set_in(rest, value)?;
                        if updated.same(existing) {
                            return Ok(self.clone());
                        }
                        Ok(Value::Array(items.update(index, updated)))
                    }
                    None if index == items.len() => {
                        let mut items = items.clone();
                        items.push_back(Value::map().set_in(rest, value)?);
                        Ok(Value::Array(items))
                    }
                    None => Err(ValueError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    }),
                }
            }
            _ => Err(ValueError::NotAContainer { key: key.clone() }),
        }
    }

    /// Deleting an absent path returns `self` unchanged; deleting the empty
    /// path yields `Null`.
    fn delete_in(&self, path: &[Key]) -> Result<Value, ValueError> {
        let Some((key, rest)) = path.split_first() else {
            return Ok(Value::Null);
        };

        match self {
            Value::Map(map) => {
                let name = key.as_name();
                let Some(existing) = map.get(name.as_ref()) else {
                    return Ok(self.clone());
                };
                if rest.is_empty() {
                    return Ok(Value::Map(map.without(name.as_ref())));
                }
                let updated = existing.delete_in(rest)?;
                if updated.same(existing) {
                    return Ok(self.clone());
                }
                Ok(Value::Map(map.update(name.into_owned(), updated)))
            }
            Value::Array(items) => {
                let Some(index) = key.as_index().filter(|index| *index < items.len()) else {
                    return Ok(self.clone());
                };
                if rest.is_empty() {
                    let mut items = items.clone();
                    items.remove(index);
                    return Ok(Value::Array(items));
                }
                let existing = &items[index];
                let updated = existing.delete_in(rest)?;
                if updated.same(existing) {
                    return Ok(self.clone());
                }
                Ok(Value::Array(items.update(index, updated)))
            }
            _ => Ok(self.clone()),
        }
    }

    fn for_each(&self, f: &mut dyn FnMut(Value, Key) -> ControlFlow<()>) -> usize {
        let mut visited = 0;
        match self {
            Value::Map(map) => {
                for (name, value) in map.iter() {
                    visited += 1;
                    if f(value.clone(), Key::Name(name.clone())).is_break() {
                        break;
                    }
                }
            }
            Value::Array(items) => {
                for (index, value) in items.iter().enumerate() {
                    visited += 1;
                    if f(value.clone(), Key::Index(index)).is_break() {
                        break;
                    }
                }
            }
            _ => {}
        }
        visited
    }

    fn fold<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, Value, Key) -> A,
    {
        match self {
            Value::Map(map) => map
                .iter()
                .fold(init, |acc, (name, value)| f(acc, value.clone(), Key::Name(name.clone()))),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .fold(init, |acc, (index, value)| f(acc, value.clone(), Key::Index(index))),
            _ => init,
        }
    }
}

/// Renders the value as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    /// Collect entries into a map.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
