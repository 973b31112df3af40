//! Typed custom properties attached to tiles, layers, objects, and maps.

use std::collections::HashMap;
use std::fmt;

/// A single custom property value.
///
/// Exactly one payload is active, selected by the type tag the property was
/// declared with in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    /// The document type tag this value was declared with.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

/// Conversion from a [`PropertyValue`] to a Rust type.
///
/// Conversions only succeed when the declared type matches: an `int`
/// property never reads as a float and vice versa.
pub trait FromProperty: Sized {
    fn from_property(value: &PropertyValue) -> Option<Self>;
}

impl FromProperty for i32 {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromProperty for f32 {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl FromProperty for bool {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromProperty for String {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Property table keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property. A later insert under the same name wins.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Typed lookup; `None` when the name is absent or the type differs.
    pub fn get_as<T: FromProperty>(&self, name: &str) -> Option<T> {
        self.0.get(name).and_then(T::from_property)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.get_as(name)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.get_as(name)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get_as(name)
    }

    /// Borrowing text lookup.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
