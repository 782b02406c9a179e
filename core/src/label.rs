use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Attribute keys written by the built-in algorithms.
///
/// | key            | owner | written by                         |
/// |----------------|-------|------------------------------------|
/// | `out_degree`   | node  | out-degree (and PageRank setup)    |
/// | `cc`           | node  | connected components               |
/// | `halt`         | node  | connected components, PageRank     |
/// | `page_rank`    | node  | PageRank                           |
/// | `traffic_prop` | edge  | PageRank setup, after `out_degree` |
pub mod keys {
    pub const CC: &str = "cc";
    pub const HALT: &str = "halt";
    pub const PAGE_RANK: &str = "page_rank";
    pub const OUT_DEGREE: &str = "out_degree";
    pub const TRAFFIC_PROP: &str = "traffic_prop";
    /// Wrapped payload stored by [`super::Label::wrap_node`] / [`super::Label::wrap_edge`].
    pub const DATA: &str = "data";
}

/// Connected-component label: unique per node, totally ordered by
/// `(name, uid)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentTag {
    pub name: String,
    pub uid: u64,
}

impl fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.uid)
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Component(ComponentTag),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Component(_) => "component",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Component(c) => write!(f, "{}", c),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<ComponentTag> for Value {
    fn from(v: ComponentTag) -> Self {
        Value::Component(v)
    }
}

/// Named, mutable attribute bag attached to every node and edge.
///
/// The name is fixed at construction. Attributes are read through typed
/// accessors that fail on absent keys rather than defaulting, so an
/// algorithm that runs before its initialization step surfaces as
/// [`GraphError::MissingAttribute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    name: String,
    attrs: BTreeMap<String, Value>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder form of [`Label::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Wrap a node identity: named after its rendering, with the
    /// rendering also stored under `data`. Handy as a projection node map.
    pub fn wrap_node<T: fmt::Display + ?Sized>(node: &T) -> Self {
        let rendered = node.to_string();
        Label::new(rendered.clone()).with(keys::DATA, rendered)
    }

    /// Wrap an edge label: named after the old label's name, with the old
    /// name stored under `data`. Endpoints are ignored.
    pub fn wrap_edge<T: fmt::Display + ?Sized>(_src: &T, _dst: &T, edge: &Label) -> Self {
        Label::new(edge.name()).with(keys::DATA, edge.name())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.attrs
            .get(key)
            .ok_or_else(|| GraphError::MissingAttribute {
                key: key.to_string(),
                label: self.name.clone(),
            })
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(type_error(key, "bool", other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            Value::Int(i) => Ok(*i),
            other => Err(type_error(key, "int", other)),
        }
    }

    /// Floats are returned as-is; integers widen.
    pub fn get_float(&self, key: &str) -> Result<f64> {
        match self.get(key)? {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            other => Err(type_error(key, "float", other)),
        }
    }

    pub fn get_text(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            Value::Text(s) => Ok(s),
            other => Err(type_error(key, "text", other)),
        }
    }

    pub fn get_component(&self, key: &str) -> Result<&ComponentTag> {
        match self.get(key)? {
            Value::Component(c) => Ok(c),
            other => Err(type_error(key, "component", other)),
        }
    }
}

fn type_error(key: &str, expected: &'static str, found: &Value) -> GraphError {
    GraphError::AttributeType {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} : {{", self.name)?;
        for (i, (k, v)) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut l = Label::new("A");
        l.set(keys::PAGE_RANK, 1.0);
        l.set(keys::HALT, false);
        l.set(keys::OUT_DEGREE, 3i64);
        assert_eq!(l.name(), "A");
        assert_eq!(l.get_float(keys::PAGE_RANK).unwrap(), 1.0);
        assert!(!l.get_bool(keys::HALT).unwrap());
        assert_eq!(l.get_int(keys::OUT_DEGREE).unwrap(), 3);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let l = Label::new("A");
        match l.get_float(keys::PAGE_RANK) {
            Err(GraphError::MissingAttribute { key, label }) => {
                assert_eq!(key, "page_rank");
                assert_eq!(label, "A");
            }
            other => panic!("expected MissingAttribute, got {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch() {
        let l = Label::new("A").with(keys::HALT, 1i64);
        match l.get_bool(keys::HALT) {
            Err(GraphError::AttributeType { expected, found, .. }) => {
                assert_eq!(expected, "bool");
                assert_eq!(found, "int");
            }
            other => panic!("expected AttributeType, got {:?}", other),
        }
    }

    #[test]
    fn test_int_widens_to_float() {
        let l = Label::new("A").with("w", 2i64);
        assert_eq!(l.get_float("w").unwrap(), 2.0);
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut l = Label::new("A");
        l.set(keys::HALT, true);
        l.set(keys::HALT, false);
        assert_eq!(l.attrs().count(), 1);
        assert!(!l.get_bool(keys::HALT).unwrap());
    }

    #[test]
    fn test_component_order_name_then_uid() {
        let a1 = ComponentTag { name: "A".into(), uid: 7 };
        let a2 = ComponentTag { name: "A".into(), uid: 9 };
        let b0 = ComponentTag { name: "B".into(), uid: 0 };
        assert!(a1 < a2);
        assert!(a2 < b0);
    }

    #[test]
    fn test_wrappers() {
        let n = Label::wrap_node(&42u64);
        assert_eq!(n.name(), "42");
        assert_eq!(n.get_text(keys::DATA).unwrap(), "42");

        let e = Label::wrap_edge(&1u64, &2u64, &Label::new("SUPPORTS"));
        assert_eq!(e.name(), "SUPPORTS");
        assert_eq!(e.get_text(keys::DATA).unwrap(), "SUPPORTS");
    }

    #[test]
    fn test_display() {
        let l = Label::new("A").with(keys::HALT, true);
        assert_eq!(l.to_string(), "\"A\" : {\"halt\": true}");
    }
}
