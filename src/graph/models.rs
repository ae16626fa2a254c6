use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Which edges of a node to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges whose source is the node.
    Outgoing,
    /// Edges whose target is the node.
    Incoming,
}

/// Property value stored in a node's or edge's JSON property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Node in the graph database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub properties: HashMap<String, Value>,
}

impl Node {
    /// Creates a node with a fresh uuid.
    pub fn new(label: &str, properties: HashMap<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            properties,
        }
    }

    pub fn with_id(id: &str, label: &str, properties: HashMap<String, Value>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// Directed, labelled edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub label: String,
    pub properties: HashMap<String, Value>,
}

impl Edge {
    pub fn new(source_id: &str, label: &str, target_id: &str, properties: HashMap<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            label: label.to_string(),
            properties,
        }
    }

    pub fn with_id(
        id: &str,
        source_id: &str,
        label: &str,
        target_id: &str,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: id.to_string(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            label: label.to_string(),
            properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_json_shape() {
        let props = HashMap::from([
            ("entity_id".to_string(), Value::from(3)),
            ("name".to_string(), Value::from("Carol")),
        ]);
        let json = serde_json::to_string(&props).unwrap();
        let back: HashMap<String, Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("entity_id").and_then(Value::as_integer), Some(3));
        assert_eq!(back.get("name").and_then(Value::as_str), Some("Carol"));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(42).as_float(), Some(42.0));
        assert_eq!(Value::from("x").as_integer(), None);
        assert_eq!(Value::from(true).as_boolean(), Some(true));
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_node_and_edge_ids() {
        let node = Node::new("Person", HashMap::new());
        assert_eq!(node.id.len(), 36);
        let edge = Edge::with_id("e1", "a", "AUTHORED", "b", HashMap::new());
        assert_eq!(edge.source_id, "a");
        assert_eq!(edge.target_id, "b");
        assert_eq!(edge.label, "AUTHORED");
    }
}
