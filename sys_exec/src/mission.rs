//! # Mission Data
//!
//! The mission document is opaque to the controller, it is only stored, checked for emptiness,
//! and handed to the planner. The target is the controller's working goal within the mission.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A mission document as supplied by the mission loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mission(Value);

/// The current goal of the mission.
///
/// Replaced wholesale each time the mission is checked, never merged with the previous target.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    /// Where the robot should move to, set by the planner
    pub location: Option<Location>,

    /// Where the target was sensed, set by the target detector
    pub position: Option<Position>,
}

/// A 2D location for the robot base.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

/// A sensed 3D position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Mission {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Parse a mission from its JSON encoding.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }

    pub fn document(&self) -> &Value {
        &self.0
    }

    /// True if the document carries nothing to do.
    ///
    /// Null, `false`, zero, and empty strings, arrays and objects are all empty. A load returning
    /// an empty mission succeeded but gave the controller no mission to run.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        }
    }
}

impl Target {
    /// A fresh target heading for the given location, with no sensed position.
    pub fn at_location(location: Location) -> Self {
        Self {
            location: Some(location),
            position: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mission_is_empty() {
        for empty in &["null", "false", "0", "0.0", "\"\"", "[]", "{}"] {
            assert!(Mission::from_json(empty).unwrap().is_empty(), "{} should be empty", empty);
        }

        for full in &["true", "3", "\"go\"", "[1]", "{\"tasks\": []}"] {
            assert!(!Mission::from_json(full).unwrap().is_empty(), "{} should not be empty", full);
        }
    }

    #[test]
    fn test_mission_from_json() {
        let mission = Mission::from_json("{\"tasks\": [{\"id\": 1}]}").unwrap();
        assert_eq!(mission.document(), &json!({"tasks": [{"id": 1}]}));

        assert!(Mission::from_json("{\"tasks\": ").is_err());
    }
}
