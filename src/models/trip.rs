use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_COMPLETED: &str = "completed";
pub const UNASSIGNED: &str = "unassigned";

/// Opaque identifier as sent by the trip API: either a JSON integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Text(String),
}

impl Identifier {
    /// Zero and empty text count as no identifier at all.
    pub fn is_unset(&self) -> bool {
        match self {
            Identifier::Int(value) => *value == 0,
            Identifier::Text(text) => text.trim().is_empty(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(value) => write!(f, "{value}"),
            Identifier::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Int(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Identifier,
    pub passenger_id: Identifier,
    #[serde(default)]
    pub driver_id: Option<Identifier>,
    pub status: String,
    /// Fields this client does not interpret (coordinates, timestamps, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trip {
    /// Row key; also the path segment used by the admin page.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn driver_text(&self) -> String {
        self.driver_id
            .as_ref()
            .filter(|driver| !driver.is_unset())
            .map(|driver| driver.to_string())
            .unwrap_or_else(|| UNASSIGNED.to_string())
    }

    pub fn with_status(&self, status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..self.clone()
        }
    }
}
