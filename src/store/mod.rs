//! Hierarchical key-value state store the readings are published into.
//!
//! Paths are dot separated (`Phone_0123.Kueche.temperature`). Nodes are
//! created once with their metadata, values are overwritten every cycle.

use crate::models::field::{FieldDescriptor, ValueType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum SinkWriteError {
    #[error("invalid state path {0:?}")]
    InvalidPath(String),

    #[error("no node at {0:?}")]
    UnknownNode(String),

    #[error("node {0:?} does not hold a value")]
    NotAState(String),

    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Device,
    Channel,
    State,
}

/// Metadata of a node, written only when the node is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub read: bool,
    pub write: bool,
}

impl NodeDescriptor {
    pub fn device(name: impl Into<String>) -> Self {
        Self::group(NodeKind::Device, name.into())
    }

    pub fn channel(name: impl Into<String>) -> Self {
        Self::group(NodeKind::Channel, name.into())
    }

    fn group(kind: NodeKind, name: String) -> Self {
        Self {
            kind,
            name,
            value_type: None,
            role: None,
            unit: None,
            read: true,
            write: false,
        }
    }

    /// Read-only state node.
    pub fn state(name: impl Into<String>, value_type: ValueType, role: &str, unit: &str) -> Self {
        Self {
            kind: NodeKind::State,
            name: name.into(),
            value_type: Some(value_type),
            role: Some(role.to_string()),
            unit: (!unit.is_empty()).then(|| unit.to_string()),
            read: true,
            write: false,
        }
    }
}

impl From<&FieldDescriptor> for NodeDescriptor {
    fn from(descriptor: &FieldDescriptor) -> Self {
        NodeDescriptor::state(
            descriptor.name.clone(),
            descriptor.value_type,
            descriptor.role,
            descriptor.unit,
        )
    }
}

/// Current value of a state node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateValue {
    pub val: serde_json::Value,
    /// Set for every value written by the poller: it is the authoritative source.
    pub ack: bool,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}

/// Write side of the state store.
pub trait StateStore {
    /// Creates the node at `path` unless it already exists. Returns whether
    /// it was created.
    fn ensure_node(&mut self, path: &str, descriptor: &NodeDescriptor) -> Result<bool, SinkWriteError>;

    /// Sets the acknowledged value of an existing state node.
    fn write_value(&mut self, path: &str, value: serde_json::Value) -> Result<(), SinkWriteError>;

    /// Persists pending changes. Stores without a backing medium do nothing.
    fn flush(&mut self) -> Result<(), SinkWriteError> {
        Ok(())
    }
}

/// Checks that every dot separated segment is non-empty and only uses
/// `[A-Za-z0-9_-]`.
pub fn validate_path(path: &str) -> Result<(), SinkWriteError> {
    let valid = !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });

    if valid {
        Ok(())
    } else {
        Err(SinkWriteError::InvalidPath(path.to_string()))
    }
}
