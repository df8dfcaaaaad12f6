use super::{validate_path, NodeDescriptor, NodeKind, SinkWriteError, StateStore, StateValue};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub common: NodeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateValue>,
}

/// In-process store keeping nodes in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    nodes: IndexMap<String, Node>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        self.nodes.get(path)
    }

    pub fn value(&self, path: &str) -> Option<&serde_json::Value> {
        self.nodes.get(path)?.state.as_ref().map(|state| &state.val)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn ensure_node(&mut self, path: &str, descriptor: &NodeDescriptor) -> Result<bool, SinkWriteError> {
        validate_path(path)?;
        if self.nodes.contains_key(path) {
            return Ok(false);
        }

        debug!("Creating {:?} node {}", descriptor.kind, path);
        self.nodes.insert(
            path.to_string(),
            Node {
                common: descriptor.clone(),
                state: None,
            },
        );
        Ok(true)
    }

    fn write_value(&mut self, path: &str, value: serde_json::Value) -> Result<(), SinkWriteError> {
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| SinkWriteError::UnknownNode(path.to_string()))?;
        if node.common.kind != NodeKind::State {
            return Err(SinkWriteError::NotAState(path.to_string()));
        }

        node.state = Some(StateValue {
            val: value,
            ack: true,
            ts: chrono::Utc::now().timestamp_millis(),
        });
        Ok(())
    }
}
