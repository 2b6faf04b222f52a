use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;

use shardcache_proto::hash_key;

/// A member of the cluster. Descriptors are immutable; membership changes
/// go through the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub host: String,
    pub rpc_port: u16,
    pub gateway_port: u16,
}

impl Node {
    pub fn new(id: String, host: String, rpc_port: u16, gateway_port: u16) -> Self {
        Node {
            id,
            host,
            rpc_port,
            gateway_port,
        }
    }

    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.host, self.rpc_port)
    }

    pub fn gateway_addr(&self) -> String {
        format!("{}:{}", self.host, self.gateway_port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    NoNodesAvailable,
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::NoNodesAvailable => write!(f, "no nodes available"),
        }
    }
}

impl std::error::Error for RingError {}

#[derive(Debug, Default)]
struct RingState {
    // Ring position -> node id. A label collision between two nodes
    // overwrites the earlier entry; collisions are accepted, not corrected.
    positions: BTreeMap<u32, String>,
    nodes: HashMap<String, Node>,
}

/// Consistent-hash ring with virtual nodes. Each member occupies
/// `virtual_nodes` positions, one per label `"{id}#{index}"`, so keys
/// spread evenly even with few members.
#[derive(Debug)]
pub struct HashRing {
    virtual_nodes: usize,
    state: RwLock<RingState>,
}

impl HashRing {
    pub fn new(virtual_nodes: usize) -> Self {
        HashRing {
            virtual_nodes,
            state: RwLock::new(RingState::default()),
        }
    }

    /// Registers a node and inserts its virtual positions. Re-adding an
    /// id is harmless: the same labels hash to the same positions.
    pub fn add_node(&self, node: Node) {
        let mut state = self.state.write().unwrap();
        for index in 0..self.virtual_nodes {
            let position = hash_key(&format!("{}#{}", node.id, index));
            state.positions.insert(position, node.id.clone());
        }
        state.nodes.insert(node.id.clone(), node);
    }

    /// Removes a node and all of its virtual positions. Unknown ids are
    /// a no-op.
    pub fn remove_node(&self, node_id: &str) {
        let mut state = self.state.write().unwrap();
        if !state.nodes.contains_key(node_id) {
            return;
        }
        for index in 0..self.virtual_nodes {
            let position = hash_key(&format!("{}#{}", node_id, index));
            state.positions.remove(&position);
        }
        state.nodes.remove(node_id);
    }

    /// Owner of a key: the first position at or after the key's hash,
    /// wrapping around to the smallest position past the top of the ring.
    pub fn node_for_key(&self, key: &str) -> Result<Node, RingError> {
        let state = self.state.read().unwrap();
        let hash = hash_key(key);
        let (_, node_id) = state
            .positions
            .range(hash..)
            .next()
            .or_else(|| state.positions.iter().next())
            .ok_or(RingError::NoNodesAvailable)?;
        let node = state
            .nodes
            .get(node_id)
            .expect("Ring positions always refer to registered nodes");
        Ok(node.clone())
    }

    pub fn has_node(&self, node_id: &str) -> bool {
        self.state.read().unwrap().nodes.contains_key(node_id)
    }

    pub fn all_nodes(&self) -> Vec<Node> {
        self.state.read().unwrap().nodes.values().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().unwrap().nodes.len()
    }

    /// Number of ring positions currently mapping to a node id.
    pub fn vnode_count(&self, node_id: &str) -> usize {
        let state = self.state.read().unwrap();
        state
            .positions
            .values()
            .filter(|id| id.as_str() == node_id)
            .count()
    }
}
