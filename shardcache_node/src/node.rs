use std::sync::Arc;

use tonic::{Request, Response, Status};

use shardcache_proto::cache::cache_service_server::CacheService;
use shardcache_proto::cache::{
    DeleteRequest, DeleteResponse, GetRequest, GetResponse, HealthRequest, HealthResponse,
    SetRequest, SetResponse,
};

use crate::constants::VIRTUAL_NODES;
use crate::ring::{HashRing, Node, RingError};
use crate::rpc::PeerClient;
use crate::store::LocalStore;

/// One cache process: the local share of the keyspace plus the routing
/// state needed to reach every other share. `get`/`set`/`del` resolve the
/// owner through the ring and either touch the local store or make a
/// single peer call; a failed call is a failed operation, never a retry.
#[derive(Debug)]
pub struct CacheNode {
    pub info: Node,
    pub ring: HashRing,
    pub store: LocalStore,
    pub peers: PeerClient,
}

impl CacheNode {
    /// Creates a node that initially owns the whole keyspace: the ring
    /// starts with just this node registered.
    pub fn new(info: Node) -> Self {
        let ring = HashRing::new(VIRTUAL_NODES);
        ring.add_node(info.clone());
        CacheNode {
            info,
            ring,
            store: LocalStore::new(),
            peers: PeerClient::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.info.id
    }

    pub fn add_node(&self, node: Node) {
        log::info!("Adding node {} at {} to the ring", node.id, node.rpc_addr());
        self.ring.add_node(node);
    }

    pub fn remove_node(&self, node_id: &str) {
        log::info!("Removing node {} from the ring", node_id);
        self.ring.remove_node(node_id);
    }

    /// Owner of the key when it is another node, `None` when this node
    /// should serve it. An empty ring fails open and treats the key as
    /// local.
    pub fn remote_owner(&self, key: &str) -> Option<Node> {
        match self.ring.node_for_key(key) {
            Ok(owner) => {
                if owner.id == self.info.id {
                    None
                } else {
                    Some(owner)
                }
            }
            Err(RingError::NoNodesAvailable) => {
                log::warn!("Ring is empty, treating key '{}' as local", key);
                None
            }
        }
    }

    pub fn is_local_key(&self, key: &str) -> bool {
        self.remote_owner(key).is_none()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match self.remote_owner(key) {
            None => self.get_local(key),
            Some(owner) => {
                log::debug!("Forwarding get for '{}' to {}", key, owner.id);
                self.peers.get(&owner, key).await
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> bool {
        match self.remote_owner(key) {
            None => self.set_local(key, value),
            Some(owner) => {
                log::debug!("Forwarding set for '{}' to {}", key, owner.id);
                self.peers.set(&owner, key, value).await
            }
        }
    }

    pub async fn del(&self, key: &str) -> bool {
        match self.remote_owner(key) {
            None => self.del_local(key),
            Some(owner) => {
                log::debug!("Forwarding delete for '{}' to {}", key, owner.id);
                self.peers.del(&owner, key).await
            }
        }
    }

    // Local-only variants back the RPC handlers and skip the ring.

    pub fn get_local(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    pub fn set_local(&self, key: &str, value: &str) -> bool {
        self.store.insert(key.to_string(), value.to_string());
        true
    }

    pub fn del_local(&self, key: &str) -> bool {
        self.store.remove(key)
    }
}

/// gRPC surface of a node. Handlers touch the local store only: the
/// calling peer already resolved ownership, and routing again here could
/// bounce a request between nodes.
#[derive(Debug, Clone)]
pub struct CacheRpc {
    node: Arc<CacheNode>,
}

impl CacheRpc {
    pub fn new(node: Arc<CacheNode>) -> Self {
        CacheRpc { node }
    }
}

#[tonic::async_trait]
impl CacheService for CacheRpc {
    async fn get(&self, request: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        let req = request.into_inner();
        match self.node.get_local(&req.key) {
            Some(value) => Ok(Response::new(GetResponse { found: true, value })),
            None => Ok(Response::new(GetResponse {
                found: false,
                value: String::new(),
            })),
        }
    }

    async fn set(&self, request: Request<SetRequest>) -> Result<Response<SetResponse>, Status> {
        let req = request.into_inner();
        let success = self.node.set_local(&req.key, &req.value);
        Ok(Response::new(SetResponse { success }))
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let req = request.into_inner();
        let success = self.node.del_local(&req.key);
        Ok(Response::new(DeleteResponse { success }))
    }

    async fn health(
        &self,
        _request: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        Ok(Response::new(HealthResponse {
            healthy: true,
            node_id: self.node.node_id().to_string(),
        }))
    }
}
