use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tonic::Request;

use shardcache_proto::cache::cache_service_client::CacheServiceClient;
use shardcache_proto::cache::{DeleteRequest, GetRequest, HealthRequest, SetRequest};

use crate::constants::{RPC_CONNECT_TIMEOUT_MS, RPC_TIMEOUT_MS};
use crate::ring::Node;

/// Outbound side of the node-to-node protocol. One lazily created client
/// per peer address, shared by every call to that peer; tonic channels
/// multiplex concurrent requests. Failures collapse to `None`/`false` so
/// callers see the same shape as a miss. Single attempt, no retries.
#[derive(Debug, Default)]
pub struct PeerClient {
    clients: Mutex<HashMap<String, CacheServiceClient<Channel>>>,
}

impl PeerClient {
    pub fn new() -> Self {
        PeerClient::default()
    }

    // The lock covers lookup-or-create only, never the call itself.
    // `connect_lazy` defers the actual dial to the first request.
    fn client_for(&self, addr: &str) -> Option<CacheServiceClient<Channel>> {
        let mut clients = self.clients.lock().unwrap();
        if let Some(client) = clients.get(addr) {
            return Some(client.clone());
        }

        let endpoint = match Endpoint::from_shared(format!("http://{}", addr)) {
            Ok(endpoint) => endpoint
                .connect_timeout(Duration::from_millis(RPC_CONNECT_TIMEOUT_MS))
                .timeout(Duration::from_millis(RPC_TIMEOUT_MS)),
            Err(e) => {
                log::warn!("Invalid peer address {}: {}", addr, e);
                return None;
            }
        };

        let client = CacheServiceClient::new(endpoint.connect_lazy());
        clients.insert(addr.to_string(), client.clone());
        Some(client)
    }

    pub async fn get(&self, node: &Node, key: &str) -> Option<String> {
        let mut client = self.client_for(&node.rpc_addr())?;
        let request = Request::new(GetRequest {
            key: key.to_string(),
        });
        match client.get(request).await {
            Ok(response) => {
                let resp = response.into_inner();
                if resp.found {
                    Some(resp.value)
                } else {
                    None
                }
            }
            Err(e) => {
                log::warn!("Get on peer {} failed: {}", node.id, e);
                None
            }
        }
    }

    pub async fn set(&self, node: &Node, key: &str, value: &str) -> bool {
        let mut client = match self.client_for(&node.rpc_addr()) {
            Some(client) => client,
            None => return false,
        };
        let request = Request::new(SetRequest {
            key: key.to_string(),
            value: value.to_string(),
        });
        match client.set(request).await {
            Ok(response) => response.into_inner().success,
            Err(e) => {
                log::warn!("Set on peer {} failed: {}", node.id, e);
                false
            }
        }
    }

    pub async fn del(&self, node: &Node, key: &str) -> bool {
        let mut client = match self.client_for(&node.rpc_addr()) {
            Some(client) => client,
            None => return false,
        };
        let request = Request::new(DeleteRequest {
            key: key.to_string(),
        });
        match client.delete(request).await {
            Ok(response) => response.into_inner().success,
            Err(e) => {
                log::warn!("Delete on peer {} failed: {}", node.id, e);
                false
            }
        }
    }

    pub async fn health(&self, node: &Node) -> bool {
        let mut client = match self.client_for(&node.rpc_addr()) {
            Some(client) => client,
            None => return false,
        };
        match client.health(Request::new(HealthRequest {})).await {
            Ok(response) => response.into_inner().healthy,
            Err(e) => {
                log::warn!("Health check on peer {} failed: {}", node.id, e);
                false
            }
        }
    }
}
