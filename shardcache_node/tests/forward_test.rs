use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shardcache_node::bootstrap::seed_cluster;
use shardcache_node::{CacheNode, Node};
use shardcache_proto::cache::cache_service_server::{CacheService, CacheServiceServer};
use shardcache_proto::cache::{
    DeleteRequest, DeleteResponse, GetRequest, GetResponse, HealthRequest, HealthResponse,
    SetRequest, SetResponse,
};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// Stand-in for a remote node that records every call it receives.
#[derive(Debug, Clone, Default)]
struct RecordingPeer {
    state: Arc<PeerState>,
}

#[derive(Debug, Default)]
struct PeerState {
    gets: AtomicUsize,
    sets: AtomicUsize,
    dels: AtomicUsize,
    healths: AtomicUsize,
    entries: Mutex<HashMap<String, String>>,
}

#[tonic::async_trait]
impl CacheService for RecordingPeer {
    async fn get(&self, request: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        self.state.gets.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        let entries = self.state.entries.lock().unwrap();
        match entries.get(&req.key) {
            Some(value) => Ok(Response::new(GetResponse {
                found: true,
                value: value.clone(),
            })),
            None => Ok(Response::new(GetResponse {
                found: false,
                value: String::new(),
            })),
        }
    }

    async fn set(&self, request: Request<SetRequest>) -> Result<Response<SetResponse>, Status> {
        self.state.sets.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        self.state
            .entries
            .lock()
            .unwrap()
            .insert(req.key, req.value);
        Ok(Response::new(SetResponse { success: true }))
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        self.state.dels.fetch_add(1, Ordering::SeqCst);
        let req = request.into_inner();
        let success = self.state.entries.lock().unwrap().remove(&req.key).is_some();
        Ok(Response::new(DeleteResponse { success }))
    }

    async fn health(
        &self,
        _request: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        self.state.healths.fetch_add(1, Ordering::SeqCst);
        Ok(Response::new(HealthResponse {
            healthy: true,
            node_id: "peer".to_string(),
        }))
    }
}

async fn start_recording_peer() -> (RecordingPeer, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = RecordingPeer::default();
    let peer_clone = peer.clone();
    tokio::spawn(async move {
        Server::builder()
            .add_service(CacheServiceServer::new(peer_clone))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    (peer, addr)
}

fn local_node() -> CacheNode {
    CacheNode::new(Node::new(
        "local".to_string(),
        "127.0.0.1".to_string(),
        50051,
        9527,
    ))
}

fn first_key_owned_by(node: &CacheNode, owner_id: &str) -> String {
    (0..)
        .map(|i| format!("probe-{}", i))
        .find(|key| {
            node.ring
                .node_for_key(key)
                .map(|owner| owner.id == owner_id)
                .unwrap_or(false)
        })
        .expect("some key maps to every node")
}

#[tokio::test]
async fn remote_keys_go_over_rpc_exactly_once() {
    let (peer, peer_addr) = start_recording_peer().await;

    let local = local_node();
    local.add_node(Node::new(
        "peer".to_string(),
        "127.0.0.1".to_string(),
        peer_addr.port(),
        0,
    ));

    let key = first_key_owned_by(&local, "peer");

    assert!(local.set(&key, "forwarded").await);
    assert_eq!(peer.state.sets.load(Ordering::SeqCst), 1);
    assert_eq!(local.store.len(), 0, "value must not land on the caller");
    assert_eq!(
        peer.state.entries.lock().unwrap().get(&key).map(String::as_str),
        Some("forwarded")
    );

    assert_eq!(local.get(&key).await.as_deref(), Some("forwarded"));
    assert_eq!(peer.state.gets.load(Ordering::SeqCst), 1);

    assert!(local.del(&key).await);
    assert!(!local.del(&key).await);
    assert_eq!(peer.state.dels.load(Ordering::SeqCst), 2);
    assert!(peer.state.entries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn local_keys_never_touch_the_peer() {
    let (peer, peer_addr) = start_recording_peer().await;

    let local = local_node();
    local.add_node(Node::new(
        "peer".to_string(),
        "127.0.0.1".to_string(),
        peer_addr.port(),
        0,
    ));

    let key = first_key_owned_by(&local, "local");

    assert!(local.set(&key, "kept here").await);
    assert_eq!(local.get(&key).await.as_deref(), Some("kept here"));
    assert!(local.del(&key).await);

    assert_eq!(peer.state.sets.load(Ordering::SeqCst), 0);
    assert_eq!(peer.state.gets.load(Ordering::SeqCst), 0);
    assert_eq!(peer.state.dels.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_peer_collapses_to_failure() {
    // Grab a port that nothing is listening on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = listener.local_addr().unwrap().port();
    drop(listener);

    let local = local_node();
    local.add_node(Node::new(
        "ghost".to_string(),
        "127.0.0.1".to_string(),
        dead_port,
        0,
    ));

    let key = first_key_owned_by(&local, "ghost");

    assert!(!local.set(&key, "lost").await);
    assert_eq!(local.get(&key).await, None);
    assert!(!local.del(&key).await);
    let ghost = local.ring.node_for_key(&key).unwrap();
    assert!(!local.peers.health(&ghost).await);
    assert_eq!(local.store.len(), 0);
}

#[tokio::test]
async fn seeding_registers_peers_after_the_delay() {
    let (peer, peer_addr) = start_recording_peer().await;

    let local = Arc::new(local_node());
    let peer_info = Node::new(
        "peer".to_string(),
        "127.0.0.1".to_string(),
        peer_addr.port(),
        0,
    );

    assert_eq!(local.ring.node_count(), 1);
    seed_cluster(local.clone(), vec![peer_info]).await;

    assert!(local.ring.has_node("peer"));
    assert_eq!(local.ring.node_count(), 2);
    assert_eq!(peer.state.healths.load(Ordering::SeqCst), 1);
}
