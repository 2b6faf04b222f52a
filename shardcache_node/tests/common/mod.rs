use std::sync::Arc;
use std::time::Duration;

use shardcache_node::{CacheNode, CacheRpc, Node};
use shardcache_proto::cache::cache_service_server::CacheServiceServer;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

/// Helper to start a node with a live RPC server on an ephemeral port.
/// Returns the node Arc and a JoinHandle to the server task.
pub async fn start_node(id: &str) -> (Arc<CacheNode>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let info = Node::new(id.to_string(), "127.0.0.1".to_string(), port, 0);
    let node = Arc::new(CacheNode::new(info));

    let node_clone = node.clone();
    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(CacheServiceServer::new(CacheRpc::new(node_clone)))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(200)).await;
    (node, handle)
}

/// Registers every node in every other node's ring.
pub fn link_cluster(nodes: &[Arc<CacheNode>]) {
    for node in nodes {
        for other in nodes {
            if other.info.id != node.info.id {
                node.add_node(other.info.clone());
            }
        }
    }
}
