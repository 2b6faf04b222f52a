use std::sync::Arc;

use tokio::time::{sleep, Duration};

use crate::constants::BOOTSTRAP_DELAY_MS;
use crate::node::CacheNode;
use crate::ring::Node;

/// Parses a peer given as `id@host:rpc_port:gateway_port`. The host part
/// may itself contain colons, so ports are taken from the right.
pub fn parse_peer(spec: &str) -> Result<Node, String> {
    let invalid = || format!("invalid peer '{}', expected id@host:rpc_port:gateway_port", spec);

    let (id, addr) = spec.split_once('@').ok_or_else(invalid)?;

    let mut parts = addr.rsplitn(3, ':');
    let gateway_port = parts.next().ok_or_else(invalid)?;
    let rpc_port = parts.next().ok_or_else(invalid)?;
    let host = parts.next().ok_or_else(invalid)?;
    if id.is_empty() || host.is_empty() {
        return Err(invalid());
    }

    let rpc_port = rpc_port
        .parse::<u16>()
        .map_err(|_| format!("invalid RPC port in peer '{}'", spec))?;
    let gateway_port = gateway_port
        .parse::<u16>()
        .map_err(|_| format!("invalid gateway port in peer '{}'", spec))?;

    Ok(Node::new(
        id.to_string(),
        host.to_string(),
        rpc_port,
        gateway_port,
    ))
}

/// Registers the configured peers once they have had a chance to come up.
/// A peer that does not answer the health probe is still added: ownership
/// has to agree across the cluster even while a member is starting, and a
/// dead peer simply fails the calls forwarded to it.
pub async fn seed_cluster(node: Arc<CacheNode>, peers: Vec<Node>) {
    if peers.is_empty() {
        return;
    }

    sleep(Duration::from_millis(BOOTSTRAP_DELAY_MS)).await;

    for peer in peers {
        if !node.peers.health(&peer).await {
            log::warn!("Peer {} at {} is not answering yet", peer.id, peer.rpc_addr());
        }
        node.add_node(peer);
    }
    log::info!("Cluster seeding finished, {} nodes known", node.ring.node_count());
}
