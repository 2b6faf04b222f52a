use clap::Parser;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use shardcache_node::bootstrap::{self, parse_peer};
use shardcache_node::constants::{DEFAULT_GATEWAY_PORT, DEFAULT_HOST, DEFAULT_RPC_PORT};
use shardcache_node::gateway;
use shardcache_node::{CacheNode, CacheRpc, Node};
use shardcache_proto::cache::cache_service_server::CacheServiceServer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Unique identifier of this node
    #[arg(short, long, default_value = "server1")]
    node_id: String,

    /// Host to bind both listeners on
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port of the node-to-node RPC server
    #[arg(short, long, default_value_t = DEFAULT_RPC_PORT)]
    rpc_port: u16,

    /// Port of the HTTP gateway
    #[arg(short, long, default_value_t = DEFAULT_GATEWAY_PORT)]
    gateway_port: u16,

    /// Peer to register at startup, as id@host:rpc_port:gateway_port (repeatable)
    #[arg(short, long, value_parser = parse_peer)]
    peer: Vec<Node>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let info = Node::new(args.node_id, args.host, args.rpc_port, args.gateway_port);
    let node = Arc::new(CacheNode::new(info.clone()));

    println!(
        "Node {} starting, RPC on {}, gateway on {}",
        info.id,
        info.rpc_addr(),
        info.gateway_addr()
    );

    tokio::spawn(bootstrap::seed_cluster(node.clone(), args.peer));

    // One channel stops both servers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let rpc_listener = TcpListener::bind(info.rpc_addr()).await?;
    let gateway_listener = TcpListener::bind(info.gateway_addr()).await?;

    let mut rpc_shutdown = shutdown_rx.clone();
    let rpc_server = Server::builder()
        .add_service(CacheServiceServer::new(CacheRpc::new(node.clone())))
        .serve_with_incoming_shutdown(TcpListenerStream::new(rpc_listener), async move {
            let _ = rpc_shutdown.changed().await;
        });

    let mut gateway_shutdown = shutdown_rx;
    let gateway_server =
        axum::serve(gateway_listener, gateway::router(node)).with_graceful_shutdown(async move {
            let _ = gateway_shutdown.changed().await;
        });

    let (rpc_result, gateway_result) = tokio::join!(rpc_server, gateway_server);
    rpc_result?;
    gateway_result?;

    println!("Node {} stopped", info.id);
    Ok(())
}
