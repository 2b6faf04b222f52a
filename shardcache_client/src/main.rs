use clap::{Parser, Subcommand};
use tonic::Request;

use shardcache_proto::cache::cache_service_client::CacheServiceClient;
use shardcache_proto::cache::{DeleteRequest, GetRequest, HealthRequest, SetRequest};

/// Talks to one node over the internal RPC, so get/set/del touch that
/// node's local share only. Useful for poking at a running cluster.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address of the node to connect to
    #[arg(short, long, default_value = "http://127.0.0.1:50051")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a key-value pair on the node
    Set { key: String, value: String },
    /// Fetch a value from the node
    Get { key: String },
    /// Delete a key from the node
    Del { key: String },
    /// Check that the node is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut client = CacheServiceClient::connect(cli.node).await?;

    match cli.command {
        Commands::Set { key, value } => {
            let request = Request::new(SetRequest { key, value });
            let response = client.set(request).await?;
            if response.into_inner().success {
                println!("Set successful");
            } else {
                println!("Set failed");
            }
        }
        Commands::Get { key } => {
            let request = Request::new(GetRequest { key });
            let response = client.get(request).await?;
            let resp = response.into_inner();
            if resp.found {
                println!("Value: {}", resp.value);
            } else {
                println!("Key not found");
            }
        }
        Commands::Del { key } => {
            let request = Request::new(DeleteRequest { key });
            let response = client.delete(request).await?;
            if response.into_inner().success {
                println!("Deleted");
            } else {
                println!("Key not found");
            }
        }
        Commands::Health => {
            let request = Request::new(HealthRequest {});
            let response = client.health(request).await?;
            let resp = response.into_inner();
            println!("Healthy: {} (node {})", resp.healthy, resp.node_id);
        }
    }

    Ok(())
}
