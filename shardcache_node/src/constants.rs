pub const VIRTUAL_NODES: usize = 100;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 50051;
pub const DEFAULT_GATEWAY_PORT: u16 = 9527;

// Outbound RPC limits
pub const RPC_CONNECT_TIMEOUT_MS: u64 = 1000;
pub const RPC_TIMEOUT_MS: u64 = 2000;

// Delays
pub const BOOTSTRAP_DELAY_MS: u64 = 2000;
