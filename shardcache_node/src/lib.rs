pub mod bootstrap;
pub mod constants;
pub mod gateway;
pub mod node;
pub mod ring;
pub mod rpc;
pub mod store;

pub use node::{CacheNode, CacheRpc};
pub use ring::{HashRing, Node, RingError};
