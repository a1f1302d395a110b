//! Adapters - concrete implementations of the outbound ports.

pub mod image_store;
pub mod json_rpc;
pub mod wallet;

pub use image_store::HttpImageStore;
pub use json_rpc::JsonRpcChainClient;
pub use wallet::RpcWalletSession;
