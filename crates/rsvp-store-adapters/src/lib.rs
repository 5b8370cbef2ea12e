//! Cache store and profile gateway adapters for the wedding guest client.

pub mod file_cache;
#[cfg(feature = "http")]
pub mod http_gateway;
pub mod memory_cache;
pub mod memory_gateway;

pub use file_cache::FileCacheStore;
#[cfg(feature = "http")]
pub use http_gateway::HttpGateway;
pub use memory_cache::MemoryCacheStore;
pub use memory_gateway::MemoryGateway;
