//! Concrete collaborator implementations

pub mod ethers_ledger;
pub mod file_lock;
pub mod file_store;
pub mod http_pool;
pub mod memory;

pub use ethers_ledger::EthersLedgerClient;
pub use file_lock::FileAdvisoryLock;
pub use file_store::FileStateStore;
pub use http_pool::HttpEntryPool;
pub use memory::{MemoryAdvisoryLock, MemoryStateStore};
