//! Transactional double-entry ledger engine for a multi-currency wallet
//! backend: asset and account registries, an idempotent movement
//! orchestrator, a bounded retry driver, and read-only balance/history
//! readers, all behind a storage-agnostic `LedgerStore` trait.

pub mod account;
pub mod asset;
pub mod audit;
pub mod balance;
pub mod config;
pub mod engine;
pub mod error;
pub mod idempotency;
pub mod ledger_entry;
pub mod movement;
pub mod orchestrator;
pub mod retry;
pub mod store;
pub mod transaction;

pub use account::{Account, AccountType};
pub use asset::Asset;
pub use balance::{AssetBalance, BalanceCacheRow};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{CoreError, ErrorKind};
pub use ledger_entry::{EntryType, LedgerEntry};
pub use orchestrator::MovementRequest;
pub use store::{HistoryEntry, LedgerStore};
pub use transaction::{TransactionHeader, TransactionStatus, TransactionType};
