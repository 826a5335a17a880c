// src/store/mod.rs
#[cfg(feature = "postgres")]
pub mod postgres;

pub mod memory;

use crate::account::{Account, AccountType};
use crate::asset::Asset;
use crate::balance::AssetBalance;
use crate::error::CoreError;
use crate::idempotency::IdempotencyRecord;
use crate::ledger_entry::LedgerEntry;
use crate::movement::{Movement, MovementOutcome};
use crate::transaction::TransactionHeader;
use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use uuid::Uuid;

/// One ledger entry joined with its parent transaction header, as returned
/// by the History Reader.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub entry: LedgerEntry,
    pub transaction: TransactionHeader,
}

/// Everything the ledger engine needs from a transactional relational
/// store: pooled connections, a scoped atomic write, and read-only query
/// surfaces. Both the Postgres adapter and the in-memory test double
/// implement this trait, so the orchestrator/retry/reader layers above it
/// are storage agnostic.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === bootstrap (out-of-band, ahead of serving traffic) ===

    async fn create_asset(&self, asset: Asset) -> Result<(), CoreError>;
    async fn create_account(&self, account: Account) -> Result<(), CoreError>;

    // === resolution ===

    async fn get_asset(&self, code: &str) -> Result<Asset, CoreError>;
    async fn get_user_account(&self, user_id: &str) -> Result<Account, CoreError>;
    async fn get_system_account(&self, account_type: AccountType) -> Result<Account, CoreError>;

    // === idempotency fast path ===

    async fn lookup_idempotency(&self, key: &str) -> Result<Option<IdempotencyRecord>, CoreError>;

    // === the atomic write ===

    /// Appends one fully-resolved movement as a single atomic unit: lock
    /// accounts in sorted order, read balances, enforce
    /// `source_balance >= amount`, insert the transaction header and its
    /// two ledger entries, upsert the balance cache, write an audit-log
    /// row, and record the idempotency result — all inside one
    /// transaction. `movement.assemble_response` is invoked with the
    /// computed outcome while the transaction is still open so the cached
    /// response and the committed state can never drift apart.
    async fn append_movement(
        &self,
        movement: Movement,
        idempotency_ttl: Duration,
    ) -> Result<(MovementOutcome, Value), CoreError>;

    // === read-only auxiliaries ===

    async fn get_balance(&self, account_id: Uuid, asset_id: Uuid) -> Result<rust_decimal::Decimal, CoreError>;

    async fn get_all_balances(&self, user_id: &str) -> Result<Vec<AssetBalance>, CoreError>;

    async fn get_history(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HistoryEntry>, CoreError>;
}
