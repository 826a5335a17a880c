// src/store/memory.rs
use super::{HistoryEntry, LedgerStore};
use crate::account::{Account, AccountType};
use crate::asset::Asset;
use crate::audit::AuditLogEntry;
use crate::balance::{AssetBalance, BalanceCacheRow};
use crate::error::{CoreError, ErrorKind};
use crate::idempotency::IdempotencyRecord;
use crate::ledger_entry::LedgerEntry;
use crate::movement::{Movement, MovementOutcome};
use crate::transaction::TransactionHeader;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct State {
    assets: HashMap<String, Asset>,
    accounts: HashMap<Uuid, Account>,
    system_accounts: HashMap<AccountType, Uuid>,
    user_accounts: HashMap<String, Uuid>,
    balances: HashMap<(Uuid, Uuid), BalanceCacheRow>,
    transactions: HashMap<Uuid, TransactionHeader>,
    entries: Vec<LedgerEntry>,
    idempotency: HashMap<String, IdempotencyRecord>,
    audit_log: Vec<AuditLogEntry>,
}

/// In-memory `LedgerStore`, standing in for Postgres in tests the way the
/// teacher ledger crate's `MemoryAdapter` stands in for its own Postgres
/// adapter. Holds a single mutex for the entire `append_movement` body,
/// which is this adapter's equivalent of `BEGIN ... FOR UPDATE NOWAIT ...
/// COMMIT` — no other task can interleave while the lock is held.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Directly sets a `(account, asset)` balance, bypassing the ledger
    /// write path entirely. Schema bootstrap/seeding is out of scope for
    /// the engine itself; this is the in-memory store's equivalent of the
    /// direct-SQL seeding an operator would run against Postgres before
    /// the engine starts serving traffic.
    pub fn seed_balance(&self, account_id: Uuid, asset_id: Uuid, balance: Decimal) {
        let mut state = self.state.lock().unwrap();
        state.balances.insert(
            (account_id, asset_id),
            BalanceCacheRow {
                account_id,
                asset_id,
                balance,
                last_transaction_id: None,
                updated_at: Utc::now(),
            },
        );
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn create_asset(&self, asset: Asset) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.assets.insert(asset.code.clone(), asset);
        Ok(())
    }

    async fn create_account(&self, account: Account) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        if account.account_type.is_system() {
            state
                .system_accounts
                .insert(account.account_type, account.id);
        } else if let Some(user_id) = account.user_id.clone() {
            state.user_accounts.insert(user_id, account.id);
        }
        state.accounts.insert(account.id, account);
        Ok(())
    }

    async fn get_asset(&self, code: &str) -> Result<Asset, CoreError> {
        let state = self.state.lock().unwrap();
        state
            .assets
            .get(code)
            .filter(|a| a.is_active)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("asset '{code}' not found or inactive")))
    }

    async fn get_user_account(&self, user_id: &str) -> Result<Account, CoreError> {
        let state = self.state.lock().unwrap();
        let id = state
            .user_accounts
            .get(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user account '{user_id}' not found")))?;
        state
            .accounts
            .get(id)
            .filter(|a| a.is_active)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("user account '{user_id}' not found")))
    }

    async fn get_system_account(&self, account_type: AccountType) -> Result<Account, CoreError> {
        let state = self.state.lock().unwrap();
        let id = state.system_accounts.get(&account_type).ok_or_else(|| {
            CoreError::NotFound(format!("system account '{:?}' not found", account_type))
        })?;
        state
            .accounts
            .get(id)
            .filter(|a| a.is_active)
            .cloned()
            .ok_or_else(|| {
                CoreError::NotFound(format!("system account '{:?}' not found", account_type))
            })
    }

    async fn lookup_idempotency(&self, key: &str) -> Result<Option<IdempotencyRecord>, CoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .idempotency
            .get(key)
            .filter(|r| r.is_live(Utc::now()))
            .cloned())
    }

    async fn append_movement(
        &self,
        movement: Movement,
        idempotency_ttl: Duration,
    ) -> Result<(MovementOutcome, Value), CoreError> {
        let mut state = self.state.lock().unwrap();

        // Duplicate idempotency key: another caller already committed this
        // movement while we were waiting for the lock.
        if state.idempotency.contains_key(&movement.idempotency_key) {
            return Err(CoreError::TransientConflict(ErrorKind::UniqueViolation));
        }

        let source_key = (movement.source_account_id, movement.asset_id);
        let destination_key = (movement.destination_account_id, movement.asset_id);

        let source_balance = state
            .balances
            .get(&source_key)
            .map(|b| b.balance)
            .unwrap_or(Decimal::ZERO);

        if source_balance < movement.amount {
            return Err(CoreError::InsufficientFunds);
        }

        let destination_balance = state
            .balances
            .get(&destination_key)
            .map(|b| b.balance)
            .unwrap_or(Decimal::ZERO);

        let new_source_balance = source_balance - movement.amount;
        let new_destination_balance = destination_balance + movement.amount;

        let header = TransactionHeader::new_completed(
            movement.idempotency_key.clone(),
            movement.transaction_type,
            movement.asset_id,
            movement.amount,
            movement.description.clone(),
            movement.metadata.clone(),
        );

        let debit = LedgerEntry::debit(
            header.id,
            movement.source_account_id,
            movement.asset_id,
            movement.amount,
            new_source_balance,
            movement.description.clone(),
        );
        let credit = LedgerEntry::credit(
            header.id,
            movement.destination_account_id,
            movement.asset_id,
            movement.amount,
            new_destination_balance,
            movement.description.clone(),
        );

        state.balances.insert(
            source_key,
            BalanceCacheRow {
                account_id: movement.source_account_id,
                asset_id: movement.asset_id,
                balance: new_source_balance,
                last_transaction_id: Some(header.id),
                updated_at: Utc::now(),
            },
        );
        state.balances.insert(
            destination_key,
            BalanceCacheRow {
                account_id: movement.destination_account_id,
                asset_id: movement.asset_id,
                balance: new_destination_balance,
                last_transaction_id: Some(header.id),
                updated_at: Utc::now(),
            },
        );

        let outcome = MovementOutcome {
            transaction_id: header.id,
            source_balance_after: new_source_balance,
            destination_balance_after: new_destination_balance,
            completed_at: header.completed_at.unwrap(),
        };

        let response = (movement.assemble_response)(&outcome);

        let record = IdempotencyRecord::new(
            movement.idempotency_key.clone(),
            movement.request_hash.clone(),
            response.clone(),
            idempotency_ttl,
        );

        let audit_entry = AuditLogEntry::new(
            Some(header.id),
            header.transaction_type.as_str(),
            None,
            response.clone(),
        );

        state.transactions.insert(header.id, header);
        state.entries.push(debit);
        state.entries.push(credit);
        state.idempotency.insert(movement.idempotency_key, record);
        state.audit_log.push(audit_entry);

        Ok((outcome, response))
    }

    async fn get_balance(&self, account_id: Uuid, asset_id: Uuid) -> Result<Decimal, CoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .balances
            .get(&(account_id, asset_id))
            .map(|b| b.balance)
            .unwrap_or(Decimal::ZERO))
    }

    async fn get_all_balances(&self, user_id: &str) -> Result<Vec<AssetBalance>, CoreError> {
        let state = self.state.lock().unwrap();
        let account_id = *state
            .user_accounts
            .get(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user account '{user_id}' not found")))?;

        let mut assets: Vec<&Asset> = state.assets.values().filter(|a| a.is_active).collect();
        assets.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(assets
            .into_iter()
            .map(|asset| {
                let balance = state
                    .balances
                    .get(&(account_id, asset.id))
                    .map(|b| b.balance)
                    .unwrap_or(Decimal::ZERO);
                AssetBalance {
                    asset_code: asset.code.clone(),
                    asset_name: asset.display_name.clone(),
                    balance,
                }
            })
            .collect())
    }

    async fn get_history(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        let state = self.state.lock().unwrap();
        let account_id = *state
            .user_accounts
            .get(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user account '{user_id}' not found")))?;

        let mut matching: Vec<&LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .collect();

        // Ordered by parent transaction's creation time, descending.
        matching.sort_by(|a, b| {
            let ta = &state.transactions[&a.transaction_id];
            let tb = &state.transactions[&b.transaction_id];
            tb.created_at.cmp(&ta.created_at)
        });

        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|entry| HistoryEntry {
                entry: entry.clone(),
                transaction: state.transactions[&entry.transaction_id].clone(),
            })
            .collect())
    }
}
