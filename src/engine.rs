// src/engine.rs
use crate::account::{Account, AccountType};
use crate::asset::Asset;
use crate::balance::AssetBalance;
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::orchestrator::{self, MovementRequest};
use crate::retry::execute_with_retry;
use crate::store::{HistoryEntry, LedgerStore};
use serde_json::Value;
use std::sync::Arc;

/// Top-level facade over a `LedgerStore`, analogous to a `LedgerSystem`:
/// it owns the configuration, wraps every mutating operation in the Retry
/// Driver, and exposes the engine's public mutating and read-only
/// operations.
pub struct Engine {
    store: Arc<dyn LedgerStore>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn LedgerStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    fn idempotency_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.idempotency.ttl_hours)
    }

    // === bootstrap ===

    pub async fn create_asset(&self, asset: Asset) -> Result<(), CoreError> {
        self.store.create_asset(asset).await
    }

    pub async fn create_account(&self, account: Account) -> Result<(), CoreError> {
        self.store.create_account(account).await
    }

    // === mutating operations ===

    pub async fn top_up(&self, request: MovementRequest) -> Result<Value, CoreError> {
        self.run_movement(request, orchestrator::top_up).await
    }

    pub async fn issue_bonus(&self, request: MovementRequest) -> Result<Value, CoreError> {
        self.run_movement(request, orchestrator::issue_bonus).await
    }

    pub async fn purchase(&self, request: MovementRequest) -> Result<Value, CoreError> {
        self.run_movement(request, orchestrator::purchase).await
    }

    async fn run_movement<F, Fut>(&self, request: MovementRequest, op: F) -> Result<Value, CoreError>
    where
        F: Fn(&dyn LedgerStore, MovementRequest, chrono::Duration) -> Fut,
        Fut: std::future::Future<Output = Result<Value, CoreError>>,
    {
        // `MovementRequest` carries a one-shot response-assembly closure by
        // value inside the orchestrator, so a retried attempt re-resolves
        // accounts and rebuilds the closure from scratch each time; only the
        // request's own fields need to survive across attempts.
        let user_id = request.user_id.clone();
        let asset_code = request.asset_code.clone();
        let amount = request.amount;
        let idempotency_key = request.idempotency_key.clone();
        let description = request.description.clone();
        let extra = request.extra.clone();

        execute_with_retry(&self.config.retry, || {
            let req = MovementRequest {
                user_id: user_id.clone(),
                asset_code: asset_code.clone(),
                amount,
                idempotency_key: idempotency_key.clone(),
                description: description.clone(),
                extra: extra.clone(),
            };
            op(self.store.as_ref(), req, self.idempotency_ttl())
        })
        .await
    }

    // === read-only operations ===

    /// Resolves a user and asset by their public identifiers and returns the
    /// single materialized balance, named for display the way `get_all_balances` is.
    pub async fn get_balance(&self, user_id: &str, asset_code: &str) -> Result<AssetBalance, CoreError> {
        let account = self.store.get_user_account(user_id).await?;
        let asset = self.store.get_asset(asset_code).await?;
        let balance = self.store.get_balance(account.id, asset.id).await?;
        Ok(AssetBalance {
            asset_code: asset.code,
            asset_name: asset.display_name,
            balance,
        })
    }

    pub async fn get_all_balances(&self, user_id: &str) -> Result<Vec<AssetBalance>, CoreError> {
        self.store.get_all_balances(user_id).await
    }

    pub async fn get_history(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        let clamped = self.config.history.clamp_limit(limit);
        self.store.get_history(user_id, clamped, offset.max(0)).await
    }

    pub async fn get_user_account(&self, user_id: &str) -> Result<Account, CoreError> {
        self.store.get_user_account(user_id).await
    }

    pub async fn get_system_account(&self, account_type: AccountType) -> Result<Account, CoreError> {
        self.store.get_system_account(account_type).await
    }
}
