// src/balance.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Materialized current balance per `(account, asset)`. Derived state —
/// always reconstructible by summing ledger entries — but maintained
/// synchronously with entries and authoritative for reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceCacheRow {
    pub account_id: Uuid,
    pub asset_id: Uuid,
    pub balance: Decimal,
    pub last_transaction_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl BalanceCacheRow {
    pub fn zero(account_id: Uuid, asset_id: Uuid) -> Self {
        Self {
            account_id,
            asset_id,
            balance: Decimal::ZERO,
            last_transaction_id: None,
            updated_at: Utc::now(),
        }
    }
}

/// One asset balance as returned to a reader of the engine's public surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset_code: String,
    pub asset_name: String,
    pub balance: Decimal,
}
