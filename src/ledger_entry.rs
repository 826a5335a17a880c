// src/ledger_entry.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Debit,
    Credit,
}

/// Append-only record of a single-sided balance movement.
/// `running_balance` is this account's balance in this asset *after* the
/// entry is applied — it is set from the value the Ledger Writer just
/// computed and upserted into the balance cache, never read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub asset_id: Uuid,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub running_balance: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn debit(
        transaction_id: Uuid,
        account_id: Uuid,
        asset_id: Uuid,
        amount: Decimal,
        running_balance: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            transaction_id,
            account_id,
            asset_id,
            entry_type: EntryType::Debit,
            amount,
            running_balance,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn credit(
        transaction_id: Uuid,
        account_id: Uuid,
        asset_id: Uuid,
        amount: Decimal,
        running_balance: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            transaction_id,
            account_id,
            asset_id,
            entry_type: EntryType::Credit,
            amount,
            running_balance,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
