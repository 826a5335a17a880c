// src/transaction.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    TopUp,
    Bonus,
    Purchase,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::TopUp => "TOP_UP",
            TransactionType::Bonus => "BONUS",
            TransactionType::Purchase => "PURCHASE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

/// One accepted logical movement. Immutable after commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub id: Uuid,
    pub idempotency_key: String,
    pub transaction_type: TransactionType,
    pub asset_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub metadata: Value,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransactionHeader {
    pub fn new_completed(
        idempotency_key: impl Into<String>,
        transaction_type: TransactionType,
        asset_id: Uuid,
        amount: Decimal,
        description: impl Into<String>,
        metadata: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            idempotency_key: idempotency_key.into(),
            transaction_type,
            asset_id,
            amount,
            description: description.into(),
            metadata,
            status: TransactionStatus::Completed,
            created_at: now,
            completed_at: Some(now),
        }
    }
}
