// src/movement.rs
use crate::transaction::TransactionType;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

/// A fully-resolved asset movement, assembled by the Movement Orchestrator
/// and handed to the Ledger Writer.
pub struct Movement {
    pub source_account_id: Uuid,
    pub destination_account_id: Uuid,
    pub asset_id: Uuid,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    pub metadata: Value,
    pub idempotency_key: String,
    pub request_hash: String,
    /// Builds the caller-facing response body from the outcome computed
    /// during `append_movement`, while the write transaction is still open.
    /// The same `Value` is persisted into the idempotency log and returned
    /// to the caller, so the cached response can never drift from what was
    /// actually committed.
    pub assemble_response: Box<dyn FnOnce(&MovementOutcome) -> Value + Send>,
}

impl std::fmt::Debug for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Movement")
            .field("source_account_id", &self.source_account_id)
            .field("destination_account_id", &self.destination_account_id)
            .field("asset_id", &self.asset_id)
            .field("amount", &self.amount)
            .field("transaction_type", &self.transaction_type)
            .field("description", &self.description)
            .field("metadata", &self.metadata)
            .field("idempotency_key", &self.idempotency_key)
            .field("request_hash", &self.request_hash)
            .finish_non_exhaustive()
    }
}

/// What the Ledger Writer reports back after a successful `append`: enough
/// to assemble every operation's response without a second round trip.
#[derive(Debug, Clone)]
pub struct MovementOutcome {
    pub transaction_id: Uuid,
    pub source_balance_after: Decimal,
    pub destination_balance_after: Decimal,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}
