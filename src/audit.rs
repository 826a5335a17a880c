// src/audit.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Describes the action taken, the actor (when available), and the request
/// payload — inserted by the Ledger Writer in the same transaction as the
/// movement it documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub action: String,
    pub actor: Option<String>,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        transaction_id: Option<Uuid>,
        action: impl Into<String>,
        actor: Option<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            transaction_id,
            action: action.into(),
            actor,
            payload,
            created_at: Utc::now(),
        }
    }
}
