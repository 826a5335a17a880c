// src/asset.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A virtual currency tracked by the ledger (e.g. gold coin, diamond).
///
/// `decimals` declares the fixed-point scale of all amounts of this asset;
/// amounts are rejected by the orchestrator if their scale exceeds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub code: String,
    pub display_name: String,
    pub decimals: u8,
    pub is_active: bool,
}

impl Asset {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>, decimals: u8) -> Self {
        Self {
            id: Uuid::now_v7(),
            code: code.into(),
            display_name: display_name.into(),
            decimals,
            is_active: true,
        }
    }
}
