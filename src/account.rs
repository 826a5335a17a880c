// src/account.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    User,
    SystemTreasury,
    SystemRevenue,
    SystemBonus,
    SystemReserve,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::User => "USER",
            AccountType::SystemTreasury => "SYSTEM_TREASURY",
            AccountType::SystemRevenue => "SYSTEM_REVENUE",
            AccountType::SystemBonus => "SYSTEM_BONUS",
            AccountType::SystemReserve => "SYSTEM_RESERVE",
        }
    }

    /// System account types are singletons: there is exactly one row of
    /// each per deployment, looked up by type rather than by owner.
    pub fn is_system(&self) -> bool {
        !matches!(self, AccountType::User)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub account_type: AccountType,
    /// Set for `USER` accounts; `None` for system accounts.
    pub user_id: Option<String>,
    pub name: String,
    pub metadata: Value,
    pub is_active: bool,
}

impl Account {
    pub fn new_user(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_type: AccountType::User,
            user_id: Some(user_id.into()),
            name: name.into(),
            metadata: Value::Null,
            is_active: true,
        }
    }

    pub fn new_system(account_type: AccountType, name: impl Into<String>) -> Self {
        debug_assert!(account_type.is_system());
        Self {
            id: Uuid::now_v7(),
            account_type,
            user_id: None,
            name: name.into(),
            metadata: Value::Null,
            is_active: true,
        }
    }
}
