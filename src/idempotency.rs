// src/idempotency.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The fixed field order hashed into the canonical request digest — a real
/// struct rather than a `HashMap` so the JSON field order serde emits is
/// stable across builds.
#[derive(Serialize)]
struct CanonicalRequest<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(rename = "assetCode")]
    asset_code: &'a str,
    amount: String,
}

/// SHA-256 over the JSON-serialized `{userId, assetCode, amount}` tuple.
/// Stored alongside the cached response so the orchestrator can reject a
/// reused idempotency key submitted with different request fields —
/// see `DESIGN.md` for why a mismatch is treated as a conflict.
pub fn canonical_request_hash(user_id: &str, asset_code: &str, amount: &str) -> String {
    let canonical = CanonicalRequest {
        user_id,
        asset_code,
        amount: amount.to_string(),
    };
    let json = serde_json::to_vec(&canonical).expect("canonical request is always serializable");
    let digest = Sha256::digest(&json);
    hex::encode(digest)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdempotencyStatus {
    Completed,
}

/// Row keyed by the client-supplied idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub request_hash: String,
    /// The response body previously returned, serialized as JSON so any
    /// operation's response shape can be cached uniformly.
    pub response: serde_json::Value,
    pub status: IdempotencyStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(
        key: impl Into<String>,
        request_hash: impl Into<String>,
        response: serde_json::Value,
        ttl: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            request_hash: request_hash.into(),
            response,
            status: IdempotencyStatus::Completed,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == IdempotencyStatus::Completed && self.expires_at > now
    }
}

// A vendored hex encoder keeps the dependency list honest: everything else
// the engine hexes goes through `sha2`'s own output, so we only ever need
// a trivial byte-to-hex pass rather than pulling in the `hex` crate for one
// call site.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        use std::fmt::Write;
        let mut out = String::with_capacity(bytes.as_ref().len() * 2);
        for b in bytes.as_ref() {
            write!(out, "{:02x}", b).expect("writing to a String never fails");
        }
        out
    }
}
