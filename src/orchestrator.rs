// src/orchestrator.rs
use crate::account::AccountType;
use crate::error::{CoreError, ErrorKind};
use crate::idempotency::canonical_request_hash;
use crate::movement::{Movement, MovementOutcome};
use crate::store::LedgerStore;
use crate::transaction::TransactionType;
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// A caller-supplied request to move funds between a user account and one
/// of the fixed system accounts. The three public operations differ only
/// in which system account plays source vs. destination and in the extra
/// fields folded into `metadata`.
pub struct MovementRequest {
    pub user_id: String,
    pub asset_code: String,
    pub amount: Decimal,
    pub idempotency_key: String,
    pub description: String,
    /// Operation-specific fields (e.g. `reason` for a bonus, `item` for a
    /// purchase), merged into the stored metadata and echoed in the
    /// response.
    pub extra: Value,
}

fn validate_amount(amount: Decimal, decimals: u8) -> Result<(), CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::ValidationError(
            "amount must be strictly positive".to_string(),
        ));
    }
    if amount.scale() > decimals as u32 {
        return Err(CoreError::ValidationError(format!(
            "amount has more than {decimals} decimal places"
        )));
    }
    Ok(())
}

/// Enforces the uniform precondition shared by all three operations: the
/// source account of the resulting `Movement` must be able to cover the
/// amount. The three named operations only differ in which account plays
/// that role, so there is no separate per-operation precondition type.
async fn execute(
    store: &(dyn LedgerStore),
    request: MovementRequest,
    transaction_type: TransactionType,
    source_type: AccountType,
    destination_type: AccountType,
    idempotency_ttl: chrono::Duration,
) -> Result<Value, CoreError> {
    if request.user_id.trim().is_empty() {
        return Err(CoreError::ValidationError("userId is required".to_string()));
    }
    if request.idempotency_key.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "idempotency key is required".to_string(),
        ));
    }

    if let Some(existing) = store.lookup_idempotency(&request.idempotency_key).await? {
        let amount_str = request.amount.to_string();
        let expected_hash =
            canonical_request_hash(&request.user_id, &request.asset_code, &amount_str);
        if existing.request_hash != expected_hash {
            return Err(CoreError::Conflict(
                "idempotency key reused with a different request".to_string(),
            ));
        }
        return Ok(existing.response);
    }

    let asset = store.get_asset(&request.asset_code).await?;
    validate_amount(request.amount, asset.decimals)?;

    let user_account = store.get_user_account(&request.user_id).await?;
    let user_is_source = source_type == AccountType::User;
    let (source_account_id, destination_account_id) = if user_is_source {
        let system = store.get_system_account(destination_type).await?;
        (user_account.id, system.id)
    } else {
        let system = store.get_system_account(source_type).await?;
        (system.id, user_account.id)
    };

    let amount_str = request.amount.to_string();
    let request_hash = canonical_request_hash(&request.user_id, &request.asset_code, &amount_str);

    let mut metadata = request.extra.clone();
    if let Value::Object(ref mut map) = metadata {
        map.insert("userId".to_string(), json!(request.user_id));
    }

    let asset_code = request.asset_code.clone();
    let response_user_id = request.user_id.clone();
    let amount = request.amount;

    let assemble_response: Box<dyn FnOnce(&MovementOutcome) -> Value + Send> =
        Box::new(move |outcome: &MovementOutcome| {
            let new_balance = if user_is_source {
                outcome.source_balance_after
            } else {
                outcome.destination_balance_after
            };
            json!({
                "transactionId": outcome.transaction_id,
                "userId": response_user_id,
                "assetCode": asset_code,
                "amount": amount,
                "newBalance": new_balance,
                "status": "completed",
                "completedAt": outcome.completed_at,
            })
        });

    let idempotency_key = request.idempotency_key.clone();

    let movement = Movement {
        source_account_id,
        destination_account_id,
        asset_id: asset.id,
        amount: request.amount,
        transaction_type,
        description: request.description,
        metadata,
        idempotency_key: request.idempotency_key,
        request_hash,
        assemble_response,
    };

    match store.append_movement(movement, idempotency_ttl).await {
        Ok((_outcome, response)) => Ok(response),
        // Another worker's insert of the same idempotency key won the race.
        // This is not a transient conflict the Retry Driver should back off
        // on — the movement already happened; re-read and hand back its
        // result.
        Err(CoreError::TransientConflict(ErrorKind::UniqueViolation)) => {
            match store.lookup_idempotency(&idempotency_key).await? {
                Some(record) => Ok(record.response),
                None => Err(CoreError::internal(
                    "idempotency key conflicted but no record was found on re-lookup",
                )),
            }
        }
        Err(err) => Err(err),
    }
}

/// Credits a user account from the system treasury.
pub async fn top_up(
    store: &(dyn LedgerStore),
    request: MovementRequest,
    idempotency_ttl: chrono::Duration,
) -> Result<Value, CoreError> {
    execute(
        store,
        request,
        TransactionType::TopUp,
        AccountType::SystemTreasury,
        AccountType::User,
        idempotency_ttl,
    )
    .await
}

/// Credits a user account from the system bonus pool.
pub async fn issue_bonus(
    store: &(dyn LedgerStore),
    request: MovementRequest,
    idempotency_ttl: chrono::Duration,
) -> Result<Value, CoreError> {
    execute(
        store,
        request,
        TransactionType::Bonus,
        AccountType::SystemBonus,
        AccountType::User,
        idempotency_ttl,
    )
    .await
}

/// Debits a user account into system revenue.
pub async fn purchase(
    store: &(dyn LedgerStore),
    request: MovementRequest,
    idempotency_ttl: chrono::Duration,
) -> Result<Value, CoreError> {
    execute(
        store,
        request,
        TransactionType::Purchase,
        AccountType::User,
        AccountType::SystemRevenue,
        idempotency_ttl,
    )
    .await
}
