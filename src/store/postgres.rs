// src/store/postgres.rs
use super::{HistoryEntry, LedgerStore};
use crate::account::{Account, AccountType};
use crate::asset::Asset;
use crate::balance::AssetBalance;
use crate::config::PoolConfig;
use crate::error::{CoreError, ErrorKind};
use crate::idempotency::IdempotencyRecord;
use crate::ledger_entry::{EntryType, LedgerEntry};
use crate::movement::{Movement, MovementOutcome};
use crate::transaction::{TransactionHeader, TransactionStatus, TransactionType};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration as StdDuration;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Maps a `sqlx` failure onto the driver-level taxonomy the Retry Driver
/// reasons about, by inspecting the Postgres SQLSTATE code when present.
fn classify(err: &sqlx::Error) -> ErrorKind {
    let Some(db_err) = err.as_database_error() else {
        return ErrorKind::Other;
    };
    match db_err.code().as_deref() {
        Some("40001") => ErrorKind::SerializationFailure,
        Some("40P01") => ErrorKind::DeadlockDetected,
        Some("55P03") => ErrorKind::LockNotAvailable,
        Some("23505") => ErrorKind::UniqueViolation,
        Some("23514") => ErrorKind::CheckViolation,
        _ => ErrorKind::Other,
    }
}

fn map_err(err: sqlx::Error) -> CoreError {
    classify(&err).into()
}

fn account_type_str(account_type: AccountType) -> &'static str {
    account_type.as_str()
}

fn parse_account_type(value: &str) -> AccountType {
    match value {
        "SYSTEM_TREASURY" => AccountType::SystemTreasury,
        "SYSTEM_REVENUE" => AccountType::SystemRevenue,
        "SYSTEM_BONUS" => AccountType::SystemBonus,
        "SYSTEM_RESERVE" => AccountType::SystemReserve,
        _ => AccountType::User,
    }
}

fn parse_transaction_type(value: &str) -> TransactionType {
    match value {
        "TOP_UP" => TransactionType::TopUp,
        "BONUS" => TransactionType::Bonus,
        _ => TransactionType::Purchase,
    }
}

fn parse_status(value: &str) -> TransactionStatus {
    match value {
        "completed" => TransactionStatus::Completed,
        "failed" => TransactionStatus::Failed,
        "reversed" => TransactionStatus::Reversed,
        _ => TransactionStatus::Pending,
    }
}

fn entry_type_str(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Debit => "debit",
        EntryType::Credit => "credit",
    }
}

/// `sqlx::PgPool`-backed `LedgerStore`. Mirrors the schema-bootstrap and
/// transaction shape of the adapter this crate's conventions are drawn
/// from: one `CREATE TABLE IF NOT EXISTS` pass wrapped in a single
/// transaction, and one atomic `append_movement` body per write.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str, config: &PoolConfig) -> Result<Self, CoreError> {
        let statement_timeout_ms = config.statement_timeout_ms;
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(StdDuration::from_millis(config.connection_timeout_ms))
            .idle_timeout(StdDuration::from_millis(config.idle_timeout_ms))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    use sqlx::Executor;
                    conn.execute(format!("SET statement_timeout = {statement_timeout_ms}").as_str())
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await
            .map_err(map_err)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates every relation named in the wallet's schema if it does not
    /// already exist. Safe to call on every process start.
    pub async fn init_schema(&self) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                id UUID PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                decimals SMALLINT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY,
                account_type TEXT NOT NULL,
                user_id TEXT,
                name TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}',
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_user_id
            ON accounts(user_id) WHERE user_id IS NOT NULL
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_system_type
            ON accounts(account_type) WHERE account_type != 'USER'
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id UUID PRIMARY KEY,
                idempotency_key TEXT NOT NULL,
                transaction_type TEXT NOT NULL,
                asset_id UUID NOT NULL REFERENCES assets(id),
                amount NUMERIC(20,8) NOT NULL CHECK (amount > 0),
                description TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}',
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                completed_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_idempotency_key
            ON transactions(idempotency_key)
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_entries (
                id UUID PRIMARY KEY,
                transaction_id UUID NOT NULL REFERENCES transactions(id),
                account_id UUID NOT NULL REFERENCES accounts(id),
                asset_id UUID NOT NULL REFERENCES assets(id),
                entry_type TEXT NOT NULL CHECK (entry_type IN ('debit', 'credit')),
                amount NUMERIC(20,8) NOT NULL CHECK (amount > 0),
                running_balance NUMERIC(20,8) NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_ledger_entries_account_created
            ON ledger_entries(account_id, created_at DESC)
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_ledger_entries_account_asset
            ON ledger_entries(account_id, asset_id)
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS balance_cache (
                account_id UUID NOT NULL,
                asset_id UUID NOT NULL,
                balance NUMERIC(20,8) NOT NULL CHECK (balance >= 0),
                last_transaction_id UUID,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (account_id, asset_id)
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS idempotency_log (
                key TEXT PRIMARY KEY,
                request_hash TEXT NOT NULL,
                response JSONB NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id UUID PRIMARY KEY,
                transaction_id UUID,
                action TEXT NOT NULL,
                actor TEXT,
                payload JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;
        Ok(())
    }

    /// Directly sets a `(account, asset)` balance, bypassing the ledger
    /// write path entirely — the real-schema equivalent of
    /// `MemoryStore::seed_balance`, for seeding a starting balance (e.g. the
    /// system treasury) the way an operator would with a direct write before
    /// the engine starts serving traffic.
    pub async fn seed_balance(
        &self,
        account_id: Uuid,
        asset_id: Uuid,
        balance: Decimal,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO balance_cache (account_id, asset_id, balance, last_transaction_id, updated_at)
            VALUES ($1, $2, $3, NULL, NOW())
            ON CONFLICT (account_id, asset_id) DO UPDATE SET balance = $3, updated_at = NOW()
            "#,
        )
        .bind(account_id)
        .bind(asset_id)
        .bind(balance)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    /// Locks the `(account, asset)` balance row, creating it at zero first
    /// if it does not yet exist. Always called with accounts pre-sorted by
    /// id so two concurrent movements over the same pair of accounts take
    /// their locks in the same order and cannot deadlock.
    async fn lock_balance(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        account_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Decimal, CoreError> {
        sqlx::query(
            r#"
            INSERT INTO balance_cache (account_id, asset_id, balance, last_transaction_id, updated_at)
            VALUES ($1, $2, 0, NULL, NOW())
            ON CONFLICT (account_id, asset_id) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(asset_id)
        .execute(&mut **tx)
        .await
        .map_err(map_err)?;

        let row = sqlx::query(
            r#"
            SELECT balance FROM balance_cache
            WHERE account_id = $1 AND asset_id = $2
            FOR UPDATE NOWAIT
            "#,
        )
        .bind(account_id)
        .bind(asset_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_err)?;

        row.try_get::<Decimal, _>("balance").map_err(map_err)
    }
}

#[async_trait]
impl LedgerStore for PostgresStore {
    async fn create_asset(&self, asset: Asset) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO assets (id, code, display_name, decimals, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO UPDATE SET display_name = $3, decimals = $4, is_active = $5
            "#,
        )
        .bind(asset.id)
        .bind(&asset.code)
        .bind(&asset.display_name)
        .bind(asset.decimals as i16)
        .bind(asset.is_active)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn create_account(&self, account: Account) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, account_type, user_id, name, metadata, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(account_type_str(account.account_type))
        .bind(&account.user_id)
        .bind(&account.name)
        .bind(&account.metadata)
        .bind(account.is_active)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn get_asset(&self, code: &str) -> Result<Asset, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, code, display_name, decimals, is_active
            FROM assets WHERE code = $1 AND is_active
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| CoreError::NotFound(format!("asset '{code}' not found or inactive")))?;

        Ok(Asset {
            id: row.try_get("id").map_err(map_err)?,
            code: row.try_get("code").map_err(map_err)?,
            display_name: row.try_get("display_name").map_err(map_err)?,
            decimals: row.try_get::<i16, _>("decimals").map_err(map_err)? as u8,
            is_active: row.try_get("is_active").map_err(map_err)?,
        })
    }

    async fn get_user_account(&self, user_id: &str) -> Result<Account, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, account_type, user_id, name, metadata, is_active
            FROM accounts WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| CoreError::NotFound(format!("user account '{user_id}' not found")))?;

        Ok(Account {
            id: row.try_get("id").map_err(map_err)?,
            account_type: parse_account_type(row.try_get::<&str, _>("account_type").map_err(map_err)?),
            user_id: row.try_get("user_id").map_err(map_err)?,
            name: row.try_get("name").map_err(map_err)?,
            metadata: row.try_get("metadata").map_err(map_err)?,
            is_active: row.try_get("is_active").map_err(map_err)?,
        })
    }

    async fn get_system_account(&self, account_type: AccountType) -> Result<Account, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, account_type, user_id, name, metadata, is_active
            FROM accounts WHERE account_type = $1 AND is_active
            "#,
        )
        .bind(account_type_str(account_type))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or_else(|| CoreError::NotFound(format!("system account '{:?}' not found", account_type)))?;

        Ok(Account {
            id: row.try_get("id").map_err(map_err)?,
            account_type,
            user_id: row.try_get("user_id").map_err(map_err)?,
            name: row.try_get("name").map_err(map_err)?,
            metadata: row.try_get("metadata").map_err(map_err)?,
            is_active: row.try_get("is_active").map_err(map_err)?,
        })
    }

    async fn lookup_idempotency(&self, key: &str) -> Result<Option<IdempotencyRecord>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT key, request_hash, response, status, created_at, expires_at
            FROM idempotency_log WHERE key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(IdempotencyRecord {
            key: row.try_get("key").map_err(map_err)?,
            request_hash: row.try_get("request_hash").map_err(map_err)?,
            response: row.try_get("response").map_err(map_err)?,
            status: crate::idempotency::IdempotencyStatus::Completed,
            created_at: row.try_get("created_at").map_err(map_err)?,
            expires_at: row.try_get("expires_at").map_err(map_err)?,
        }))
    }

    #[instrument(skip(self, movement), fields(idempotency_key = %movement.idempotency_key))]
    async fn append_movement(
        &self,
        movement: Movement,
        idempotency_ttl: Duration,
    ) -> Result<(MovementOutcome, Value), CoreError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;

        // Insert the idempotency key first: if another request committed it
        // first, bail out before touching balances.
        let inserted_key = sqlx::query(
            r#"
            INSERT INTO idempotency_log (key, request_hash, response, status, created_at, expires_at)
            VALUES ($1, $2, 'null'::jsonb, 'completed', NOW(), NOW() + $3 * INTERVAL '1 second')
            ON CONFLICT (key) DO NOTHING
            RETURNING key
            "#,
        )
        .bind(&movement.idempotency_key)
        .bind(&movement.request_hash)
        .bind(idempotency_ttl.num_seconds())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        if inserted_key.is_none() {
            tx.rollback().await.ok();
            return Err(CoreError::TransientConflict(ErrorKind::UniqueViolation));
        }

        // Lock the two balance rows in a fixed order so two movements over
        // the same pair of accounts never wait on each other in reverse.
        let (first, second) = if movement.source_account_id <= movement.destination_account_id {
            (movement.source_account_id, movement.destination_account_id)
        } else {
            (movement.destination_account_id, movement.source_account_id)
        };

        let first_balance = Self::lock_balance(&mut tx, first, movement.asset_id).await?;
        let second_balance = Self::lock_balance(&mut tx, second, movement.asset_id).await?;

        let source_balance = if first == movement.source_account_id {
            first_balance
        } else {
            second_balance
        };
        let destination_balance = if first == movement.destination_account_id {
            first_balance
        } else {
            second_balance
        };

        if source_balance < movement.amount {
            tx.rollback().await.ok();
            return Err(CoreError::InsufficientFunds);
        }

        let new_source_balance = source_balance - movement.amount;
        let new_destination_balance = destination_balance + movement.amount;

        let header = TransactionHeader::new_completed(
            movement.idempotency_key.clone(),
            movement.transaction_type,
            movement.asset_id,
            movement.amount,
            movement.description.clone(),
            movement.metadata.clone(),
        );

        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, idempotency_key, transaction_type, asset_id, amount, description, metadata, status, created_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(header.id)
        .bind(&header.idempotency_key)
        .bind(header.transaction_type.as_str())
        .bind(header.asset_id)
        .bind(header.amount)
        .bind(&header.description)
        .bind(&header.metadata)
        .bind("completed")
        .bind(header.created_at)
        .bind(header.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        let debit = LedgerEntry::debit(
            header.id,
            movement.source_account_id,
            movement.asset_id,
            movement.amount,
            new_source_balance,
            movement.description.clone(),
        );
        let credit = LedgerEntry::credit(
            header.id,
            movement.destination_account_id,
            movement.asset_id,
            movement.amount,
            new_destination_balance,
            movement.description.clone(),
        );

        for entry in [&debit, &credit] {
            sqlx::query(
                r#"
                INSERT INTO ledger_entries
                    (id, transaction_id, account_id, asset_id, entry_type, amount, running_balance, description, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(entry.id)
            .bind(entry.transaction_id)
            .bind(entry.account_id)
            .bind(entry.asset_id)
            .bind(entry_type_str(entry.entry_type))
            .bind(entry.amount)
            .bind(entry.running_balance)
            .bind(&entry.description)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        sqlx::query(
            r#"
            UPDATE balance_cache SET balance = $3, last_transaction_id = $4, updated_at = NOW()
            WHERE account_id = $1 AND asset_id = $2
            "#,
        )
        .bind(movement.source_account_id)
        .bind(movement.asset_id)
        .bind(new_source_balance)
        .bind(header.id)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            r#"
            UPDATE balance_cache SET balance = $3, last_transaction_id = $4, updated_at = NOW()
            WHERE account_id = $1 AND asset_id = $2
            "#,
        )
        .bind(movement.destination_account_id)
        .bind(movement.asset_id)
        .bind(new_destination_balance)
        .bind(header.id)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        let outcome = MovementOutcome {
            transaction_id: header.id,
            source_balance_after: new_source_balance,
            destination_balance_after: new_destination_balance,
            completed_at: header.completed_at.unwrap(),
        };

        let response = (movement.assemble_response)(&outcome);

        sqlx::query("UPDATE idempotency_log SET response = $2 WHERE key = $1")
            .bind(&movement.idempotency_key)
            .bind(&response)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;

        sqlx::query(
            r#"
            INSERT INTO audit_log (id, transaction_id, action, actor, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(header.id)
        .bind(header.transaction_type.as_str())
        .bind(Option::<String>::None)
        .bind(&response)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;

        debug!(transaction_id = %header.id, "movement committed");
        Ok((outcome, response))
    }

    async fn get_balance(&self, account_id: Uuid, asset_id: Uuid) -> Result<Decimal, CoreError> {
        let row = sqlx::query("SELECT balance FROM balance_cache WHERE account_id = $1 AND asset_id = $2")
            .bind(account_id)
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(match row {
            Some(row) => row.try_get("balance").map_err(map_err)?,
            None => Decimal::ZERO,
        })
    }

    async fn get_all_balances(&self, user_id: &str) -> Result<Vec<AssetBalance>, CoreError> {
        let account = self.get_user_account(user_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT a.code AS asset_code, a.display_name AS asset_name,
                   COALESCE(b.balance, 0) AS balance
            FROM assets a
            LEFT JOIN balance_cache b ON b.asset_id = a.id AND b.account_id = $1
            WHERE a.is_active
            ORDER BY a.code
            "#,
        )
        .bind(account.id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(AssetBalance {
                    asset_code: row.try_get("asset_code").map_err(map_err)?,
                    asset_name: row.try_get("asset_name").map_err(map_err)?,
                    balance: row.try_get("balance").map_err(map_err)?,
                })
            })
            .collect()
    }

    async fn get_history(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        let account = self.get_user_account(user_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT
                le.id AS entry_id, le.transaction_id, le.account_id, le.asset_id,
                le.entry_type, le.amount AS entry_amount, le.running_balance,
                le.description AS entry_description, le.created_at AS entry_created_at,
                t.idempotency_key, t.transaction_type, t.amount AS tx_amount,
                t.description AS tx_description, t.metadata, t.status,
                t.created_at AS tx_created_at, t.completed_at
            FROM ledger_entries le
            JOIN transactions t ON t.id = le.transaction_id
            WHERE le.account_id = $1
            ORDER BY le.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        rows.into_iter()
            .map(|row| {
                let entry = LedgerEntry {
                    id: row.try_get("entry_id").map_err(map_err)?,
                    transaction_id: row.try_get("transaction_id").map_err(map_err)?,
                    account_id: row.try_get("account_id").map_err(map_err)?,
                    asset_id: row.try_get("asset_id").map_err(map_err)?,
                    entry_type: if row.try_get::<&str, _>("entry_type").map_err(map_err)? == "debit" {
                        EntryType::Debit
                    } else {
                        EntryType::Credit
                    },
                    amount: row.try_get("entry_amount").map_err(map_err)?,
                    running_balance: row.try_get("running_balance").map_err(map_err)?,
                    description: row.try_get("entry_description").map_err(map_err)?,
                    created_at: row.try_get("entry_created_at").map_err(map_err)?,
                };
                let transaction = TransactionHeader {
                    id: entry.transaction_id,
                    idempotency_key: row.try_get("idempotency_key").map_err(map_err)?,
                    transaction_type: parse_transaction_type(
                        row.try_get::<&str, _>("transaction_type").map_err(map_err)?,
                    ),
                    asset_id: entry.asset_id,
                    amount: row.try_get("tx_amount").map_err(map_err)?,
                    description: row.try_get("tx_description").map_err(map_err)?,
                    metadata: row.try_get("metadata").map_err(map_err)?,
                    status: parse_status(row.try_get::<&str, _>("status").map_err(map_err)?),
                    created_at: row.try_get("tx_created_at").map_err(map_err)?,
                    completed_at: row
                        .try_get::<Option<DateTime<Utc>>, _>("completed_at")
                        .map_err(map_err)?,
                };
                Ok(HistoryEntry { entry, transaction })
            })
            .collect()
    }
}
