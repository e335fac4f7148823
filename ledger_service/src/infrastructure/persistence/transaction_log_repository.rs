use async_trait::async_trait;
use chrono::Utc;
use common::{Money, TransactionId, TransferError, WalletId};
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{TransactionLog, TransactionStatus};
use crate::domain::repository::{TransactionLogRepository, TransferOutcome};
use crate::infrastructure::persistence::models::{TransactionLogModel, WalletModel};

/// Repositorio de TransactionLog sobre PostgreSQL. También es el hogar del
/// ejecutor de transferencias: `execute_transfer` abre una única transacción
/// que bloquea ambas filas de wallet en orden ascendente de id, valida, muta
/// y finaliza el log.
pub struct PostgresTransactionLogRepository {
    pool: PgPool,
}

impl PostgresTransactionLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLogRepository for PostgresTransactionLogRepository {
    async fn insert_pending(
        &self,
        id: TransactionId,
        from_wallet_id: WalletId,
        to_wallet_id: WalletId,
        amount: Money,
        idempotency_key: &str,
        metadata: JsonValue,
    ) -> Result<TransactionLog, TransferError> {
        let now = Utc::now();
        let result = sqlx::query_as::<_, TransactionLogModel>(
            r#"
            INSERT INTO transaction_logs (
                id, from_wallet_id, to_wallet_id, amount, status,
                idempotency_key, error_message, metadata, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 'PENDING', $5, NULL, $6, $7, $7)
            RETURNING id, from_wallet_id, to_wallet_id, amount, status,
                      idempotency_key, error_message, metadata, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(from_wallet_id.as_uuid())
        .bind(to_wallet_id.as_uuid())
        .bind(amount.as_decimal())
        .bind(idempotency_key)
        .bind(metadata)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(model) => Ok(model.into()),
            Err(sqlx::Error::Database(db_err)) if is_unique_violation(&*db_err) => {
                Err(TransferError::duplicate_request(format!(
                    "idempotencyKey '{idempotency_key}' has already been used"
                )))
            }
            Err(e) => Err(TransferError::internal(format!(
                "failed to persist PENDING transaction log: {e}"
            ))),
        }
    }

    async fn execute_transfer(
        &self,
        pending: &TransactionLog,
    ) -> Result<TransferOutcome, TransferError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TransferError::internal(format!("failed to open transaction: {e}")))?;

        // Global invariant: always lock the lower wallet id first. This is a
        // pure function of the two ids, not of source-file/call order, so it
        // rules out a lock-cycle deadlock between two transfers on the same
        // pair moving in opposite directions.
        let from_id = pending.from_wallet_id.as_uuid();
        let to_id = pending.to_wallet_id.as_uuid();
        let (first, second) = if from_id < to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };

        let first_row = lock_wallet_row(&mut tx, first).await?;
        let second_row = lock_wallet_row(&mut tx, second).await?;

        // `first`/`second` are just `from_id`/`to_id` sorted ascending for the
        // lock order above; re-associate the two locked rows with their
        // logical roles now that both locks are held.
        let (from_wallet, to_wallet) = if first == from_id {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };
        let from_wallet = from_wallet.ok_or_else(|| {
            TransferError::wallet_not_found(format!("source wallet {from_id} does not exist"))
        })?;
        let to_wallet = to_wallet.ok_or_else(|| {
            TransferError::wallet_not_found(format!("destination wallet {to_id} does not exist"))
        })?;

        let amount = pending.amount.as_decimal();
        if from_wallet.balance < amount {
            return Err(TransferError::insufficient_balance(format!(
                "wallet {from_id} has balance {} but {} was requested",
                from_wallet.balance, amount
            )));
        }

        let new_from_balance = from_wallet.balance - amount;
        let new_to_balance = to_wallet.balance + amount;

        update_wallet_balance(&mut tx, from_id, new_from_balance).await?;
        update_wallet_balance(&mut tx, to_id, new_to_balance).await?;

        let now = Utc::now();
        let patch = json!({
            "completedAt": now,
            "fromBalanceAfter": Money::from_decimal(new_from_balance).to_fixed_string(),
            "toBalanceAfter": Money::from_decimal(new_to_balance).to_fixed_string(),
        });
        let merged_metadata = merge_json(&pending.metadata, &patch);

        let updated_log = sqlx::query_as::<_, TransactionLogModel>(
            r#"
            UPDATE transaction_logs
            SET status = 'SUCCESS', metadata = $1, updated_at = $2
            WHERE id = $3 AND status = 'PENDING'
            RETURNING id, from_wallet_id, to_wallet_id, amount, status,
                      idempotency_key, error_message, metadata, created_at, updated_at
            "#,
        )
        .bind(&merged_metadata)
        .bind(now)
        .bind(pending.id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| TransferError::internal(format!("failed to finalize transaction log: {e}")))?
        .ok_or_else(|| {
            TransferError::internal("PENDING transaction log vanished before finalize".to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| TransferError::internal(format!("failed to commit transfer: {e}")))?;

        Ok(TransferOutcome {
            log: updated_log.into(),
            from_balance_after: Money::from_decimal(new_from_balance),
            to_balance_after: Money::from_decimal(new_to_balance),
        })
    }

    async fn mark_failed(
        &self,
        idempotency_key: &str,
        error_message: &str,
    ) -> Result<(), TransferError> {
        const MAX_ERROR_MESSAGE_LEN: usize = 2000;
        let truncated: String = error_message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        let now = Utc::now();

        let existing = sqlx::query_as::<_, TransactionLogModel>(
            r#"SELECT id, from_wallet_id, to_wallet_id, amount, status,
                      idempotency_key, error_message, metadata, created_at, updated_at
               FROM transaction_logs WHERE idempotency_key = $1"#,
        )
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TransferError::internal(format!("failed to load log for failure write: {e}")))?;

        let Some(existing) = existing else {
            return Err(TransferError::internal(format!(
                "no transaction log found for idempotencyKey '{idempotency_key}' while recording failure"
            )));
        };

        let patch = json!({ "failedAt": now });
        let merged_metadata = merge_json(&existing.metadata, &patch);

        sqlx::query(
            r#"
            UPDATE transaction_logs
            SET status = 'FAILED', error_message = $1, metadata = $2, updated_at = $3
            WHERE idempotency_key = $4 AND status = 'PENDING'
            "#,
        )
        .bind(&truncated)
        .bind(&merged_metadata)
        .bind(now)
        .bind(idempotency_key)
        .execute(&self.pool)
        .await
        .map_err(|e| TransferError::internal(format!("failed to write FAILED status: {e}")))?;

        Ok(())
    }

    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<TransactionLog>, TransferError> {
        let model_opt = sqlx::query_as::<_, TransactionLogModel>(
            r#"SELECT id, from_wallet_id, to_wallet_id, amount, status,
                      idempotency_key, error_message, metadata, created_at, updated_at
               FROM transaction_logs WHERE idempotency_key = $1"#,
        )
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TransferError::internal(format!("log lookup by key failed: {e}")))?;

        Ok(model_opt.map(Into::into))
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<TransactionLog>, TransferError> {
        let model_opt = sqlx::query_as::<_, TransactionLogModel>(
            r#"SELECT id, from_wallet_id, to_wallet_id, amount, status,
                      idempotency_key, error_message, metadata, created_at, updated_at
               FROM transaction_logs WHERE id = $1"#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TransferError::internal(format!("log lookup by id failed: {e}")))?;

        Ok(model_opt.map(Into::into))
    }

    async fn find_recent_by_wallet_id(
        &self,
        wallet_id: WalletId,
    ) -> Result<Vec<TransactionLog>, TransferError> {
        let models = sqlx::query_as::<_, TransactionLogModel>(
            r#"
            SELECT id, from_wallet_id, to_wallet_id, amount, status,
                   idempotency_key, error_message, metadata, created_at, updated_at
            FROM transaction_logs
            WHERE from_wallet_id = $1 OR to_wallet_id = $1
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        )
        .bind(wallet_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TransferError::internal(format!("history lookup failed: {e}")))?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

async fn lock_wallet_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Option<WalletModel>, TransferError> {
    sqlx::query_as::<_, WalletModel>(
        r#"
        SELECT id, owner_id, balance, version, created_at, updated_at
        FROM wallets
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| TransferError::internal(format!("failed to lock wallet row: {e}")))
}

async fn update_wallet_balance(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    new_balance: Decimal,
) -> Result<(), TransferError> {
    sqlx::query(
        r#"
        UPDATE wallets
        SET balance = $1, version = version + 1, updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(new_balance)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut **tx)
    .await
    .map_err(|e| TransferError::internal(format!("failed to update wallet balance: {e}")))?;

    Ok(())
}

fn merge_json(base: &JsonValue, patch: &JsonValue) -> JsonValue {
    let mut merged = base.as_object().cloned().unwrap_or_default();
    if let Some(patch_obj) = patch.as_object() {
        for (k, v) in patch_obj {
            merged.insert(k.clone(), v.clone());
        }
    }
    JsonValue::Object(merged)
}

fn is_unique_violation(db_err: &(dyn sqlx::error::DatabaseError + '_)) -> bool {
    db_err.code().as_deref() == Some("23505")
        && db_err
            .constraint()
            .map(|c| c.contains("idempotency_key"))
            .unwrap_or(true)
}
