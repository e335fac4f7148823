use std::sync::Arc;
use std::time::Duration;

use common::{Money, TransactionId, TransferError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::entities::TransactionStatus;
use crate::domain::ports::{DistributedLease, LeaseAcquireOutcome, ResultCache};
use crate::domain::repository::{TransactionLogRepository, WalletRepository};
use crate::domain::validator::ValidatedTransferRequest;

/// Contrato de respuesta para un intento de transferencia, éxito o replay
/// idempotente. Se serializa tal cual en la caché de resultados de tier 1,
/// así que reproducir un hit de caché y reproducir un hit reconstruido desde
/// el ledger producen la misma forma.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub transaction_id: TransactionId,
    pub success: bool,
    pub message: String,
    pub from_balance: Money,
    pub to_balance: Money,
}

/// Parámetros ajustables de la caché de idempotencia y del lease distribuido.
#[derive(Debug, Clone)]
pub struct IdempotencyConfig {
    pub cache_ttl: Duration,
    pub lease_ttl: Duration,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            lease_ttl: Duration::from_secs(30),
        }
    }
}

/// Idempotency coordinator que envuelve el transfer executor y el failure
/// recorder en un único método de orquestación: struct plano, puertos
/// `Arc<dyn Trait>`, un solo punto de entrada `execute`.
pub struct ProcessTransferUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    log_repo: Arc<dyn TransactionLogRepository>,
    cache: Arc<dyn ResultCache>,
    lease: Arc<dyn DistributedLease>,
    config: IdempotencyConfig,
}

impl ProcessTransferUseCase {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        log_repo: Arc<dyn TransactionLogRepository>,
        cache: Arc<dyn ResultCache>,
        lease: Arc<dyn DistributedLease>,
        config: IdempotencyConfig,
    ) -> Self {
        Self {
            wallet_repo,
            log_repo,
            cache,
            lease,
            config,
        }
    }

    pub async fn execute(
        &self,
        req: ValidatedTransferRequest,
    ) -> Result<TransferResult, TransferError> {
        let key = req.idempotency_key.as_str();

        // Tier 1 — caché de resultados.
        match self.cache.get(key).await {
            Ok(Some(cached_json)) => {
                if let Ok(mut cached) = serde_json::from_str::<TransferResult>(&cached_json) {
                    cached.message = format!("{} (from cache)", cached.message);
                    return Ok(cached);
                }
                warn!("idempotency cache hit for key '{key}' could not be deserialized; treating as miss");
            }
            Ok(None) => {}
            Err(e) => warn!("idempotency cache read failed for key '{key}', degrading to miss: {e}"),
        }

        // Tier 2 — lease distribuido tipo mutex.
        let lease_outcome = self.lease.try_acquire(key, self.config.lease_ttl).await;
        let lease_held_by_us = matches!(lease_outcome, LeaseAcquireOutcome::Acquired);

        if lease_outcome == LeaseAcquireOutcome::HeldByOther {
            return self.resolve_via_ledger_lookup(key).await;
        }

        // Tier 3 (enforcement) — el insert PENDING, dentro del path del transfer executor.
        let pending = match self
            .log_repo
            .insert_pending(
                TransactionId::new(),
                req.from_wallet_id,
                req.to_wallet_id,
                req.amount,
                key,
                json!({ "requestedAt": chrono::Utc::now() }),
            )
            .await
        {
            Ok(pending) => pending,
            Err(e) if e.kind == common::ErrorKind::DuplicateRequest => {
                let result = self.resolve_via_ledger_lookup(key).await;
                if lease_held_by_us {
                    self.lease.release(key).await;
                }
                return result;
            }
            Err(e) => {
                if lease_held_by_us {
                    self.lease.release(key).await;
                }
                return Err(e);
            }
        };

        // Débito/crédito con row-locking ordenado, dentro de su propia transacción.
        let outcome = self.log_repo.execute_transfer(&pending).await;

        let result = match outcome {
            Ok(outcome) => {
                let result = TransferResult {
                    transaction_id: outcome.log.id,
                    success: true,
                    message: "Transfer completed successfully".to_string(),
                    from_balance: outcome.from_balance_after,
                    to_balance: outcome.to_balance_after,
                };

                if let Ok(serialized) = serde_json::to_string(&result) {
                    if let Err(e) = self.cache.set(key, &serialized, self.config.cache_ttl).await {
                        warn!("failed to populate idempotency cache for key '{key}': {e}");
                    }
                } else {
                    warn!("failed to serialize transfer result for caching, key '{key}'");
                }

                info!(
                    "transfer {} completed: {} -> {} amount {}",
                    outcome.log.id, req.from_wallet_id, req.to_wallet_id, req.amount
                );

                Ok(result)
            }
            Err(e) => {
                // La escritura del failure recorder es best-effort: su propio
                // fallo se loggea, nunca se permite que tape el error original.
                if let Err(mark_err) = self.log_repo.mark_failed(key, &e.message).await {
                    warn!(
                        "failure recorder could not write FAILED status for key '{key}': {mark_err}"
                    );
                }
                Err(e)
            }
        };

        if lease_held_by_us {
            self.lease.release(key).await;
        }

        result
    }

    /// Fallback de contención de tier 2 / resolución de conflicto de tier 3:
    /// reconstruye una respuesta a partir del log que ya exista para esta llave.
    async fn resolve_via_ledger_lookup(&self, key: &str) -> Result<TransferResult, TransferError> {
        let Some(log) = self.log_repo.find_by_idempotency_key(key).await? else {
            return Err(TransferError::concurrent_processing(
                "another request is currently processing this idempotency key",
            ));
        };

        match log.status {
            TransactionStatus::Success => {
                let from_balance = self.balance_from_metadata(&log, "fromBalanceAfter").await?;
                let to_balance = self.balance_from_metadata(&log, "toBalanceAfter").await?;
                let result = TransferResult {
                    transaction_id: log.id,
                    success: true,
                    message: "Transfer already processed (idempotent request)".to_string(),
                    from_balance,
                    to_balance,
                };
                if let Ok(serialized) = serde_json::to_string(&result) {
                    if let Err(e) = self.cache.set(key, &serialized, self.config.cache_ttl).await {
                        warn!("failed to backfill idempotency cache for key '{key}': {e}");
                    }
                }
                Ok(result)
            }
            TransactionStatus::Pending => Err(TransferError::concurrent_processing(
                "Transfer is being processed",
            )),
            TransactionStatus::Failed => Err(TransferError::duplicate_request(
                "Transfer previously failed",
            )),
        }
    }

    async fn balance_from_metadata(
        &self,
        log: &crate::domain::entities::TransactionLog,
        field: &str,
    ) -> Result<Money, TransferError> {
        if let Some(s) = log.metadata.get(field).and_then(|v| v.as_str()) {
            if let Some(m) = Money::parse(s) {
                return Ok(m);
            }
        }
        // Metadata sin el balance post-operación (no debería pasar para una
        // fila SUCCESS) — se cae a una lectura fresca de la billetera en vez
        // de fallar el replay directamente.
        let wallet_id = if field == "fromBalanceAfter" {
            log.from_wallet_id
        } else {
            log.to_wallet_id
        };
        let wallet = self
            .wallet_repo
            .find_by_id(wallet_id)
            .await?
            .ok_or_else(|| TransferError::wallet_not_found(format!("wallet {wallet_id} vanished")))?;
        Ok(wallet.balance)
    }
}
