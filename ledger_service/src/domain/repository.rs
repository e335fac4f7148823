use crate::domain::entities::{TransactionLog, Wallet};
use async_trait::async_trait;
use common::{Money, TransactionId, TransferError, WalletId};
use serde_json::Value as JsonValue;

/// Port (interface) for Wallet persistence. `sqlx::PgPool`/`PgTransaction`
/// are the only implementation detail this trait hides — tests inject an
/// in-memory fake via `mockall`.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, TransferError>;
}

/// Port for TransactionLog persistence and the ordered-lock transfer itself.
/// `execute_transfer` owns the whole debit/credit cycle inside one
/// `sqlx::Transaction` — ordered row locks, existence and balance checks,
/// the debit/credit, and the SUCCESS finalize. It is deliberately one method
/// (not "lock" + "mutate" + "commit" as separate calls) because the
/// ordering and atomicity are a single invariant, not a sequence the caller
/// is trusted to get right.
#[async_trait]
pub trait TransactionLogRepository: Send + Sync {
    /// Tier-3 enforcement: inserts the PENDING row as its own committed
    /// statement, independent of the transfer transaction. A unique-constraint
    /// violation on `idempotency_key` surfaces as `ErrorKind::DuplicateRequest`.
    async fn insert_pending(
        &self,
        id: TransactionId,
        from_wallet_id: WalletId,
        to_wallet_id: WalletId,
        amount: Money,
        idempotency_key: &str,
        metadata: JsonValue,
    ) -> Result<TransactionLog, TransferError>;

    /// Steps 2-8: ordered row locks, existence/balance checks, debit/credit,
    /// SUCCESS finalize — all inside one transaction.
    async fn execute_transfer(
        &self,
        pending: &TransactionLog,
    ) -> Result<TransferOutcome, TransferError>;

    /// Best-effort from the caller's perspective, but returns its own
    /// `Result` so the use case can log (not propagate) a secondary
    /// failure without losing the original error.
    async fn mark_failed(
        &self,
        idempotency_key: &str,
        error_message: &str,
    ) -> Result<(), TransferError>;

    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<TransactionLog>, TransferError>;

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<TransactionLog>, TransferError>;

    /// Up to 100 most recent logs touching `wallet_id`, newest first.
    async fn find_recent_by_wallet_id(
        &self,
        wallet_id: WalletId,
    ) -> Result<Vec<TransactionLog>, TransferError>;
}

/// Result of a successful transfer: the finalized log plus the post-trade
/// balances, which the coordinator needs for the response and for the
/// cache-population payload.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub log: TransactionLog,
    pub from_balance_after: Money,
    pub to_balance_after: Money,
}
