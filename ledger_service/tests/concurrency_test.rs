//! Exercises the scenarios from spec §8 that need genuine concurrent
//! execution rather than a single mocked call: concurrent duplicate keys,
//! contention on a shared source wallet, and exact fixed-point precision.
//! The fakes below hold real mutable state behind `tokio::sync::Mutex`
//! instead of `mockall` expectations, so two tasks racing through
//! `ProcessTransferUseCase::execute` observe each other's effects the way
//! two request handlers sharing one `PgPool`/Redis connection would.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{ErrorKind, Money, TransactionId, TransferError, WalletId};
use ledger_service::domain::entities::{TransactionLog, TransactionStatus, Wallet};
use ledger_service::domain::ports::{CacheError, DistributedLease, LeaseAcquireOutcome, ResultCache};
use ledger_service::domain::repository::{TransactionLogRepository, TransferOutcome, WalletRepository};
use ledger_service::domain::validator::validate_transfer_request;
use ledger_service::use_cases::transfer::{IdempotencyConfig, ProcessTransferUseCase};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value as JsonValue};
use tokio::sync::Mutex as AsyncMutex;

/// Per-wallet balance guarded by its own lock, so `execute_transfer` can
/// reproduce the "lock lower id first" discipline instead of holding one
/// global lock for the whole ledger.
struct WalletSlot {
    owner_id: String,
    balance: AsyncMutex<Decimal>,
}

struct FakeLedger {
    wallets: HashMap<WalletId, WalletSlot>,
    logs: AsyncMutex<HashMap<String, TransactionLog>>,
}

impl FakeLedger {
    fn new(wallets: Vec<(WalletId, &str, Decimal)>) -> Self {
        let wallets = wallets
            .into_iter()
            .map(|(id, owner, balance)| {
                (
                    id,
                    WalletSlot {
                        owner_id: owner.to_string(),
                        balance: AsyncMutex::new(balance),
                    },
                )
            })
            .collect();
        Self {
            wallets,
            logs: AsyncMutex::new(HashMap::new()),
        }
    }

    async fn balance_of(&self, id: WalletId) -> Decimal {
        *self.wallets[&id].balance.lock().await
    }
}

#[async_trait]
impl WalletRepository for FakeLedger {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, TransferError> {
        let Some(slot) = self.wallets.get(&id) else {
            return Ok(None);
        };
        let balance = *slot.balance.lock().await;
        let now = Utc::now();
        Ok(Some(Wallet::reconstitute(
            id,
            slot.owner_id.clone(),
            Money::from_decimal(balance),
            0,
            now,
            now,
        )))
    }
}

#[async_trait]
impl TransactionLogRepository for FakeLedger {
    async fn insert_pending(
        &self,
        id: TransactionId,
        from_wallet_id: WalletId,
        to_wallet_id: WalletId,
        amount: Money,
        idempotency_key: &str,
        metadata: JsonValue,
    ) -> Result<TransactionLog, TransferError> {
        let mut logs = self.logs.lock().await;
        if logs.contains_key(idempotency_key) {
            return Err(TransferError::duplicate_request(format!(
                "idempotencyKey '{idempotency_key}' has already been used"
            )));
        }
        let now = Utc::now();
        let log = TransactionLog {
            id,
            from_wallet_id,
            to_wallet_id,
            amount,
            status: TransactionStatus::Pending,
            idempotency_key: idempotency_key.to_string(),
            error_message: None,
            metadata,
            created_at: now,
            updated_at: now,
        };
        logs.insert(idempotency_key.to_string(), log.clone());
        Ok(log)
    }

    async fn execute_transfer(
        &self,
        pending: &TransactionLog,
    ) -> Result<TransferOutcome, TransferError> {
        let from_id = pending.from_wallet_id;
        let to_id = pending.to_wallet_id;
        let (first, second) = if from_id < to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };

        let Some(first_slot) = self.wallets.get(&first) else {
            return Err(TransferError::wallet_not_found(format!("wallet {first} does not exist")));
        };
        let mut first_guard = first_slot.balance.lock().await;

        let Some(second_slot) = self.wallets.get(&second) else {
            return Err(TransferError::wallet_not_found(format!("wallet {second} does not exist")));
        };
        let mut second_guard = second_slot.balance.lock().await;

        let (from_balance, to_balance) = if first == from_id {
            (&mut first_guard, &mut second_guard)
        } else {
            (&mut second_guard, &mut first_guard)
        };

        let amount = pending.amount.as_decimal();
        let available = **from_balance;
        if available < amount {
            return Err(TransferError::insufficient_balance(format!(
                "wallet {from_id} has balance {available} but {amount} was requested"
            )));
        }

        **from_balance -= amount;
        **to_balance += amount;
        let new_from = **from_balance;
        let new_to = **to_balance;
        drop(first_guard);
        drop(second_guard);

        let now = Utc::now();
        let mut metadata = pending.metadata.as_object().cloned().unwrap_or_default();
        metadata.insert("completedAt".into(), json!(now));
        metadata.insert("fromBalanceAfter".into(), json!(Money::from_decimal(new_from).to_fixed_string()));
        metadata.insert("toBalanceAfter".into(), json!(Money::from_decimal(new_to).to_fixed_string()));

        let mut logs = self.logs.lock().await;
        let log = logs.get_mut(&pending.idempotency_key).expect("pending log must exist");
        log.status = TransactionStatus::Success;
        log.metadata = JsonValue::Object(metadata);
        log.updated_at = now;
        let finalized = log.clone();
        drop(logs);

        Ok(TransferOutcome {
            log: finalized,
            from_balance_after: Money::from_decimal(new_from),
            to_balance_after: Money::from_decimal(new_to),
        })
    }

    async fn mark_failed(
        &self,
        idempotency_key: &str,
        error_message: &str,
    ) -> Result<(), TransferError> {
        let mut logs = self.logs.lock().await;
        if let Some(log) = logs.get_mut(idempotency_key) {
            log.status = TransactionStatus::Failed;
            log.error_message = Some(error_message.to_string());
            let mut metadata = log.metadata.as_object().cloned().unwrap_or_default();
            metadata.insert("failedAt".into(), json!(Utc::now()));
            log.metadata = JsonValue::Object(metadata);
            log.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<TransactionLog>, TransferError> {
        Ok(self.logs.lock().await.get(idempotency_key).cloned())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<TransactionLog>, TransferError> {
        Ok(self.logs.lock().await.values().find(|l| l.id == id).cloned())
    }

    async fn find_recent_by_wallet_id(
        &self,
        wallet_id: WalletId,
    ) -> Result<Vec<TransactionLog>, TransferError> {
        let logs = self.logs.lock().await;
        let mut matching: Vec<_> = logs
            .values()
            .filter(|l| l.from_wallet_id == wallet_id || l.to_wallet_id == wallet_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(100);
        Ok(matching)
    }
}

/// In-memory stand-in for `RedisStore`'s result-cache half.
#[derive(Default)]
struct FakeCache {
    entries: AsyncMutex<HashMap<String, String>>,
}

#[async_trait]
impl ResultCache for FakeCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
        self.entries.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// In-memory stand-in for `RedisStore`'s lease half. Uses a short retry
/// budget so contention tests don't pay the production ~5s ceiling.
struct FakeLease {
    held: AsyncMutex<HashSet<String>>,
    retries: u32,
    retry_interval: Duration,
}

impl FakeLease {
    fn new(retries: u32, retry_interval: Duration) -> Self {
        Self {
            held: AsyncMutex::new(HashSet::new()),
            retries,
            retry_interval,
        }
    }
}

#[async_trait]
impl DistributedLease for FakeLease {
    async fn try_acquire(&self, key: &str, _ttl: Duration) -> LeaseAcquireOutcome {
        for attempt in 0..self.retries {
            {
                let mut held = self.held.lock().await;
                if !held.contains(key) {
                    held.insert(key.to_string());
                    return LeaseAcquireOutcome::Acquired;
                }
            }
            if attempt + 1 < self.retries {
                tokio::time::sleep(self.retry_interval).await;
            }
        }
        LeaseAcquireOutcome::HeldByOther
    }

    async fn release(&self, key: &str) {
        self.held.lock().await.remove(key);
    }
}

fn fast_idempotency_config() -> IdempotencyConfig {
    IdempotencyConfig {
        cache_ttl: Duration::from_secs(60),
        lease_ttl: Duration::from_secs(5),
    }
}

const A: &str = "550e8400-e29b-41d4-a716-446655440000";
const B: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

#[tokio::test]
async fn concurrent_identical_requests_apply_the_transfer_exactly_once() {
    let wallet_a = WalletId::parse_canonical(A).unwrap();
    let wallet_b = WalletId::parse_canonical(B).unwrap();

    let ledger = Arc::new(FakeLedger::new(vec![
        (wallet_a, "owner-a", dec!(1000.0000)),
        (wallet_b, "owner-b", dec!(500.0000)),
    ]));
    let cache = Arc::new(FakeCache::default());
    let lease = Arc::new(FakeLease::new(10, Duration::from_millis(20)));

    let use_case = Arc::new(ProcessTransferUseCase::new(
        ledger.clone(),
        ledger.clone(),
        cache,
        lease,
        fast_idempotency_config(),
    ));

    let req_a = validate_transfer_request(A, B, "100.0000", "c1").unwrap();
    let req_b = validate_transfer_request(A, B, "100.0000", "c1").unwrap();

    let uc1 = use_case.clone();
    let uc2 = use_case.clone();
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { uc1.execute(req_a).await }),
        tokio::spawn(async move { uc2.execute(req_b).await }),
    );
    let r1 = r1.unwrap();
    let r2 = r2.unwrap();

    // At most one mutation: exactly one log row exists for the key, and A's
    // balance decreased by exactly 100.0000, not 0 and not 200.0000.
    let logs = ledger.logs.lock().await;
    assert_eq!(logs.len(), 1);
    drop(logs);

    assert_eq!(
        ledger.balance_of(wallet_a).await,
        dec!(900.0000),
        "source wallet must be debited exactly once"
    );
    assert_eq!(ledger.balance_of(wallet_b).await, dec!(600.0000));

    // Every outcome is either a successful (possibly replayed) result or a
    // categorized conflict — never a silent second mutation.
    for outcome in [r1, r2] {
        match outcome {
            Ok(result) => assert!(result.success),
            Err(e) => assert!(matches!(
                e.kind,
                ErrorKind::ConcurrentProcessing | ErrorKind::DuplicateRequest
            )),
        }
    }
}

#[tokio::test]
async fn three_concurrent_transfers_from_the_same_source_exhaust_the_balance_safely() {
    let wallet_a = WalletId::parse_canonical(A).unwrap();
    let wallet_b = WalletId::parse_canonical(B).unwrap();

    let ledger = Arc::new(FakeLedger::new(vec![
        (wallet_a, "owner-a", dec!(1000.0000)),
        (wallet_b, "owner-b", Decimal::ZERO),
    ]));
    let cache = Arc::new(FakeCache::default());
    let lease = Arc::new(FakeLease::new(10, Duration::from_millis(10)));

    let use_case = Arc::new(ProcessTransferUseCase::new(
        ledger.clone(),
        ledger.clone(),
        cache,
        lease,
        fast_idempotency_config(),
    ));

    let mut handles = Vec::new();
    for key in ["k1", "k2", "k3"] {
        let req = validate_transfer_request(A, B, "400.0000", key).unwrap();
        let uc = use_case.clone();
        handles.push(tokio::spawn(async move { uc.execute(req).await }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                assert!(result.success);
                succeeded += 1;
            }
            Err(e) => {
                assert_eq!(e.kind, ErrorKind::InsufficientBalance);
                insufficient += 1;
            }
        }
    }

    assert_eq!(succeeded, 2, "exactly two of three 400.0000 transfers fit in a 1000.0000 balance");
    assert_eq!(insufficient, 1);
    assert_eq!(ledger.balance_of(wallet_a).await, dec!(200.0000));
    assert_eq!(ledger.balance_of(wallet_b).await, dec!(800.0000));
}

#[tokio::test]
async fn transfer_arithmetic_is_exact_to_four_fractional_digits() {
    let wallet_a = WalletId::parse_canonical(A).unwrap();
    let wallet_b = WalletId::parse_canonical(B).unwrap();

    let ledger = Arc::new(FakeLedger::new(vec![
        (wallet_a, "owner-a", dec!(1000.0000)),
        (wallet_b, "owner-b", Decimal::ZERO),
    ]));
    let cache = Arc::new(FakeCache::default());
    let lease = Arc::new(FakeLease::new(5, Duration::from_millis(10)));

    let use_case = ProcessTransferUseCase::new(ledger.clone(), ledger.clone(), cache, lease, fast_idempotency_config());

    let req = validate_transfer_request(A, B, "123.4567", "p1").unwrap();
    let result = use_case.execute(req).await.unwrap();

    assert_eq!(result.from_balance.to_fixed_string(), "876.5433");
    assert_eq!(result.to_balance.to_fixed_string(), "123.4567");
    assert!(!result.from_balance.to_fixed_string().contains("00000000"));
}

#[tokio::test]
async fn insufficient_balance_leaves_a_failed_log_with_error_detail() {
    let wallet_a = WalletId::parse_canonical(A).unwrap();
    let wallet_b = WalletId::parse_canonical(B).unwrap();

    let ledger = Arc::new(FakeLedger::new(vec![
        (wallet_a, "owner-a", dec!(500.0000)),
        (wallet_b, "owner-b", Decimal::ZERO),
    ]));
    let cache = Arc::new(FakeCache::default());
    let lease = Arc::new(FakeLease::new(5, Duration::from_millis(10)));

    let use_case = ProcessTransferUseCase::new(ledger.clone(), ledger.clone(), cache, lease, fast_idempotency_config());

    let req = validate_transfer_request(A, B, "2000.0000", "i1").unwrap();
    let err = use_case.execute(req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientBalance);

    let logs = ledger.logs.lock().await;
    let log = logs.get("i1").expect("a log row must exist for a failed transfer");
    assert_eq!(log.status, TransactionStatus::Failed);
    let message = log.error_message.as_ref().expect("FAILED log must carry errorMessage");
    assert!(message.contains("500") && message.contains("2000"));

    // Balances are untouched.
    drop(logs);
    assert_eq!(ledger.balance_of(wallet_a).await, dec!(500.0000));
    assert_eq!(ledger.balance_of(wallet_b).await, Decimal::ZERO);
}
