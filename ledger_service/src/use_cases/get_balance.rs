use std::sync::Arc;

use common::{Money, TransferError, WalletId};

use crate::domain::repository::WalletRepository;

/// Bypasses the cache — reads are always from the ledger — and takes no locks.
#[derive(Clone)]
pub struct GetBalanceUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
}

impl GetBalanceUseCase {
    pub fn new(wallet_repo: Arc<dyn WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    pub async fn execute(&self, wallet_id: WalletId) -> Result<Money, TransferError> {
        self.wallet_repo
            .find_by_id(wallet_id)
            .await?
            .map(|w| w.balance)
            .ok_or_else(|| TransferError::wallet_not_found(format!("wallet {wallet_id} does not exist")))
    }
}
