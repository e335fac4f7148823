use std::sync::Arc;

use common::{TransferError, WalletId};

use crate::domain::entities::TransactionLog;
use crate::domain::repository::TransactionLogRepository;

/// Up to the 100 most recent logs touching the wallet, regardless of
/// status, newest first — no pagination beyond the fixed cap.
#[derive(Clone)]
pub struct GetHistoryUseCase {
    log_repo: Arc<dyn TransactionLogRepository>,
}

impl GetHistoryUseCase {
    pub fn new(log_repo: Arc<dyn TransactionLogRepository>) -> Self {
        Self { log_repo }
    }

    pub async fn execute(&self, wallet_id: WalletId) -> Result<Vec<TransactionLog>, TransferError> {
        self.log_repo.find_recent_by_wallet_id(wallet_id).await
    }
}
