use async_trait::async_trait;
use common::{TransferError, WalletId};
use sqlx::PgPool;

use crate::domain::entities::Wallet;
use crate::domain::repository::WalletRepository;
use crate::infrastructure::persistence::models::WalletModel;

/// Repositorio de Billeteras basado en PostgreSQL. Sólo lectura — la
/// mutación de balances vive en `TransactionLogRepository::execute_transfer`,
/// porque esa mutación siempre ocurre junto con el log dentro de la misma
/// transacción ordenada por row lock.
pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, TransferError> {
        let model_opt = sqlx::query_as::<_, WalletModel>(
            r#"
            SELECT id, owner_id, balance, version, created_at, updated_at
            FROM wallets
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TransferError::internal(format!("wallet lookup failed: {e}")))?;

        Ok(model_opt.map(Into::into))
    }
}
