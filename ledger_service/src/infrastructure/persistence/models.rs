use chrono::{DateTime, Utc};
use common::{Money, TransactionId, WalletId};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::entities::{TransactionLog, TransactionStatus, Wallet};

/// Modelo de Base de Datos para Wallet (especifico de SQLx). Guarda los ids
/// como `Uuid` crudo; la conversión a los NewTypes de dominio ocurre en
/// `From<WalletModel> for Wallet`.
#[derive(Debug, FromRow)]
pub struct WalletModel {
    pub id: Uuid,
    pub owner_id: String,
    pub balance: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WalletModel> for Wallet {
    fn from(m: WalletModel) -> Self {
        Wallet::reconstitute(
            WalletId(m.id),
            m.owner_id,
            Money::from_decimal(m.balance),
            m.version,
            m.created_at,
            m.updated_at,
        )
    }
}

/// Modelo de Base de Datos para TransactionLog.
#[derive(Debug, FromRow)]
pub struct TransactionLogModel {
    pub id: Uuid,
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub idempotency_key: String,
    pub error_message: Option<String>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionLogModel> for TransactionLog {
    fn from(m: TransactionLogModel) -> Self {
        TransactionLog {
            id: TransactionId(m.id),
            from_wallet_id: WalletId(m.from_wallet_id),
            to_wallet_id: WalletId(m.to_wallet_id),
            amount: Money::from_decimal(m.amount),
            status: m.status,
            idempotency_key: m.idempotency_key,
            error_message: m.error_message,
            metadata: m.metadata,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
