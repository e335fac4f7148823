use chrono::{DateTime, Utc};
use common::{Money, TransactionId, WalletId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Modelo de Entidad: Wallet.
///
/// Representa una billetera administrada internamente. El balance nunca se
/// expresa en coma flotante: `Money` envuelve `rust_decimal::Decimal`
/// redondeado a 4 dígitos fraccionarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner_id: String,
    pub balance: Money,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn reconstitute(
        id: WalletId,
        owner_id: String,
        balance: Money,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            balance,
            version,
            created_at,
            updated_at,
        }
    }
}

/// Tri-state terminal de un `TransactionLog`. PENDING es transitorio; una vez
/// en SUCCESS o FAILED no hay transición de salida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

/// Modelo de Entidad: TransactionLog.
///
/// Registro append-only de cada intento de transferencia, llave de
/// idempotencia incluida. Nunca se elimina; `idempotency_key` es único a
/// nivel de todo el log, sin importar el estado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLog {
    pub id: TransactionId,
    pub from_wallet_id: WalletId,
    pub to_wallet_id: WalletId,
    pub amount: Money,
    pub status: TransactionStatus,
    pub idempotency_key: String,
    pub error_message: Option<String>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
