use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::entities::TransactionLog;

/// Generic success envelope: `{status, data}`.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[schema(value_type = Object)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

/// POST /api/transfer success body.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponseBody {
    pub success: bool,
    pub transaction_id: String,
    pub message: String,
    pub from_balance: String,
    pub to_balance: String,
}

/// GET /api/wallet/{id}/balance success body.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponseBody {
    pub wallet_id: String,
    pub balance: String,
}

/// GET /health body.
#[derive(Serialize, ToSchema)]
pub struct HealthResponseBody {
    pub status: &'static str,
    pub services: HealthServices,
}

#[derive(Serialize, ToSchema)]
pub struct HealthServices {
    pub database: &'static str,
    pub cache: &'static str,
}

/// GET /api/wallet/{id}/transactions entry — an API-layer projection of
/// `TransactionLog`, kept separate so `utoipa::ToSchema` (and any future
/// wire-format change) never has to leak into the domain entity.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLogResponseBody {
    pub id: String,
    pub from_wallet_id: String,
    pub to_wallet_id: String,
    pub amount: String,
    pub status: String,
    pub idempotency_key: String,
    pub error_message: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

impl From<&TransactionLog> for TransactionLogResponseBody {
    fn from(log: &TransactionLog) -> Self {
        Self {
            id: log.id.to_string(),
            from_wallet_id: log.from_wallet_id.to_string(),
            to_wallet_id: log.to_wallet_id.to_string(),
            amount: log.amount.to_fixed_string(),
            status: format!("{:?}", log.status).to_uppercase(),
            idempotency_key: log.idempotency_key.clone(),
            error_message: log.error_message.clone(),
            metadata: log.metadata.clone(),
        }
    }
}
