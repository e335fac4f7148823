use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use common::WalletId;
use serde::Deserialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::api::response::{
    ApiResponse, BalanceResponseBody, HealthResponseBody, HealthServices, TransactionLogResponseBody,
    TransferResponseBody,
};
use crate::config::Environment;
use crate::domain::ports::ResultCache;
use crate::domain::validator::validate_transfer_request;
use crate::use_cases::get_balance::GetBalanceUseCase;
use crate::use_cases::get_history::GetHistoryUseCase;
use crate::use_cases::transfer::ProcessTransferUseCase;

/// Shared application state injected into every handler.
pub struct AppState {
    pub process_transfer_use_case: ProcessTransferUseCase,
    pub get_balance_use_case: GetBalanceUseCase,
    pub get_history_use_case: GetHistoryUseCase,
    pub db_pool: PgPool,
    pub cache: Arc<dyn ResultCache>,
    pub environment: Environment,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/transfer", post(transfer))
        .route("/api/wallet/{id}/balance", get(get_balance))
        .route("/api/wallet/{id}/transactions", get(get_transactions))
        .with_state(state)
}

#[derive(Deserialize, ToSchema)]
pub struct TransferRequest {
    #[serde(rename = "fromWalletId")]
    pub from_wallet_id: String,
    #[serde(rename = "toWalletId")]
    pub to_wallet_id: String,
    pub amount: String,
    #[serde(rename = "idempotencyKey")]
    pub idempotency_key: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Liveness/readiness of the database and cache", body = HealthResponseBody))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponseBody> {
    let database = if sqlx::query("SELECT 1").execute(&state.db_pool).await.is_ok() {
        "ok"
    } else {
        "unavailable"
    };
    let cache = if state.cache.get("__healthcheck__").await.is_ok() {
        "ok"
    } else {
        "unavailable"
    };

    Json(HealthResponseBody {
        status: "ok",
        services: HealthServices { database, cache },
    })
}

#[utoipa::path(
    post,
    path = "/api/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer completed or idempotently replayed", body = ApiResponse<TransferResponseBody>),
        (status = 400, description = "Validation or balance error"),
        (status = 404, description = "Wallet not found"),
        (status = 409, description = "Duplicate or concurrently-processing request")
    )
)]
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<ApiResponse<TransferResponseBody>>, ApiError> {
    let validated = validate_transfer_request(
        &payload.from_wallet_id,
        &payload.to_wallet_id,
        &payload.amount,
        &payload.idempotency_key,
    )
    .map_err(|e| ApiError::new(e, state.environment))?;

    let result = state
        .process_transfer_use_case
        .execute(validated)
        .await
        .map_err(|e| ApiError::new(e, state.environment))?;

    Ok(Json(ApiResponse::success(TransferResponseBody {
        success: result.success,
        transaction_id: result.transaction_id.to_string(),
        message: result.message,
        from_balance: result.from_balance.to_fixed_string(),
        to_balance: result.to_balance.to_fixed_string(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/wallet/{id}/balance",
    params(("id" = String, Path, description = "Wallet id, canonical 8-4-4-4-12 form")),
    responses(
        (status = 200, description = "Current balance", body = ApiResponse<BalanceResponseBody>),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BalanceResponseBody>>, ApiError> {
    let wallet_id = parse_wallet_id(&id).map_err(|e| ApiError::new(e, state.environment))?;

    let balance = state
        .get_balance_use_case
        .execute(wallet_id)
        .await
        .map_err(|e| ApiError::new(e, state.environment))?;

    Ok(Json(ApiResponse::success(BalanceResponseBody {
        wallet_id: wallet_id.to_string(),
        balance: balance.to_fixed_string(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/wallet/{id}/transactions",
    params(("id" = String, Path, description = "Wallet id, canonical 8-4-4-4-12 form")),
    responses((status = 200, description = "Up to 100 most recent logs, newest first", body = ApiResponse<Vec<TransactionLogResponseBody>>))
)]
pub async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<TransactionLogResponseBody>>>, ApiError> {
    let wallet_id = parse_wallet_id(&id).map_err(|e| ApiError::new(e, state.environment))?;

    let history = state
        .get_history_use_case
        .execute(wallet_id)
        .await
        .map_err(|e| ApiError::new(e, state.environment))?;

    let body = history.iter().map(TransactionLogResponseBody::from).collect();

    Ok(Json(ApiResponse::success(body)))
}

fn parse_wallet_id(raw: &str) -> Result<WalletId, common::TransferError> {
    WalletId::parse_canonical(raw).ok_or_else(|| {
        common::TransferError::invalid_wallet_id(format!(
            "'{raw}' is not a canonical 8-4-4-4-12 wallet id"
        ))
    })
}
