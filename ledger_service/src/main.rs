use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ledger_service::api::http_routes::{routes, AppState};
use ledger_service::config::Config;
use ledger_service::infrastructure::cache::redis_store::RedisStore;
use ledger_service::infrastructure::persistence::transaction_log_repository::PostgresTransactionLogRepository;
use ledger_service::infrastructure::persistence::wallet_repository::PostgresWalletRepository;
use ledger_service::use_cases::get_balance::GetBalanceUseCase;
use ledger_service::use_cases::get_history::GetHistoryUseCase;
use ledger_service::use_cases::transfer::{IdempotencyConfig, ProcessTransferUseCase};

#[derive(OpenApi)]
#[openapi(
    paths(
        ledger_service::api::http_routes::health,
        ledger_service::api::http_routes::transfer,
        ledger_service::api::http_routes::get_balance,
        ledger_service::api::http_routes::get_transactions
    ),
    components(schemas(
        ledger_service::api::http_routes::TransferRequest,
        ledger_service::api::response::ApiResponse<serde_json::Value>,
        ledger_service::api::response::TransferResponseBody,
        ledger_service::api::response::BalanceResponseBody,
        ledger_service::api::response::HealthResponseBody,
        ledger_service::api::response::TransactionLogResponseBody
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Cargar variables de entorno
    dotenv().ok();

    // 2. Configurar Logging/Tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    info!(environment = ?config.environment, "Starting Ledger Service...");

    // 3. Configurar Conexión a Base de Datos
    let pool = PgPoolOptions::new()
        .max_connections(config.db_pool_max)
        .min_connections(config.db_pool_min)
        .acquire_timeout(config.db_acquire_timeout)
        .idle_timeout(config.db_idle_timeout)
        .connect(&config.database_url)
        .await?;

    info!("Connected to Database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    // 4. Configurar Conexión a Cache/Lease (Redis)
    let cache = Arc::new(
        RedisStore::connect(
            &config.cache_url,
            config.cache_key_prefix.clone(),
            config.cache_lease_retries,
            config.cache_lease_retry_interval,
        )
        .await?,
    );

    info!("Connected to Cache");

    // 5. Instanciar Dependencias (Infraestructura)
    let wallet_repo = Arc::new(PostgresWalletRepository::new(pool.clone()));
    let log_repo = Arc::new(PostgresTransactionLogRepository::new(pool.clone()));

    // 6. Instanciar Casos de Uso
    let process_transfer_use_case = ProcessTransferUseCase::new(
        wallet_repo.clone(),
        log_repo.clone(),
        cache.clone(),
        cache.clone(),
        IdempotencyConfig {
            cache_ttl: config.cache_idempotency_ttl,
            lease_ttl: config.cache_lease_ttl,
        },
    );
    let get_balance_use_case = GetBalanceUseCase::new(wallet_repo.clone());
    let get_history_use_case = GetHistoryUseCase::new(log_repo.clone());

    // 7. Configurar Estado de la App Axum
    let app_state = Arc::new(AppState {
        process_transfer_use_case,
        get_balance_use_case,
        get_history_use_case,
        db_pool: pool,
        cache,
        environment: config.environment,
    });

    // 8. Configurar Rutas y Servidor HTTP
    let app = routes(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let addr = format!("{}:{}", config.host, config.port);
    info!("HTTP Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
