use std::env;
use std::time::Duration;

/// `ENV` — recognized deployment environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    fn from_env_var(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "production" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

/// Process configuration, assembled from the environment with ad hoc
/// `env::var(...).unwrap_or_else` calls — no config-file framework,
/// `dotenvy::dotenv()` is called once at startup before this is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: String,
    pub database_url: String,
    pub db_pool_max: u32,
    pub db_pool_min: u32,
    pub db_acquire_timeout: Duration,
    pub db_idle_timeout: Duration,
    pub cache_url: String,
    pub cache_key_prefix: String,
    pub cache_idempotency_ttl: Duration,
    pub cache_lease_ttl: Duration,
    pub cache_lease_retries: u32,
    pub cache_lease_retry_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let environment =
            Environment::from_env_var(&env::var("ENV").unwrap_or_else(|_| "development".into()));

        Self {
            environment,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            db_pool_max: env_parse("DB_POOL_MAX", 20),
            db_pool_min: env_parse("DB_POOL_MIN", 5),
            db_acquire_timeout: Duration::from_millis(env_parse("DB_ACQUIRE_TIMEOUT_MS", 30_000)),
            db_idle_timeout: Duration::from_millis(env_parse("DB_IDLE_TIMEOUT_MS", 600_000)),
            cache_url: env::var("CACHE_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            cache_key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or_else(|_| "wallet:".to_string()),
            cache_idempotency_ttl: Duration::from_secs(env_parse(
                "CACHE_IDEMPOTENCY_TTL_SECONDS",
                24 * 60 * 60,
            )),
            cache_lease_ttl: Duration::from_secs(env_parse("CACHE_LEASE_TTL_SECONDS", 30)),
            cache_lease_retries: env_parse("CACHE_LEASE_RETRIES", 50),
            cache_lease_retry_interval: Duration::from_millis(env_parse(
                "CACHE_LEASE_RETRY_INTERVAL_MS",
                100,
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
