use async_trait::async_trait;
use std::time::Duration;

/// Tier 1 del idempotency coordinator: la caché de resultados. `get`/`set`
/// operan sobre llaves ya namespaced (el llamador, `RedisStore`, aplica el
/// layout `idempotency:{key}` y el prefijo del servicio). Los errores de
/// este puerto siempre se tratan como miss por el llamador — la caché nunca
/// es el ancla de corrección, sólo una optimización de latencia.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Tier 2: el lease distribuido tipo mutex. `try_acquire` retorna `Acquired`,
/// `FailedOpen` (ocurrió un error de caché — se procede como si el lease
/// estuviera tomado, según la política explícita de fail-open), o
/// `HeldByOther` (se agotó el presupuesto de reintentos contra un holder
/// vivo, sin error de caché — el llamador debe caer al lookup de tier 3).
#[async_trait]
pub trait DistributedLease: Send + Sync {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> LeaseAcquireOutcome;

    /// Best-effort; los fallos se loggean, nunca se propagan (el TTL es el backstop).
    async fn release(&self, key: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseAcquireOutcome {
    Acquired,
    FailedOpen,
    HeldByOther,
}

#[derive(Debug, thiserror::Error)]
#[error("cache error: {0}")]
pub struct CacheError(pub String);
