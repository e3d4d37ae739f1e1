//! Rocket-managed application state: one instance shared across all
//! handlers via `.manage(...)`, each store internally serializing its own
//! mutation per §5's ownership model.

use crate::audit::AuditLog;
use crate::config::Config;
use crate::idempotency::IdempotencyStore;
use crate::jwks::JwksCache;
use crate::rate_limit::RateLimiter;

pub struct IgState {
    pub config: Config,
    pub http: reqwest::Client,
    pub jwks: JwksCache,
    pub rate_limiter: RateLimiter,
    pub idempotency: IdempotencyStore,
    pub audit: AuditLog,
}

impl IgState {
    pub fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let jwks = JwksCache::new(&config)?;
        let rate_limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window_secs);
        let idempotency = IdempotencyStore::open(config.idempotency_path())?;
        let audit = AuditLog::open(config.audit_log_path())?;
        let http = reqwest::Client::builder().timeout(config.submit_timeout).build()?;

        Ok(Self {
            config,
            http,
            jwks,
            rate_limiter,
            idempotency,
            audit,
        })
    }
}
