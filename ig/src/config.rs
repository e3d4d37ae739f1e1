//! Environment-driven configuration, loaded once at startup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage_dir: PathBuf,
    pub iam_base_url: String,
    pub clinical_base_url: String,
    pub audience: String,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: i64,
    pub submit_timeout: Duration,
    pub jwks_refresh_timeout: Duration,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("CLIENT_PORT", "8081")
            .parse()
            .context("CLIENT_PORT must be a valid u16")?;
        let storage_dir = PathBuf::from(env_or("CLIENT_STORAGE_DIR", "./data/ig"));
        std::fs::create_dir_all(&storage_dir)
            .with_context(|| format!("creating CLIENT_STORAGE_DIR at {}", storage_dir.display()))?;

        let rate_limit_max = env_or("RATE_LIMIT_MAX", "60")
            .parse()
            .context("RATE_LIMIT_MAX must be a u32")?;
        let rate_limit_window_secs = env_or("RATE_LIMIT_WINDOW", "60")
            .parse()
            .context("RATE_LIMIT_WINDOW must be an i64")?;
        let submit_timeout_secs: u64 = env_or("SUBMIT_TIMEOUT_SECS", "10")
            .parse()
            .context("SUBMIT_TIMEOUT_SECS must be a u64")?;
        let jwks_refresh_timeout_secs: u64 = env_or("JWKS_REFRESH_TIMEOUT_SECS", "2")
            .parse()
            .context("JWKS_REFRESH_TIMEOUT_SECS must be a u64")?;

        let tls_cert_path = std::env::var("TLS_CERT_PATH").ok().map(PathBuf::from);
        let tls_key_path = std::env::var("TLS_KEY_PATH").ok().map(PathBuf::from);

        Ok(Self {
            port,
            storage_dir,
            iam_base_url: env_or("IAM_BASE_URL", "http://localhost:8080"),
            clinical_base_url: env_or("CLINICAL_BASE_URL", "http://localhost:8082"),
            audience: env_or("IAM_AUDIENCE", "client-facing-server"),
            rate_limit_max,
            rate_limit_window_secs,
            submit_timeout: Duration::from_secs(submit_timeout_secs),
            jwks_refresh_timeout: Duration::from_secs(jwks_refresh_timeout_secs),
            tls_cert_path,
            tls_key_path,
        })
    }

    pub fn idempotency_path(&self) -> PathBuf {
        self.storage_dir.join("idempotency.txt")
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.storage_dir.join("audit.log")
    }

    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.iam_base_url)
    }

    pub fn jwks_url(&self) -> String {
        format!("{}/jwks", self.iam_base_url)
    }

    pub fn process_url(&self) -> String {
        format!("{}/api/v1/process", self.clinical_base_url)
    }

    pub fn status_url(&self, patient_id: &str) -> String {
        format!("{}/api/v1/status/{patient_id}", self.clinical_base_url)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
