//! Environment-driven configuration, loaded once at startup.

use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage_dir: PathBuf,
    pub output_path: PathBuf,
    pub sender_id: String,
    pub receiver_id: String,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("CLINICAL_PORT", "8082")
            .parse()
            .context("CLINICAL_PORT must be a valid u16")?;
        let storage_dir = PathBuf::from(env_or("CLINICAL_STORAGE_DIR", "./data/ce"));
        std::fs::create_dir_all(&storage_dir)
            .with_context(|| format!("creating CLINICAL_STORAGE_DIR at {}", storage_dir.display()))?;

        let output_path = PathBuf::from(env_or("GDT_OUTPUT_PATH", "./data/ce/exchange"));
        std::fs::create_dir_all(&output_path)
            .with_context(|| format!("creating GDT_OUTPUT_PATH at {}", output_path.display()))?;

        let tls_cert_path = std::env::var("TLS_CERT_PATH").ok().map(PathBuf::from);
        let tls_key_path = std::env::var("TLS_KEY_PATH").ok().map(PathBuf::from);

        Ok(Self {
            port,
            storage_dir,
            output_path,
            sender_id: env_or("GDT_SENDER_ID", "pghd-ce"),
            receiver_id: env_or("GDT_RECEIVER_ID", "pms"),
            tls_cert_path,
            tls_key_path,
        })
    }

    pub fn status_path(&self) -> PathBuf {
        self.storage_dir.join("clinical_status.txt")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
