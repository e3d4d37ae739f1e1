//! Environment-driven configuration, loaded once at startup.

use std::path::PathBuf;

use anyhow::Context;

/// A single registered OAuth client. The source never validates
/// `redirect_uri` against anything; this field closes that gap per the
/// recorded Open Question decision (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct Client {
    pub client_id: String,
    pub allowed_redirect_uris: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage_dir: PathBuf,
    pub issuer: String,
    pub public_base_url: String,
    pub audience: String,
    pub client: Client,
    pub admin_token: Option<String>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("IAM_PORT", "8080")
            .parse()
            .context("IAM_PORT must be a valid u16")?;
        let storage_dir = PathBuf::from(env_or("IAM_STORAGE_DIR", "./data/ia"));
        std::fs::create_dir_all(&storage_dir)
            .with_context(|| format!("creating IAM_STORAGE_DIR at {}", storage_dir.display()))?;

        let client = Client {
            client_id: env_or("IAM_CLIENT_ID", "client-facing-server"),
            allowed_redirect_uris: env_or("IAM_CLIENT_REDIRECT_URIS", "http://localhost:3000/callback")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let admin_token = std::env::var("IAM_ADMIN_TOKEN").ok().filter(|s| !s.is_empty());
        if admin_token.is_none() {
            log::warn!("IAM_ADMIN_TOKEN is unset; /patients endpoints are unauthenticated");
        }

        let tls_cert_path = std::env::var("TLS_CERT_PATH").ok().map(PathBuf::from);
        let tls_key_path = std::env::var("TLS_KEY_PATH").ok().map(PathBuf::from);

        Ok(Self {
            port,
            storage_dir,
            issuer: env_or("IAM_ISSUER", "iam-server"),
            public_base_url: env_or("IAM_BASE_URL", &format!("http://localhost:{port}")),
            audience: env_or("IAM_AUDIENCE", "client-facing-server"),
            client,
            admin_token,
            tls_cert_path,
            tls_key_path,
        })
    }

    pub fn patients_path(&self) -> PathBuf {
        self.storage_dir.join("patients.txt")
    }

    pub fn auth_codes_path(&self) -> PathBuf {
        self.storage_dir.join("auth_codes.txt")
    }

    pub fn refresh_tokens_path(&self) -> PathBuf {
        self.storage_dir.join("refresh_tokens.txt")
    }

    pub fn signing_key_path(&self) -> PathBuf {
        self.storage_dir.join("ec_private_key.pem")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
