//! JWKS cache: fetched lazily from the Identity Authority, refreshed on a
//! `kid` miss, falling back to the last-known key set on refresh failure.

use std::sync::RwLock;

use crate::config::Config;
use crate::model::{Jwk, JwkSet};

pub struct JwksCache {
    http: reqwest::Client,
    jwks_url: String,
    cached: RwLock<Option<JwkSet>>,
}

impl JwksCache {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.jwks_refresh_timeout).build()?;
        Ok(Self {
            http,
            jwks_url: config.jwks_url(),
            cached: RwLock::new(None),
        })
    }

    /// Find the key for `kid`. On a cache miss, refresh once and retry; a
    /// failed refresh keeps serving whatever was last known (possibly
    /// nothing, on first start).
    pub async fn find(&self, kid: &str) -> Option<Jwk> {
        if let Some(key) = self.lookup(kid) {
            return Some(key);
        }
        if let Err(err) = self.refresh().await {
            log::warn!("JWKS refresh failed: {err}");
        }
        self.lookup(kid)
    }

    fn lookup(&self, kid: &str) -> Option<Jwk> {
        let cached = self.cached.read().expect("jwks cache lock poisoned");
        cached.as_ref()?.keys.iter().find(|k| k.kid == kid).cloned()
    }

    async fn refresh(&self) -> anyhow::Result<()> {
        let set: JwkSet = self.http.get(&self.jwks_url).send().await?.error_for_status()?.json().await?;
        *self.cached.write().expect("jwks cache lock poisoned") = Some(set);
        Ok(())
    }
}
