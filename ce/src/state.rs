//! Rocket-managed application state.

use std::sync::atomic::AtomicU64;

use crate::config::Config;
use crate::status_store::StatusStore;

pub struct CeState {
    pub config: Config,
    pub status: StatusStore,
    pub filename_sequence: AtomicU64,
}

impl CeState {
    pub fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let status = StatusStore::open(config.status_path())?;
        Ok(Self {
            config,
            status,
            filename_sequence: AtomicU64::new(0),
        })
    }
}
