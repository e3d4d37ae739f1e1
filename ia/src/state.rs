//! Rocket-managed application state: one instance per process, owning every
//! store and the signing key.

use crate::auth_codes::AuthCodeStore;
use crate::config::Config;
use crate::keys::SigningMaterial;
use crate::patients::PatientStore;
use crate::refresh_tokens::RefreshTokenStore;

pub struct IaState {
    pub config: Config,
    pub patients: PatientStore,
    pub auth_codes: AuthCodeStore,
    pub refresh_tokens: RefreshTokenStore,
    pub keys: SigningMaterial,
}

impl IaState {
    pub fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let patients = PatientStore::open(config.patients_path())?;
        let auth_codes = AuthCodeStore::open(config.auth_codes_path())?;
        let refresh_tokens = RefreshTokenStore::open(config.refresh_tokens_path())?;
        let keys = SigningMaterial::load_or_generate(&config.signing_key_path())?;
        Ok(Self {
            config,
            patients,
            auth_codes,
            refresh_tokens,
            keys,
        })
    }
}
