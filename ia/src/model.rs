//! Wire/persistence DTOs for the Identity Authority.

use chrono::{DateTime, Utc};
use pghd_shared::store::Keyed;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: String,
    pub created_at: DateTime<Utc>,
}

impl Keyed for Patient {
    fn store_key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub subject: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub scope: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

impl Keyed for AuthorizationCode {
    fn store_key(&self) -> String {
        self.code.clone()
    }
}

impl AuthorizationCode {
    pub const TTL_SECONDS: i64 = 10 * 60;

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_seconds() >= Self::TTL_SECONDS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshToken {
    pub token: String,
    pub subject: String,
    pub scope: String,
    pub created_at: DateTime<Utc>,
}

impl Keyed for RefreshToken {
    fn store_key(&self) -> String {
        self.token.clone()
    }
}

impl RefreshToken {
    pub const TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_seconds() >= Self::TTL_SECONDS
    }
}

/// Optional subject demographics, co-located in access-token claims so the
/// gateway never needs to look the patient back up (breaks the cyclic
/// reference between issuance and demographics lookup, per §9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Demographics {
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
}

impl AccessTokenClaims {
    pub const LIFETIME_SECONDS: i64 = 15 * 60;
}
