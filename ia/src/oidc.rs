//! OpenID Connect Discovery and JWKS publication.

use rocket::serde::json::Json;
use rocket::{get, State};
use serde_json::{json, Value};

use crate::state::IaState;

#[get("/.well-known/openid-configuration")]
pub fn discovery(state: &State<IaState>) -> Json<Value> {
    let base = &state.config.public_base_url;
    Json(json!({
        "issuer": state.config.issuer,
        "authorization_endpoint": format!("{base}/authorize"),
        "token_endpoint": format!("{base}/token"),
        "revocation_endpoint": format!("{base}/revoke"),
        "jwks_uri": format!("{base}/jwks"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": ["ES256"],
        "code_challenge_methods_supported": ["S256"],
        "scopes_supported": ["openid", "observation.write", "status.read"],
    }))
}

#[get("/jwks")]
pub fn jwks(state: &State<IaState>) -> Json<Value> {
    Json(json!({ "keys": [state.keys.jwk()] }))
}
