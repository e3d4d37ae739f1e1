//! Access-token issuance: header/payload/signature compact serialization via
//! `jsonwebtoken`, per §9's "a mature crypto library SHOULD be used".

use chrono::Utc;
use jsonwebtoken::{Algorithm, Header};

use crate::keys::SigningMaterial;
use crate::model::{AccessTokenClaims, Demographics};

pub fn issue_access_token(
    keys: &SigningMaterial,
    issuer: &str,
    audience: &str,
    subject: &str,
    scope: &str,
    demographics: Option<Demographics>,
) -> anyhow::Result<(String, AccessTokenClaims)> {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        iss: issuer.to_string(),
        sub: subject.to_string(),
        aud: audience.to_string(),
        iat: now,
        exp: now + AccessTokenClaims::LIFETIME_SECONDS,
        scope: scope.to_string(),
        demographics,
    };

    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(keys.kid().to_string());

    let token = jsonwebtoken::encode(&header, &claims, &keys.jsonwebtoken_encoding_key()?)?;
    Ok((token, claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SigningMaterial;

    #[test]
    fn issued_token_carries_expected_claims() {
        let dir = tempfile::tempdir().unwrap();
        let keys = SigningMaterial::load_or_generate(&dir.path().join("key.pem")).unwrap();
        let (token, claims) = issue_access_token(
            &keys,
            "iam-server",
            "client-facing-server",
            "1",
            "openid observation.write",
            None,
        )
        .unwrap();

        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.aud, "client-facing-server");
        assert_eq!(claims.iss, "iam-server");
        assert_eq!(claims.sub, "1");
        assert_eq!(token.split('.').count(), 3);
    }
}
