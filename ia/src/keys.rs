//! P-256 signing key lifecycle: generated once on first start, persisted as a
//! SEC1 PEM, reused on restart.

use std::path::Path;

use p256::ecdsa::SigningKey;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::pkcs8::{DecodePrivateKey as _, EncodePrivateKey as _, LineEnding};
use p256::{PublicKey, SecretKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

/// The service's signing key pair plus the precomputed values derived from
/// it: the JWKS `kid` and the jsonwebtoken-ready encoding key.
pub struct SigningMaterial {
    signing_key: SigningKey,
    kid: String,
}

impl SigningMaterial {
    /// Load the key at `path`, generating and persisting a fresh one if it
    /// does not exist yet. Any failure here is fatal at startup per §4.1's
    /// "Key load failure at startup → fatal".
    pub fn load_or_generate(path: &Path) -> anyhow::Result<Self> {
        let secret = if path.exists() {
            let pem = std::fs::read_to_string(path)?;
            SecretKey::from_pkcs8_pem(&pem)?
        } else {
            let secret = SecretKey::random(&mut OsRng);
            let pem = secret.to_pkcs8_pem(LineEnding::LF)?;
            std::fs::write(path, pem.as_str())?;
            secret
        };
        let signing_key = SigningKey::from(secret);
        let kid = compute_kid(&signing_key.verifying_key().into());
        Ok(Self { signing_key, kid })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// A jsonwebtoken-ready encoding key, re-derived from the in-memory
    /// secret on each call (signing is rare enough — once per token issuance
    /// — that caching the PEM isn't worth the extra state).
    pub fn jsonwebtoken_encoding_key(&self) -> anyhow::Result<jsonwebtoken::EncodingKey> {
        let secret: SecretKey = self.signing_key.clone().into();
        let pem = secret.to_pkcs8_pem(LineEnding::LF)?;
        Ok(jsonwebtoken::EncodingKey::from_ec_pem(pem.as_bytes())?)
    }

    /// The public key as a JWKS entry, per §6's
    /// `{kty, crv, x, y, kid, use, alg}` shape.
    pub fn jwk(&self) -> serde_json::Value {
        let public_key: PublicKey = self.signing_key.verifying_key().into();
        let point = public_key.to_encoded_point(false);
        let x = point.x().expect("uncompressed point carries x");
        let y = point.y().expect("uncompressed point carries y");
        serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": pghd_shared::b64url::encode(x),
            "y": pghd_shared::b64url::encode(y),
            "kid": self.kid,
            "use": "sig",
            "alg": "ES256",
        })
    }
}

/// `kid` = hex of the first 8 bytes of SHA-256 over the public key's
/// uncompressed coordinate representation.
fn compute_kid(public_key: &PublicKey) -> String {
    let point = public_key.to_encoded_point(false);
    let digest = Sha256::digest(point.as_bytes());
    hex::encode(&digest[..8])
}

/// Reconstruct a verifying key from JWK (x, y) coordinates, the one
/// non-obvious step §9 calls out for hand-rolled JWKS consumers: concatenate
/// the two 32-byte coordinates and import as an uncompressed point.
pub fn verifying_key_from_coordinates(x: &[u8], y: &[u8]) -> anyhow::Result<p256::ecdsa::VerifyingKey> {
    let encoded = p256::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let public_key = Option::<PublicKey>::from(PublicKey::from_encoded_point(&encoded))
        .ok_or_else(|| anyhow::anyhow!("invalid EC point"))?;
    Ok(public_key.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_and_reloads_stable_kid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ec_private_key.pem");

        let first = SigningMaterial::load_or_generate(&path).unwrap();
        let second = SigningMaterial::load_or_generate(&path).unwrap();
        assert_eq!(first.kid(), second.kid());
    }

    #[test]
    fn kid_is_sixteen_hex_chars() {
        let dir = tempfile::tempdir().unwrap();
        let material = SigningMaterial::load_or_generate(&dir.path().join("key.pem")).unwrap();
        assert_eq!(material.kid().len(), 16);
        assert!(material.kid().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn jwk_roundtrips_through_coordinate_reconstruction() {
        let dir = tempfile::tempdir().unwrap();
        let material = SigningMaterial::load_or_generate(&dir.path().join("key.pem")).unwrap();
        let jwk = material.jwk();
        let x = pghd_shared::b64url::decode(jwk["x"].as_str().unwrap()).unwrap();
        let y = pghd_shared::b64url::decode(jwk["y"].as_str().unwrap()).unwrap();
        let reconstructed = verifying_key_from_coordinates(&x, &y).unwrap();
        assert_eq!(reconstructed, *material.signing_key.verifying_key());
    }
}
