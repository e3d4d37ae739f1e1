//! PKCE S256 verification: `challenge == base64url(SHA256(ASCII(verifier)))`.

use sha2::{Digest, Sha256};

pub fn challenge_from_verifier(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    pghd_shared::b64url::encode(digest)
}

pub fn verify(verifier: &str, challenge: &str) -> bool {
    challenge_from_verifier(verifier) == challenge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pair_from_the_spec_scenario_matches() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
        assert!(verify(verifier, challenge));
    }

    #[test]
    fn mutated_verifier_fails() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
        assert!(!verify(&format!("{verifier}x"), challenge));
    }
}
