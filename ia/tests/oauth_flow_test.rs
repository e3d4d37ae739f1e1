//! End-to-end OAuth 2.0 Authorization Code + PKCE flow against an in-process
//! Rocket instance backed by a temporary storage directory.

use pghd_ia::config::{Client, Config};
use pghd_ia::server::build_rocket;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client as TestClient;
use sha2::{Digest, Sha256};

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        port: 0,
        storage_dir: dir.to_path_buf(),
        issuer: "iam-server".into(),
        public_base_url: "http://localhost:8080".into(),
        audience: "client-facing-server".into(),
        client: Client {
            client_id: "client-facing-server".into(),
            allowed_redirect_uris: vec!["http://localhost:3000/callback".into()],
        },
        admin_token: None,
        tls_cert_path: None,
        tls_key_path: None,
    }
}

fn pkce_pair() -> (&'static str, &'static str) {
    // The spec's worked example pair.
    ("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk", "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM")
}

#[test]
fn full_register_authorize_token_flow() {
    let dir = tempfile::tempdir().unwrap();
    let rocket = build_rocket(test_config(dir.path())).unwrap();
    let client = TestClient::tracked(rocket).unwrap();

    let register = client
        .post("/patients")
        .header(ContentType::JSON)
        .body(r#"{"given_name":"Max","family_name":"Mustermann","date_of_birth":"1990-01-15"}"#)
        .dispatch();
    assert_eq!(register.status(), Status::Ok);
    let patient: serde_json::Value = serde_json::from_str(&register.into_string().unwrap()).unwrap();
    assert_eq!(patient["id"], "1");

    let (verifier, challenge) = pkce_pair();
    let authorize_get = client
        .get(format!(
            "/authorize?response_type=code&client_id=client-facing-server&redirect_uri=http://localhost:3000/callback&scope=openid+observation.write&state=xyz&code_challenge={challenge}&code_challenge_method=S256"
        ))
        .dispatch();
    assert_eq!(authorize_get.status(), Status::Ok);

    let authorize_post = client
        .post("/authorize")
        .header(ContentType::Form)
        .body(format!(
            "subject=1&date_of_birth=1990-01-15&response_type=code&client_id=client-facing-server&\
             redirect_uri=http://localhost:3000/callback&state=xyz&scope=openid+observation.write&\
             code_challenge={challenge}&code_challenge_method=S256"
        ))
        .dispatch();
    assert_eq!(authorize_post.status(), Status::SeeOther);
    let location = authorize_post.headers().get_one("Location").unwrap().to_string();
    assert!(location.starts_with("http://localhost:3000/callback?"));

    let code = location
        .split("code=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap()
        .to_string();

    let token_response = client
        .post("/token")
        .header(ContentType::Form)
        .body(format!(
            "grant_type=authorization_code&code={code}&redirect_uri=http://localhost:3000/callback&\
             code_verifier={verifier}&client_id=client-facing-server"
        ))
        .dispatch();
    assert_eq!(token_response.status(), Status::Ok);
    let body: serde_json::Value = serde_json::from_str(&token_response.into_string().unwrap()).unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);

    let access_token = body["access_token"].as_str().unwrap();
    let payload_segment = access_token.split('.').nth(1).unwrap();
    let payload_bytes = pghd_shared::b64url::decode(payload_segment).unwrap();
    let claims: serde_json::Value = serde_json::from_slice(&payload_bytes).unwrap();
    assert_eq!(claims["sub"], "1");
    assert_eq!(claims["aud"], "client-facing-server");
    assert_eq!(claims["iss"], "iam-server");
    assert_eq!(claims["scope"], "openid observation.write");

    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();
    let refreshed = client
        .post("/token")
        .header(ContentType::Form)
        .body(format!("grant_type=refresh_token&refresh_token={refresh_token}"))
        .dispatch();
    assert_eq!(refreshed.status(), Status::Ok);

    let reuse_original = client
        .post("/token")
        .header(ContentType::Form)
        .body(format!("grant_type=refresh_token&refresh_token={refresh_token}"))
        .dispatch();
    assert_eq!(reuse_original.status(), Status::BadRequest);
}

#[test]
fn pkce_mismatch_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let rocket = build_rocket(test_config(dir.path())).unwrap();
    let client = TestClient::tracked(rocket).unwrap();

    client
        .post("/patients")
        .header(ContentType::JSON)
        .body(r#"{"given_name":"Max","family_name":"Mustermann","date_of_birth":"1990-01-15"}"#)
        .dispatch();

    let verifier_a = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    let challenge_a = {
        let digest = Sha256::digest(verifier_a.as_bytes());
        pghd_shared::b64url::encode(digest)
    };

    let authorize_post = client
        .post("/authorize")
        .header(ContentType::Form)
        .body(format!(
            "subject=1&date_of_birth=1990-01-15&response_type=code&client_id=client-facing-server&\
             redirect_uri=http://localhost:3000/callback&state=xyz&scope=openid&\
             code_challenge={challenge_a}&code_challenge_method=S256"
        ))
        .dispatch();
    let location = authorize_post.headers().get_one("Location").unwrap().to_string();
    let code = location.split("code=").nth(1).unwrap().split('&').next().unwrap().to_string();

    let token_response = client
        .post("/token")
        .header(ContentType::Form)
        .body(format!(
            "grant_type=authorization_code&code={code}&redirect_uri=http://localhost:3000/callback&\
             code_verifier=wrong-verifier-wrong-verifier-wrong-verif&client_id=client-facing-server"
        ))
        .dispatch();
    assert_eq!(token_response.status(), Status::BadRequest);
}
