//! `POST /token`: authorization_code and refresh_token grants.

use rocket::form::Form;
use rocket::serde::json::Json;
use rocket::{post, FromForm, State};
use serde::Serialize;

use crate::errors::IaError;
use crate::jwt::issue_access_token;
use crate::model::Demographics;
use crate::pkce;
use crate::state::IaState;

#[derive(Debug, Clone, FromForm)]
pub struct TokenForm {
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub client_id: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: String,
}

#[post("/token", data = "<form>")]
pub fn token(form: Form<TokenForm>, app: &State<IaState>) -> Result<Json<TokenResponse>, IaError> {
    let form = form.into_inner();
    match form.grant_type.as_str() {
        "authorization_code" => authorization_code_grant(form, app),
        "refresh_token" => refresh_token_grant(form, app),
        other => Err(IaError::BadRequest(format!("unsupported grant_type: {other}"))),
    }
}

fn authorization_code_grant(form: TokenForm, app: &State<IaState>) -> Result<Json<TokenResponse>, IaError> {
    let code_value = form.code.ok_or_else(|| IaError::BadRequest("code is required".into()))?;
    let redirect_uri = form
        .redirect_uri
        .ok_or_else(|| IaError::BadRequest("redirect_uri is required".into()))?;
    let verifier = form
        .code_verifier
        .ok_or_else(|| IaError::BadRequest("code_verifier is required".into()))?;
    let client_id = form.client_id.ok_or_else(|| IaError::BadRequest("client_id is required".into()))?;

    let code = app
        .auth_codes
        .consume(&code_value)
        .map_err(IaError::from)?
        .ok_or_else(|| IaError::BadRequest("unknown or expired code".into()))?;

    if code.redirect_uri != redirect_uri || code.client_id != client_id {
        return Err(IaError::BadRequest("redirect_uri or client_id mismatch".into()));
    }
    if !pkce::verify(&verifier, &code.code_challenge) {
        return Err(IaError::BadRequest("PKCE verification failed".into()));
    }

    issue_token_pair(app, &code.subject, &code.scope)
}

fn refresh_token_grant(form: TokenForm, app: &State<IaState>) -> Result<Json<TokenResponse>, IaError> {
    let supplied = form
        .refresh_token
        .ok_or_else(|| IaError::BadRequest("refresh_token is required".into()))?;
    let binding = app
        .refresh_tokens
        .consume(&supplied)
        .map_err(IaError::from)?
        .ok_or_else(|| IaError::BadRequest("unknown or expired refresh_token".into()))?;

    issue_token_pair(app, &binding.subject, &binding.scope)
}

fn issue_token_pair(app: &State<IaState>, subject: &str, scope: &str) -> Result<Json<TokenResponse>, IaError> {
    // Unknown patient at exchange time: proceed with demographics absent,
    // never fail the exchange (§4.1 failure semantics).
    let demographics = app.patients.get(subject).map(|p| Demographics {
        given_name: p.given_name,
        family_name: p.family_name,
        date_of_birth: p.date_of_birth,
    });

    let (access_token, _claims) = issue_access_token(
        &app.keys,
        &app.config.issuer,
        &app.config.audience,
        subject,
        scope,
        demographics,
    )
    .map_err(IaError::from)?;

    let refresh = app.refresh_tokens.issue(subject, scope).map_err(IaError::from)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: 900,
        refresh_token: refresh.token,
        scope: scope.to_string(),
    }))
}
