//! Bearer-token verification: the request guard that every protected
//! handler and the rate limiter read their subject from.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;

use crate::errors::IgError;
use crate::model::{AccessTokenClaims, AuthenticatedSubject};
use crate::state::IgState;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedSubject {
    type Error = IgError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let app = match request.guard::<&State<IgState>>().await {
            Outcome::Success(app) => app,
            _ => {
                return Outcome::Error((
                    rocket::http::Status::InternalServerError,
                    IgError::Internal("application state unavailable".into()),
                ))
            }
        };

        match verify(request, app).await {
            Ok(subject) => Outcome::Success(subject),
            Err(err) => {
                log::debug!("authentication rejected: {err}");
                Outcome::Error((rocket::http::Status::Unauthorized, err))
            }
        }
    }
}

async fn verify(request: &Request<'_>, app: &IgState) -> Result<AuthenticatedSubject, IgError> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or_else(|| IgError::Authentication("missing Authorization header".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| IgError::Authentication("Authorization header is not a Bearer token".into()))?;

    if token.split('.').count() != 3 {
        return Err(IgError::Authentication("malformed token structure".into()));
    }

    let unverified = jsonwebtoken::decode_header(token)
        .map_err(|e| IgError::Authentication(format!("malformed token header: {e}")))?;
    if unverified.alg != Algorithm::ES256 {
        return Err(IgError::Authentication("unsupported signing algorithm".into()));
    }
    let kid = unverified
        .kid
        .ok_or_else(|| IgError::Authentication("token header missing kid".into()))?;

    let jwk = app
        .jwks
        .find(&kid)
        .await
        .ok_or_else(|| IgError::Authentication("unknown signing key".into()))?;

    let decoding_key = DecodingKey::from_ec_components(&jwk.x, &jwk.y)
        .map_err(|e| IgError::Authentication(format!("invalid signing key coordinates: {e}")))?;

    let mut validation = Validation::new(Algorithm::ES256);
    validation.set_audience(&[&app.config.audience]);
    validation.validate_exp = true;

    let data = decode::<AccessTokenClaims>(token, &decoding_key, &validation)
        .map_err(|e| IgError::Authentication(format!("token verification failed: {e}")))?;

    Ok(AuthenticatedSubject {
        subject: data.claims.sub,
        scope: data.claims.scope,
        demographics: data.claims.demographics,
    })
}
