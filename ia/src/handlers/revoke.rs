//! `POST /revoke`: RFC 7009 semantics — succeed whether or not the token
//! existed.

use rocket::form::Form;
use rocket::{post, FromForm, State};

use crate::errors::IaError;
use crate::state::IaState;

#[derive(Debug, Clone, FromForm)]
pub struct RevokeForm {
    pub token: String,
    pub token_type_hint: Option<String>,
}

#[post("/revoke", data = "<form>")]
pub fn revoke(form: Form<RevokeForm>, app: &State<IaState>) -> Result<(), IaError> {
    app.refresh_tokens.revoke(&form.token).map_err(IaError::from)?;
    Ok(())
}
