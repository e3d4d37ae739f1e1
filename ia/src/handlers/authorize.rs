//! `GET /authorize` and `POST /authorize`: the interactive credentials form
//! and authorization-code issuance.

use handlebars::Handlebars;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::{get, post, FromForm, State};
use serde::Serialize;
use serde_json::json;

use crate::errors::IaError;
use crate::state::IaState;

#[derive(Debug, Clone, FromForm)]
pub struct AuthorizeQuery {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

#[derive(Debug, Clone, FromForm)]
pub struct CredentialsForm {
    pub subject: String,
    pub date_of_birth: String,
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub state: String,
    pub scope: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

#[derive(Serialize)]
pub struct FormHtml(pub String);

impl<'r> rocket::response::Responder<'r, 'static> for FormHtml {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        rocket::Response::build()
            .header(rocket::http::ContentType::HTML)
            .sized_body(self.0.len(), std::io::Cursor::new(self.0))
            .ok()
    }
}

fn validate(query: &AuthorizeQuery, state: &IaState) -> Result<(), IaError> {
    if query.response_type != "code" {
        return Err(IaError::BadRequest("response_type must be code".into()));
    }
    if query.code_challenge_method != "S256" {
        return Err(IaError::BadRequest("code_challenge_method must be S256".into()));
    }
    if query.state.is_empty() {
        return Err(IaError::BadRequest("state must not be empty".into()));
    }
    if query.code_challenge.is_empty() {
        return Err(IaError::BadRequest("code_challenge must not be empty".into()));
    }
    if query.client_id != state.config.client.client_id {
        return Err(IaError::BadRequest("unknown client_id".into()));
    }
    if !state.config.client.allowed_redirect_uris.iter().any(|u| u == &query.redirect_uri) {
        return Err(IaError::BadRequest("redirect_uri not allowed for this client".into()));
    }
    Ok(())
}

fn render_form(query: &AuthorizeQuery, error_msg: Option<&str>) -> String {
    let mut reg = Handlebars::new();
    reg.register_template_string("credentials", include_str!("../../resources/forms/credentials.hbs"))
        .expect("credentials template is valid handlebars");
    reg.render(
        "credentials",
        &json!({
            "client_id": query.client_id,
            "response_type": query.response_type,
            "redirect_uri": query.redirect_uri,
            "state": query.state,
            "scope": query.scope,
            "code_challenge": query.code_challenge,
            "code_challenge_method": query.code_challenge_method,
            "error_msg": error_msg,
        }),
    )
    .expect("credentials template renders")
}

#[get("/authorize?<response_type>&<client_id>&<redirect_uri>&<scope>&<state>&<code_challenge>&<code_challenge_method>")]
#[allow(clippy::too_many_arguments)]
pub fn authorize_get(
    response_type: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    state: String,
    code_challenge: String,
    code_challenge_method: String,
    app: &State<IaState>,
) -> Result<FormHtml, IaError> {
    let query = AuthorizeQuery {
        response_type,
        client_id,
        redirect_uri,
        scope,
        state,
        code_challenge,
        code_challenge_method,
    };
    validate(&query, app)?;
    Ok(FormHtml(render_form(&query, None)))
}

/// Either a redirect carrying the issued code, or a re-rendered form on
/// credential mismatch (never a hard failure, per §4.1's "on mismatch
/// re-renders the form with an error").
pub enum AuthorizeResult {
    Redirect(Redirect),
    Rerender(FormHtml),
}

impl<'r> rocket::response::Responder<'r, 'static> for AuthorizeResult {
    fn respond_to(self, request: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        match self {
            AuthorizeResult::Redirect(r) => r.respond_to(request),
            AuthorizeResult::Rerender(html) => {
                let mut response = html.respond_to(request)?;
                response.set_status(Status::Ok);
                Ok(response)
            }
        }
    }
}

#[post("/authorize", data = "<form>")]
pub fn authorize_post(form: Form<CredentialsForm>, app: &State<IaState>) -> Result<AuthorizeResult, IaError> {
    let form = form.into_inner();
    let query = AuthorizeQuery {
        response_type: form.response_type.clone(),
        client_id: form.client_id.clone(),
        redirect_uri: form.redirect_uri.clone(),
        scope: form.scope.clone(),
        state: form.state.clone(),
        code_challenge: form.code_challenge.clone(),
        code_challenge_method: form.code_challenge_method.clone(),
    };
    validate(&query, app)?;

    let mismatch = match app.patients.get(&form.subject) {
        Some(patient) => patient.date_of_birth != form.date_of_birth,
        None => true,
    };
    if mismatch {
        return Ok(AuthorizeResult::Rerender(FormHtml(render_form(
            &query,
            Some("Patient ID and date of birth do not match."),
        ))));
    }

    let code = app
        .auth_codes
        .issue(
            &form.client_id,
            &form.subject,
            &form.redirect_uri,
            &form.code_challenge,
            &form.code_challenge_method,
            &form.scope,
            &form.state,
        )
        .map_err(IaError::from)?;

    let query = serde_urlencoded::to_string([("code", code.code.as_str()), ("state", form.state.as_str())])
        .map_err(|e| IaError::Internal(e.to_string()))?;
    let redirect_url = format!("{}?{}", form.redirect_uri, query);
    Ok(AuthorizeResult::Redirect(Redirect::to(redirect_url)))
}
