//! Rocket server assembly.

use rocket::{routes, Build, Rocket};

use crate::config::Config;
use crate::cors::Cors;
use crate::handlers::{authorize, patients, revoke, token};
use crate::oidc;
use crate::state::IaState;

pub fn build_rocket(config: Config) -> anyhow::Result<Rocket<Build>> {
    let mut rocket_config = rocket::Config::default();
    rocket_config.port = config.port;
    if let (Some(cert), Some(key)) = (&config.tls_cert_path, &config.tls_key_path) {
        rocket_config.tls = Some(
            rocket::config::TlsConfig::from_paths(cert, key),
        );
    }

    let state = IaState::bootstrap(config)?;

    Ok(rocket::custom(rocket_config)
        .attach(Cors)
        .manage(state)
        .mount(
            "/",
            routes![
                oidc::discovery,
                oidc::jwks,
                authorize::authorize_get,
                authorize::authorize_post,
                token::token,
                revoke::revoke,
                patients::register,
                patients::list,
                patients::get_one,
                patients::delete_one,
            ],
        ))
}
