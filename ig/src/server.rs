//! Rocket server assembly.

use rocket::{routes, Build, Rocket};

use crate::config::Config;
use crate::handlers::{metadata, observations, status};
use crate::state::IgState;

pub fn build_rocket(config: Config) -> anyhow::Result<Rocket<Build>> {
    let mut rocket_config = rocket::Config::default();
    rocket_config.port = config.port;
    if let (Some(cert), Some(key)) = (&config.tls_cert_path, &config.tls_key_path) {
        rocket_config.tls = Some(rocket::config::TlsConfig::from_paths(cert, key));
    }

    let state = IgState::bootstrap(config)?;

    Ok(rocket::custom(rocket_config).manage(state).mount(
        "/",
        routes![metadata::metadata, observations::submit, status::status],
    ))
}
