use anyhow::{Context, Result};
use pghd_ia::{config::Config, server};

#[rocket::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("loading Identity Authority configuration")?;
    log::info!("Identity Authority listening on port {}", config.port);

    server::build_rocket(config)
        .context("building Rocket instance")?
        .launch()
        .await
        .context("Identity Authority server exited with an error")?;

    Ok(())
}
