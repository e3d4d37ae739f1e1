use anyhow::{Context, Result};
use pghd_ig::{config::Config, server};

#[rocket::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("loading Ingestion Gateway configuration")?;
    log::info!("Ingestion Gateway listening on port {}", config.port);

    server::build_rocket(config)
        .context("building Rocket instance")?
        .launch()
        .await
        .context("Ingestion Gateway server exited with an error")?;

    Ok(())
}
