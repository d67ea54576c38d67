#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

mod app;
mod routes;

use app::{Application, EnvConfig};
use primitives::config::configuration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let env_config = EnvConfig::from_env()?;
    let config = configuration(env_config.env, env_config.config_file.as_deref())?;

    Application::new(config, env_config.port)?.run().await
}
