#![deny(clippy::all)]
#![deny(rust_2018_idioms)]

use std::{net::SocketAddr, sync::Arc};

use clap::{crate_version, Arg, Command};

use adstore::{application::EnvConfig, Application};
use primitives::{config::configuration, util::logging::new_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Command::new("Ad Store")
        .version(crate_version!())
        .arg(
            Arg::new("config")
                .help("the config file of the Ad Store server")
                .takes_value(true),
        )
        .get_matches();

    let env_config = EnvConfig::from_env()?;
    let config = configuration(env_config.env, cli.value_of("config"))?;

    let logger = new_logger("adstore");
    let socket_addr = SocketAddr::new(env_config.ip_addr, env_config.port);

    let app = Arc::new(Application::new(config, logger));
    app.run(socket_addr).await;

    Ok(())
}
