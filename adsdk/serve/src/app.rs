use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Extension, Router};
use serde::Deserialize;
use tera::Tera;
use tracing::info;

use adsdk::{Manager, Options};
use primitives::{config::Environment, Config};

use crate::routes::{get_ad, get_index};

pub const DEFAULT_PORT: u16 = 3030;

/// Environment variables of the demo binary.
#[derive(Debug, Deserialize, Clone)]
pub struct EnvConfig {
    /// Defaults to `Development`: [`Environment::default()`]
    #[serde(default)]
    pub env: Environment,
    /// Defaults to `3030`: [`DEFAULT_PORT`]
    #[serde(default = "default_port")]
    pub port: u16,
    /// An explicit Toml config file to use instead of the
    /// [`Environment`]-embedded one.
    #[serde(default)]
    pub config_file: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug)]
pub struct State {
    pub tera: Tera,
    pub manager: Manager,
}

pub struct Application {
    /// The shared state of the application
    state: Arc<State>,
    port: u16,
}

impl Application {
    pub fn new(config: Config, port: u16) -> anyhow::Result<Self> {
        let serve_dir = match std::env::current_dir()? {
            serve_path if serve_path.ends_with("serve") => serve_path,
            adsdk_path if adsdk_path.ends_with("adsdk") => adsdk_path.join("serve"),
            // running from the workspace root
            workspace_path => workspace_path.join("adsdk/serve"),
        };

        let templates_glob = format!("{}/templates/**/*.html", serve_dir.display());

        info!("Tera templates glob path: {templates_glob}");
        // Use globbing
        let tera = Tera::new(&templates_glob)?;

        let manager = Manager::new(Options {
            ad_store_url: config.ad_store_url.clone(),
            location: None,
            retry_analytics: config.retry_analytics,
            fetch_timeout: config.fetch_timeout,
        })?;

        let shared_state = Arc::new(State { tera, manager });

        Ok(Self {
            state: shared_state,
            port,
        })
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/", get(get_index))
            .route("/ad", get(get_ad))
            .layer(Extension(self.state.clone()));

        let socket_addr: SocketAddr = ([127, 0, 0, 1], self.port).into();
        info!("Server running on: {socket_addr}");

        axum::Server::bind(&socket_addr)
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }
}
