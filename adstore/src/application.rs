use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use slog::{error, info, Logger};
use tower_http::cors::CorsLayer;

use primitives::{
    adstore::{Status, VersionResponse},
    config::Environment,
    Config,
};

/// an error used when deserializing the [`EnvConfig`] from environment variables,
/// see [`EnvConfig::from_env()`]
pub use envy::Error as EnvError;

use crate::{
    db::{AdRepository, EventRepository, MemoryAds, MemoryEvents},
    routes::{ads, analytics},
};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_IP_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

/// Environment variables of the server binary.
#[derive(Debug, Deserialize, Clone)]
pub struct EnvConfig {
    /// Defaults to `Development`: [`Environment::default()`]
    #[serde(default)]
    pub env: Environment,
    /// The port on which the Ad Store REST API will be accessible.
    /// Defaults to `5000`: [`DEFAULT_PORT`]
    #[serde(default = "default_port")]
    pub port: u16,
    /// The address on which the Ad Store REST API will be accessible.
    /// `0.0.0.0` can be used for Docker.
    /// `127.0.0.1` can be used for locally running servers.
    /// Defaults to `0.0.0.0`: [`DEFAULT_IP_ADDR`]
    #[serde(default = "default_ip_addr")]
    pub ip_addr: IpAddr,
}

impl EnvConfig {
    /// Deserialize the [`EnvConfig`] from Environment variables.
    pub fn from_env() -> Result<Self, EnvError> {
        envy::from_env()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_ip_addr() -> IpAddr {
    DEFAULT_IP_ADDR
}

/// The Ad Store application with its repositories.
#[derive(Clone)]
pub struct Application {
    pub config: Config,
    pub logger: Logger,
    pub ads: Arc<dyn AdRepository>,
    pub events: Arc<dyn EventRepository>,
}

impl Application {
    /// Creates an [`Application`] backed by the in-memory repositories.
    pub fn new(config: Config, logger: Logger) -> Self {
        Self {
            config,
            logger,
            ads: Arc::new(MemoryAds::default()),
            events: Arc::new(MemoryEvents::default()),
        }
    }

    /// Builds the application [`Router`].
    ///
    /// CORS is permissive - the admin console is browser-class
    /// and the API carries no authentication.
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/api", get(index))
            .route("/api/ads", get(ads::ad_list).post(ads::ad_create))
            .route("/api/ads/random", get(ads::ad_random))
            .route(
                "/api/ads/:id",
                get(ads::ad_get).put(ads::ad_update).delete(ads::ad_delete),
            )
            .route(
                "/api/analytics/impression",
                post(analytics::record_impression),
            )
            .route("/api/analytics/click", post(analytics::record_click))
            .route("/api/analytics/stats", get(analytics::stats))
            .layer(CorsLayer::permissive())
            .layer(Extension(self.clone()))
    }

    /// Starts the `axum` Server, until a shutdown signal (Ctrl+C) is received.
    pub async fn run(self: Arc<Self>, socket_addr: SocketAddr) {
        let logger = self.logger.clone();
        info!(&logger, "Listening on socket address: {}!", socket_addr);

        let server = axum::Server::bind(&socket_addr)
            .serve(self.router().into_make_service())
            .with_graceful_shutdown(shutdown_signal(logger.clone()));

        if let Err(error) = server.await {
            error!(&logger, "server error: {}", error; "main" => "run");
        }
    }
}

/// `GET /` & `GET /api` - the health route.
async fn index() -> Json<VersionResponse> {
    Json(VersionResponse {
        status: Status::Success,
        message: "Ad server is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn shutdown_signal(logger: Logger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(&logger, "Received Ctrl+C, shutting down.."),
        Err(error) => error!(&logger, "Failed to listen for Ctrl+C: {}", error),
    }
}
