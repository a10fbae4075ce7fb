// src/main.rs
mod api;
mod auth;
mod config;
mod db;
mod error;
mod models;

use crate::auth::Credentials;
use crate::config::Config;
use env_logger::Builder;
use log::{error, info, warn, LevelFilter};
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let store = match db::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize record store: {}", e);
            process::exit(1);
        }
    };
    info!("Record store ready ({:?} backend).", config.backend);

    let credentials = Arc::new(Credentials::from_config(&config));
    if !credentials.can_issue_tokens() {
        warn!("JWT_SECRET is not set; login requests will fail.");
    }

    let api = api::routes(store, credentials);

    let addr = SocketAddr::new(config.host, config.port);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down.");
    };
    let (bound, server) = match warp::serve(api).try_bind_with_graceful_shutdown(addr, shutdown) {
        Ok(bound) => bound,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            process::exit(1);
        }
    };

    info!("Server running on http://{}", bound);
    server.await;
}
