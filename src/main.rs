/*****************************************************************************************
 *
 *  timeslot – Single-Slot Time Value Store over HTTP
 *  -------------------------------------------------
 *
 *  GET/POST /time backed by one concurrent slot, with a pluggable wire codec
 *  (decimal timestamp or in-process locator) and a self-checking client.
 *
 *****************************************************************************************/

mod app;
mod client;
mod codec;
mod config;
mod errors;
mod routes;
mod services;
mod state;

use std::path::PathBuf;

use axum::serve;
use tokio::net::TcpListener;
use tokio::task;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::errors::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    //
    // ────────────────────────────────────────────────────────
    //  Locate config.json (EXE folder or its parent)
    // ────────────────────────────────────────────────────────
    //
    let config_path = locate_config();

    //
    // ────────────────────────────────────────────────────────
    //  Load configuration
    // ────────────────────────────────────────────────────────
    //
    let cfg = match &config_path {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    match &config_path {
        Some(path) => tracing::info!("Loaded config.json from {}", path.display()),
        None => tracing::info!("No config.json found, using defaults"),
    }
    tracing::info!("Starting timeslot…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Bind server and start listening
    // ────────────────────────────────────────────────────────
    //
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .map_err(|source| AppError::Bind { addr: addr.clone(), source })?;

    tracing::info!("Listening on http://{} ({} codec)", addr, cfg.codec);

    let app = app::build_configured_app(cfg.clone());
    let server = task::spawn(async move {
        serve(listener, app)
            .with_graceful_shutdown(shutdown())
            .await
    });

    //
    // ────────────────────────────────────────────────────────
    //  Client handshake: wait, write once, read once
    // ────────────────────────────────────────────────────────
    //
    let value = client::run_handshake(
        cfg.codec,
        &cfg.base_url(),
        cfg.readiness_interval(),
        cfg.readiness_timeout(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Handshake failed: {e}");
        e
    })?;

    println!("{value}");

    if !cfg.serve_after_handshake {
        return Ok(());
    }

    tracing::info!("Handshake done, serving until CTRL+C");
    server_outcome(server.await)
}

/// Fold the server task's result into the process result.
fn server_outcome(joined: Result<std::io::Result<()>, task::JoinError>) -> Result<(), AppError> {
    let served = joined.map_err(|e| {
        tracing::error!("Server task failed: {e}");
        AppError::ServerTask(e)
    })?;
    served.map_err(AppError::Serve)
}

/// `config.json` next to the executable, else one directory up.
fn locate_config() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    [exe_dir.join("config.json"), exe_dir.join("..").join("config.json")]
        .into_iter()
        .find(|path| path.exists())
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    tracing::warn!("CTRL+C received — shutting down. Goodbye.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn panicked_server_task_is_an_error() {
        let joined: Result<std::io::Result<()>, _> =
            task::spawn(async { panic!("server blew up") }).await;
        assert!(matches!(server_outcome(joined), Err(AppError::ServerTask(_))));
    }

    #[tokio::test]
    async fn server_io_error_is_an_error() {
        let joined = task::spawn(async { Err(std::io::Error::other("accept failed")) }).await;
        assert!(matches!(server_outcome(joined), Err(AppError::Serve(_))));
    }

    #[tokio::test]
    async fn clean_server_exit_is_ok() {
        let joined = task::spawn(async { Ok(()) }).await;
        assert!(server_outcome(joined).is_ok());
    }
}
