use anyhow::{Context, Result};
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

pub mod graphql;
pub mod server;
pub mod service;
pub mod session;

use crate::api::server::{create_router, AppState, HttpServer};
use crate::config::Config;
use crate::storage::open_engine;
use crate::utils::logging;

/// 读取配置；文件不存在或无法解析时使用默认配置
pub fn load_config(config_path: &str) -> Config {
    match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Failed to load config from '{}': {}, using default config",
                config_path, e
            );
            Config::default()
        }
    }
}

pub async fn start_service(config_path: String) -> Result<()> {
    let mut config = load_config(&config_path);
    let env_warnings = config.apply_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    logging::init(&config).map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;
    for warning in &env_warnings {
        warn!("{}", warning);
    }
    info!("Initializing socialgraph service ({:?})", config.environment);

    let engine = open_engine(&config.storage).context("failed to open storage")?;
    info!("Storage opened at {}", config.storage.path);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let server = Arc::new(HttpServer::new(config, engine));
    server.get_session_manager().start_cleanup_task();

    let app = create_router(AppState::new(Arc::clone(&server)));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    server.get_session_manager().stop_cleanup_task();
    if let Err(e) = &result {
        warn!("Server terminated with error: {}", e);
    }
    info!("Shutting down socialgraph service");
    logging::shutdown();

    result.context("server error")
}

/// 输出 GraphQL schema SDL；`output` 为空时写到标准输出
pub fn print_schema(output: Option<String>) -> Result<()> {
    let sdl = graphql::schema_sdl();
    match output {
        Some(path) => {
            std::fs::write(&path, sdl).with_context(|| format!("failed to write {}", path))?;
            println!("Schema written to {}", path);
        }
        None => println!("{}", sdl),
    }
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
