use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lingua_backend::config::Config;
use lingua_backend::routes;
use lingua_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lingua_backend=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Config file candidates, first existing one wins
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    let config_paths: Vec<PathBuf> = vec![
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from),
        Some(PathBuf::from("conf.yaml")),
        Some(exe_dir.join("conf.yaml")),
    ]
    .into_iter()
    .flatten()
    .collect();

    let config_path = config_paths.iter().find(|path| path.is_file());
    let config = Config::load(config_path.map(PathBuf::as_path))?;
    match config_path {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => info!("No config file found (tried {:?}), using defaults", config_paths),
    }

    let system_config = &config.system_config;
    let addr: SocketAddr = format!("{}:{}", system_config.host, system_config.port).parse()?;
    info!("Inference service at {}", config.inference_config.base_url);

    // Build application
    let app_state = AppState::new(config);
    let app = routes::build_app(app_state);

    // Start server
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
