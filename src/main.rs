use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use s3_file_manager::config;
use s3_file_manager::link_cache::LinkCache;
use s3_file_manager::storage::create_store;
use s3_file_manager::tree::{FileTree, TreeOptions};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3_file_manager=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Object store / 对象存储
    let store = create_store(&app_config.storage)?;
    let tree = FileTree::new(store, TreeOptions::from(&app_config.listing));

    // Link cache and its periodic sweep / 链接缓存与定期清理
    let links = Arc::new(LinkCache::new());
    let sweep_interval = Duration::from_secs(app_config.links.sweep_interval_secs);
    let _sweeper = links.spawn_sweeper(sweep_interval);
    tracing::info!("Link cache sweep every {:?}", sweep_interval);

    let bind_addr = app_config.get_bind_address();
    let state = Arc::new(AppState::new(tree, links, app_config));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
