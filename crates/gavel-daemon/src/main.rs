mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use gavel_expiry::AuctionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(gavel_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = gavel_db::PoolConfig::from_app_config(&config);
    let pool = gavel_db::connect_pool(&config.database_url, pool_config).await?;
    gavel_db::run_migrations(&pool).await?;

    let service = AuctionService::from_config(pool, &config);
    let monitor = service.start_monitor();
    let _scheduler = scheduler::build_scheduler(Arc::clone(service.timer_registry())).await?;

    tracing::info!(env = %config.env, "gaveld started");

    shutdown_signal().await;
    tracing::info!("received shutdown signal, starting graceful shutdown");
    monitor.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
