use axum::routing::get;
use qnnect_server::{api, config::Config, events::QueueHub, migrator, session::SessionKey};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    qnnect_server::telemetry::init_telemetry("qnnect-server")?;

    let config = Config::from_env()?;
    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url).await?;
    migrator::Migrator::up(&db, None).await?;

    qnnect_server::metrics::init_metrics(&db).await;

    let hub = QueueHub::new();
    let app = api::router(
        db,
        hub.clone(),
        SessionKey(config.session_key.clone()),
        config.cors_origin.clone(),
    )
    .layer(prometheus_layer)
    .route("/metrics", get(|| async move { metric_handle.render() }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await?;

    Ok(())
}

/// Waits for Ctrl-C, then ends the open event streams so their connections
/// can drain.
async fn shutdown_signal(hub: QueueHub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!(streams = hub.subscriber_count(), "Shutting down");
    hub.close();
}
