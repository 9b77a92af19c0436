use anyhow::Result;

use wardrobe_ai_proxy::{
    config::AppConfig,
    server::{build_orchestrator, router},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_telemetry()?;

    let config = AppConfig::from_env()?;
    let orchestrator = build_orchestrator(&config);
    let app = router(orchestrator.clone(), config.max_body_bytes);

    let tcp_listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(
        address = %config.bind_address,
        provider = orchestrator.provider().status_label(),
        "Wardrobe AI proxy listening"
    );

    axum::serve(tcp_listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    orchestrator.cache().shutdown();
    tracing::info!("Shut down");
    Ok(())
}
