use std::net::SocketAddr;

use anyhow::Context;

use innkeep_api::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    innkeep_observability::init();

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(?settings, "starting innkeep-api");

    let app = innkeep_api::app::build_app(&settings).await?;

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")
}
