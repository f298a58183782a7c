use std::sync::Arc;

use anyhow::Context;

use campus_api::app::{build_app, AppState};
use campus_api::config::ApiConfig;
use campus_infra::{demo_identity_store, CredentialHasher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    campus_observability::init();

    let config = ApiConfig::from_env()?;
    tracing::info!(?config, "starting campus-api");

    // TODO: swap the demo store for a persistent Identity Store adapter once one exists in campus-infra.
    let identities = Arc::new(demo_identity_store(CredentialHasher::new())?);
    let app = build_app(AppState::from_config(&config, identities));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
