use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use booking_bridge::config::AppConfig;
use booking_bridge::logging;
use booking_bridge::services::auth::client_credentials::ClientCredentialsProvider;
use booking_bridge::services::bookings::graph::GraphBookingsSource;
use booking_bridge::services::helpdesk::bossdesk::BossDeskClient;
use booking_bridge::services::sync;
use booking_bridge::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let _log_guard = logging::init(&config.log_dir).context("failed to initialise logging")?;

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;

    tracing::info!(
        business_id = %config.business_id,
        questions = config.mapping.question_map.len(),
        staff = config.mapping.staff_map.len(),
        contact_source = ?config.mapping.contact_source,
        "configuration loaded"
    );

    let state = Arc::new(AppState {
        credentials: Box::new(ClientCredentialsProvider::new(
            client.clone(),
            config.graph_token_url.clone(),
            config.graph_client_id.clone(),
            config.graph_client_secret.clone(),
            config.graph_scope.clone(),
        )),
        bookings: Box::new(GraphBookingsSource::new(
            client.clone(),
            config.graph_api_endpoint.clone(),
        )),
        helpdesk: Box::new(BossDeskClient::new(
            client,
            config.helpdesk_api_endpoint.clone(),
            config.helpdesk_api_key.clone(),
        )),
        config,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, finishing current work");
            let _ = shutdown_tx.send(true);
        }
    });

    sync::run(state, shutdown_rx).await;
    Ok(())
}
