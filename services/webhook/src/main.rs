use std::net::SocketAddr;
use std::sync::Arc;

use storybot_config::{init_tracing, AppConfig};
use storybot_webhook::jira::client::{JiraClient, JiraClientConfig};
use storybot_webhook::reconcile::ReconcileSettings;
use storybot_webhook::{build_router, AppState, SERVICE_NAME};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("failed to load config");
    init_tracing(&config.log_level, config.log_format);

    tracing::info!(service = SERVICE_NAME, "starting");

    let jira_config = JiraClientConfig::from_env().expect("failed to load jira config");
    let client = JiraClient::new(jira_config).expect("failed to create jira client");
    let settings = ReconcileSettings::from_env();

    tracing::info!(
        base_url = %client.config().base_url,
        story_points_field = %settings.story_points_field,
        epic_link_field = %settings.epic_link_field,
        trigger_phrase = %settings.trigger_phrase,
        "jira tracker configured"
    );

    let state = AppState {
        tracker: Arc::new(client),
        settings: Arc::new(settings),
    };

    let app = build_router(state);
    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
