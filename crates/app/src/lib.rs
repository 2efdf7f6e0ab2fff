//! Tokochat application composition root
//!
//! Wires the conversation store, the assistant gateway and the auth backend
//! into the chat router, then adds the shared infrastructure routes and layers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tokochat_assistant::{AssistantConfig, AssistantGateway, AssistantGatewayFactory};
use tokochat_auth::{AuthBackend, AuthConfig};
use tokochat_common::Config;
use tokochat_conversations::{
    ConversationStore, ConversationsState, HistoryReader, InMemoryConversationStore,
    MessageRelay, PgConversationStore,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Largest request body the API accepts
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Create the main application router from environment configuration
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    let store = connect_store(config).await?;

    let assistant_config = AssistantConfig::from_env()?;
    let gateway_timeout = assistant_config.timeout;
    let gateway: Arc<dyn AssistantGateway> =
        Arc::from(AssistantGatewayFactory::create(assistant_config)?);

    let state = build_state(config, store, gateway, gateway_timeout);

    Ok(router(config, state))
}

/// Open the conversation store: Postgres when a database is configured,
/// otherwise a process-local store.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn ConversationStore>, anyhow::Error> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set; conversations are kept in memory only");
        return Ok(Arc::new(InMemoryConversationStore::new()));
    };

    let pool = PgPool::connect(database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;

    let store = PgConversationStore::new(pool);
    store.migrate().await?;

    tracing::info!("Database connection established, migrations applied");
    Ok(Arc::new(store))
}

/// Assemble the conversations domain state
pub fn build_state(
    config: &Config,
    store: Arc<dyn ConversationStore>,
    gateway: Arc<dyn AssistantGateway>,
    gateway_timeout: Duration,
) -> ConversationsState {
    let auth = AuthBackend::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    ConversationsState {
        relay: MessageRelay::new(store.clone(), gateway, gateway_timeout),
        history: HistoryReader::new(
            store,
            config.history_default_limit,
            config.history_max_limit,
        ),
        auth,
    }
}

/// Compose domain routes with infrastructure routes and middleware
pub fn router(config: &Config, state: ConversationsState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(version_banner))
        .merge(tokochat_conversations::routes().with_state(state))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(build_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the storefront. `None` allows any origin.
pub fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let Some(origins) = allowed_origins else {
        return base.allow_origin(AllowOrigin::any());
    };

    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn version_banner() -> &'static str {
    concat!("Tokochat API v", env!("CARGO_PKG_VERSION"))
}
