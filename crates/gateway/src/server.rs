//! HTTP transport for the GraphQL schema.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_graphql::http::GraphiQLSource;
use async_graphql::{ErrorExtensions, Pos};
use axum::extract::State;
use axum::http::Uri;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use ledgerql_client::{LedgerApi, LedgerClient};
use ledgerql_graphql::{build_schema, LedgerSchema};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::GatewayConfig;

/// Error code of a query cut off by the request timeout.
pub const TIMEOUT_CODE: &str = "TIMEOUT";

#[derive(Clone)]
pub struct AppState {
    schema: LedgerSchema,
    request_timeout: Duration,
    ledger_url: Arc<str>,
}

impl AppState {
    pub fn new(schema: LedgerSchema, request_timeout: Duration, ledger_url: &str) -> Self {
        Self {
            schema,
            request_timeout,
            ledger_url: Arc::from(ledger_url),
        }
    }

    /// State serving `ledger` with the limits and timeout from `config`.
    pub fn from_config(config: &GatewayConfig, ledger: Arc<dyn LedgerApi>) -> Self {
        Self::new(
            build_schema(ledger, config.schema_limits()),
            config.request_timeout(),
            &config.ledger_url,
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(graphiql).post(graphql_handler))
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(config: GatewayConfig) -> Result<()> {
    let client = LedgerClient::from_config(config.client_config())
        .context("failed to configure ledger client")?;
    let state = AppState::from_config(&config, Arc::new(client));
    let app = router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("LedgerQL gateway listening on {}", addr);
    info!("Ledger node: {}", config.ledger_url);
    info!("GraphiQL IDE: http://{}/graphql", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("LedgerQL gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Returns the GraphiQL page pointed at the requested path.
async fn graphiql(uri: Uri) -> Html<String> {
    Html(GraphiQLSource::build().endpoint(uri.path()).finish())
}

async fn graphql_handler(
    State(state): State<AppState>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let execution = state.schema.execute(request);
    match tokio::time::timeout(state.request_timeout, execution).await {
        Ok(response) => Json(response),
        Err(_) => {
            warn!(timeout = ?state.request_timeout, "GraphQL request timed out");
            let error = async_graphql::Error::new("request timed out")
                .extend_with(|_, ext| ext.set("code", TIMEOUT_CODE))
                .into_server_error(Pos::default());
            Json(async_graphql::Response::from_errors(vec![error]))
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "ledgerql-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "ledger_url": &*state.ledger_url,
    }))
}
