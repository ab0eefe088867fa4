use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use ledgerql_client::memory::MemoryLedger;
use ledgerql_client::{LedgerApi, LedgerError};
use ledgerql_gateway::{router, AppState, TIMEOUT_CODE};
use ledgerql_graphql::{build_schema, SchemaLimits};
use ledgerql_types::{Block, BlockStatus, Fulfills, Operation, Transaction, Vote};
use serde_json::{json, Value};
use tower::ServiceExt;

const LEDGER_URL: &str = "http://ledger.test:9984/api/v1/";

fn app_with(ledger: Arc<dyn LedgerApi>, timeout: Duration) -> Router {
    let schema = build_schema(ledger, SchemaLimits::default());
    router(AppState::new(schema, timeout, LEDGER_URL))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn graphql_post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// A ledger whose every call hangs.
struct StalledLedger;

#[async_trait]
impl LedgerApi for StalledLedger {
    async fn fetch_transaction(&self, _id: &str) -> Result<Option<Transaction>, LedgerError> {
        std::future::pending().await
    }

    async fn list_transactions(
        &self,
        _asset_id: &str,
        _operation: Option<Operation>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        std::future::pending().await
    }

    async fn list_outputs(
        &self,
        _public_key: &str,
        _spent: Option<bool>,
    ) -> Result<Vec<Fulfills>, LedgerError> {
        std::future::pending().await
    }

    async fn fetch_block(&self, _id: &str) -> Result<Option<Block>, LedgerError> {
        std::future::pending().await
    }

    async fn list_blocks_containing(
        &self,
        _transaction_id: &str,
        _status: Option<BlockStatus>,
    ) -> Result<Vec<Block>, LedgerError> {
        std::future::pending().await
    }

    async fn list_votes(&self, _block_id: &str) -> Result<Vec<Vote>, LedgerError> {
        std::future::pending().await
    }

    async fn search_assets(
        &self,
        _text: &str,
        _limit: Option<u32>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        std::future::pending().await
    }

    async fn submit_create_transaction(
        &self,
        _issuer_public_key: &str,
        _issuer_private_key: &str,
        _asset: Value,
        _metadata: Value,
    ) -> Result<Transaction, LedgerError> {
        std::future::pending().await
    }

    async fn submit_transfer_transaction(
        &self,
        _source: &Transaction,
        _from_public_key: &str,
        _from_private_key: &str,
        _to_public_key: &str,
        _metadata: Value,
    ) -> Result<Transaction, LedgerError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn health_reports_service_and_ledger() {
    let app = app_with(Arc::new(MemoryLedger::new()), Duration::from_secs(5));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "ledgerql-gateway");
    assert_eq!(body["ledger_url"], LEDGER_URL);
}

#[tokio::test]
async fn graphiql_is_served_on_get() {
    let app = app_with(Arc::new(MemoryLedger::new()), Duration::from_secs(5));

    let response = app
        .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8_lossy(&bytes);
    assert!(page.contains("graphiql"));
    assert!(page.contains("/graphql"));
}

#[tokio::test]
async fn queries_execute_on_both_endpoints() {
    let ledger = Arc::new(MemoryLedger::new());
    let app = app_with(ledger.clone(), Duration::from_secs(5));

    for path in ["/graphql", "/"] {
        let response = app
            .clone()
            .oneshot(graphql_post(
                path,
                json!({
                    "query": "query Lookup($id: String!) { transaction(id: $id) { id } }",
                    "variables": { "id": "unknown" },
                    "operationName": "Lookup",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"], json!({ "transaction": null }));
    }
    assert_eq!(ledger.call_count("fetch_transaction"), 2);
}

#[tokio::test]
async fn ledger_failures_are_reported_in_band() {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.inject_failure("search_assets");
    let app = app_with(ledger, Duration::from_secs(5));

    let response = app
        .oneshot(graphql_post(
            "/graphql",
            json!({ "query": r#"{ search(text: "x") { id } }"# }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], "NETWORK_FAILURE");
}

#[tokio::test]
async fn hung_ledger_hits_request_timeout() {
    let app = app_with(Arc::new(StalledLedger), Duration::from_millis(50));

    let response = app
        .oneshot(graphql_post(
            "/graphql",
            json!({ "query": r#"{ transaction(id: "x") { id } }"# }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["message"], "request timed out");
    assert_eq!(body["errors"][0]["extensions"]["code"], TIMEOUT_CODE);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let app = app_with(Arc::new(MemoryLedger::new()), Duration::from_secs(5));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/graphql")
                .header(header::ORIGIN, "http://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
