use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use ledgerql_types::{
    AssetSummary, Block, BlockStatus, Fulfills, Operation, StatusResponse, Transaction,
    TransactionStatus, Vote,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::builder;
use crate::error::LedgerError;
use crate::LedgerApi;

/// Default API root of a local ledger node.
pub const DEFAULT_LEDGER_URL: &str = "http://localhost:9984/api/v1/";

/// Connection settings for [`LedgerClient`].
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    /// API root, e.g. `http://localhost:9984/api/v1/`.
    pub base_url: String,
    /// Headers sent with every request (e.g. `app_id`/`app_key`).
    pub headers: BTreeMap<String, String>,
    /// Bound on any single HTTP exchange.
    pub http_timeout: Duration,
    /// Delay between commit status checks.
    pub commit_poll_interval: Duration,
    /// How long a submission may stay undecided before giving up.
    pub commit_timeout: Duration,
}

impl LedgerClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: BTreeMap::new(),
            http_timeout: Duration::from_secs(10),
            commit_poll_interval: Duration::from_millis(500),
            commit_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_commit_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.commit_poll_interval = interval;
        self.commit_timeout = timeout;
        self
    }
}

impl Default for LedgerClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_URL)
    }
}

/// HTTP client for a ledger node's API.
///
/// Holds no per-request state; clones share one connection pool.
#[derive(Clone)]
pub struct LedgerClient {
    base_url: Url,
    http: Client,
    commit_poll_interval: Duration,
    commit_timeout: Duration,
}

impl LedgerClient {
    /// Create a client with default settings for the given API root.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, LedgerError> {
        Self::from_config(LedgerClientConfig::new(base_url.as_ref()))
    }

    pub fn from_config(config: LedgerClientConfig) -> Result<Self, LedgerError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| LedgerError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| LedgerError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        let http = Client::builder()
            .timeout(config.http_timeout)
            .default_headers(headers)
            .build()?;

        let mut client = Self::with_http_client(&config.base_url, http)?;
        client.commit_poll_interval = config.commit_poll_interval;
        client.commit_timeout = config.commit_timeout;
        Ok(client)
    }

    /// Use an existing reqwest client (useful for custom TLS or middleware).
    pub fn with_http_client(base_url: impl AsRef<str>, http: Client) -> Result<Self, LedgerError> {
        let mut url = Url::parse(base_url.as_ref())
            .map_err(|_| LedgerError::InvalidBaseUrl(base_url.as_ref().to_string()))?;
        if url.cannot_be_a_base() {
            return Err(LedgerError::InvalidBaseUrl(base_url.as_ref().to_string()));
        }
        if !url.path().ends_with('/') {
            let mut path = url.path().trim_end_matches('/').to_owned();
            path.push('/');
            url.set_path(&path);
        }
        let defaults = LedgerClientConfig::default();
        Ok(Self {
            base_url: url,
            http,
            commit_poll_interval: defaults.commit_poll_interval,
            commit_timeout: defaults.commit_timeout,
        })
    }

    /// Expose the underlying base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of `segments` below the API root, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str], query: &[(&str, Option<String>)]) -> Result<Url, LedgerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        let pairs: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
            .collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, LedgerError>
    where
        T: DeserializeOwned,
    {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        Self::map_response(response).await
    }

    /// Like `get_json`, but a 404 means "no such entity" rather than failure.
    async fn get_optional<T>(&self, url: Url) -> Result<Option<T>, LedgerError>
    where
        T: DeserializeOwned,
    {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::map_response(response).await.map(Some)
    }

    async fn map_response<T>(response: Response) -> Result<T, LedgerError>
    where
        T: DeserializeOwned,
    {
        if !response.status().is_success() {
            return Err(Self::map_api_error(response).await);
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| LedgerError::parse_error(format!("unexpected response body: {err}")))
    }

    async fn map_api_error(response: Response) -> LedgerError {
        let status = response.status().as_u16();
        let message = Self::error_message(response).await;
        LedgerError::server_error(status, message)
    }

    async fn error_message(response: Response) -> String {
        let bytes = response.bytes().await.unwrap_or_default();
        if let Ok(api_error) = serde_json::from_slice::<ApiErrorResponse>(&bytes) {
            if let Some(message) = api_error.message {
                return message;
            }
        }
        String::from_utf8_lossy(&bytes).to_string()
    }

    /// Post a signed transaction. A validation refusal is a commit rejection.
    pub async fn post_transaction(&self, tx: &Transaction) -> Result<(), LedgerError> {
        let url = self.endpoint(&["transactions"], &[])?;
        debug!(%url, transaction_id = %tx.id, "POST");
        let response = self.http.post(url).json(tx).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::BAD_REQUEST {
            return Err(LedgerError::CommitRejected {
                id: tx.id.clone(),
                reason: Self::error_message(response).await,
            });
        }
        Err(Self::map_api_error(response).await)
    }

    /// Commit status of a submitted transaction; `None` if the node has not seen it.
    pub async fn transaction_status(
        &self,
        id: &str,
    ) -> Result<Option<TransactionStatus>, LedgerError> {
        let url = self.endpoint(&["statuses"], &[("transaction_id", Some(id.to_string()))])?;
        Ok(self
            .get_optional::<StatusResponse>(url)
            .await?
            .map(|response| response.status))
    }

    /// Poll until the network decides on `id`, then return the committed record.
    pub async fn wait_for_commit(&self, id: &str) -> Result<Transaction, LedgerError> {
        let started = Instant::now();
        loop {
            match self.transaction_status(id).await? {
                Some(status) if status.is_final() => return self.settle(id, status).await,
                status => debug!(transaction_id = id, ?status, "awaiting commit"),
            }

            let waited = started.elapsed();
            if waited >= self.commit_timeout {
                return Err(LedgerError::CommitTimeout {
                    id: id.to_string(),
                    waited,
                });
            }
            tokio::time::sleep(self.commit_poll_interval).await;
        }
    }

    async fn settle(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<Transaction, LedgerError> {
        if status == TransactionStatus::Invalid {
            return Err(LedgerError::CommitRejected {
                id: id.to_string(),
                reason: "the network reported the transaction invalid".into(),
            });
        }
        self.fetch_transaction(id).await?.ok_or_else(|| {
            LedgerError::parse_error(format!(
                "transaction {id} reported valid but could not be fetched"
            ))
        })
    }

    async fn submit(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        let id = tx.id.clone();
        info!(transaction_id = %id, operation = %tx.operation, "transaction signed");
        if let Err(err) = self.post_transaction(&tx).await {
            warn!(transaction_id = %id, error = %err, "submission failed");
            return Err(err);
        }
        info!(transaction_id = %id, "transaction submitted");

        match self.wait_for_commit(&id).await {
            Ok(committed) => {
                info!(transaction_id = %id, "transaction committed");
                Ok(committed)
            }
            Err(err) => {
                warn!(transaction_id = %id, error = %err, "transaction not committed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl LedgerApi for LedgerClient {
    async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, LedgerError> {
        let url = self.endpoint(&["transactions", id], &[])?;
        self.get_optional(url).await
    }

    async fn list_transactions(
        &self,
        asset_id: &str,
        operation: Option<Operation>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let url = self.endpoint(
            &["transactions"],
            &[
                ("asset_id", Some(asset_id.to_string())),
                ("operation", operation.map(|op| op.to_string())),
            ],
        )?;
        self.get_json(url).await
    }

    async fn list_outputs(
        &self,
        public_key: &str,
        spent: Option<bool>,
    ) -> Result<Vec<Fulfills>, LedgerError> {
        let url = self.endpoint(
            &["outputs"],
            &[
                ("public_key", Some(public_key.to_string())),
                ("spent", spent.map(|s| s.to_string())),
            ],
        )?;
        self.get_json(url).await
    }

    async fn fetch_block(&self, id: &str) -> Result<Option<Block>, LedgerError> {
        let url = self.endpoint(&["blocks", id], &[])?;
        self.get_optional(url).await
    }

    async fn list_blocks_containing(
        &self,
        transaction_id: &str,
        status: Option<BlockStatus>,
    ) -> Result<Vec<Block>, LedgerError> {
        let url = self.endpoint(
            &["blocks"],
            &[
                ("transaction_id", Some(transaction_id.to_string())),
                ("status", status.map(|s| s.to_string())),
            ],
        )?;
        let block_ids: Vec<String> = self.get_json(url).await?;
        let blocks = try_join_all(block_ids.iter().map(|id| self.fetch_block(id))).await?;
        Ok(blocks.into_iter().flatten().collect())
    }

    async fn list_votes(&self, block_id: &str) -> Result<Vec<Vote>, LedgerError> {
        let url = self.endpoint(&["votes"], &[("block_id", Some(block_id.to_string()))])?;
        self.get_json(url).await
    }

    async fn search_assets(
        &self,
        text: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let url = self.endpoint(
            &["assets"],
            &[
                ("search", Some(text.to_string())),
                ("limit", limit.map(|l| l.to_string())),
            ],
        )?;
        let hits: Vec<AssetSummary> = self.get_json(url).await?;
        let transactions =
            try_join_all(hits.iter().map(|hit| self.fetch_transaction(&hit.id))).await?;
        Ok(transactions.into_iter().flatten().collect())
    }

    async fn submit_create_transaction(
        &self,
        issuer_public_key: &str,
        issuer_private_key: &str,
        asset: Value,
        metadata: Value,
    ) -> Result<Transaction, LedgerError> {
        let tx = builder::prepare_create(issuer_public_key, issuer_private_key, asset, metadata)?;
        self.submit(tx).await
    }

    async fn submit_transfer_transaction(
        &self,
        source: &Transaction,
        from_public_key: &str,
        from_private_key: &str,
        to_public_key: &str,
        metadata: Value,
    ) -> Result<Transaction, LedgerError> {
        let tx = builder::prepare_transfer(
            source,
            from_public_key,
            from_private_key,
            to_public_key,
            metadata,
        )?;
        self.submit(tx).await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
}
