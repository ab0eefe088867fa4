//! Ledger client adapter.
//!
//! [`LedgerApi`] is the seam the GraphQL layer talks to; [`LedgerClient`]
//! implements it over the ledger's HTTP API, and the [`builder`] module
//! constructs and signs the transactions it submits.

pub mod builder;
mod client;
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use crate::client::{LedgerClient, LedgerClientConfig, DEFAULT_LEDGER_URL};
pub use crate::error::{ConstructionError, FailureKind, LedgerError};

use async_trait::async_trait;
use ledgerql_types::{Block, BlockStatus, Fulfills, Operation, Transaction, Vote};
use serde_json::Value;

/// Read and write operations the gateway needs from a ledger network.
///
/// Lookups by identifier return `Ok(None)` when nothing matches; `Err` is
/// reserved for failing to ask.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, LedgerError>;

    /// Transactions of one asset, optionally limited to one operation kind.
    async fn list_transactions(
        &self,
        asset_id: &str,
        operation: Option<Operation>,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Outputs owned by `public_key`; `spent` narrows to spent or unspent ones.
    async fn list_outputs(
        &self,
        public_key: &str,
        spent: Option<bool>,
    ) -> Result<Vec<Fulfills>, LedgerError>;

    async fn fetch_block(&self, id: &str) -> Result<Option<Block>, LedgerError>;

    /// Full blocks whose payload contains `transaction_id`.
    async fn list_blocks_containing(
        &self,
        transaction_id: &str,
        status: Option<BlockStatus>,
    ) -> Result<Vec<Block>, LedgerError>;

    async fn list_votes(&self, block_id: &str) -> Result<Vec<Vote>, LedgerError>;

    /// Full-text asset search, resolved to the transactions that created the hits.
    async fn search_assets(
        &self,
        text: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Build, sign and submit a CREATE, returning it once committed.
    async fn submit_create_transaction(
        &self,
        issuer_public_key: &str,
        issuer_private_key: &str,
        asset: Value,
        metadata: Value,
    ) -> Result<Transaction, LedgerError>;

    /// Build, sign and submit a TRANSFER of output 0 of `source`, returning it
    /// once committed.
    async fn submit_transfer_transaction(
        &self,
        source: &Transaction,
        from_public_key: &str,
        from_private_key: &str,
        to_public_key: &str,
        metadata: Value,
    ) -> Result<Transaction, LedgerError>;
}
