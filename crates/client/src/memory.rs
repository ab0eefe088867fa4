//! In-memory [`LedgerApi`] for tests.
//!
//! Commits every accepted submission immediately into a block of its own with
//! a single valid vote. Each trait call is counted so tests can assert how
//! many ledger round trips a query caused.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use ledgerql_types::{
    Block, BlockBody, BlockStatus, Fulfills, Operation, Transaction, Vote, VoteBody,
};
use parking_lot::Mutex;
use serde_json::Value;

use crate::builder::{self, TRANSFER_OUTPUT_INDEX};
use crate::error::LedgerError;
use crate::LedgerApi;

/// Public key recorded as the proposer and voter of in-memory blocks.
pub const MEMORY_NODE_KEY: &str = "MemoryLedgerNode1111111111111111111111111111";

#[derive(Default)]
struct State {
    transactions: Vec<Transaction>,
    blocks: Vec<Block>,
    votes: Vec<Vote>,
    spent: HashSet<Fulfills>,
    failing: HashSet<String>,
    clock: u64,
}

impl State {
    fn tick(&mut self) -> String {
        self.clock += 1;
        (1_500_000_000 + self.clock).to_string()
    }

    fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    fn block_status(&self, block_id: &str) -> BlockStatus {
        let mut votes = self
            .votes
            .iter()
            .filter(|vote| vote.vote.voting_for_block == block_id)
            .peekable();
        if votes.peek().is_none() {
            return BlockStatus::Undecided;
        }
        if votes.all(|vote| vote.vote.is_block_valid) {
            BlockStatus::Valid
        } else {
            BlockStatus::Invalid
        }
    }
}

/// Ledger double backed by process memory.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tx` as committed, marking the outputs it consumes as spent.
    pub fn insert_transaction(&self, tx: Transaction) {
        let mut state = self.state.lock();
        for input in &tx.inputs {
            if let Some(fulfills) = &input.fulfills {
                state.spent.insert(fulfills.clone());
            }
        }
        state.transactions.push(tx);
    }

    /// Put the given stored transactions into a new block and return its id.
    pub fn commit_block(&self, transaction_ids: &[&str]) -> String {
        let mut state = self.state.lock();
        let transactions = transaction_ids
            .iter()
            .filter_map(|id| state.transaction(id).cloned())
            .collect();
        let id = format!("block-{}", state.blocks.len() + 1);
        let timestamp = state.tick();
        state.blocks.push(Block {
            id: id.clone(),
            block: BlockBody {
                timestamp,
                transactions,
                node_pubkey: MEMORY_NODE_KEY.to_string(),
                voters: vec![MEMORY_NODE_KEY.to_string()],
            },
            signature: None,
        });
        id
    }

    /// Record a vote by `node_pubkey` on `block_id`.
    pub fn add_vote(&self, block_id: &str, node_pubkey: &str, is_block_valid: bool) {
        let mut state = self.state.lock();
        let previous_block = state
            .blocks
            .iter()
            .take_while(|block| block.id != block_id)
            .last()
            .map(|block| block.id.clone())
            .unwrap_or_default();
        let timestamp = state.tick();
        state.votes.push(Vote {
            node_pubkey: node_pubkey.to_string(),
            signature: None,
            vote: VoteBody {
                voting_for_block: block_id.to_string(),
                previous_block,
                is_block_valid,
                invalid_reason: (!is_block_valid).then(|| "rejected by test".to_string()),
                timestamp,
            },
        });
    }

    /// Make every later call to `operation` fail as an unavailable node would.
    pub fn inject_failure(&self, operation: &str) {
        self.state.lock().failing.insert(operation.to_string());
    }

    /// Number of times `operation` (a [`LedgerApi`] method name) was invoked.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    /// Sum of all recorded calls.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().transactions.clone()
    }

    fn enter(&self, operation: &'static str) -> Result<(), LedgerError> {
        *self.calls.lock().entry(operation).or_default() += 1;
        if self.state.lock().failing.contains(operation) {
            return Err(LedgerError::server_error(503, format!("{operation} unavailable")));
        }
        Ok(())
    }

    fn commit(&self, tx: Transaction) -> Transaction {
        let id = tx.id.clone();
        self.insert_transaction(tx.clone());
        let block_id = self.commit_block(&[&id]);
        self.add_vote(&block_id, MEMORY_NODE_KEY, true);
        tx
    }
}

fn wants_rejection(metadata: &Value) -> bool {
    metadata.get("reject").and_then(Value::as_bool) == Some(true)
}

#[async_trait]
impl LedgerApi for MemoryLedger {
    async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, LedgerError> {
        self.enter("fetch_transaction")?;
        Ok(self.state.lock().transaction(id).cloned())
    }

    async fn list_transactions(
        &self,
        asset_id: &str,
        operation: Option<Operation>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.enter("list_transactions")?;
        Ok(self
            .state
            .lock()
            .transactions
            .iter()
            .filter(|tx| tx.asset_id() == Some(asset_id))
            .filter(|tx| operation.map_or(true, |op| tx.operation == op))
            .cloned()
            .collect())
    }

    async fn list_outputs(
        &self,
        public_key: &str,
        spent: Option<bool>,
    ) -> Result<Vec<Fulfills>, LedgerError> {
        self.enter("list_outputs")?;
        let state = self.state.lock();
        let mut outputs = Vec::new();
        for tx in &state.transactions {
            for (index, output) in tx.outputs.iter().enumerate() {
                if !output.public_keys.iter().any(|key| key == public_key) {
                    continue;
                }
                let fulfills = Fulfills {
                    transaction_id: tx.id.clone(),
                    output_index: index as u32,
                };
                let is_spent = state.spent.contains(&fulfills);
                if spent.map_or(true, |wanted| wanted == is_spent) {
                    outputs.push(fulfills);
                }
            }
        }
        Ok(outputs)
    }

    async fn fetch_block(&self, id: &str) -> Result<Option<Block>, LedgerError> {
        self.enter("fetch_block")?;
        Ok(self
            .state
            .lock()
            .blocks
            .iter()
            .find(|block| block.id == id)
            .cloned())
    }

    async fn list_blocks_containing(
        &self,
        transaction_id: &str,
        status: Option<BlockStatus>,
    ) -> Result<Vec<Block>, LedgerError> {
        self.enter("list_blocks_containing")?;
        let state = self.state.lock();
        Ok(state
            .blocks
            .iter()
            .filter(|block| block.contains_transaction(transaction_id))
            .filter(|block| status.map_or(true, |s| state.block_status(&block.id) == s))
            .cloned()
            .collect())
    }

    async fn list_votes(&self, block_id: &str) -> Result<Vec<Vote>, LedgerError> {
        self.enter("list_votes")?;
        Ok(self
            .state
            .lock()
            .votes
            .iter()
            .filter(|vote| vote.vote.voting_for_block == block_id)
            .cloned()
            .collect())
    }

    async fn search_assets(
        &self,
        text: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.enter("search_assets")?;
        let needle = text.to_lowercase();
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        Ok(self
            .state
            .lock()
            .transactions
            .iter()
            .filter(|tx| tx.operation == Operation::Create)
            .filter(|tx| {
                tx.asset
                    .get("data")
                    .map(|data| data.to_string().to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn submit_create_transaction(
        &self,
        issuer_public_key: &str,
        issuer_private_key: &str,
        asset: Value,
        metadata: Value,
    ) -> Result<Transaction, LedgerError> {
        self.enter("submit_create_transaction")?;
        let tx = builder::prepare_create(issuer_public_key, issuer_private_key, asset, metadata)?;
        if wants_rejection(&tx.metadata) {
            return Err(LedgerError::CommitRejected {
                id: tx.id,
                reason: "rejected by validation".into(),
            });
        }
        Ok(self.commit(tx))
    }

    async fn submit_transfer_transaction(
        &self,
        source: &Transaction,
        from_public_key: &str,
        from_private_key: &str,
        to_public_key: &str,
        metadata: Value,
    ) -> Result<Transaction, LedgerError> {
        self.enter("submit_transfer_transaction")?;
        let tx = builder::prepare_transfer(
            source,
            from_public_key,
            from_private_key,
            to_public_key,
            metadata,
        )?;
        let consumed = Fulfills {
            transaction_id: source.id.clone(),
            output_index: TRANSFER_OUTPUT_INDEX,
        };
        let reason = {
            let state = self.state.lock();
            if state.transaction(&source.id).is_none() {
                Some(format!("input {} does not exist", source.id))
            } else if state.spent.contains(&consumed) {
                Some(format!("output 0 of {} is already spent", source.id))
            } else if wants_rejection(&tx.metadata) {
                Some("rejected by validation".to_string())
            } else {
                None
            }
        };
        if let Some(reason) = reason {
            return Err(LedgerError::CommitRejected { id: tx.id, reason });
        }
        Ok(self.commit(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerql_crypto::Keypair;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_transfer_updates_outputs() {
        let ledger = MemoryLedger::new();
        let alice = Keypair::from_seed([1u8; 32]);
        let bob = Keypair::from_seed([2u8; 32]);

        let created = ledger
            .submit_create_transaction(
                &alice.public_key(),
                &alice.private_key(),
                json!({ "serial": "A-1" }),
                Value::Null,
            )
            .await
            .unwrap();
        let unspent = ledger
            .list_outputs(&alice.public_key(), Some(false))
            .await
            .unwrap();
        assert_eq!(unspent.len(), 1);

        ledger
            .submit_transfer_transaction(
                &created,
                &alice.public_key(),
                &alice.private_key(),
                &bob.public_key(),
                Value::Null,
            )
            .await
            .unwrap();

        let spent = ledger
            .list_outputs(&alice.public_key(), Some(true))
            .await
            .unwrap();
        assert_eq!(spent, unspent);
        let history = ledger.list_transactions(&created.id, None).await.unwrap();
        assert_eq!(history.len(), 2);

        let blocks = ledger
            .list_blocks_containing(&created.id, Some(BlockStatus::Valid))
            .await
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(ledger.list_votes(&blocks[0].id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_double_spend_is_rejected() {
        let ledger = MemoryLedger::new();
        let alice = Keypair::from_seed([1u8; 32]);
        let created = ledger
            .submit_create_transaction(&alice.public_key(), &alice.private_key(), Value::Null, Value::Null)
            .await
            .unwrap();
        for attempt in 0..2 {
            let result = ledger
                .submit_transfer_transaction(
                    &created,
                    &alice.public_key(),
                    &alice.private_key(),
                    &alice.public_key(),
                    json!({ "attempt": attempt }),
                )
                .await;
            assert_eq!(result.is_ok(), attempt == 0);
        }
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_counts() {
        let ledger = MemoryLedger::new();
        ledger.inject_failure("fetch_block");
        let err = ledger.fetch_block("block-1").await.unwrap_err();
        assert!(matches!(err, LedgerError::ServerError { status: 503, .. }));
        assert_eq!(ledger.fetch_transaction("missing").await.unwrap(), None);
        assert_eq!(ledger.call_count("fetch_block"), 1);
        assert_eq!(ledger.call_count("fetch_transaction"), 1);
        assert_eq!(ledger.total_calls(), 2);
    }
}
