use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// A network-proposed batch of transactions.
///
/// Votes are not embedded; they are fetched separately by block id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub block: BlockBody,
    #[serde(default)]
    pub signature: Option<String>,
}

impl Block {
    /// Whether `transaction_id` is part of this block's payload.
    pub fn contains_transaction(&self, transaction_id: &str) -> bool {
        self.block
            .transactions
            .iter()
            .any(|tx| tx.id == transaction_id)
    }
}

/// Signed content of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockBody {
    pub timestamp: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub node_pubkey: String,
    #[serde(default)]
    pub voters: Vec<String>,
}

/// A node's signed endorsement or rejection of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub node_pubkey: String,
    #[serde(default)]
    pub signature: Option<String>,
    pub vote: VoteBody,
}

/// The decision record inside a vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteBody {
    pub voting_for_block: String,
    pub previous_block: String,
    pub is_block_valid: bool,
    #[serde(default)]
    pub invalid_reason: Option<String>,
    pub timestamp: String,
}

/// Block status filter understood by the `blocks` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockStatus {
    Valid,
    Invalid,
    Undecided,
}

impl BlockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStatus::Valid => "VALID",
            BlockStatus::Invalid => "INVALID",
            BlockStatus::Undecided => "UNDECIDED",
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
