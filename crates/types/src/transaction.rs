use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Transaction format version emitted by the gateway.
pub const TRANSACTION_VERSION: &str = "1.0";

/// Amount assigned to a freshly created output.
pub const DEFAULT_OUTPUT_AMOUNT: &str = "1";

/// Kind of state change a ledger transaction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Registers a new asset owned by the issuer.
    Create,
    /// Reassigns ownership of an existing asset.
    Transfer,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger transaction as served by the network.
///
/// `asset` and `metadata` are opaque JSON; `null` when absent. The `id` is a
/// content fingerprint and is only empty while a transaction is being built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    pub operation: Operation,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub asset: Value,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

fn default_version() -> String {
    TRANSACTION_VERSION.to_string()
}

impl Transaction {
    /// Asset identifier this transaction belongs to.
    ///
    /// A CREATE transaction *is* the asset, so its own id is returned; a
    /// TRANSFER carries `{"id": ...}` as its asset.
    pub fn asset_id(&self) -> Option<&str> {
        match self.operation {
            Operation::Create => Some(self.id.as_str()).filter(|id| !id.is_empty()),
            Operation::Transfer => self.asset.get("id").and_then(Value::as_str),
        }
    }
}

/// A spend of a previous output, with the proof authorising it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    #[serde(default)]
    pub owners_before: Vec<String>,
    #[serde(default)]
    pub fulfillment: Option<String>,
    #[serde(default)]
    pub fulfills: Option<Fulfills>,
}

/// Reference to a specific output of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fulfills {
    pub transaction_id: String,
    pub output_index: u32,
}

/// A spendable claim guarded by a crypto-condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub condition: Value,
    #[serde(default)]
    pub public_keys: Vec<String>,
    #[serde(deserialize_with = "amount_string")]
    pub amount: String,
}

/// Older nodes emit amounts as JSON numbers; keep them as decimal strings.
fn amount_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "amount must be a string or number, got {other}"
        ))),
    }
}

/// Search hit returned by the asset text index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub id: String,
    #[serde(default)]
    pub data: Value,
}

/// Commit status reported by the network for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Valid,
    Invalid,
    Undecided,
    Backlog,
}

impl TransactionStatus {
    /// Whether the network has reached a final verdict.
    pub fn is_final(&self) -> bool {
        matches!(self, TransactionStatus::Valid | TransactionStatus::Invalid)
    }
}

/// Body of the `statuses` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: TransactionStatus,
}
