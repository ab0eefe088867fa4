//! Graph object types wrapping the ledger records.
//!
//! Fields keep the ledger's snake_case names. Fields backed by a further
//! ledger call (`Transaction.blocks`, `Fulfills.transaction`, `Block.votes`)
//! are resolved only when selected, once per parent. They are nullable so a
//! failed ledger call renders as null next to its error entry.

use async_graphql::{Context, Enum, Json, Object, Result};
use ledgerql_types::{Block, BlockBody, Fulfills, Input, Output, Transaction, Vote, VoteBody};
use serde_json::Value;

use crate::error::{ledger, LedgerResultExt};

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(name = "Operation", remote = "ledgerql_types::Operation")]
pub enum OperationKind {
    Create,
    Transfer,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(name = "BlockStatus", remote = "ledgerql_types::BlockStatus")]
pub enum BlockStatusKind {
    Valid,
    Invalid,
    Undecided,
}

pub struct TransactionObject(pub Transaction);

#[Object(name = "Transaction", rename_fields = "snake_case")]
impl TransactionObject {
    async fn id(&self) -> &str {
        &self.0.id
    }

    async fn operation(&self) -> OperationKind {
        self.0.operation.into()
    }

    async fn version(&self) -> &str {
        &self.0.version
    }

    async fn asset(&self) -> Json<Value> {
        Json(self.0.asset.clone())
    }

    async fn metadata(&self) -> Json<Value> {
        Json(self.0.metadata.clone())
    }

    async fn inputs(&self) -> Vec<InputObject> {
        self.0.inputs.iter().cloned().map(InputObject).collect()
    }

    async fn outputs(&self) -> Vec<OutputObject> {
        self.0.outputs.iter().cloned().map(OutputObject).collect()
    }

    /// Blocks that include this transaction.
    async fn blocks(
        &self,
        ctx: &Context<'_>,
        status: Option<BlockStatusKind>,
    ) -> Result<Option<Vec<BlockObject>>> {
        let blocks = ledger(ctx)?
            .list_blocks_containing(&self.0.id, status.map(Into::into))
            .await
            .into_field_result()?;
        Ok(Some(blocks.into_iter().map(BlockObject).collect()))
    }
}

pub struct InputObject(pub Input);

#[Object(name = "Input", rename_fields = "snake_case")]
impl InputObject {
    async fn owners_before(&self) -> &[String] {
        &self.0.owners_before
    }

    async fn fulfillment(&self) -> Option<&str> {
        self.0.fulfillment.as_deref()
    }

    /// The output this input spends; null for a CREATE.
    async fn fulfills(&self) -> Option<FulfillsObject> {
        self.0.fulfills.clone().map(FulfillsObject)
    }
}

pub struct FulfillsObject(pub Fulfills);

#[Object(name = "Fulfills", rename_fields = "snake_case")]
impl FulfillsObject {
    async fn output_index(&self) -> u32 {
        self.0.output_index
    }

    async fn transaction_id(&self) -> &str {
        &self.0.transaction_id
    }

    /// The referenced transaction, fetched on demand.
    async fn transaction(&self, ctx: &Context<'_>) -> Result<Option<TransactionObject>> {
        let tx = ledger(ctx)?
            .fetch_transaction(&self.0.transaction_id)
            .await
            .into_field_result()?;
        Ok(tx.map(TransactionObject))
    }
}

pub struct OutputObject(pub Output);

#[Object(name = "Output", rename_fields = "snake_case")]
impl OutputObject {
    async fn condition(&self) -> Json<Value> {
        Json(self.0.condition.clone())
    }

    async fn public_keys(&self) -> &[String] {
        &self.0.public_keys
    }

    /// Decimal string; amounts may exceed what a GraphQL Int holds.
    async fn amount(&self) -> &str {
        &self.0.amount
    }
}

pub struct BlockObject(pub Block);

#[Object(name = "Block", rename_fields = "snake_case")]
impl BlockObject {
    async fn id(&self) -> &str {
        &self.0.id
    }

    async fn block(&self) -> BlockInternObject {
        BlockInternObject(self.0.block.clone())
    }

    async fn signature(&self) -> Option<&str> {
        self.0.signature.as_deref()
    }

    /// Votes cast on this block.
    async fn votes(&self, ctx: &Context<'_>) -> Result<Option<Vec<VoteObject>>> {
        let votes = ledger(ctx)?
            .list_votes(&self.0.id)
            .await
            .into_field_result()?;
        Ok(Some(votes.into_iter().map(VoteObject).collect()))
    }
}

pub struct BlockInternObject(pub BlockBody);

#[Object(name = "BlockIntern", rename_fields = "snake_case")]
impl BlockInternObject {
    async fn timestamp(&self) -> &str {
        &self.0.timestamp
    }

    async fn transactions(&self) -> Vec<TransactionObject> {
        self.0
            .transactions
            .iter()
            .cloned()
            .map(TransactionObject)
            .collect()
    }

    async fn node_pubkey(&self) -> &str {
        &self.0.node_pubkey
    }

    async fn voters(&self) -> &[String] {
        &self.0.voters
    }
}

pub struct VoteObject(pub Vote);

#[Object(name = "Vote", rename_fields = "snake_case")]
impl VoteObject {
    async fn node_pubkey(&self) -> &str {
        &self.0.node_pubkey
    }

    async fn signature(&self) -> Option<&str> {
        self.0.signature.as_deref()
    }

    async fn vote(&self) -> VoteInternObject {
        VoteInternObject(self.0.vote.clone())
    }
}

pub struct VoteInternObject(pub VoteBody);

#[Object(name = "VoteIntern", rename_fields = "snake_case")]
impl VoteInternObject {
    async fn voting_for_block(&self) -> &str {
        &self.0.voting_for_block
    }

    async fn previous_block(&self) -> &str {
        &self.0.previous_block
    }

    async fn is_block_valid(&self) -> bool {
        self.0.is_block_valid
    }

    async fn invalid_reason(&self) -> Option<&str> {
        self.0.invalid_reason.as_deref()
    }

    async fn timestamp(&self) -> &str {
        &self.0.timestamp
    }
}
