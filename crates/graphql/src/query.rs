use async_graphql::{Context, Object, Result};

use crate::error::{ledger, LedgerResultExt};
use crate::objects::{
    BlockObject, BlockStatusKind, FulfillsObject, OperationKind, TransactionObject, VoteObject,
};

/// Read operations.
#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// A committed transaction, or null if the ledger does not know `id`.
    async fn transaction(&self, ctx: &Context<'_>, id: String) -> Result<Option<TransactionObject>> {
        let tx = ledger(ctx)?.fetch_transaction(&id).await.into_field_result()?;
        Ok(tx.map(TransactionObject))
    }

    /// History of an asset.
    async fn transactions(
        &self,
        ctx: &Context<'_>,
        asset_id: String,
        operation: Option<OperationKind>,
    ) -> Result<Option<Vec<TransactionObject>>> {
        let txs = ledger(ctx)?
            .list_transactions(&asset_id, operation.map(Into::into))
            .await
            .into_field_result()?;
        Ok(Some(txs.into_iter().map(TransactionObject).collect()))
    }

    /// Outputs owned by `publicKey`.
    async fn outputs(
        &self,
        ctx: &Context<'_>,
        public_key: String,
        spent: Option<bool>,
    ) -> Result<Option<Vec<FulfillsObject>>> {
        let outputs = ledger(ctx)?
            .list_outputs(&public_key, spent)
            .await
            .into_field_result()?;
        Ok(Some(outputs.into_iter().map(FulfillsObject).collect()))
    }

    async fn block(&self, ctx: &Context<'_>, id: String) -> Result<Option<BlockObject>> {
        let block = ledger(ctx)?.fetch_block(&id).await.into_field_result()?;
        Ok(block.map(BlockObject))
    }

    /// Blocks containing `transactionId`.
    async fn blocks(
        &self,
        ctx: &Context<'_>,
        transaction_id: String,
        status: Option<BlockStatusKind>,
    ) -> Result<Option<Vec<BlockObject>>> {
        let blocks = ledger(ctx)?
            .list_blocks_containing(&transaction_id, status.map(Into::into))
            .await
            .into_field_result()?;
        Ok(Some(blocks.into_iter().map(BlockObject).collect()))
    }

    async fn votes(
        &self,
        ctx: &Context<'_>,
        block_id: String,
    ) -> Result<Option<Vec<VoteObject>>> {
        let votes = ledger(ctx)?.list_votes(&block_id).await.into_field_result()?;
        Ok(Some(votes.into_iter().map(VoteObject).collect()))
    }

    /// Full-text search over asset payloads.
    async fn search(
        &self,
        ctx: &Context<'_>,
        text: String,
        limit: Option<u32>,
    ) -> Result<Option<Vec<TransactionObject>>> {
        let txs = ledger(ctx)?
            .search_assets(&text, limit)
            .await
            .into_field_result()?;
        Ok(Some(txs.into_iter().map(TransactionObject).collect()))
    }
}
