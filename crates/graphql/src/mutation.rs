use async_graphql::{Context, Json, Object, Result};
use ledgerql_client::{ConstructionError, LedgerError};
use ledgerql_types::Transaction;
use serde_json::Value;
use tracing::info;

use crate::error::{ledger, LedgerResultExt};
use crate::objects::TransactionObject;

/// Write operations. Each resolves once the ledger has committed the result.
#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create an asset holding `payload`, owned by `publicKey`.
    async fn transaction(
        &self,
        ctx: &Context<'_>,
        public_key: String,
        private_key: String,
        payload: Json<Value>,
        metadata: Option<Json<Value>>,
    ) -> Result<TransactionObject> {
        let metadata = metadata.map_or(Value::Null, |json| json.0);
        let tx = ledger(ctx)?
            .submit_create_transaction(&public_key, &private_key, payload.0, metadata)
            .await
            .into_field_result()?;
        info!(transaction_id = %tx.id, "create committed");
        Ok(TransactionObject(tx))
    }

    /// Transfer output 0 of `tx` from its current owner to `toPublicKey`.
    async fn transfer(
        &self,
        ctx: &Context<'_>,
        tx: Json<Value>,
        from_public_key: String,
        from_private_key: String,
        to_public_key: String,
        metadata: Option<Json<Value>>,
    ) -> Result<TransactionObject> {
        let source: Transaction = serde_json::from_value(tx.0)
            .map_err(|err| {
                LedgerError::from(ConstructionError::InvalidSource(format!(
                    "tx is not a ledger transaction: {err}"
                )))
            })
            .into_field_result()?;
        let metadata = metadata.map_or(Value::Null, |json| json.0);
        let committed = ledger(ctx)?
            .submit_transfer_transaction(
                &source,
                &from_public_key,
                &from_private_key,
                &to_public_key,
                metadata,
            )
            .await
            .into_field_result()?;
        info!(transaction_id = %committed.id, source = %source.id, "transfer committed");
        Ok(TransactionObject(committed))
    }
}
