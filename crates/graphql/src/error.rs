use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions};
use ledgerql_client::{LedgerApi, LedgerError};
use tracing::debug;

/// Convert adapter failures into field errors tagged with their failure class.
pub(crate) trait LedgerResultExt<T> {
    fn into_field_result(self) -> async_graphql::Result<T>;
}

impl<T> LedgerResultExt<T> for Result<T, LedgerError> {
    fn into_field_result(self) -> async_graphql::Result<T> {
        self.map_err(|err| {
            let code = err.kind().code();
            debug!(code, error = %err, "ledger call failed");
            async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
        })
    }
}

/// The adapter injected at schema construction.
pub(crate) fn ledger<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<dyn LedgerApi>> {
    ctx.data::<Arc<dyn LedgerApi>>()
}
