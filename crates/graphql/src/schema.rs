use std::sync::Arc;

use async_graphql::{EmptySubscription, Schema};
use ledgerql_client::LedgerApi;

use crate::mutation::MutationRoot;
use crate::query::QueryRoot;

pub type LedgerSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Per-query cost bounds enforced before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaLimits {
    pub max_depth: usize,
    pub max_complexity: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        // Deep enough for the GraphiQL introspection query.
        Self {
            max_depth: 32,
            max_complexity: 5_000,
        }
    }
}

/// Build a schema whose resolvers call `ledger`.
///
/// Schemas share nothing but what is passed in, so several can be served side
/// by side against different ledgers.
pub fn build_schema(ledger: Arc<dyn LedgerApi>, limits: SchemaLimits) -> LedgerSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .limit_depth(limits.max_depth)
        .limit_complexity(limits.max_complexity)
        .data(ledger)
        .finish()
}

/// Export the schema in GraphQL SDL.
pub fn export_sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}
