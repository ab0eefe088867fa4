//! GraphQL surface of the ledger gateway.
//!
//! [`build_schema`] binds every root and nested field to a call on an
//! injected [`LedgerApi`](ledgerql_client::LedgerApi). Adapter failures
//! surface as field errors whose `code` extension names the failure class,
//! leaving sibling fields to resolve on their own.

mod error;
mod mutation;
mod objects;
mod query;
mod schema;

pub use crate::mutation::MutationRoot;
pub use crate::objects::{
    BlockInternObject, BlockObject, BlockStatusKind, FulfillsObject, InputObject, OperationKind,
    OutputObject, TransactionObject, VoteInternObject, VoteObject,
};
pub use crate::query::QueryRoot;
pub use crate::schema::{build_schema, export_sdl, LedgerSchema, SchemaLimits};
