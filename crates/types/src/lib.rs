pub mod block;
pub mod canonical;
pub mod transaction;

pub use block::*;
pub use canonical::*;
pub use transaction::*;
