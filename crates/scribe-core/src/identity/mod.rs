mod pool;
mod virtualizer;

pub use pool::IdentityPool;
pub use virtualizer::{CommitLookup, IdentityVirtualizer};
