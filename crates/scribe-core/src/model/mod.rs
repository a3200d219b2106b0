pub mod clock;
pub mod identity;
pub mod record;

pub use clock::LogicalClock;
pub use identity::{CommitIdentity, FakeCommit};
pub use record::{CommandRecord, FencedBlock};
