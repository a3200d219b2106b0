mod wrapper;

pub use wrapper::{CapturedOutput, PtyCommand, PtyCommandConfig};
