//! Terminal capture: run a shell command behind a pseudo-terminal and turn
//! the raw bytes it printed into the text a terminal would finally show.

pub mod error;
pub mod normalize;
pub mod pty;

pub use error::CaptureError;
pub use normalize::{normalize, Normalizer};
pub use pty::{CapturedOutput, PtyCommand, PtyCommandConfig};
