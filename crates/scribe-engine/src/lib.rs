//! Deterministic transcripts of git sessions for documentation.
//!
//! # Example
//! ```no_run
//! use scribe_engine::Session;
//!
//! let mut session = Session::begin(Default::default()).unwrap();
//! let document = "```sh\n$ git clone https://github.com/username/reponame\n$ cd reponame\n$ ls\n```\n";
//! let processed = session.process(document).unwrap();
//! println!("{}", processed.text);
//! ```

pub mod error;
pub mod harness;
pub mod pipeline;
mod session;

pub use error::EngineError;
pub use harness::{CommandShape, Harness};
pub use pipeline::{documents_from_index, DocumentReport, ProcessedDocument};
pub use session::Session;

// Re-export core types that callers configure a session with
pub use scribe_core::config::{EditorHook, GitConfigMap, SessionSettings};
pub use scribe_core::identity::IdentityPool;
