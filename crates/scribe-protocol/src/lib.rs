pub mod clone;
pub mod error;
pub mod push;
pub mod remotes;

pub use clone::{clone_message, clone_remote, count_objects, CloneOutcome, ObjectCounts};
pub use error::ProtocolError;
pub use push::{rewrite_push_output, PUSH_SUMMARY};
pub use remotes::FictitiousRemotes;
