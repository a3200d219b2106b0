mod lookup;
mod provision;
mod session;

pub use lookup::RepoSetLookup;
pub use provision::{provision, SEED_FILES};
pub use session::Sandbox;

/// Directory names inside the sandbox root.
pub const FAKE_REMOTE_DIR: &str = "fake_remote";
pub const FAKE_FORK_DIR: &str = "fake_fork_source";
pub const WORKING_DIR: &str = "working_dir";
pub const HOME_DIR: &str = "home";
