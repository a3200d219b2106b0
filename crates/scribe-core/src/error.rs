use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Sandbox provisioning failed: {0}")]
    Provision(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Invalid identity pool: {0}")]
    InvalidPool(String),

    #[error("Identity pool exhausted: more than {size} distinct commits appeared")]
    PoolExhausted { size: usize },

    #[error("Commit {hash} has not been shown yet, so it has no real counterpart in the sandbox")]
    UnresolvedIdentity { hash: String },
}
