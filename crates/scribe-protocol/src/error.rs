use scribe_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Clone failed: {0}")]
    Clone(String),

    #[error("Cannot quote {0} for the shell")]
    Quote(String),

    #[error("No fork source was provisioned for {0}")]
    NoForkSource(String),
}
