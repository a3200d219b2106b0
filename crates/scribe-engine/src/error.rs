use scribe_capture::CaptureError;
use scribe_core::error::CoreError;
use scribe_protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command `{command}` exited with status {exit_code}:\n{output}")]
    CommandFailed {
        command: String,
        exit_code: u32,
        output: String,
    },

    #[error("Malformed transcript block at line {line}: {text:?}")]
    MalformedBlock { line: usize, text: String },

    #[error("Bad instructions at line {line}: {text:?}")]
    BadInstructions { line: usize, text: String },

    #[error("Code fence opened at line {line} is never closed")]
    UnterminatedFence { line: usize },

    #[error("Editing {path} expects branch {expected}, but {actual} is checked out")]
    WrongBranch {
        path: String,
        expected: String,
        actual: String,
    },
}
