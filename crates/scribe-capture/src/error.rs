use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("PTY error: {0}")]
    Pty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Captured output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
