use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use portable_pty::{native_pty_system, CommandBuilder, PtySize};

use crate::error::CaptureError;

/// Configuration for one command run behind a pseudo-terminal.
#[derive(Debug, Clone)]
pub struct PtyCommandConfig {
    /// Shell that interprets `command` (run as `<shell> -c <command>`).
    pub shell: String,
    pub command: String,
    pub working_dir: PathBuf,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Inherited variables to remove.
    pub unset: Vec<String>,
    pub cols: u16,
    pub rows: u16,
}

impl PtyCommandConfig {
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell: "bash".to_string(),
            command: command.into(),
            working_dir: working_dir.into(),
            env: Vec::new(),
            unset: Vec::new(),
            cols: 80,
            rows: 24,
        }
    }
}

/// Everything the command wrote to the terminal, stdout and stderr merged.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub raw_output: Vec<u8>,
    pub exit_code: u32,
    pub duration: Duration,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a command so that it believes it writes to an interactive terminal:
/// pagers, `ls` columns and `git log --graph` decorations all behave as they
/// do for a user at a real terminal.
pub struct PtyCommand {
    config: PtyCommandConfig,
}

impl PtyCommand {
    pub fn new(config: PtyCommandConfig) -> Self {
        Self { config }
    }

    /// Run to completion and collect the output. Blocks for as long as the
    /// command runs.
    pub fn run(self) -> Result<CapturedOutput, CaptureError> {
        let started = Instant::now();
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows: self.config.rows,
                cols: self.config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| CaptureError::Pty(format!("Failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&self.config.shell);
        cmd.arg("-c");
        cmd.arg(&self.config.command);
        cmd.cwd(&self.config.working_dir);
        // Copy the parent environment explicitly, minus the unset variables
        for (key, value) in std::env::vars() {
            if !self.config.unset.contains(&key) {
                cmd.env(key, value);
            }
        }
        for key in &self.config.unset {
            cmd.env_remove(key);
        }
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| CaptureError::Pty(format!("Failed to spawn command: {e}")))?;

        // Drop the slave so the reader sees EOF once the child exits
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| CaptureError::Pty(format!("Failed to clone PTY reader: {e}")))?;

        // Reader thread: PTY output -> capture buffer
        let reader_handle = std::thread::spawn(move || {
            let mut captured = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => captured.extend_from_slice(&buf[..n]),
                    // Linux reports EIO once the slave side is gone
                    Err(_) => break,
                }
            }
            captured
        });

        let status = child
            .wait()
            .map_err(|e| CaptureError::Pty(format!("Failed to wait for child: {e}")))?;

        let raw_output = reader_handle
            .join()
            .map_err(|_| CaptureError::Pty("PTY reader thread panicked".into()))?;
        drop(pair.master);

        let captured = CapturedOutput {
            raw_output,
            exit_code: status.exit_code(),
            duration: started.elapsed(),
        };
        tracing::trace!(
            "{:?} exited with {} after {:?} ({} bytes)",
            self.config.command,
            captured.exit_code,
            captured.duration,
            captured.raw_output.len()
        );
        Ok(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bash_available() -> bool {
        std::process::Command::new("bash")
            .arg("-c")
            .arg("true")
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run(command: &str, dir: &TempDir) -> CapturedOutput {
        let mut config = PtyCommandConfig::new(command, dir.path());
        config.env.push(("SCRIBE_TEST_VAR".into(), "hello".into()));
        PtyCommand::new(config).run().unwrap()
    }

    #[test]
    fn test_output_goes_to_a_terminal() {
        if !bash_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let captured = run("if [ -t 1 ]; then echo tty; else echo pipe; fi", &tmp);
        assert!(captured.success());
        assert_eq!(captured.raw_output, b"tty\r\n");
    }

    #[test]
    fn test_stderr_is_merged_and_exit_code_kept() {
        if !bash_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let captured = run("echo out; echo err >&2; exit 3", &tmp);
        assert_eq!(captured.exit_code, 3);
        assert!(!captured.success());
        let text = String::from_utf8(captured.raw_output).unwrap();
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }

    #[test]
    fn test_working_dir_and_env() {
        if !bash_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker.txt"), "").unwrap();
        let captured = run("ls; echo $SCRIBE_TEST_VAR", &tmp);
        let text = String::from_utf8(captured.raw_output).unwrap();
        assert!(text.contains("marker.txt"));
        assert!(text.contains("hello"));
    }
}
