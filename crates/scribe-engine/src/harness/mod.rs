//! Runs one command at a time against the sandbox.

mod shape;

use scribe_capture::{Normalizer, PtyCommand, PtyCommandConfig};
use scribe_core::config::SessionSettings;
use scribe_core::identity::{IdentityPool, IdentityVirtualizer};
use scribe_core::sandbox::{provision, Sandbox};
use scribe_protocol::{clone_remote, rewrite_push_output, FictitiousRemotes};

use crate::error::EngineError;

pub use shape::CommandShape;

/// Text in recorded output that shows the command was meant to fail.
pub const FAILURE_MARKERS: &[&str] = &["fatal:", "error:"];

/// A rejected push prints this next to the refused ref.
const REJECTED_MARKER: &str = "[rejected]";

/// Inherited variables that would point git at other repositories or
/// identities than the sandbox's own.
const UNSET_ENV: &[&str] = &[
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_OBJECT_DIRECTORY",
    "GIT_CONFIG_GLOBAL",
    "GIT_CONFIG_SYSTEM",
    "GIT_AUTHOR_NAME",
    "GIT_AUTHOR_EMAIL",
    "GIT_COMMITTER_NAME",
    "GIT_COMMITTER_EMAIL",
    "EMAIL",
    "GIT_PAGER",
    "PAGER",
    "GIT_EDITOR",
    "EDITOR",
    "VISUAL",
];

pub fn shows_failure(output: &str) -> bool {
    FAILURE_MARKERS.iter().any(|marker| output.contains(marker))
}

/// Executes commands inside one sandbox and returns their normalized,
/// virtualized output.
pub struct Harness {
    settings: SessionSettings,
    sandbox: Sandbox,
    virtualizer: IdentityVirtualizer,
    remotes: FictitiousRemotes,
    normalizer: Normalizer,
    commands_run: usize,
}

impl Harness {
    /// Provision a fresh sandbox for `settings`.
    pub fn new(settings: SessionSettings, pool: IdentityPool) -> Result<Self, EngineError> {
        let sandbox = provision(&settings)?;
        let remotes = FictitiousRemotes::new(&sandbox, &settings);
        Ok(Self {
            normalizer: Normalizer::new(settings.tab_width),
            virtualizer: IdentityVirtualizer::new(pool),
            settings,
            sandbox,
            remotes,
            commands_run: 0,
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn sandbox_mut(&mut self) -> &mut Sandbox {
        &mut self.sandbox
    }

    pub fn virtualizer(&self) -> &IdentityVirtualizer {
        &self.virtualizer
    }

    pub fn commands_run(&self) -> usize {
        self.commands_run
    }

    pub fn into_sandbox(self) -> Sandbox {
        self.sandbox
    }

    /// Run `command` as typed in a document. `previous_output` is what the
    /// document currently shows below it; it only decides whether a failure
    /// is expected, and is returned as-is for a push that fails as expected.
    pub fn execute(&mut self, command: &str, previous_output: &str) -> Result<String, EngineError> {
        let shape = CommandShape::classify(command, &self.settings);
        self.sandbox.clock_mut().tick();
        self.commands_run += 1;
        tracing::info!("$ {command}");

        match shape {
            CommandShape::ChangeDir { target } => {
                self.sandbox.change_dir(&target)?;
                Ok(String::new())
            }
            CommandShape::CloneRemote { target } => {
                let outcome = clone_remote(&mut self.sandbox, target.as_deref())?;
                Ok(outcome.message)
            }
            CommandShape::PullFork { command } => {
                let real = self.virtualizer.rewrite_command(&command)?;
                let real = self.remotes.fork_pull_command(&real)?;
                self.run_shell(&command, &real, previous_output)
            }
            CommandShape::GlobalConfig {
                local_command,
                setting,
            } => {
                let real = self.virtualizer.rewrite_command(&local_command)?;
                let output = if self.sandbox.current_repository().is_some() {
                    self.run_shell(command, &real, previous_output)?
                } else {
                    String::new()
                };
                if let Some((key, value)) = setting {
                    self.sandbox.record_global(&key, &value)?;
                }
                Ok(output)
            }
            CommandShape::Push { command } => self.push(&command, previous_output),
            CommandShape::General { command } => {
                let real = self.virtualizer.rewrite_command(&command)?;
                let real = self.remotes.substitute_urls(&real)?.into_owned();
                self.run_shell(&command, &real, previous_output)
            }
        }
    }

    fn run_shell(
        &mut self,
        shown: &str,
        real: &str,
        previous_output: &str,
    ) -> Result<String, EngineError> {
        let (exit_code, output) = self.capture(real)?;
        if exit_code != 0 {
            if !shows_failure(previous_output) {
                return Err(EngineError::CommandFailed {
                    command: shown.to_string(),
                    exit_code,
                    output,
                });
            }
            tracing::warn!("`{shown}` failed with status {exit_code}, as the document expects");
        }
        self.virtualize(&output)
    }

    fn push(&mut self, command: &str, previous_output: &str) -> Result<String, EngineError> {
        let real = self.virtualizer.rewrite_command(command)?;
        let real = self.remotes.substitute_urls(&real)?.into_owned();
        let (exit_code, output) = self.capture(&real)?;
        if exit_code != 0 {
            if shows_failure(previous_output)
                || shows_failure(&output)
                || output.contains(REJECTED_MARKER)
            {
                tracing::warn!("`{command}` failed with status {exit_code}, keeping recorded output");
                return Ok(previous_output.to_string());
            }
            return Err(EngineError::CommandFailed {
                command: command.to_string(),
                exit_code,
                output,
            });
        }
        let output = rewrite_push_output(&output, &self.settings.remote_url);
        self.virtualize(&output)
    }

    /// Run through the PTY and normalize. Sandbox paths are already
    /// rewritten to their URLs in the returned text.
    fn capture(&self, command: &str) -> Result<(u32, String), EngineError> {
        let mut config = PtyCommandConfig::new(command, self.sandbox.cwd());
        config.shell = self.settings.shell.clone();
        config.cols = self.settings.pty_cols;
        config.rows = self.settings.pty_rows;
        config.unset = UNSET_ENV.iter().map(|v| v.to_string()).collect();
        config.env = self.command_env();

        let captured = PtyCommand::new(config).run()?;
        let text = self.normalizer.normalize(&captured.raw_output)?;
        Ok((captured.exit_code, self.remotes.rewrite_paths(&text)))
    }

    fn command_env(&self) -> Vec<(String, String)> {
        let date = self.sandbox.clock().git_date();
        let mut env = vec![
            (
                "HOME".to_string(),
                self.sandbox.home().to_string_lossy().into_owned(),
            ),
            ("GIT_CONFIG_NOSYSTEM".to_string(), "1".to_string()),
            ("GIT_AUTHOR_DATE".to_string(), date.clone()),
            ("GIT_COMMITTER_DATE".to_string(), date),
        ];
        env.extend(self.settings.env.iter().cloned());
        env
    }

    fn virtualize(&mut self, output: &str) -> Result<String, EngineError> {
        let lookup = self.sandbox.commit_lookup();
        Ok(self.virtualizer.rewrite_output(output, &lookup)?)
    }
}
