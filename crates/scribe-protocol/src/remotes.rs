use std::borrow::Cow;
use std::path::Path;

use scribe_core::config::SessionSettings;
use scribe_core::sandbox::Sandbox;

use crate::error::ProtocolError;

/// The URLs documents use for remote repositories, paired with the sandbox
/// directories that stand in for them.
#[derive(Debug, Clone)]
pub struct FictitiousRemotes {
    // (sandbox path, url)
    pairs: Vec<(String, String)>,
    // Every (sandbox path, shown text) pair output is rewritten with,
    // longest path first so no path is rewritten through a prefix of it.
    rewrites: Vec<(String, String)>,
    fork_url: Option<String>,
}

impl FictitiousRemotes {
    pub fn new(sandbox: &Sandbox, settings: &SessionSettings) -> Self {
        let mut pairs = vec![(path_text(sandbox.remote_dir()), settings.remote_url.clone())];
        if let (Some(dir), Some(url)) = (sandbox.fork_dir(), &settings.fork_url) {
            pairs.push((path_text(dir), url.clone()));
        }

        let mut rewrites = pairs.clone();
        for dir in [sandbox.working_root(), sandbox.home(), sandbox.root()] {
            rewrites.push((path_text(dir), settings.path_placeholder.clone()));
        }
        rewrites.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            pairs,
            rewrites,
            fork_url: settings.fork_url.clone(),
        }
    }

    pub fn fork_url(&self) -> Option<&str> {
        self.fork_url.as_deref()
    }

    /// Replace every whitespace-separated word of `command` that is one of
    /// the fictitious URLs by the quoted path of its sandbox directory. The
    /// rest of the command is passed through untouched.
    pub fn substitute_urls<'a>(&self, command: &'a str) -> Result<Cow<'a, str>, ProtocolError> {
        if !self.pairs.iter().any(|(_, url)| command.contains(url.as_str())) {
            return Ok(Cow::Borrowed(command));
        }
        let mut out = String::with_capacity(command.len());
        for (i, word) in command.split(' ').enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match self.pairs.iter().find(|(_, url)| url == word) {
                Some((path, _)) => {
                    let quoted = shlex::try_quote(path)
                        .map_err(|_| ProtocolError::Quote(path.clone()))?;
                    out.push_str(&quoted);
                }
                None => out.push_str(word),
            }
        }
        Ok(Cow::Owned(out))
    }

    /// Command that pulls from the fork source instead of `fork_url`.
    pub fn fork_pull_command(&self, command: &str) -> Result<String, ProtocolError> {
        let url = self
            .fork_url()
            .ok_or_else(|| ProtocolError::NoForkSource(command.to_string()))?;
        if !command.split(' ').any(|word| word == url) {
            return Err(ProtocolError::NoForkSource(command.to_string()));
        }
        Ok(self.substitute_urls(command)?.into_owned())
    }

    /// Rewrite sandbox paths in captured output back to the URLs they stand
    /// for. Any other path under the sandbox root is shown under the
    /// placeholder directory.
    pub fn rewrite_paths(&self, text: &str) -> String {
        let mut text = text.to_string();
        for (path, shown) in &self.rewrites {
            if text.contains(path.as_str()) {
                tracing::debug!("Rewriting {path} to {shown}");
                text = text.replace(path.as_str(), shown);
            }
        }
        text
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
