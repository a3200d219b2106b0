use std::path::Path;

use git2::{Config, Repository};

use crate::error::CoreError;

/// Ordered git configuration applied to every repository the sandbox clones.
///
/// Later entries for the same key replace earlier ones in place, so the
/// order in which settings were first declared is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitConfigMap {
    entries: Vec<(String, String)>,
}

impl GitConfigMap {
    /// The deterministic map: no pager, an editor that accepts the default
    /// message, forced colors and an empty identity so commits fail the way
    /// they do right after installing git.
    pub fn deterministic() -> Self {
        let mut map = Self::default();
        map.insert("core.pager", "cat");
        map.insert("core.editor", "true");
        map.insert("color.ui", "always");
        map.insert("user.email", "");
        map.insert("user.name", "");
        map
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `other` on top of this map.
    pub fn merged(&self, other: &GitConfigMap) -> GitConfigMap {
        let mut merged = self.clone();
        for (key, value) in other.iter() {
            merged.insert(key, value);
        }
        merged
    }

    /// Write every entry into a git config.
    pub fn save(&self, config: &mut Config) -> Result<(), CoreError> {
        for (key, value) in self.iter() {
            config.set_str(key, value).map_err(CoreError::Git)?;
        }
        Ok(())
    }

    /// Write every entry into the local config of the repository at `path`.
    pub fn apply_to(&self, path: &Path) -> Result<(), CoreError> {
        let repo = Repository::open(path)?;
        let mut config = repo.config()?;
        self.save(&mut config)?;
        tracing::debug!("Applied {} config entries to {}", self.len(), path.display());
        Ok(())
    }
}

/// A phrase in the document's prose that stands for "the reader edits this
/// file by hand". Processing the phrase writes `content` into `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorHook {
    pub trigger: String,
    pub path: String,
    pub content: String,
}

/// Every tunable of a transcript session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// URL that `git clone` commands in documents use for the fictitious remote.
    pub remote_url: String,
    /// URL that stands for the repository a fork is pulled from.
    pub fork_url: Option<String>,
    pub default_branch: String,
    pub initial_commit_message: String,
    /// Identity used for the commits the provisioner creates itself.
    pub seed_author_name: String,
    pub seed_author_email: String,
    /// Second line of the README the remote starts with.
    pub seed_description: String,
    pub fork_commit_message: String,
    pub fork_readme_addition: String,
    /// Marker at the start of a command line inside a transcript block.
    pub prompt: String,
    /// Fence tags whose blocks hold transcripts.
    pub transcript_tags: Vec<String>,
    /// Fence tags whose blocks may hold a `# ` editing instruction. Other
    /// fences only display text and are left alone.
    pub instruction_tags: Vec<String>,
    /// Shown in place of the sandbox's working tree, home and root paths.
    pub path_placeholder: String,
    pub clock_start: i64,
    pub clock_step: i64,
    pub utc_offset_minutes: i32,
    pub tab_width: usize,
    pub pty_cols: u16,
    pub pty_rows: u16,
    pub shell: String,
    /// Extra environment for every command, on top of the hermetic defaults.
    pub env: Vec<(String, String)>,
    pub git_config: GitConfigMap,
    pub editor_hooks: Vec<EditorHook>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            remote_url: "https://github.com/username/reponame".to_string(),
            fork_url: None,
            default_branch: "main".to_string(),
            initial_commit_message: "Initial commit".to_string(),
            seed_author_name: "yourusername".to_string(),
            seed_author_email: "you@example.com".to_string(),
            seed_description: "The description of the repository is here by default".to_string(),
            fork_commit_message: "Improve the description".to_string(),
            fork_readme_addition: "\nThis line was added in a fork of the repository.\n"
                .to_string(),
            prompt: "$ ".to_string(),
            transcript_tags: vec!["sh".to_string(), "diff".to_string()],
            instruction_tags: vec!["python".to_string()],
            path_placeholder: "/home/username".to_string(),
            // Using a prime step makes the commit times look less artificial.
            clock_start: 1_622_133_500,
            clock_step: 7,
            utc_offset_minutes: 120,
            tab_width: 8,
            pty_cols: 80,
            pty_rows: 24,
            shell: "bash".to_string(),
            env: vec![
                ("TERM".to_string(), "xterm-256color".to_string()),
                ("LC_ALL".to_string(), "C".to_string()),
            ],
            git_config: GitConfigMap::deterministic(),
            editor_hooks: vec![EditorHook {
                trigger: "Now open `README.md` in your favorite text editor".to_string(),
                path: "README.md".to_string(),
                content: "# reponame\n\
                          This is a better description of this repository. Imagine you just wrote it\n\
                          into your text editor.\n\
                          \n\
                          More text here. Lorem ipsum blah blah blah.\n"
                    .to_string(),
            }],
        }
    }
}

impl SessionSettings {
    /// Repository name: the last path segment of the remote URL.
    pub fn repo_name(&self) -> &str {
        repo_name_from_url(&self.remote_url)
    }

    /// README content GitHub generates for a new repository.
    pub fn seed_readme(&self) -> String {
        format!("# {}\n{}\n", self.repo_name(), self.seed_description)
    }

    pub fn is_transcript_tag(&self, tag: &str) -> bool {
        self.transcript_tags.iter().any(|t| t == tag)
    }

    pub fn is_instruction_tag(&self, tag: &str) -> bool {
        self.instruction_tags.iter().any(|t| t == tag)
    }

    /// Reject settings that cannot produce a well-formed sandbox.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.repo_name().is_empty() {
            return Err(CoreError::Config(format!(
                "Remote URL has no repository name: {}",
                self.remote_url
            )));
        }
        if let Some(fork) = &self.fork_url {
            if repo_name_from_url(fork) != self.repo_name() {
                return Err(CoreError::Config(format!(
                    "Fork URL {fork} must name the same repository as {}",
                    self.remote_url
                )));
            }
        }
        if self.clock_step <= 0 {
            return Err(CoreError::Config(format!(
                "Clock step must be positive, got {}",
                self.clock_step
            )));
        }
        if self.tab_width == 0 {
            return Err(CoreError::Config("Tab width must be positive".into()));
        }
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Config("Prompt marker must not be blank".into()));
        }
        if !Path::new(&self.path_placeholder).is_absolute() {
            return Err(CoreError::Config(format!(
                "Path placeholder must be absolute, got {:?}",
                self.path_placeholder
            )));
        }
        if self.pty_cols == 0 || self.pty_rows == 0 {
            return Err(CoreError::Config("Terminal size must be positive".into()));
        }
        Ok(())
    }
}

fn repo_name_from_url(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last)
}
