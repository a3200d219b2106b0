use std::path::{Component, Path, PathBuf};

use git2::{Repository, RepositoryOpenFlags};
use tempfile::TempDir;

use crate::config::GitConfigMap;
use crate::error::CoreError;
use crate::model::LogicalClock;

use super::lookup::RepoSetLookup;

/// Mutable state of one transcript run.
///
/// Owns the sandbox root; dropping the sandbox deletes every file in it,
/// whether the run succeeded or not.
pub struct Sandbox {
    root: Option<TempDir>,
    root_path: PathBuf,
    working_root: PathBuf,
    cwd: PathBuf,
    home: PathBuf,
    remote: PathBuf,
    fork: Option<PathBuf>,
    repo_name: String,
    git_config: GitConfigMap,
    globals: GitConfigMap,
    clones: Vec<PathBuf>,
    clock: LogicalClock,
}

/// Paths making up a freshly provisioned sandbox.
pub(crate) struct SandboxLayout {
    pub root: TempDir,
    pub working_root: PathBuf,
    pub home: PathBuf,
    pub remote: PathBuf,
    pub fork: Option<PathBuf>,
}

impl Sandbox {
    pub(crate) fn new(
        layout: SandboxLayout,
        repo_name: &str,
        git_config: GitConfigMap,
        clock: LogicalClock,
    ) -> Self {
        Self {
            root_path: layout.root.path().to_path_buf(),
            root: Some(layout.root),
            cwd: layout.working_root.clone(),
            working_root: layout.working_root,
            home: layout.home,
            remote: layout.remote,
            fork: layout.fork,
            repo_name: repo_name.to_string(),
            git_config,
            globals: GitConfigMap::default(),
            clones: Vec::new(),
            clock,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Top of the live working tree; `cd` never leaves it.
    pub fn working_root(&self) -> &Path {
        &self.working_root
    }

    /// Directory the next command runs in.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Empty `HOME` for commands, so no user configuration leaks in.
    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn remote_dir(&self) -> &Path {
        &self.remote
    }

    pub fn fork_dir(&self) -> Option<&Path> {
        self.fork.as_deref()
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut LogicalClock {
        &mut self.clock
    }

    pub fn clones(&self) -> &[PathBuf] {
        &self.clones
    }

    /// Settings recorded from `git config --global` commands.
    pub fn globals(&self) -> &GitConfigMap {
        &self.globals
    }

    /// Configuration for a freshly cloned repository: the deterministic map
    /// followed by every global setting recorded so far.
    pub fn clone_config(&self) -> GitConfigMap {
        self.git_config.merged(&self.globals)
    }

    /// Remember a clone and apply the clone configuration to it.
    pub fn register_clone(&mut self, path: PathBuf) -> Result<(), CoreError> {
        self.clone_config().apply_to(&path)?;
        tracing::debug!("Registered clone {}", path.display());
        self.clones.push(path);
        Ok(())
    }

    /// Record a global setting. It is replayed on every later clone and
    /// written into the clones that already exist, like a real global
    /// setting would be seen by them.
    pub fn record_global(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.globals.insert(key, value);
        let mut single = GitConfigMap::default();
        single.insert(key, value);
        for clone in self.clones.iter().filter(|c| c.exists()) {
            single.apply_to(clone)?;
        }
        tracing::debug!("Recorded global config {key}={value:?}");
        Ok(())
    }

    /// Move the working-directory pointer. Supports `.`, `..` and nested
    /// relative paths; the result must exist and stay inside the working tree.
    pub fn change_dir(&mut self, target: &str) -> Result<(), CoreError> {
        let target_path = Path::new(target);
        if target.is_empty() || target_path.is_absolute() {
            return Err(CoreError::Sandbox(format!(
                "cd needs a relative directory, got {target:?}"
            )));
        }

        let mut resolved = self.cwd.clone();
        for component in target_path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if resolved == self.working_root {
                        return Err(CoreError::Sandbox(format!(
                            "cd {target} would leave the working tree"
                        )));
                    }
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(CoreError::Sandbox(format!(
                        "cd needs a relative directory, got {target:?}"
                    )));
                }
            }
        }

        if !resolved.is_dir() {
            return Err(CoreError::Sandbox(format!(
                "cd {target}: no such directory"
            )));
        }
        tracing::debug!("cd {}", resolved.display());
        self.cwd = resolved;
        Ok(())
    }

    /// The repository containing the current directory, if any.
    pub fn current_repository(&self) -> Option<Repository> {
        Repository::open_ext(
            &self.cwd,
            RepositoryOpenFlags::empty(),
            [self.root_path.as_os_str()],
        )
        .ok()
    }

    /// Branch checked out in the current repository.
    pub fn current_branch(&self) -> Result<String, CoreError> {
        let repo = self.current_repository().ok_or_else(|| {
            CoreError::Sandbox(format!("{} is not inside a repository", self.cwd.display()))
        })?;
        let head = repo.head()?;
        head.shorthand()
            .map(String::from)
            .ok_or_else(|| CoreError::Sandbox("HEAD is not valid UTF-8".into()))
    }

    /// Commit lookup over every repository the sandbox knows about.
    pub fn commit_lookup(&self) -> RepoSetLookup {
        let mut paths: Vec<&Path> = vec![self.remote.as_path()];
        paths.extend(self.fork.as_deref());
        paths.extend(self.clones.iter().map(PathBuf::as_path));
        let mut lookup = RepoSetLookup::open(paths);
        if let Some(current) = self.current_repository() {
            lookup.push(current);
        }
        lookup
    }

    /// Detach the sandbox root from this session so it survives the drop.
    pub fn keep(mut self) -> PathBuf {
        match self.root.take() {
            Some(root) => root.keep(),
            None => self.root_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SessionSettings;
    use crate::sandbox::provision;

    #[test]
    fn test_change_dir() {
        let mut sandbox = provision(&SessionSettings::default()).unwrap();
        let working_root = sandbox.working_root().to_path_buf();
        std::fs::create_dir_all(working_root.join("reponame/src/deep")).unwrap();

        sandbox.change_dir("reponame").unwrap();
        assert_eq!(sandbox.cwd(), working_root.join("reponame"));

        sandbox.change_dir("src/deep").unwrap();
        sandbox.change_dir("../..").unwrap();
        assert_eq!(sandbox.cwd(), working_root.join("reponame"));

        sandbox.change_dir("./src/../src").unwrap();
        assert_eq!(sandbox.cwd(), working_root.join("reponame/src"));

        sandbox.change_dir("../..").unwrap();
        assert_eq!(sandbox.cwd(), working_root);
    }

    #[test]
    fn test_change_dir_rejects_bad_targets() {
        let mut sandbox = provision(&SessionSettings::default()).unwrap();
        assert!(sandbox.change_dir("missing").is_err());
        assert!(sandbox.change_dir("..").is_err());
        assert!(sandbox.change_dir("/tmp").is_err());
        assert!(sandbox.change_dir("").is_err());
        // A failed cd leaves the pointer where it was.
        assert_eq!(sandbox.cwd(), sandbox.working_root());
    }

    #[test]
    fn test_drop_removes_sandbox() {
        let sandbox = provision(&SessionSettings::default()).unwrap();
        let root = sandbox.root().to_path_buf();
        assert!(root.exists());
        drop(sandbox);
        assert!(!root.exists());
    }

    #[test]
    fn test_keep_leaves_sandbox_on_disk() {
        let sandbox = provision(&SessionSettings::default()).unwrap();
        let expected = sandbox.root().to_path_buf();
        let root = sandbox.keep();
        assert_eq!(root, expected);
        assert!(root.join("fake_remote/reponame/README.md").exists());
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_record_global_reaches_existing_clones() {
        let mut sandbox = provision(&SessionSettings::default()).unwrap();
        let clone_path = sandbox.working_root().join("reponame");
        git2::Repository::clone(&sandbox.remote_dir().to_string_lossy(), &clone_path).unwrap();
        sandbox.register_clone(clone_path.clone()).unwrap();

        sandbox.record_global("user.name", "yourusername").unwrap();

        let repo = git2::Repository::open(&clone_path).unwrap();
        let config = repo.config().unwrap();
        assert_eq!(config.get_string("user.name").unwrap(), "yourusername");
        assert_eq!(config.get_string("core.pager").unwrap(), "cat");
        assert_eq!(sandbox.clone_config().get("user.name"), Some("yourusername"));
    }
}
