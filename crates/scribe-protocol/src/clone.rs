use std::collections::HashSet;
use std::path::PathBuf;

use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use scribe_core::sandbox::Sandbox;

use crate::error::ProtocolError;

/// Objects reachable from the branches of a repository, as a hosting
/// service would count them when packing a clone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    pub commits: usize,
    pub trees: usize,
    pub blobs: usize,
}

impl ObjectCounts {
    pub fn total(&self) -> usize {
        self.commits + self.trees + self.blobs
    }

    /// Objects the server would compress: everything but the commits.
    pub fn compressed(&self) -> usize {
        self.trees + self.blobs
    }
}

/// Result of substituting a clone of the fictitious remote.
#[derive(Debug)]
pub struct CloneOutcome {
    pub path: PathBuf,
    pub counts: ObjectCounts,
    /// What a clone from a real hosting service would have printed.
    pub message: String,
}

/// Count the unique objects reachable from every local branch.
pub fn count_objects(repo: &Repository) -> Result<ObjectCounts, ProtocolError> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push_glob("refs/heads/*")?;

    let mut counts = ObjectCounts::default();
    let mut seen = HashSet::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        counts.commits += 1;

        let tree = commit.tree()?;
        if !seen.insert(tree.id()) {
            continue;
        }
        counts.trees += 1;
        tree.walk(TreeWalkMode::PreOrder, |_, entry| {
            if !seen.insert(entry.id()) {
                return TreeWalkResult::Skip;
            }
            match entry.kind() {
                Some(ObjectType::Tree) => counts.trees += 1,
                Some(ObjectType::Blob) => counts.blobs += 1,
                // Submodule commits live in another repository
                _ => {}
            }
            TreeWalkResult::Ok
        })?;
    }
    Ok(counts)
}

/// The progress summary `git clone` prints for a repository on a hosting
/// service, after progress lines have settled.
pub fn clone_message(dir_name: &str, counts: &ObjectCounts) -> String {
    let total = counts.total();
    let compressed = counts.compressed();
    format!(
        "Cloning into '{dir_name}'...\n\
         remote: Enumerating objects: {total}, done.\n\
         remote: Counting objects: 100% ({total}/{total}), done.\n\
         remote: Compressing objects: 100% ({compressed}/{compressed}), done.\n\
         remote: Total {total} (delta 0), reused 0 (delta 0), pack-reused 0\n\
         Receiving objects: 100% ({total}/{total}), done.\n"
    )
}

/// Clone the fictitious remote into the sandbox's current directory and
/// register the clone so it receives the deterministic configuration.
///
/// `target` is the optional directory argument of `git clone`; without it
/// the repository name is used, as git does.
pub fn clone_remote(
    sandbox: &mut Sandbox,
    target: Option<&str>,
) -> Result<CloneOutcome, ProtocolError> {
    let dir_name = target.unwrap_or(sandbox.repo_name()).to_string();
    let path = sandbox.cwd().join(&dir_name);
    let occupied = path
        .read_dir()
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(path.exists());
    if occupied {
        return Err(ProtocolError::Clone(format!(
            "destination path '{dir_name}' already exists and is not an empty directory"
        )));
    }

    let remote = Repository::open(sandbox.remote_dir())?;
    let counts = count_objects(&remote)?;

    let source = sandbox.remote_dir().to_string_lossy().into_owned();
    Repository::clone(&source, &path)
        .map_err(|e| ProtocolError::Clone(format!("Failed to clone {source}: {e}")))?;
    sandbox.register_clone(path.clone())?;
    tracing::debug!(
        "Cloned fictitious remote into {} ({} objects)",
        path.display(),
        counts.total()
    );

    Ok(CloneOutcome {
        message: clone_message(&dir_name, &counts),
        path,
        counts,
    })
}
