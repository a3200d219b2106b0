use std::path::Path;

use git2::Repository;

use crate::identity::CommitLookup;

/// Resolves abbreviated hashes against a fixed set of repositories.
pub struct RepoSetLookup {
    repos: Vec<Repository>,
}

impl RepoSetLookup {
    /// Open every path that is a repository; others are skipped.
    pub fn open<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Self {
        let repos = paths
            .into_iter()
            .filter_map(|path| match Repository::open(path) {
                Ok(repo) => Some(repo),
                Err(e) => {
                    tracing::debug!("Skipping {} for commit lookup: {e}", path.display());
                    None
                }
            })
            .collect();
        Self { repos }
    }

    pub fn push(&mut self, repo: Repository) {
        self.repos.push(repo);
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

impl CommitLookup for RepoSetLookup {
    fn resolve_commit(&self, hex: &str) -> Option<String> {
        self.repos.iter().find_map(|repo| {
            repo.find_commit_by_prefix(hex)
                .ok()
                .map(|commit| commit.id().to_string())
        })
    }
}
