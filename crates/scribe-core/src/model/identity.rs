use serde::{Deserialize, Serialize};

/// One pre-declared substitute commit: hash, display date and optionally
/// the author shown in commit headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeCommit {
    pub hash: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl FakeCommit {
    pub fn new(hash: &str, date: &str) -> Self {
        Self {
            hash: hash.to_string(),
            date: date.to_string(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    /// The first `len` hex digits, as git abbreviates hashes.
    pub fn abbreviated(&self, len: usize) -> &str {
        &self.hash[..len.min(self.hash.len())]
    }

    pub fn short_hash(&self) -> &str {
        self.abbreviated(7)
    }
}

/// A real commit of this run bound to its fake stand-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitIdentity {
    pub real: String,
    pub fake: FakeCommit,
}
