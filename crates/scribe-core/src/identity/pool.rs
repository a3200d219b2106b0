use std::collections::HashSet;
use std::path::Path;

use crate::error::CoreError;
use crate::model::FakeCommit;

/// Length of the abbreviated hashes that appear in transcripts.
pub(crate) const SHORT_HASH_LEN: usize = 7;

/// Built-in identities, harvested from a known-good run of the guide and
/// listed in allocation order (oldest first).
const BUILTIN: &[(&str, &str)] = &[
    ("e008dfa2f1380a4f2d99b7a0ad3d4a10d75f5f06", "Sun May 23 00:42:34 2021 +0300"),
    ("c31289bd02f89d5b1b19040d419365a58edfa6d7", "Sun May 23 15:24:51 2021 +0300"),
    ("5bf1f4e2101b044e4032b23fe6940f3cd1c9f33f", "Sun May 23 15:31:25 2021 +0300"),
    ("1f956800248ad1d577039a92f05beee9e05c1a0f", "Sun May 23 15:34:50 2021 +0300"),
    ("78b197bfe895cd73d988853685ff5a308d61dab3", "Sun May 23 16:06:58 2021 +0300"),
    ("94265fe47a65daa152f9c8ffa66dab336c0161c6", "Sun May 23 18:20:51 2021 +0300"),
    ("9900601fc325837bf3c3a40eaeffedc1e2ec5e85", "Sun May 23 18:32:49 2021 +0300"),
    ("4a5095bcb0e05894e7271cde6ea6b6b153916e7c", "Sun May 23 20:17:20 2021 +0300"),
    ("a713ead26f8e9a609c3eb5e727f66db430574be7", "Sun May 23 20:35:31 2021 +0300"),
    ("8f466b5f969287e1801fe8d057f3148398174a5d", "Sun May 23 21:56:26 2021 +0300"),
    ("6f4300485993179cb171662bf419240ac17d89d0", "Mon May 24 00:14:56 2021 +0300"),
    ("c8e61efa6a858153ff57fb923a330cecbdf5d927", "Mon May 24 00:16:13 2021 +0300"),
    ("fb56bf9f2d8a10e66256cab721a7a6817b3162a3", "Mon May 24 00:17:33 2021 +0300"),
    ("1e3d7a8d32430eb138bee2a526c1d5676f3a4da3", "Mon May 24 00:19:58 2021 +0300"),
    ("53f1321b8b0a339b07fd6e2e32816e0c92019416", "Mon May 24 00:20:28 2021 +0300"),
    ("d32545d929d9fb243359165fd37f291a8896b8c7", "Mon May 24 00:22:49 2021 +0300"),
    ("b753376396613661abeb4608feee2785e54343d5", "Mon May 24 00:27:04 2021 +0300"),
    ("647f6c6fb034ecff75a7699457b592d3240443ce", "Mon May 24 00:27:30 2021 +0300"),
    ("fb5aad1f60a80d2037e7fe1298b094b1f059bb07", "Mon May 24 00:28:13 2021 +0300"),
    ("cad28e22d712c3ee9a185dccbce3609a6d9faff7", "Mon May 24 18:34:38 2021 +0300"),
    ("d21685edc8268b4369fe00a1b057e4b24a8d12db", "Mon May 24 20:34:45 2021 +0300"),
    ("9cfe4460b2709d4575d6df13cb83ee6e00e40a01", "Mon May 24 21:04:05 2021 +0300"),
    ("eea7704461d1d3ab18c07a9fd1ef8c8803553e52", "Tue May 25 19:39:17 2021 +0300"),
];

/// Fixed, ordered list of fake commit identities.
///
/// Every entry has a distinct abbreviated hash, so a hash shown in a
/// transcript identifies exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPool {
    entries: Vec<FakeCommit>,
}

impl IdentityPool {
    pub fn new(entries: Vec<FakeCommit>) -> Result<Self, CoreError> {
        if entries.is_empty() {
            return Err(CoreError::InvalidPool("pool has no entries".into()));
        }
        let mut prefixes = HashSet::new();
        for entry in &entries {
            let valid_hex = entry.hash.len() == 40
                && entry
                    .hash
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
            if !valid_hex {
                return Err(CoreError::InvalidPool(format!(
                    "not a 40-digit lowercase hex hash: {:?}",
                    entry.hash
                )));
            }
            if entry.date.trim().is_empty() {
                return Err(CoreError::InvalidPool(format!(
                    "entry {} has an empty date",
                    entry.hash
                )));
            }
            if !prefixes.insert(entry.short_hash().to_string()) {
                return Err(CoreError::InvalidPool(format!(
                    "abbreviated hash {} is used by more than one entry",
                    entry.short_hash()
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(hash, date)| FakeCommit::new(hash, date))
                .collect(),
        }
    }

    /// Parse a JSON array of `{"hash", "date", "author"?}` objects.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let entries: Vec<FakeCommit> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FakeCommit> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[FakeCommit] {
        &self.entries
    }

    /// Index of the entry whose hash starts with `hex` (at least 7 digits).
    pub fn position_by_prefix(&self, hex: &str) -> Option<usize> {
        if hex.len() < SHORT_HASH_LEN {
            return None;
        }
        self.entries.iter().position(|e| e.hash.starts_with(hex))
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::builtin()
    }
}
