use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::CoreError;
use crate::model::{CommitIdentity, FakeCommit};

use super::pool::IdentityPool;

// Hardcoded patterns, validated by the tests below.
static HASH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9a-f]{40}|[0-9a-f]{7})\b").expect("hash token pattern is valid")
});

// Two commits can share a date, so dates are only rewritten next to the
// full hash that identifies them.
static COMMIT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^commit ([0-9a-f]{40})([^\n]*)\n(Merge:[^\n]*\n)?Author: ([^\n]*)\nDate:([ \t]+)([^\n]*)$",
    )
    .expect("commit header pattern is valid")
});

/// Answers whether a hex string names a commit that exists in the sandbox.
pub trait CommitLookup {
    /// Full 40-digit id of the commit `hex` abbreviates, if there is one.
    fn resolve_commit(&self, hex: &str) -> Option<String>;
}

impl<F> CommitLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve_commit(&self, hex: &str) -> Option<String> {
        self(hex)
    }
}

/// Bidirectional real <-> fake commit mapping for one session.
///
/// Fake identities are handed out strictly in pool order, one per distinct
/// real commit, and are never released.
#[derive(Debug, Clone)]
pub struct IdentityVirtualizer {
    pool: IdentityPool,
    /// `allocated[i]` is the real commit bound to pool entry `i`.
    allocated: Vec<String>,
    by_real: HashMap<String, usize>,
}

impl IdentityVirtualizer {
    pub fn new(pool: IdentityPool) -> Self {
        Self {
            pool,
            allocated: Vec::new(),
            by_real: HashMap::new(),
        }
    }

    pub fn pool(&self) -> &IdentityPool {
        &self.pool
    }

    /// Fake identity of a real commit, allocating the next pool entry the
    /// first time the commit is seen.
    pub fn fake_for(&mut self, real: &str) -> Result<&FakeCommit, CoreError> {
        let index = match self.by_real.get(real) {
            Some(&index) => index,
            None => {
                let index = self.allocated.len();
                if index >= self.pool.len() {
                    return Err(CoreError::PoolExhausted {
                        size: self.pool.len(),
                    });
                }
                self.allocated.push(real.to_string());
                self.by_real.insert(real.to_string(), index);
                tracing::debug!(
                    "Commit {} is now {}",
                    &real[..real.len().min(7)],
                    self.pool.entries()[index].short_hash()
                );
                index
            }
        };
        self.pool
            .get(index)
            .ok_or(CoreError::PoolExhausted { size: self.pool.len() })
    }

    /// Real commit behind a fake hash (full or abbreviated), if allocated.
    pub fn real_for(&self, fake_hex: &str) -> Option<&str> {
        let index = self.pool.position_by_prefix(fake_hex)?;
        self.allocated.get(index).map(String::as_str)
    }

    /// All identities allocated so far, in allocation order.
    pub fn identities(&self) -> Vec<CommitIdentity> {
        self.allocated
            .iter()
            .zip(self.pool.entries())
            .map(|(real, fake)| CommitIdentity {
                real: real.clone(),
                fake: fake.clone(),
            })
            .collect()
    }

    /// Rewrite captured output: commit headers get the fake hash, date and
    /// (if the pool has one) author; every other hash token that names a
    /// sandbox commit gets the fake hash abbreviated to the same length.
    pub fn rewrite_output(
        &mut self,
        text: &str,
        lookup: &dyn CommitLookup,
    ) -> Result<String, CoreError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in COMMIT_HEADER.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(real) = lookup.resolve_commit(&caps[1]) else {
                continue;
            };
            self.rewrite_tokens(&text[last..whole.start()], lookup, &mut out)?;
            self.rewrite_header(&caps, &real, lookup, &mut out)?;
            last = whole.end();
        }
        self.rewrite_tokens(&text[last..], lookup, &mut out)?;
        Ok(out)
    }

    fn rewrite_header(
        &mut self,
        caps: &Captures<'_>,
        real: &str,
        lookup: &dyn CommitLookup,
        out: &mut String,
    ) -> Result<(), CoreError> {
        let fake = self.fake_for(real)?.clone();
        out.push_str("commit ");
        out.push_str(&fake.hash);
        self.rewrite_tokens(&caps[2], lookup, out)?;
        out.push('\n');
        if let Some(merge) = caps.get(3) {
            self.rewrite_tokens(merge.as_str(), lookup, out)?;
        }
        out.push_str("Author: ");
        out.push_str(fake.author.as_deref().unwrap_or(&caps[4]));
        out.push_str("\nDate:");
        out.push_str(&caps[5]);
        out.push_str(&fake.date);
        Ok(())
    }

    fn rewrite_tokens(
        &mut self,
        segment: &str,
        lookup: &dyn CommitLookup,
        out: &mut String,
    ) -> Result<(), CoreError> {
        let mut last = 0;
        for token in HASH_TOKEN.find_iter(segment) {
            out.push_str(&segment[last..token.start()]);
            match lookup.resolve_commit(token.as_str()) {
                Some(real) => {
                    let fake = self.fake_for(&real)?;
                    out.push_str(fake.abbreviated(token.len()));
                }
                None => out.push_str(token.as_str()),
            }
            last = token.end();
        }
        out.push_str(&segment[last..]);
        Ok(())
    }

    /// Rewrite a command typed in the document: every fake hash it quotes is
    /// replaced with the full real hash. Quoting a fake hash that has not
    /// been shown yet is an error.
    pub fn rewrite_command(&self, command: &str) -> Result<String, CoreError> {
        let mut out = String::with_capacity(command.len());
        let mut last = 0;
        for token in HASH_TOKEN.find_iter(command) {
            out.push_str(&command[last..token.start()]);
            if self.pool.position_by_prefix(token.as_str()).is_some() {
                let real = self
                    .real_for(token.as_str())
                    .ok_or_else(|| CoreError::UnresolvedIdentity {
                        hash: token.as_str().to_string(),
                    })?;
                out.push_str(real);
            } else {
                out.push_str(token.as_str());
            }
            last = token.end();
        }
        out.push_str(&command[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const REAL_A: &str = "1111111aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const REAL_B: &str = "2222222bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const REAL_C: &str = "3333333ccccccccccccccccccccccccccccccccc";

    fn lookup(hex: &str) -> Option<String> {
        [REAL_A, REAL_B, REAL_C]
            .iter()
            .find(|real| real.starts_with(hex))
            .map(|real| real.to_string())
    }

    #[test]
    fn test_patterns_compile() {
        assert!(HASH_TOKEN.is_match("abcdef0"));
        assert!(!HASH_TOKEN.is_match("abcdef"));
        assert!(!HASH_TOKEN.is_match("abcdef01"));
        assert!(COMMIT_HEADER.is_match(&format!(
            "commit {REAL_A}\nAuthor: A <a@b>\nDate:   Thu Jan 1 00:00:00 1970 +0000"
        )));
    }

    #[test]
    fn test_short_and_long_forms_share_identity() {
        let pool = IdentityPool::builtin();
        let mut v = IdentityVirtualizer::new(pool.clone());
        let out = v
            .rewrite_output(&format!("* 2222222 (HEAD -> main) second\n{REAL_B}\n"), &lookup)
            .unwrap();
        let first = pool.get(0).unwrap();
        assert_eq!(
            out,
            format!("* {} (HEAD -> main) second\n{}\n", first.short_hash(), first.hash)
        );
    }

    #[test]
    fn test_allocation_advances_in_pool_order() {
        let pool = IdentityPool::builtin();
        let mut v = IdentityVirtualizer::new(pool.clone());
        let out = v
            .rewrite_output("3333333 then 1111111 then 3333333\n", &lookup)
            .unwrap();
        let (first, second) = (pool.get(0).unwrap(), pool.get(1).unwrap());
        assert_eq!(
            out,
            format!(
                "{} then {} then {}\n",
                first.short_hash(),
                second.short_hash(),
                first.short_hash()
            )
        );
        let identities = v.identities();
        assert_eq!(identities.len(), 2);
        assert_eq!(identities[0].real, REAL_C);
        assert_eq!(identities[1].real, REAL_A);
    }

    #[test]
    fn test_mapping_is_a_bijection() {
        let mut v = IdentityVirtualizer::new(IdentityPool::builtin());
        v.rewrite_output(&format!("{REAL_A} {REAL_B} 3333333 1111111"), &lookup)
            .unwrap();
        let identities = v.identities();
        let fakes: HashSet<_> = identities.iter().map(|i| i.fake.hash.clone()).collect();
        assert_eq!(fakes.len(), identities.len());
        for identity in &identities {
            assert_eq!(v.real_for(&identity.fake.hash), Some(identity.real.as_str()));
            assert_eq!(v.real_for(identity.fake.short_hash()), Some(identity.real.as_str()));
            assert_eq!(v.fake_for(&identity.real).unwrap(), &identity.fake);
        }
    }

    #[test]
    fn test_unknown_hex_words_are_left_alone() {
        let mut v = IdentityVirtualizer::new(IdentityPool::builtin());
        let text = "size 1234567 bytes, id deadbee, 2222222x\n";
        assert_eq!(v.rewrite_output(text, &lookup).unwrap(), text);
        assert!(v.identities().is_empty());
    }

    #[test]
    fn test_commit_header_rewrite() {
        let pool = IdentityPool::builtin();
        let mut v = IdentityVirtualizer::new(pool.clone());
        let text = format!(
            "commit {REAL_A} (HEAD -> main, origin/main)\n\
             Author: yourusername <you@example.com>\n\
             Date:   Thu May 27 19:38:27 2021 +0200\n\
             \n    Initial commit\n"
        );
        let out = v.rewrite_output(&text, &lookup).unwrap();
        let fake = pool.get(0).unwrap();
        assert_eq!(
            out,
            format!(
                "commit {} (HEAD -> main, origin/main)\n\
                 Author: yourusername <you@example.com>\n\
                 Date:   {}\n\
                 \n    Initial commit\n",
                fake.hash, fake.date
            )
        );
    }

    #[test]
    fn test_merge_header_and_fake_author() {
        let pool = IdentityPool::new(vec![
            FakeCommit::new("eea7704461d1d3ab18c07a9fd1ef8c8803553e52", "Tue May 25 19:39:17 2021 +0300")
                .with_author("Someone <someone@example.com>"),
            FakeCommit::new("9cfe4460b2709d4575d6df13cb83ee6e00e40a01", "Mon May 24 21:04:05 2021 +0300"),
            FakeCommit::new("d21685edc8268b4369fe00a1b057e4b24a8d12db", "Mon May 24 20:34:45 2021 +0300"),
        ])
        .unwrap();
        let mut v = IdentityVirtualizer::new(pool);
        let text = format!(
            "commit {REAL_C}\nMerge: 1111111 2222222\nAuthor: x <y>\nDate:   whenever\n"
        );
        let out = v.rewrite_output(&text, &lookup).unwrap();
        assert_eq!(
            out,
            "commit eea7704461d1d3ab18c07a9fd1ef8c8803553e52\n\
             Merge: 9cfe446 d21685e\n\
             Author: Someone <someone@example.com>\n\
             Date:   Tue May 25 19:39:17 2021 +0300\n"
        );
    }

    #[test]
    fn test_header_of_unknown_commit_is_untouched() {
        let mut v = IdentityVirtualizer::new(IdentityPool::builtin());
        let text = format!("commit {}\nAuthor: a <b>\nDate:   now\n", "f".repeat(40));
        assert_eq!(v.rewrite_output(&text, &lookup).unwrap(), text);
    }

    #[test]
    fn test_pool_exhaustion_is_an_error() {
        let pool = IdentityPool::new(vec![FakeCommit::new(
            "eea7704461d1d3ab18c07a9fd1ef8c8803553e52",
            "Tue May 25 19:39:17 2021 +0300",
        )])
        .unwrap();
        let mut v = IdentityVirtualizer::new(pool);
        v.rewrite_output("1111111\n", &lookup).unwrap();
        let err = v.rewrite_output("2222222\n", &lookup).unwrap_err();
        assert!(matches!(err, CoreError::PoolExhausted { size: 1 }));
    }

    #[test]
    fn test_rewrite_command_translates_fake_hashes() {
        let pool = IdentityPool::builtin();
        let mut v = IdentityVirtualizer::new(pool.clone());
        v.rewrite_output("2222222\n", &lookup).unwrap();
        let fake = pool.get(0).unwrap();

        let command = format!("git checkout {}", fake.short_hash());
        assert_eq!(v.rewrite_command(&command).unwrap(), format!("git checkout {REAL_B}"));

        // A real-looking word that is not in the pool passes through.
        assert_eq!(v.rewrite_command("git show abcdef0").unwrap(), "git show abcdef0");

        // A fake hash that was never shown cannot be resolved.
        let unseen = pool.get(1).unwrap().short_hash().to_string();
        let err = v.rewrite_command(&format!("git revert {unseen}")).unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedIdentity { hash } if hash == unseen));
    }
}
