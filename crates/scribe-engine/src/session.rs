use std::path::PathBuf;

use scribe_core::config::SessionSettings;
use scribe_core::identity::IdentityPool;
use scribe_core::model::CommitIdentity;

use crate::error::EngineError;
use crate::harness::Harness;
use crate::pipeline::{self, ProcessedDocument};

/// One transcript-generation run: a fresh sandbox shared by every document
/// processed through it, in order. The sandbox is deleted when the session
/// is dropped, whether the run succeeded or not.
pub struct Session {
    harness: Harness,
    documents: usize,
}

impl Session {
    /// Provision a sandbox with the built-in identity pool.
    pub fn begin(settings: SessionSettings) -> Result<Self, EngineError> {
        Self::with_pool(settings, IdentityPool::builtin())
    }

    pub fn with_pool(settings: SessionSettings, pool: IdentityPool) -> Result<Self, EngineError> {
        let harness = Harness::new(settings, pool)?;
        tracing::info!(
            "Session started in {}",
            harness.sandbox().root().display()
        );
        Ok(Self {
            harness,
            documents: 0,
        })
    }

    /// Process one document. Later documents see the sandbox state the
    /// earlier ones left behind.
    pub fn process(&mut self, document: &str) -> Result<ProcessedDocument, EngineError> {
        let processed = pipeline::process(&mut self.harness, document)?;
        self.documents += 1;
        Ok(processed)
    }

    /// Run a single command outside of any document.
    pub fn run_command(&mut self, command: &str) -> Result<String, EngineError> {
        self.harness.execute(command, "")
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    pub fn documents_processed(&self) -> usize {
        self.documents
    }

    /// Real to fake commit mapping established so far.
    pub fn identities(&self) -> Vec<CommitIdentity> {
        self.harness.virtualizer().identities()
    }

    /// End the session but leave the sandbox on disk. Returns its root.
    pub fn keep_sandbox(self) -> PathBuf {
        self.harness.into_sandbox().keep()
    }
}
