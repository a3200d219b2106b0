pub mod check;
pub mod pool;
pub mod run;
pub mod sandbox;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use scribe_engine::{documents_from_index, DocumentReport, IdentityPool, Session, SessionSettings};
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate transcripts and write the documents back
    Run(run::RunArgs),
    /// Regenerate transcripts without writing; fail if any document would change
    Check(check::CheckArgs),
    /// Provision a sandbox and show its layout
    Sandbox(sandbox::SandboxArgs),
    /// Validate and print the fake identity pool
    Pool(pool::PoolArgs),
}

/// Settings shared by every command that provisions a sandbox.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// URL documents clone the fictitious remote from
    #[arg(long, env = "SCRIBE_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// URL documents pull the fork from (provisions a fork source)
    #[arg(long, env = "SCRIBE_FORK_URL")]
    pub fork_url: Option<String>,

    /// JSON file replacing the built-in identity pool
    #[arg(long, env = "SCRIBE_POOL")]
    pub pool: Option<PathBuf>,

    /// Default branch of the fictitious remote
    #[arg(long)]
    pub branch: Option<String>,

    /// Shell that runs the document's commands
    #[arg(long)]
    pub shell: Option<String>,
}

impl SessionArgs {
    pub fn settings(&self) -> SessionSettings {
        let mut settings = SessionSettings::default();
        if let Some(url) = &self.remote_url {
            settings.remote_url = url.clone();
        }
        if let Some(url) = &self.fork_url {
            settings.fork_url = Some(url.clone());
        }
        if let Some(branch) = &self.branch {
            settings.default_branch = branch.clone();
        }
        if let Some(shell) = &self.shell {
            settings.shell = shell.clone();
        }
        settings
    }

    pub fn load_pool(&self) -> Result<IdentityPool> {
        match &self.pool {
            Some(path) => IdentityPool::load(path)
                .with_context(|| format!("Failed to load identity pool {}", path.display())),
            None => Ok(IdentityPool::builtin()),
        }
    }

    pub fn begin(&self) -> Result<Session> {
        Session::with_pool(self.settings(), self.load_pool()?)
            .context("Failed to provision the sandbox")
    }
}

/// Which documents to process.
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Documents to process, in order
    pub files: Vec<PathBuf>,

    /// Read the document list from this index file's `Contents:` section
    #[arg(long)]
    pub contents_from: Option<PathBuf>,
}

impl DocumentArgs {
    /// Documents from the index first, then the ones named explicitly.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        let mut documents = Vec::new();
        if let Some(index) = &self.contents_from {
            let text = fs::read_to_string(index)
                .with_context(|| format!("Failed to read {}", index.display()))?;
            let names = documents_from_index(&text).with_context(|| {
                format!("{} has no `Contents:` list of documents", index.display())
            })?;
            let base = index.parent().unwrap_or(Path::new(""));
            documents.extend(names.into_iter().map(|name| base.join(name)));
        }
        documents.extend(self.files.iter().cloned());
        if documents.is_empty() {
            anyhow::bail!("No documents given. Pass files or --contents-from <index>.");
        }
        Ok(documents)
    }
}

/// What happened to one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub changed: bool,
    pub sha256_before: String,
    pub sha256_after: String,
    #[serde(flatten)]
    pub report: DocumentReport,
    #[serde(skip)]
    pub text: String,
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Process one document in the session. `on_success` runs before the next
/// document is read, so a failure later on leaves earlier results in place.
pub fn process_documents(
    session: &mut Session,
    documents: &[PathBuf],
    mut on_success: impl FnMut(&DocumentOutcome) -> Result<()>,
) -> Result<Vec<DocumentOutcome>> {
    let mut outcomes = Vec::with_capacity(documents.len());
    for path in documents {
        tracing::info!("Running commands from {}", path.display());
        let before = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let processed = session
            .process(&before)
            .with_context(|| format!("Failed to process {}", path.display()))?;
        let outcome = DocumentOutcome {
            path: path.clone(),
            changed: processed.text != before,
            sha256_before: sha256_hex(before.as_bytes()),
            sha256_after: sha256_hex(processed.text.as_bytes()),
            report: processed.report,
            text: processed.text,
        };
        on_success(&outcome)?;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_collect_reads_index_relative_to_its_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let index = tmp.path().join("README.md");
        fs::write(
            &index,
            "# Guide\n\nContents:\n- [One](one.md): first\n- [Two](two.md): second\n",
        )
        .unwrap();
        let args = DocumentArgs {
            files: vec![PathBuf::from("extra.md")],
            contents_from: Some(index),
        };
        assert_eq!(
            args.collect().unwrap(),
            vec![
                tmp.path().join("one.md"),
                tmp.path().join("two.md"),
                PathBuf::from("extra.md")
            ]
        );
    }

    #[test]
    fn test_collect_needs_documents() {
        let args = DocumentArgs {
            files: Vec::new(),
            contents_from: None,
        };
        assert!(args.collect().is_err());
    }
}
