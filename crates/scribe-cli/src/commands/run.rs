use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::{process_documents, DocumentArgs, SessionArgs};
use crate::output::format::format_outcomes;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub documents: DocumentArgs,

    #[command(flatten)]
    pub session: SessionArgs,
}

pub fn run(args: &RunArgs, format: OutputFormat) -> Result<()> {
    let documents = args.documents.collect()?;
    let mut session = args.session.begin()?;

    let outcomes = process_documents(&mut session, &documents, |outcome| {
        if outcome.changed {
            write_atomically(&outcome.path, &outcome.text)?;
        }
        Ok(())
    })?;

    print!("{}", format_outcomes(&outcomes, format));
    Ok(())
}

/// Replace `path` through a temporary file in the same directory, so the
/// document is never seen half written.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    temp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
