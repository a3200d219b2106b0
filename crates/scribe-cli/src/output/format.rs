use std::path::PathBuf;

use scribe_engine::IdentityPool;
use serde::Serialize;

use super::OutputFormat;
use crate::commands::DocumentOutcome;

pub fn format_outcomes(outcomes: &[DocumentOutcome], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(outcomes).unwrap_or_default() + "\n",
        OutputFormat::Text => format_outcomes_text(outcomes),
    }
}

fn format_outcomes_text(outcomes: &[DocumentOutcome]) -> String {
    let mut out = String::new();
    for o in outcomes {
        let status = if o.changed { "changed" } else { "unchanged" };
        out.push_str(&format!(
            "{} {status}: {} commands in {} blocks, {} edits\n",
            o.path.display(),
            o.report.commands,
            o.report.transcript_blocks,
            o.report.edits + o.report.hooks,
        ));
        if o.changed {
            out.push_str(&format!(
                "  sha256 {} -> {}\n",
                &o.sha256_before[..12],
                &o.sha256_after[..12]
            ));
        }
    }
    let changed = outcomes.iter().filter(|o| o.changed).count();
    out.push_str(&format!(
        "{} documents, {changed} changed\n",
        outcomes.len()
    ));
    out
}

/// Where a provisioned sandbox lives on disk.
#[derive(Debug, Serialize)]
pub struct SandboxLayout {
    pub root: PathBuf,
    pub remote: PathBuf,
    pub fork: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub home: PathBuf,
    pub kept: bool,
}

pub fn format_layout(layout: &SandboxLayout, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(layout).unwrap_or_default() + "\n",
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("Root:        {}\n", layout.root.display()));
            out.push_str(&format!("Remote:      {}\n", layout.remote.display()));
            if let Some(fork) = &layout.fork {
                out.push_str(&format!("Fork source: {}\n", fork.display()));
            }
            out.push_str(&format!("Working dir: {}\n", layout.working_dir.display()));
            out.push_str(&format!("Home:        {}\n", layout.home.display()));
            if layout.kept {
                out.push_str("Sandbox kept on disk. Remove it when done.\n");
            } else {
                out.push_str("Sandbox removed. Pass --keep to inspect it.\n");
            }
            out
        }
    }
}

pub fn format_pool(pool: &IdentityPool, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => {
            serde_json::to_string_pretty(pool.entries()).unwrap_or_default() + "\n"
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (i, entry) in pool.entries().iter().enumerate() {
                out.push_str(&format!("{:>3}  {}  {}", i + 1, entry.short_hash(), entry.date));
                if let Some(author) = &entry.author {
                    out.push_str(&format!("  {author}"));
                }
                out.push('\n');
            }
            out.push_str(&format!("{} identities\n", pool.len()));
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_engine::DocumentReport;

    fn outcome(changed: bool) -> DocumentOutcome {
        DocumentOutcome {
            path: PathBuf::from("committing.md"),
            changed,
            sha256_before: "a".repeat(64),
            sha256_after: if changed { "b".repeat(64) } else { "a".repeat(64) },
            report: DocumentReport {
                transcript_blocks: 2,
                commands: 5,
                edits: 1,
                hooks: 0,
            },
            text: String::new(),
        }
    }

    #[test]
    fn test_outcomes_text() {
        let text = format_outcomes(&[outcome(true), outcome(false)], OutputFormat::Text);
        assert_eq!(
            text,
            "committing.md changed: 5 commands in 2 blocks, 1 edits\n  \
             sha256 aaaaaaaaaaaa -> bbbbbbbbbbbb\n\
             committing.md unchanged: 5 commands in 2 blocks, 1 edits\n\
             2 documents, 1 changed\n"
        );
    }

    #[test]
    fn test_outcomes_json() {
        let json = format_outcomes(&[outcome(false)], OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["commands"], 5);
        assert_eq!(value[0]["changed"], false);
        assert!(value[0].get("text").is_none());
    }

    #[test]
    fn test_pool_text() {
        let text = format_pool(&IdentityPool::builtin(), OutputFormat::Text);
        assert!(text.starts_with("  1  e008dfa  Sun May 23 00:42:34 2021 +0300\n"));
        assert!(text.ends_with("23 identities\n"));
    }
}
