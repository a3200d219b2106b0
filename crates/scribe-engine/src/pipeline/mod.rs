//! Walks a document, runs its commands and edits, and splices fresh output
//! back into its transcript blocks.

pub mod document;
pub mod edit;

use std::sync::LazyLock;

use regex::Regex;
use scribe_core::model::CommandRecord;
use serde::Serialize;

use crate::error::EngineError;
use crate::harness::Harness;

pub use document::{parse_transcript, split_segments, Segment};
pub use edit::{run_editor_hooks, EditInstruction};

const INSTRUCTION_PREFIX: &str = "# ";

// Hardcoded pattern, validated by the tests below.
static CONTENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\nContents:\n((?:- \[.*\]\(.*\): .*\n)+)").expect("contents pattern is valid")
});

/// Counts of what processing one document did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub transcript_blocks: usize,
    pub commands: usize,
    pub edits: usize,
    pub hooks: usize,
}

/// A processed document and its report.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub text: String,
    pub report: DocumentReport,
}

/// Process one document against the harness's sandbox, in document order.
///
/// Nothing is written anywhere: the caller receives the complete new text
/// only once every block succeeded.
pub fn process(harness: &mut Harness, document: &str) -> Result<ProcessedDocument, EngineError> {
    let mut report = DocumentReport::default();
    let mut out = String::with_capacity(document.len());

    for segment in split_segments(document)? {
        match &segment {
            Segment::Text(text) => {
                report.hooks +=
                    run_editor_hooks(harness.sandbox(), &harness.settings().editor_hooks, text)?;
                segment.render(&mut out);
            }
            Segment::Fence {
                tag,
                line,
                open,
                body,
                close,
            } if harness.settings().is_transcript_tag(tag) => {
                let prompt = harness.settings().prompt.clone();
                let mut block = parse_transcript(tag, body, &prompt, line + 1)?;
                for record in &mut block.records {
                    let output = harness.execute(&record.command, &record.output)?;
                    *record = CommandRecord::new(record.command.clone(), output);
                    report.commands += 1;
                }
                report.transcript_blocks += 1;
                out.push_str(open);
                out.push_str(&block.render_body(&prompt));
                out.push_str(close);
            }
            Segment::Fence {
                tag, line, body, ..
            } if harness.settings().is_instruction_tag(tag) => {
                if let Some(rest) = body.strip_prefix(INSTRUCTION_PREFIX) {
                    let (instruction, content) = rest.split_once('\n').unwrap_or((rest, ""));
                    EditInstruction::parse(instruction, line + 1)?
                        .apply(harness.sandbox(), content)?;
                    report.edits += 1;
                }
                segment.render(&mut out);
            }
            Segment::Fence { .. } => segment.render(&mut out),
        }
    }
    Ok(ProcessedDocument { text: out, report })
}

/// File names listed in an index document's `Contents:` section, one
/// `- [Title](file.md): description` bullet per document.
pub fn documents_from_index(index: &str) -> Option<Vec<String>> {
    let caps = CONTENTS.captures(index)?;
    let files = caps[1]
        .lines()
        .filter_map(|line| {
            let start = line.find("](")? + 2;
            let end = start + line[start..].find(')')?;
            Some(line[start..end].to_string())
        })
        .collect();
    Some(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::config::SessionSettings;
    use scribe_core::identity::IdentityPool;

    fn tools_available() -> bool {
        ["git", "bash"].iter().all(|tool| {
            std::process::Command::new(tool)
                .arg("--version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
    }

    fn harness() -> Harness {
        Harness::new(SessionSettings::default(), IdentityPool::builtin()).unwrap()
    }

    #[test]
    fn test_documents_from_index() {
        let index = "# Guide\n\nContents:\n\
                     - [Getting started](getting-started.md): installing git\n\
                     - [Committing](committing.md): add, commit, push\n\
                     \nOther text\n";
        assert_eq!(
            documents_from_index(index).unwrap(),
            vec!["getting-started.md", "committing.md"]
        );
        assert!(documents_from_index("# No contents\n").is_none());
    }

    #[test]
    fn test_process_without_shell_commands() {
        let mut harness = harness();
        let document = "Clone it:\n\
                        ```sh\n\
                        $ git clone https://github.com/username/reponame\n\
                        stale output\n\
                        $ cd reponame\n\
                        ```\n\
                        ```python\n\
                        # Write this to hello.py\n\
                        print(\"hello\")\n\
                        ```\n";
        let processed = process(&mut harness, document).unwrap();
        assert_eq!(
            processed.report,
            DocumentReport {
                transcript_blocks: 1,
                commands: 2,
                edits: 1,
                hooks: 0,
            }
        );
        assert!(processed.text.starts_with(
            "Clone it:\n```sh\n$ git clone https://github.com/username/reponame\nCloning into 'reponame'...\n"
        ));
        assert!(!processed.text.contains("stale output"));
        assert!(processed
            .text
            .ends_with("\n$ cd reponame\n```\n```python\n# Write this to hello.py\nprint(\"hello\")\n```\n"));
        assert_eq!(
            std::fs::read_to_string(harness.sandbox().cwd().join("hello.py")).unwrap(),
            "print(\"hello\")\n"
        );
    }

    #[test]
    fn test_bad_instructions_abort() {
        let mut harness = harness();
        let err = process(&mut harness, "text\n```python\n# Rename a.py\n```\n").unwrap_err();
        match err {
            EngineError::BadInstructions { line, text } => {
                assert_eq!(line, 3);
                assert_eq!(text, "Rename a.py");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_display_fences_are_not_instructions() {
        let mut harness = harness();
        let document = "```sh\n\
                        $ git clone https://github.com/username/reponame\n\
                        $ cd reponame\n\
                        ```\n\
                        Now open `README.md` in your favorite text editor and change it to this:\n\
                        ```\n\
                        # reponame\n\
                        This is a better description\n\
                        ```\n\
                        ```markdown\n\
                        # reponame\n\
                        ```\n";
        let processed = process(&mut harness, document).unwrap();
        assert_eq!(processed.report.edits, 0);
        assert_eq!(processed.report.hooks, 1);
        assert!(processed
            .text
            .ends_with("```\n# reponame\nThis is a better description\n```\n```markdown\n# reponame\n```\n"));
        let readme =
            std::fs::read_to_string(harness.sandbox().cwd().join("README.md")).unwrap();
        assert!(readme.starts_with("# reponame\nThis is a better description of this repository."));
    }

    #[test]
    fn test_paths_are_deterministic() {
        if !tools_available() {
            return;
        }
        let document = "```sh\n$ git init newrepo\n```\n";
        let first = process(&mut harness(), document).unwrap().text;
        let second = process(&mut harness(), document).unwrap().text;
        assert_eq!(first, second);
        assert!(first.contains("Initialized empty Git repository in /home/username/newrepo/.git/"));
        assert!(!first.contains("scribe-"));
    }

    #[test]
    fn test_process_is_deterministic() {
        if !tools_available() {
            return;
        }
        let document = "```sh\n\
                        $ git clone https://github.com/username/reponame\n\
                        $ cd reponame\n\
                        $ git config --global user.name \"yourusername\"\n\
                        $ git config --global user.email \"you@example.com\"\n\
                        $ echo hello >> README.md\n\
                        $ git commit -am 'Say hello'\n\
                        $ git log --oneline\n\
                        ```\n";
        let first = process(&mut harness(), document).unwrap().text;
        let second = process(&mut harness(), document).unwrap().text;
        assert_eq!(first, second);

        let pool = IdentityPool::builtin();
        let newest = &pool.entries()[0].hash[..7];
        assert!(first.contains(&format!("$ git log --oneline\n{newest} ")));
        // Running again on its own output changes nothing.
        let third = process(&mut harness(), &first).unwrap().text;
        assert_eq!(first, third);
    }
}
