use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use scribe_core::config::EditorHook;
use scribe_core::sandbox::Sandbox;

use crate::error::EngineError;

// Hardcoded patterns, validated by the tests below.
static APPEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Add to end of (.+) \(on branch (.+)\)$").expect("append pattern is valid")
});

static LAST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Last line of (.+) \(on branch (.+)\)$").expect("last line pattern is valid")
});

static WRITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Write this to (.+)|Edit (.+) so that it looks like this)$")
        .expect("write pattern is valid")
});

/// A file edit the reader is told to make by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditInstruction {
    Append { path: String, branch: String },
    ReplaceLastLine { path: String, branch: String },
    Overwrite { path: String },
}

impl EditInstruction {
    /// Parse the text after `# ` on the first line of an instruction block.
    pub fn parse(text: &str, line: usize) -> Result<Self, EngineError> {
        if let Some(caps) = APPEND.captures(text) {
            return Ok(EditInstruction::Append {
                path: caps[1].to_string(),
                branch: caps[2].to_string(),
            });
        }
        if let Some(caps) = LAST_LINE.captures(text) {
            return Ok(EditInstruction::ReplaceLastLine {
                path: caps[1].to_string(),
                branch: caps[2].to_string(),
            });
        }
        if let Some(path) = WRITE
            .captures(text)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        {
            return Ok(EditInstruction::Overwrite {
                path: path.as_str().to_string(),
            });
        }
        Err(EngineError::BadInstructions {
            line,
            text: text.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        match self {
            EditInstruction::Append { path, .. }
            | EditInstruction::ReplaceLastLine { path, .. }
            | EditInstruction::Overwrite { path } => path,
        }
    }

    /// Apply to the file relative to the sandbox's current directory.
    pub fn apply(&self, sandbox: &Sandbox, content: &str) -> Result<(), EngineError> {
        let path = sandbox.cwd().join(self.path());
        match self {
            EditInstruction::Append { branch, .. } => {
                check_branch(sandbox, branch, self.path())?;
                let mut existing = fs::read_to_string(&path)?;
                existing.push_str(content);
                fs::write(&path, existing)?;
            }
            EditInstruction::ReplaceLastLine { branch, .. } => {
                check_branch(sandbox, branch, self.path())?;
                let existing = fs::read_to_string(&path)?;
                let mut lines: Vec<&str> = existing.split_inclusive('\n').collect();
                lines.pop();
                let mut updated = lines.concat();
                updated.push_str(content);
                fs::write(&path, updated)?;
            }
            EditInstruction::Overwrite { .. } => write_file(&path, content)?,
        }
        tracing::debug!("Edited {}", path.display());
        Ok(())
    }
}

fn check_branch(sandbox: &Sandbox, expected: &str, path: &str) -> Result<(), EngineError> {
    let actual = sandbox.current_branch()?;
    if actual != expected {
        return Err(EngineError::WrongBranch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Run every hook whose trigger phrase appears in `text`. Returns how many ran.
pub fn run_editor_hooks(
    sandbox: &Sandbox,
    hooks: &[EditorHook],
    text: &str,
) -> Result<usize, EngineError> {
    let mut ran = 0;
    for hook in hooks.iter().filter(|hook| text.contains(&hook.trigger)) {
        let path = sandbox.cwd().join(&hook.path);
        write_file(&path, &hook.content)?;
        tracing::debug!("Editor hook wrote {}", path.display());
        ran += 1;
    }
    Ok(ran)
}
