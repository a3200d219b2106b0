use serde::Serialize;

/// One command line of a transcript and the output shown below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    pub command: String,
    /// Output text; empty, or ending with a newline.
    pub output: String,
}

impl CommandRecord {
    pub fn new(command: impl Into<String>, output: impl Into<String>) -> Self {
        let mut output = output.into();
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        Self {
            command: command.into(),
            output,
        }
    }

    /// Render as it appears in a document: the prompt line, then the output.
    pub fn render(&self, prompt: &str) -> String {
        format!("{prompt}{}\n{}", self.command, self.output)
    }
}

/// A fenced transcript block: its language tag and its records in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FencedBlock {
    pub tag: String,
    pub records: Vec<CommandRecord>,
}

impl FencedBlock {
    /// Render the block body (without fences). Records are separated by a blank line.
    pub fn render_body(&self, prompt: &str) -> String {
        self.records
            .iter()
            .map(|record| record.render(prompt))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
