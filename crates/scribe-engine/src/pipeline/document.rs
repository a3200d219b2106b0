use scribe_core::model::{CommandRecord, FencedBlock};

use crate::error::EngineError;

const FENCE: &str = "```";

/// A piece of a document: prose, or a fenced block kept with its exact
/// opening and closing lines so untouched blocks render byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Fence {
        tag: String,
        /// 1-based line number of the opening fence.
        line: usize,
        open: String,
        body: String,
        close: String,
    },
}

impl Segment {
    pub fn render(&self, out: &mut String) {
        match self {
            Segment::Text(text) => out.push_str(text),
            Segment::Fence {
                open, body, close, ..
            } => {
                out.push_str(open);
                out.push_str(body);
                out.push_str(close);
            }
        }
    }
}

/// Split a document into prose and fenced blocks. A fence opens on a line
/// starting with three backticks and closes on the next line that is only
/// three backticks.
pub fn split_segments(document: &str) -> Result<Vec<Segment>, EngineError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut lines = document.split_inclusive('\n').enumerate();

    while let Some((index, line)) = lines.next() {
        let Some(tag) = line.strip_prefix(FENCE) else {
            text.push_str(line);
            continue;
        };
        if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut text)));
        }

        let mut body = String::new();
        let close = loop {
            match lines.next() {
                Some((_, inner)) if inner.trim_end() == FENCE => break inner.to_string(),
                Some((_, inner)) => body.push_str(inner),
                None => return Err(EngineError::UnterminatedFence { line: index + 1 }),
            }
        };
        segments.push(Segment::Fence {
            tag: tag.trim().to_string(),
            line: index + 1,
            open: line.to_string(),
            body,
            close,
        });
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

/// Parse the body of a transcript block into command records. Each record
/// is a prompt line followed by the output lines up to the next prompt;
/// blank lines between records are dropped.
///
/// `first_line` is the document line number of the body's first line.
pub fn parse_transcript(
    tag: &str,
    body: &str,
    prompt: &str,
    first_line: usize,
) -> Result<FencedBlock, EngineError> {
    let marker = prompt.trim_end();
    let mut records = Vec::new();
    let mut current: Option<(String, String)> = None;

    for (offset, line) in body.lines().enumerate() {
        if let Some(command) = line.strip_prefix(prompt).filter(|c| !c.trim().is_empty()) {
            if let Some((command, output)) = current.take() {
                records.push(finish_record(command, output));
            }
            current = Some((command.to_string(), String::new()));
            continue;
        }
        let malformed = || EngineError::MalformedBlock {
            line: first_line + offset,
            text: line.to_string(),
        };
        if !marker.is_empty() && line.starts_with(marker) {
            return Err(malformed());
        }
        match current.as_mut() {
            Some((_, output)) => {
                output.push_str(line);
                output.push('\n');
            }
            None => return Err(malformed()),
        }
    }
    if let Some((command, output)) = current {
        records.push(finish_record(command, output));
    }
    Ok(FencedBlock {
        tag: tag.to_string(),
        records,
    })
}

fn finish_record(command: String, output: String) -> CommandRecord {
    CommandRecord::new(command, output.trim_end_matches('\n'))
}
