use std::sync::LazyLock;

use regex::bytes::Regex;

// Hardcoded patterns, validated by the tests below.
static SGR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)\x1b\[[0-9;]*m").expect("SGR pattern is valid"));

static ERASED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)[^\n]*\r\x1b\[K").expect("erased line pattern is valid")
});

// CSI, OSC (terminated by BEL or ST), keypad modes and charset designations.
static CONTROL_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)\x1b(?:\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\)|[=>]|[()][0-9A-Za-z])",
    )
    .expect("control sequence pattern is valid")
});

/// Expand tabs to the next multiple of `width` columns.
///
/// Escape sequences and UTF-8 continuation bytes take up no column, so
/// colored output lines up the same way it does on screen.
pub fn expand_tabs(raw: &[u8], width: usize) -> Vec<u8> {
    let width = width.max(1);
    let mut out = Vec::with_capacity(raw.len());
    let mut column = 0usize;
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'\t' => {
                let spaces = width - column % width;
                out.resize(out.len() + spaces, b' ');
                column += spaces;
            }
            b'\n' | b'\r' => {
                out.push(raw[i]);
                column = 0;
            }
            0x1b => {
                let len = escape_len(&raw[i..]);
                out.extend_from_slice(&raw[i..i + len]);
                i += len;
                continue;
            }
            0x80..=0xbf => out.push(raw[i]),
            byte => {
                out.push(byte);
                column += 1;
            }
        }
        i += 1;
    }
    out
}

/// Length of the escape sequence at the start of `raw` (which begins with ESC).
fn escape_len(raw: &[u8]) -> usize {
    match raw.get(1) {
        Some(b'[') => raw
            .iter()
            .skip(2)
            .position(|b| (0x40..=0x7e).contains(b))
            .map_or(raw.len(), |pos| pos + 3),
        Some(_) => 2,
        None => 1,
    }
}

/// Remove color and text attribute sequences.
pub fn strip_sgr(raw: &[u8]) -> Vec<u8> {
    SGR.replace_all(raw, &b""[..]).into_owned()
}

/// Turn every CRLF into LF.
pub fn unify_line_endings(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\r' && raw.get(i + 1) == Some(&b'\n') {
            out.push(b'\n');
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

/// Delete everything from the start of a line through its last
/// "carriage return, erase to end of line" sequence, leaving only what the
/// terminal shows once the progress output settles.
pub fn collapse_erased_lines(raw: &[u8]) -> Vec<u8> {
    ERASED_LINE.replace_all(raw, &b""[..]).into_owned()
}

/// Remove the escape sequences that survive the earlier steps.
pub fn strip_control_sequences(raw: &[u8]) -> Vec<u8> {
    CONTROL_SEQUENCE.replace_all(raw, &b""[..]).into_owned()
}

/// Apply lone carriage returns: text after a `\r` overwrites the line from
/// its first column, keeping whatever a shorter rewrite does not cover.
pub fn settle_carriage_returns(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.split('\n')
        .map(settle_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn settle_line(line: &str) -> String {
    if !line.contains('\r') {
        return line.to_string();
    }
    let mut cells: Vec<char> = Vec::with_capacity(line.len());
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\r' {
            column = 0;
            continue;
        }
        if column < cells.len() {
            cells[column] = ch;
        } else {
            cells.push(ch);
        }
        column += 1;
    }
    cells.into_iter().collect()
}
