//! Terminal output normalization.
//!
//! The steps run in a fixed order on raw bytes: tabs are expanded, SGR
//! (color) sequences removed, CRLF unified to LF, "erase line and rewrite"
//! progress output collapsed to its final state and the remaining control
//! sequences dropped. Only then is the result decoded as UTF-8, and lone
//! carriage returns are settled the way a terminal overwrites a line.

mod steps;

use crate::error::CaptureError;

pub use steps::{
    collapse_erased_lines, expand_tabs, settle_carriage_returns, strip_control_sequences,
    strip_sgr, unify_line_endings,
};

pub const DEFAULT_TAB_WIDTH: usize = 8;

/// Turns raw PTY bytes into canonical transcript text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    tab_width: usize,
}

impl Normalizer {
    pub fn new(tab_width: usize) -> Self {
        Self {
            tab_width: tab_width.max(1),
        }
    }

    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    pub fn normalize(&self, raw: &[u8]) -> Result<String, CaptureError> {
        let bytes = expand_tabs(raw, self.tab_width);
        let bytes = strip_sgr(&bytes);
        let bytes = unify_line_endings(&bytes);
        let bytes = collapse_erased_lines(&bytes);
        let bytes = strip_control_sequences(&bytes);
        let text = String::from_utf8(bytes)?;
        Ok(settle_carriage_returns(&text))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_WIDTH)
    }
}

/// Normalize with the default tab width.
pub fn normalize(raw: &[u8]) -> Result<String, CaptureError> {
    Normalizer::default().normalize(raw)
}
