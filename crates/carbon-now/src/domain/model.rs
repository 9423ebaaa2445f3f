//! Domain models for a single rendering request.

use std::path::PathBuf;

/// Where the source text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Clipboard,
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// Pick the source by priority: clipboard, then file, then stdin.
    pub fn resolve(from_clipboard: bool, file: Option<PathBuf>) -> Self {
        match (from_clipboard, file) {
            (true, _) => InputSource::Clipboard,
            (false, Some(path)) => InputSource::File(path),
            (false, None) => InputSource::Stdin,
        }
    }

    /// Stem used when no explicit output name is given.
    pub fn stem(&self) -> String {
        match self {
            InputSource::Clipboard => "clipboard".into(),
            InputSource::Stdin => "stdin".into(),
            InputSource::File(path) => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|stem| !stem.is_empty())
                .unwrap_or("carbon")
                .to_owned(),
        }
    }
}

/// 1-based, inclusive line range. Never rejected, only normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl LineRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Resolve against a text of `total` lines into clamped `(start, end)` bounds.
    ///
    /// A reversed range collapses to its start line. Returns `None` for empty text.
    pub fn bounds(&self, total: usize) -> Option<(usize, usize)> {
        if total == 0 {
            return None;
        }
        let start = self.start.unwrap_or(1).max(1);
        let end = self.end.unwrap_or(total).max(start);
        let start = start.min(total);
        let end = end.min(total);
        Some((start, end))
    }

    /// Slice `text` down to the range, keeping the original line contents.
    pub fn apply(&self, text: &str) -> String {
        if self.is_full() {
            return text.to_owned();
        }
        let lines: Vec<&str> = text.lines().collect();
        match self.bounds(lines.len()) {
            Some((start, end)) => lines[start - 1..end].join("\n"),
            None => String::new(),
        }
    }
}

/// What happens with the rendered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Save,
    Clipboard,
    Browser,
}

impl Destination {
    pub fn from_flags(to_clipboard: bool, open_in_browser: bool) -> Self {
        if open_in_browser {
            Destination::Browser
        } else if to_clipboard {
            Destination::Clipboard
        } else {
            Destination::Save
        }
    }
}

/// One fully-resolved CLI call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub source: InputSource,
    pub range: LineRange,
    pub destination: Destination,
    pub save_as: Option<String>,
    pub save_to: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub settings: Option<String>,
    pub timeout_secs: u64,
}
