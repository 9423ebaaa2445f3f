//! Input resolution from the clipboard, a file, or standard input.

use std::fs;
use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};

use crate::domain::errors::DomainError;
use crate::domain::model::{InputSource, LineRange};
use crate::infra::clipboard::Clipboard;

/// Source text after range selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub code: String,
    /// Line number the snippet starts at within its source.
    pub first_line: usize,
}

/// Read the raw text of `source`.
pub fn read_source(source: &InputSource) -> Result<String> {
    let text = match source {
        InputSource::Clipboard => Clipboard::new()
            .read_text()
            .context("failed to read from clipboard")?,
        InputSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        InputSource::Stdin => read_stdin()?,
    };

    if text.trim().is_empty() {
        return Err(DomainError::InputMissing.into());
    }
    Ok(text)
}

fn read_stdin() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(DomainError::InputMissing.into());
    }
    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .context("failed to read standard input")?;
    Ok(text)
}

/// Cut `text` down to `range`.
pub fn select(text: &str, range: LineRange) -> Snippet {
    let first_line = range
        .bounds(text.lines().count())
        .map_or(1, |(start, _)| start);
    Snippet {
        code: range.apply(text),
        first_line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn whitespace_only_file_counts_as_missing() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("blank.txt");
        fs::write(&path, "  \n\n")?;

        let err = read_source(&InputSource::File(path)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InputMissing)
        ));
        Ok(())
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_source(&InputSource::File(PathBuf::from("does/not/exist.rs"))).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.rs"));
    }

    #[test]
    fn select_reports_first_line() {
        let snippet = select("a\nb\nc\nd\n", LineRange::new(Some(2), Some(3)));
        assert_eq!(snippet.code, "b\nc");
        assert_eq!(snippet.first_line, 2);
    }

    #[test]
    fn select_without_range_keeps_text() {
        let snippet = select("a\nb\n", LineRange::default());
        assert_eq!(snippet.code, "a\nb\n");
        assert_eq!(snippet.first_line, 1);
    }
}
