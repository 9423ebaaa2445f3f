//! Domain-specific errors.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("no input: pass a <file>, pipe text through stdin, or use --from-clipboard")]
    InputMissing,
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("no Chromium-based browser found; set CARBON_NOW_BROWSER to its executable")]
    BrowserNotFound,
    #[error("browser exited with {status}")]
    BrowserFailed { status: ExitStatus },
    #[error("browser did not produce a PNG image at {}", path.display())]
    InvalidImage { path: PathBuf },
}
