//! Clipboard integration utilities.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Cross-platform clipboard helper with fallbacks for headless environments.
pub struct Clipboard {
    primary: Option<arboard::Clipboard>,
}

impl Clipboard {
    /// Attempt to initialize the system clipboard. When unavailable we fall back to shell-based
    /// clipboard utilities.
    pub fn new() -> Self {
        let primary = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(error = %err, "system clipboard unavailable, using commands");
                None
            }
        };
        Self { primary }
    }

    /// Copy text to the clipboard, falling back to platform-specific executables if needed.
    pub fn copy_text(&mut self, text: &str) -> Result<()> {
        if let Some(primary) = self.primary.as_mut()
            && primary.set_text(text.to_owned()).is_ok()
        {
            return Ok(());
        }

        self.primary = None;
        fallback_copy(text)
    }

    /// Read the clipboard as text. An empty clipboard reads as an empty string.
    pub fn read_text(&mut self) -> Result<String> {
        if let Some(primary) = self.primary.as_mut() {
            match native_text(primary.get_text()) {
                Ok(text) => return Ok(text),
                Err(err) => tracing::debug!(error = %err, "clipboard read failed, trying commands"),
            }
        }

        self.primary = None;
        fallback_read()
    }

    /// Put a PNG image on the clipboard as pixels.
    ///
    /// Only the native clipboard can hold images; there is no command fallback.
    pub fn copy_png(&mut self, path: &Path) -> Result<()> {
        let primary = self
            .primary
            .as_mut()
            .ok_or_else(|| anyhow!("system clipboard unavailable for images"))?;

        let decoded = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        let data = arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Owned(decoded.into_raw()),
        };
        primary
            .set_image(data)
            .context("failed to copy image to clipboard")
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Native read result with "nothing on the clipboard" treated as empty text.
fn native_text(result: Result<String, arboard::Error>) -> Result<String, arboard::Error> {
    match result {
        Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
        other => other,
    }
}

fn fallback_copy(text: &str) -> Result<()> {
    for command in copy_commands() {
        match try_command_copy(command, text) {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(command = command[0], error = %err, "copy command failed"),
        }
    }

    Err(anyhow!(
        "failed to copy text to clipboard using available backends"
    ))
}

fn fallback_read() -> Result<String> {
    for command in paste_commands() {
        match try_command_read(command) {
            Ok(text) => return Ok(text),
            Err(err) => tracing::debug!(command = command[0], error = %err, "paste command failed"),
        }
    }

    Err(anyhow!(
        "failed to read clipboard using available backends"
    ))
}

fn try_command_copy(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("clipboard command exited with status {status}"))
    }
}

fn try_command_read(command: &[&str]) -> Result<String> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if !output.status.success() {
        return Err(anyhow!(
            "clipboard command exited with status {}",
            output.status
        ));
    }
    String::from_utf8(output.stdout).context("clipboard contents are not valid UTF-8")
}

#[cfg(target_os = "macos")]
fn copy_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn copy_commands() -> Vec<&'static [&'static str]> {
    vec![&["xclip", "-selection", "clipboard"], &["wl-copy"]]
}

#[cfg(target_os = "windows")]
fn copy_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Set-Clipboard"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn copy_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}

#[cfg(target_os = "macos")]
fn paste_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbpaste"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn paste_commands() -> Vec<&'static [&'static str]> {
    vec![
        &["xclip", "-selection", "clipboard", "-o"],
        &["wl-paste", "--no-newline"],
    ]
}

#[cfg(target_os = "windows")]
fn paste_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Get-Clipboard"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn paste_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}
