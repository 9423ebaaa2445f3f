//! Output naming and placement.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::OffsetDateTime;

use crate::infra::browser;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 5;

/// File name for the image: `<save-as>.png`, or `<stem>-<suffix>.png` by default.
pub fn file_name(save_as: Option<&str>, stem: &str) -> String {
    match save_as.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{name}.png"),
        None => format!("{stem}-{}.png", unique_suffix()),
    }
}

/// Short base36 suffix so default names from parallel runs do not collide.
fn unique_suffix() -> String {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos().unsigned_abs();
    let mut seed = nanos ^ (u128::from(std::process::id()) << 64);
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        let index = (seed % SUFFIX_ALPHABET.len() as u128) as usize;
        suffix.push(char::from(SUFFIX_ALPHABET[index]));
        seed /= SUFFIX_ALPHABET.len() as u128;
    }
    suffix
}

/// Directory the image is saved in.
pub fn target_dir(save_to: Option<&Path>) -> PathBuf {
    save_to
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Move a rendered image into `dir/name`, replacing any existing file atomically.
pub fn persist(rendered: &Path, dir: &Path, name: &str) -> Result<PathBuf> {
    browser::ensure_png(rendered)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let bytes = fs::read(rendered)
        .with_context(|| format!("failed to read rendered image {}", rendered.display()))?;
    let mut staged = tempfile::Builder::new()
        .prefix(".carbon-now-")
        .suffix(".png")
        .tempfile_in(dir)
        .with_context(|| format!("failed to stage image in {}", dir.display()))?;
    staged
        .write_all(&bytes)
        .context("failed to write staged image")?;

    let destination = dir.join(name);
    staged
        .persist(&destination)
        .with_context(|| format!("failed to save image to {}", destination.display()))?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    #[test]
    fn explicit_name_gets_png_extension() {
        assert_eq!(file_name(Some("shot"), "main"), "shot.png");
        assert_eq!(file_name(Some("3"), "main"), "3.png");
    }

    #[test]
    fn default_name_uses_stem_and_suffix() {
        let name = file_name(None, "main");
        assert!(name.starts_with("main-"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "main-".len() + SUFFIX_LEN + ".png".len());
    }

    #[test]
    fn blank_name_is_ignored() {
        assert!(file_name(Some("  "), "stdin").starts_with("stdin-"));
    }

    #[test]
    fn target_dir_defaults_to_cwd() {
        assert_eq!(target_dir(None), PathBuf::from("."));
        assert_eq!(target_dir(Some(Path::new("out"))), PathBuf::from("out"));
    }

    #[test]
    fn persist_creates_directory_and_leaves_no_staging_files() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let rendered = temp.path().join("render.png");
        fs::write(&rendered, PNG)?;
        let dir = temp.path().join("nested/out");

        let saved = persist(&rendered, &dir, "x.png")?;

        assert_eq!(saved, dir.join("x.png"));
        assert_eq!(fs::read(&saved)?, PNG);
        assert_eq!(fs::read_dir(&dir)?.count(), 1);
        Ok(())
    }

    #[test]
    fn persist_rejects_non_png() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let rendered = temp.path().join("render.png");
        fs::write(&rendered, "not an image")?;
        assert!(persist(&rendered, temp.path(), "x.png").is_err());
        assert!(!temp.path().join("x.png").exists());
        Ok(())
    }
}
