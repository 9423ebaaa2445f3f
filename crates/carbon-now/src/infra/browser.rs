//! Browser integration: headless capture of the carbon card and opening links.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::domain::errors::DomainError;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

const CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "microsoft-edge",
    "msedge",
];

#[cfg(target_os = "macos")]
const APP_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(target_os = "windows")]
const APP_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const APP_PATHS: &[&str] = &[];

/// Everything a renderer needs to capture one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub budget: Duration,
}

/// Turns a render request into a PNG file at `target`.
pub trait Renderer {
    fn render(&self, request: &RenderRequest, target: &Path) -> Result<()>;
}

/// Renders by running a Chromium-family browser in headless screenshot mode.
///
/// The executable is located lazily so that runs which never render need no browser.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBrowser {
    configured: Option<PathBuf>,
}

impl HeadlessBrowser {
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self { configured }
    }

    /// The configured executable, or the first one found in the usual install locations.
    pub fn executable(&self) -> Result<PathBuf> {
        if let Some(path) = &self.configured {
            return Ok(path.clone());
        }
        find_executable().ok_or_else(|| DomainError::BrowserNotFound.into())
    }

    fn arguments(&self, request: &RenderRequest, target: &Path, profile: &Path) -> Vec<OsString> {
        let mut screenshot = OsString::from("--screenshot=");
        screenshot.push(target);
        let mut user_data = OsString::from("--user-data-dir=");
        user_data.push(profile);

        vec![
            "--headless=new".into(),
            "--disable-gpu".into(),
            "--hide-scrollbars".into(),
            "--no-first-run".into(),
            "--no-default-browser-check".into(),
            "--default-background-color=00000000".into(),
            user_data,
            format!("--window-size={},{}", request.width, request.height).into(),
            format!("--force-device-scale-factor={}", request.scale).into(),
            format!("--virtual-time-budget={}", request.budget.as_millis()).into(),
            screenshot,
            request.url.clone().into(),
        ]
    }
}

impl Renderer for HeadlessBrowser {
    fn render(&self, request: &RenderRequest, target: &Path) -> Result<()> {
        let profile = tempfile::Builder::new()
            .prefix("carbon-now-profile-")
            .tempdir()
            .context("failed to create browser profile directory")?;

        let executable = self.executable()?;
        tracing::info!(
            browser = %executable.display(),
            width = request.width,
            height = request.height,
            scale = request.scale,
            "rendering snippet"
        );

        let output = Command::new(&executable)
            .args(self.arguments(request, target, profile.path()))
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to launch browser {}", executable.display()))?;

        if !output.status.success() {
            tracing::debug!(
                stderr = %String::from_utf8_lossy(&output.stderr),
                "browser reported an error"
            );
            return Err(DomainError::BrowserFailed {
                status: output.status,
            }
            .into());
        }

        ensure_png(target)
    }
}

/// Check that `path` exists and starts with the PNG signature.
pub fn ensure_png(path: &Path) -> Result<()> {
    let mut header = [0u8; 8];
    let valid = File::open(path)
        .and_then(|mut file| file.read_exact(&mut header))
        .is_ok()
        && header == PNG_SIGNATURE;
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidImage {
            path: path.to_path_buf(),
        }
        .into())
    }
}

fn find_executable() -> Option<PathBuf> {
    let search = env::var_os("PATH").unwrap_or_default();
    for dir in env::split_paths(&search) {
        for name in CANDIDATES {
            let candidate = dir.join(executable_name(name));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    APP_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

#[cfg(target_os = "windows")]
fn executable_name(name: &str) -> String {
    format!("{name}.exe")
}

#[cfg(not(target_os = "windows"))]
fn executable_name(name: &str) -> String {
    name.to_owned()
}

/// Open `url` in the user's browser, honouring `$BROWSER` when set.
pub fn open_in_browser(url: &str) -> Result<()> {
    if let Some(browser) = env::var_os("BROWSER").filter(|value| !value.is_empty()) {
        tracing::debug!(browser = ?browser, "opening with $BROWSER");
        let status = Command::new(&browser)
            .arg(url)
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("failed to launch {}", browser.to_string_lossy()))?;
        if !status.success() {
            anyhow::bail!("{} exited with {status}", browser.to_string_lossy());
        }
        return Ok(());
    }

    open::that(url).context("failed to open browser")
}
