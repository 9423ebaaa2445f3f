//! The render pipeline: settings, input, capture, and delivery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::app::input::{self, Snippet};
use crate::app::output;
use crate::domain::model::{Destination, InputSource, Invocation};
use crate::infra::browser::{self, RenderRequest, Renderer};
use crate::infra::carbon::{CarbonUrl, Settings};
use crate::infra::clipboard::Clipboard;
use crate::infra::config::Config;
use crate::infra::language;

const RENDER_FILE: &str = "render.png";

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Saved(PathBuf),
    /// `image` is false when only the link fit on the clipboard.
    Copied { image: bool },
    Opened(String),
}

/// Drives one invocation from flags to a delivered image.
pub struct Snapshotter<R> {
    renderer: R,
    urls: CarbonUrl,
}

impl<R: Renderer> Snapshotter<R> {
    pub fn new(renderer: R, urls: CarbonUrl) -> Self {
        Self { renderer, urls }
    }

    pub fn run(&self, invocation: &Invocation, config: &mut Config) -> Result<Outcome> {
        let overrides = invocation
            .settings
            .as_deref()
            .map(Settings::parse_overlay)
            .transpose()?;
        let settings =
            config.resolve_settings(invocation.preset.as_deref(), overrides.as_ref())?;

        let text = input::read_source(&invocation.source)?;
        let snippet = input::select(&text, invocation.range);
        let effective = effective_settings(&settings, invocation, &snippet);
        tracing::debug!(
            language = %effective.language,
            lines = snippet.code.lines().count(),
            "input resolved"
        );

        let outcome = match invocation.destination {
            Destination::Browser => {
                let url = self.urls.editor(&effective, &snippet.code);
                browser::open_in_browser(&url)?;
                Outcome::Opened(url)
            }
            Destination::Save => {
                let workdir = scratch_dir()?;
                let rendered = workdir.path().join(RENDER_FILE);
                self.render(&effective, &snippet, invocation.timeout_secs, &rendered)?;

                let stem = invocation.source.stem();
                let name = output::file_name(invocation.save_as.as_deref(), &stem);
                let dir = output::target_dir(invocation.save_to.as_deref());
                Outcome::Saved(output::persist(&rendered, &dir, &name)?)
            }
            Destination::Clipboard => {
                let workdir = scratch_dir()?;
                let rendered = workdir.path().join(RENDER_FILE);
                self.render(&effective, &snippet, invocation.timeout_secs, &rendered)?;

                let mut clipboard = Clipboard::new();
                match clipboard.copy_png(&rendered) {
                    Ok(()) => Outcome::Copied { image: true },
                    Err(err) => {
                        tracing::warn!(error = %err, "image clipboard unavailable, copying link");
                        clipboard
                            .copy_text(&self.urls.editor(&effective, &snippet.code))
                            .context("failed to copy to clipboard")?;
                        Outcome::Copied { image: false }
                    }
                }
            }
        };

        config.save_latest(&settings)?;
        Ok(outcome)
    }

    fn render(
        &self,
        settings: &Settings,
        snippet: &Snippet,
        timeout_secs: u64,
        target: &Path,
    ) -> Result<()> {
        let (width, height) = settings.viewport(&snippet.code);
        let request = RenderRequest {
            url: self.urls.embed(settings, &snippet.code),
            width,
            height,
            scale: settings.scale_factor(),
            budget: Duration::from_secs(timeout_secs),
        };
        self.renderer
            .render(&request, target)
            .context("failed to render snippet")
    }
}

/// Settings as sent to carbon: detected language and range-aware numbering applied.
fn effective_settings(
    settings: &Settings,
    invocation: &Invocation,
    snippet: &Snippet,
) -> Settings {
    let mut effective = settings.clone();
    if effective.language.eq_ignore_ascii_case(language::AUTO) {
        let path = match &invocation.source {
            InputSource::File(path) => Some(path.as_path()),
            _ => None,
        };
        effective.language = language::detect(path, &snippet.code);
    }
    if invocation.range.start.is_some() && snippet.first_line > 1 {
        effective.first_line_number = snippet.first_line;
    }
    effective
}

fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("carbon-now-")
        .tempdir()
        .context("failed to create temporary directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    use crate::domain::model::LineRange;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    #[derive(Default)]
    struct RecordingRenderer {
        requests: RefCell<Vec<RenderRequest>>,
    }

    impl Renderer for &RecordingRenderer {
        fn render(&self, request: &RenderRequest, target: &Path) -> Result<()> {
            self.requests.borrow_mut().push(request.clone());
            fs::write(target, PNG)?;
            Ok(())
        }
    }

    fn invocation(source: InputSource, save_to: &Path) -> Invocation {
        Invocation {
            source,
            range: LineRange::default(),
            destination: Destination::Save,
            save_as: Some("shot".into()),
            save_to: Some(save_to.to_path_buf()),
            config: None,
            preset: None,
            settings: None,
            timeout_secs: 5,
        }
    }

    fn read_only_config(dir: &Path) -> Result<Config> {
        Config::load(Some(&dir.join("absent.json")))
    }

    #[test]
    fn saves_rendered_image_under_requested_name() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("main.rs");
        fs::write(&file, "fn main() {}\n")?;
        let out = temp.path().join("out");

        let renderer = RecordingRenderer::default();
        let snapshotter = Snapshotter::new(&renderer, CarbonUrl::default());
        let mut config = read_only_config(temp.path())?;
        let outcome = snapshotter.run(&invocation(InputSource::File(file), &out), &mut config)?;

        assert_eq!(outcome, Outcome::Saved(out.join("shot.png")));
        assert_eq!(fs::read(out.join("shot.png"))?, PNG);

        let requests = renderer.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.contains("/embed?"));
        assert!(requests[0].url.contains("&l=rust&"));
        assert_eq!(requests[0].scale, 2);
        assert_eq!(requests[0].budget, Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn range_start_becomes_first_line_number() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("notes.txt");
        fs::write(&file, "a\nb\nc\nd\n")?;

        let renderer = RecordingRenderer::default();
        let snapshotter = Snapshotter::new(&renderer, CarbonUrl::default());
        let mut config = read_only_config(temp.path())?;
        let mut request = invocation(InputSource::File(file), temp.path());
        request.range = LineRange::new(Some(3), Some(1));
        snapshotter.run(&request, &mut config)?;

        let requests = renderer.requests.borrow();
        assert!(requests[0].url.contains("&fl=3&"));
        assert!(requests[0].url.ends_with("&code=c"));
        Ok(())
    }

    #[test]
    fn inline_settings_override_preset() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("main.py");
        fs::write(&file, "print(1)\n")?;
        let config_path = temp.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"latest-preset":{"theme":"dracula","exportSize":"4x"}}"#,
        )?;

        let renderer = RecordingRenderer::default();
        let snapshotter = Snapshotter::new(&renderer, CarbonUrl::default());
        let mut config = Config::load(Some(&config_path))?;
        let mut request = invocation(InputSource::File(file), temp.path());
        request.settings = Some(r#"{"theme":"nord"}"#.into());
        snapshotter.run(&request, &mut config)?;

        let requests = renderer.requests.borrow();
        assert!(requests[0].url.contains("&t=nord&"));
        assert_eq!(requests[0].scale, 4);
        Ok(())
    }

    #[test]
    fn invalid_inline_settings_fail_before_rendering() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("main.rs");
        fs::write(&file, "fn main() {}\n")?;

        let renderer = RecordingRenderer::default();
        let snapshotter = Snapshotter::new(&renderer, CarbonUrl::default());
        let mut config = read_only_config(temp.path())?;
        let mut request = invocation(InputSource::File(file), temp.path());
        request.settings = Some("not json".into());

        assert!(snapshotter.run(&request, &mut config).is_err());
        assert!(renderer.requests.borrow().is_empty());
        assert!(!temp.path().join("shot.png").exists());
        Ok(())
    }
}
