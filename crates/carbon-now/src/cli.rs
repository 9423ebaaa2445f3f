//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::domain::model::{Destination, InputSource, Invocation, LineRange};

/// Beautiful images of your code, rendered by carbon.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source file; standard input is read when omitted
    pub file: Option<PathBuf>,

    /// Read the source from the system clipboard
    #[arg(long)]
    pub from_clipboard: bool,

    /// First line of the snippet (1-based)
    #[arg(long, value_name = "LINE")]
    pub start: Option<usize>,

    /// Last line of the snippet (inclusive)
    #[arg(long, value_name = "LINE")]
    pub end: Option<usize>,

    /// Base name of the saved image, without extension
    #[arg(long, value_name = "NAME")]
    pub save_as: Option<String>,

    /// Directory the image is saved in
    #[arg(long, value_name = "DIR")]
    pub save_to: Option<PathBuf>,

    /// Copy the image to the clipboard instead of saving it
    #[arg(long, conflicts_with = "open_in_browser")]
    pub to_clipboard: bool,

    /// Open the snippet in carbon in your browser instead of saving it
    #[arg(long)]
    pub open_in_browser: bool,

    /// Read-only JSON file with presets (defaults to ~/.carbon-now.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Preset to use from the config file
    #[arg(long, short, value_name = "NAME")]
    pub preset: Option<String>,

    /// Inline JSON settings applied on top of the preset
    #[arg(long, value_name = "JSON")]
    pub settings: Option<String>,

    /// Seconds the browser may spend rendering
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub timeout: u64,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn into_invocation(self) -> Invocation {
        Invocation {
            source: InputSource::resolve(self.from_clipboard, self.file),
            range: LineRange::new(self.start, self.end),
            destination: Destination::from_flags(self.to_clipboard, self.open_in_browser),
            save_as: self.save_as,
            save_to: self.save_to,
            config: self.config,
            preset: self.preset,
            settings: self.settings,
            timeout_secs: self.timeout,
        }
    }
}
