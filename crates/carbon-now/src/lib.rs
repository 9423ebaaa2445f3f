pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::app::snapshot::{Outcome, Snapshotter};
use crate::cli::Args;
use crate::infra::browser::HeadlessBrowser;
use crate::infra::carbon::CarbonUrl;
use crate::infra::config::{Config, EnvOverrides};

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run one invocation end to end and report where the result went.
pub fn run(args: Args) -> Result<()> {
    let invocation = args.into_invocation();
    let env = EnvOverrides::from_env();
    let mut config = Config::load(invocation.config.as_deref())?;

    let renderer = HeadlessBrowser::new(env.browser.clone());
    let snapshotter = Snapshotter::new(renderer, CarbonUrl::new(env.base_url()));
    let outcome = snapshotter.run(&invocation, &mut config)?;

    match outcome {
        Outcome::Saved(path) => println!("Saved to {}", path.display()),
        Outcome::Copied { image: true } => println!("Image copied to clipboard"),
        Outcome::Copied { image: false } => println!("Link copied to clipboard"),
        Outcome::Opened(_) => println!("Opened in browser"),
    }
    Ok(())
}
