//! Print the diff of a local repository as JSON.
//!
//! Defaults come from the `GUCK_*` environment variables; logs go to stderr
//! and are filtered by `RUST_LOG` (default `guck_core=info`).

use std::io::{self, Write};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use guck_core::{ComparisonRequest, DiffConfig, DiffEngine, DiffMode, Repository};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Print the diff of a local repository as JSON.
#[derive(Parser, Debug)]
#[command(name = "guck-diff", version)]
struct Args {
    /// Comparison mode: branch, working or staged. Unknown values fall back
    /// to branch.
    #[arg(long)]
    mode: Option<String>,

    /// Base branch for branch mode, looked up on origin first.
    #[arg(long)]
    base: Option<String>,

    /// Repository root or any directory inside it.
    #[arg(default_value = ".")]
    path: Utf8PathBuf,
}

impl Args {
    fn request(&self, config: &DiffConfig) -> ComparisonRequest {
        let mut request = config.default_request();
        if let Some(mode) = &self.mode {
            if DiffMode::parse(mode).is_none() {
                warn!(mode = %mode, "unknown mode, using branch");
            }
            request.mode = DiffMode::parse_or_default(mode);
        }
        if let Some(base) = &self.base {
            request.base_branch.clone_from(base);
        }
        request
    }
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = DiffConfig::from_env();
    let request = args.request(&config);

    let repository = Repository::open(args.path.as_std_path())
        .with_context(|| format!("failed to open repository at {}", args.path))?;
    let engine = DiffEngine::with_config(config);
    let cancellation = engine.config().cancellation();

    let files = match engine.compute(&repository, &request, &cancellation) {
        Ok(files) => files,
        Err(err) if err.is_branch_not_found() => {
            let suggestion = repository.default_branch();
            return Err(err).with_context(|| format!("try --base {suggestion}"));
        }
        Err(err) => return Err(err).context("failed to compute diff"),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &files).context("failed to encode diff")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("guck_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
