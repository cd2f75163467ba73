//! `trajmatch` command line: compares a test `.trc` file against a truth
//! `.trc` file and prints the divergence report to stdout.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trajmatch::{proximal_candidates, run_report, CompareOptions, Side, Strategy};

#[derive(Debug, Parser)]
#[command(
    name = "trajmatch",
    version,
    about = "Compare pedestrian trajectories against a reference"
)]
struct Cli {
    /// Reference trajectories
    truth: PathBuf,
    /// Trajectories to validate
    test: PathBuf,
    /// JSON file with comparison options; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tolerated per-frame distance in pixels
    #[arg(short, long)]
    epsilon: Option<f64>,
    /// Report every frame whose distance exceeds epsilon
    #[arg(short, long)]
    point_diff: bool,
    /// Report matched pairs with differing first or last frame
    #[arg(short, long)]
    frames: bool,
    /// Report persons without a counterpart
    #[arg(short, long)]
    counterpart: bool,
    /// Divergence at and above which trajectories are never paired
    #[arg(short, long)]
    max_divergence: Option<f64>,
    /// Association strategy: optimal or threshold
    #[arg(short, long)]
    strategy: Option<Strategy>,
    /// List nearby trajectories for every person without a counterpart
    #[arg(long)]
    suggest: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn options(&self) -> anyhow::Result<CompareOptions> {
        let mut options = match &self.config {
            Some(path) => CompareOptions::from_json_file(path)
                .with_context(|| format!("loading options from {}", path.display()))?,
            None => CompareOptions::default(),
        };
        options.warn_pointwise |= self.point_diff;
        options.check_frames |= self.frames;
        options.check_counterpart |= self.counterpart;
        if let Some(epsilon) = self.epsilon {
            options.epsilon = epsilon;
        }
        if let Some(max) = self.max_divergence {
            options.max_divergence = max;
        }
        if let Some(strategy) = self.strategy {
            options.strategy = strategy;
        }
        options.validate()?;
        Ok(options)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let options = cli.options()?;

    let (truth, test, report) = run_report(&cli.truth, &cli.test, &options)
        .with_context(|| format!("comparing {} to {}", cli.test.display(), cli.truth.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report.lines() {
            println!("{}", line);
        }
    }

    if cli.suggest {
        let unmatched = report
            .association
            .unmatched_truth
            .iter()
            .map(|&id| (Side::Truth, &truth[id]))
            .chain(
                report
                    .association
                    .unmatched_test
                    .iter()
                    .map(|&id| (Side::Test, &test[id])),
            );
        for (side, seed) in unmatched {
            let found = proximal_candidates(seed, &truth, &test, options.max_divergence)?;
            let one_based = |ids: &[usize]| ids.iter().map(|id| id + 1).collect::<Vec<_>>();
            println!(
                "Near {}({}): truth {:?} test {:?}",
                side,
                seed.id() + 1,
                one_based(&found.truth),
                one_based(&found.test)
            );
        }
    }

    Ok(())
}
