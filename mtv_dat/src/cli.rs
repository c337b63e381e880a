//! Command line interface.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use mtv::{Miner, MinerParams};

use crate::dat;
use crate::output;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "mtv",
    version,
    about = "Mine a maximum-entropy itemset summary from a transaction dataset.",
    long_about = None
)]
pub struct Args {
    /// Transaction dataset: one transaction per line, whitespace-separated
    /// integer item identifiers.
    #[arg(long, value_name = "FILE")]
    pub dataset: PathBuf,

    /// Attribute names, one per line, indexed by item identifier.
    #[arg(long, value_name = "FILE")]
    pub headers: Option<PathBuf>,

    /// Directory receiving summary.dat and stats.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Stop after K itemsets instead of stopping on a worsening BIC score.
    #[arg(short, long, value_name = "K")]
    pub k: Option<usize>,

    /// Maximum itemset size (0 = unbounded).
    #[arg(short, long, value_name = "M", default_value_t = 0)]
    pub m: usize,

    /// Minimum support as a fraction of the dataset.
    #[arg(short, long, value_name = "S", default_value_t = 0.05)]
    pub s: f64,

    /// Number of candidates retained by the search.
    #[arg(short, long, value_name = "Z", default_value_t = 10)]
    pub z: usize,

    /// Blacklist a component's attributes once it holds Q itemsets.
    #[arg(short, long, value_name = "Q")]
    pub q: Option<usize>,

    /// Mine negated patterns as well.
    #[arg(long)]
    pub add_negated: bool,

    /// Prune candidates whose divergence does not improve on their parent.
    #[arg(long)]
    pub greedy: bool,

    /// Report every iteration on stdout.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Return command line args.
pub fn parse_args() -> Args {
    Args::parse()
}

/// Run the miner with the given args.
pub fn run(args: &Args) -> anyhow::Result<()> {
    let level = if args.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    let subscriber = tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::Uptime::from(Instant::now()))
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    anyhow::ensure!(
        args.dataset.exists(),
        "Dataset file {} does not exist",
        args.dataset.display()
    );
    let content = fs::read_to_string(&args.dataset)
        .with_context(|| format!("Could not read {}", args.dataset.display()))?;
    let headers = match &args.headers {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Could not read {}", path.display()))?
                .lines()
                .map(str::to_string)
                .collect(),
        ),
        None => None,
    };
    let data = dat::parse(&content, headers)?;

    let params = MinerParams {
        k: args.k,
        max_size: args.m,
        min_support: args.s,
        top_z: args.z,
        max_component: args.q,
        add_negated: args.add_negated,
        greedy: args.greedy,
    };
    let mut miner = Miner::new(data, params)?;
    miner.run();

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Could not create {}", args.output.display()))?;
    fs::write(args.output.join("summary.dat"), output::summary(&miner))?;
    fs::write(args.output.join("stats"), output::stats(&miner))?;

    println!("{}", miner.stats());
    Ok(())
}
