//! zipdelta CLI
//!
//! Compares two ZIP archives and shows both trees side by side, with each
//! entry marked as identical, one-sided, or differing in content or date.

mod demo;
mod recent;
mod render;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};

use zipdelta_core::{NodeKind, Side};
use zipdelta_engine::path::{ancestors, canonical};
use zipdelta_engine::{ChecksumPolicy, EngineConfig, EngineSession};
use zipdelta_parsers::logging::{init_with_config, TracingConfig};

use crate::recent::RecentArchives;
use crate::render::RenderOptions;

/// zipdelta - side-by-side comparison of ZIP archives
#[derive(Parser)]
#[command(name = "zipdelta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChecksumArg(ChecksumPolicy);

impl std::str::FromStr for ChecksumArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ChecksumArg(ChecksumPolicy::Strict)),
            "size-only" => Ok(ChecksumArg(ChecksumPolicy::SizeOnlyWhenMissing)),
            _ => Err(format!("Unknown checksum policy: {} (use strict or size-only)", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two archives
    Compare(CompareArgs),

    /// List recently compared archives
    Recent,

    /// Create two sample archives to compare
    Demo(DemoArgs),
}

#[derive(Args)]
struct CompareArgs {
    /// Left (older) archive
    left: Option<PathBuf>,

    /// Right (newer) archive
    right: Option<PathBuf>,

    /// Fill in missing archive paths from the recent list
    #[arg(long)]
    last: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Show only rows that differ
    #[arg(long)]
    only_diffs: bool,

    /// Do not mark directories containing differences
    #[arg(long)]
    no_dir_diff: bool,

    /// Leave the missing side of one-sided entries blank
    #[arg(long)]
    no_placeholders: bool,

    /// Handling of entries without a checksum (strict, size-only)
    #[arg(long)]
    checksum: Option<ChecksumArg>,

    /// Start with every directory closed
    #[arg(long)]
    collapsed: bool,

    /// Open a directory in the left view (can be repeated)
    #[arg(long, value_name = "PATH")]
    expand: Vec<String>,

    /// Do not mirror expansion onto the right view
    #[arg(long)]
    no_sync: bool,

    /// Read both archives in parallel
    #[arg(long)]
    parallel: bool,

    /// JSON engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct DemoArgs {
    /// Directory to create the archives in
    #[arg(default_value = ".")]
    dir: PathBuf,
}

fn setup_logging(verbosity: u8) {
    init_with_config(TracingConfig::from_verbosity(verbosity));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Compare(args) => cmd_compare(args),
        Commands::Recent => cmd_recent(),
        Commands::Demo(args) => cmd_demo(args),
    }
}

fn load_ledger() -> (Option<PathBuf>, RecentArchives) {
    let path = RecentArchives::default_path();
    let ledger = match &path {
        Some(p) => RecentArchives::load(p).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable recent archives ledger");
            RecentArchives::default()
        }),
        None => RecentArchives::default(),
    };
    (path, ledger)
}

fn engine_config(args: &CompareArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if args.no_dir_diff {
        config.propagate_directory_diff = false;
    }
    if args.no_placeholders {
        config.placeholders = false;
    }
    if let Some(ChecksumArg(policy)) = args.checksum {
        config.checksum_policy = policy;
    }
    if args.no_sync {
        config.sync_enabled = false;
    }
    if args.parallel {
        config.parallel_read = true;
    }
    Ok(config)
}

fn cmd_compare(args: CompareArgs) -> Result<()> {
    let (ledger_path, mut ledger) = load_ledger();

    let pick = |given: &Option<PathBuf>, side: Side| -> PathBuf {
        match given {
            Some(path) => path.clone(),
            None if args.last => ledger.most_recent(side).map(PathBuf::from).unwrap_or_default(),
            None => PathBuf::new(),
        }
    };
    let left = pick(&args.left, Side::Left);
    let right = pick(&args.right, Side::Right);

    let mut session = EngineSession::new(engine_config(&args)?)?;
    session.run(&left, &right).context("Comparison failed")?;

    if !args.collapsed {
        session.expand_all();
    }
    for path in &args.expand {
        let dir = canonical(path, NodeKind::Directory);
        for target in ancestors(&dir).iter().chain(std::iter::once(&dir)) {
            session.expand_path(Side::Left, target);
        }
    }

    ledger.record(Side::Left, &left);
    ledger.record(Side::Right, &right);
    if let Some(path) = &ledger_path {
        if let Err(e) = ledger.save(path) {
            warn!(error = %e, "Could not update recent archives");
        }
    }

    let report = session.report(args.only_diffs)?;
    if let Some(output) = &args.output {
        std::fs::write(output, report.to_json_pretty()?)
            .with_context(|| format!("Failed to write report to {}", output.display()))?;
        info!(path = %output.display(), "Report written");
    }

    let comparison = session
        .comparison()
        .context("Comparison finished without a result")?;

    match args.format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Text => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            render::render_trees(
                &mut out,
                comparison,
                session.views(),
                session.sources(),
                RenderOptions {
                    only_differences: args.only_diffs,
                },
            )?;
            writeln!(out)?;
            render::render_summary(&mut out, &comparison.summary)?;
            writeln!(out)?;
            render::render_legend(&mut out)?;
        }
    }

    debug!(differences = comparison.summary.differences(), "Done");
    Ok(())
}

fn cmd_recent() -> Result<()> {
    let (path, ledger) = load_ledger();
    if let Some(path) = &path {
        println!("Ledger: {}", path.display());
    }

    for (title, side) in [("Left", Side::Left), ("Right", Side::Right)] {
        println!("\n{} archives:", title);
        let list = ledger.list(side);
        if list.is_empty() {
            println!("  (none)");
        }
        for (i, archive) in list.iter().enumerate() {
            println!("  {}. {}", i + 1, archive.display());
        }
    }
    Ok(())
}

fn cmd_demo(args: DemoArgs) -> Result<()> {
    let created = demo::create_demo_archives(&args.dir)?;
    if created.is_empty() {
        println!("Sample archives already exist in {}", args.dir.display());
    }
    for path in created {
        println!("Created {}", path.display());
    }
    Ok(())
}
