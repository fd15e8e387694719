use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use rusty_lattice::color::{DivergingScale, GroupColors, Rgb8};
use rusty_lattice::{
    load_file, BinPolicy, Dataset, FeatureList, LatticeConfig, MatrixCells, MatrixSelector,
    MatrixSnapshot, ParseReport, ViewMode,
};

#[derive(Parser, Debug)]
#[command(
    name = "rusty-lattice",
    version,
    about = "Correlation heatmaps and scatter-plot matrices from grouped tables"
)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in configuration: `abalone` or `iris`.
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List groups, their sizes and the parse report.
    Groups { file: PathBuf },

    /// Pearson correlation matrix for one group.
    Correlation {
        #[command(flatten)]
        target: Target,

        /// Attach a heatmap fill colour to every cell.
        #[arg(long)]
        colors: bool,
    },

    /// Scatter-plot matrix with histograms on the diagonal.
    Layout {
        #[command(flatten)]
        target: Target,

        /// Equal-width histogram bins.
        #[arg(long, conflicts_with = "nice_bins", value_parser = parse_bin_count)]
        bins: Option<NonZeroUsize>,

        /// Histogram bins on round thresholds, about this many.
        #[arg(long, value_parser = parse_bin_count)]
        nice_bins: Option<NonZeroUsize>,
    },
}

#[derive(Args, Debug)]
struct Target {
    file: PathBuf,

    /// Group label; defaults to the configured group, then the first one.
    #[arg(long)]
    group: Option<String>,

    /// Comma-separated feature order.
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,
}

fn parse_bin_count(s: &str) -> Result<NonZeroUsize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    match NonZeroUsize::new(n) {
        Some(n) if n.get() <= BinPolicy::MAX_BINS => Ok(n),
        _ => Err(format!("expected 1..={}", BinPolicy::MAX_BINS)),
    }
}

// ---------------------------------------------------------------------------
// Output documents
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GroupSummary {
    label: String,
    rows: usize,
    color: Rgb8,
}

#[derive(Serialize)]
struct GroupsOutput<'a> {
    groups: Vec<GroupSummary>,
    report: &'a ParseReport,
}

#[derive(Serialize)]
struct MatrixOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fills: Option<Vec<Rgb8>>,
    snapshot: &'a MatrixSnapshot,
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), cli.preset.as_deref())?;

    match cli.command {
        Command::Groups { file } => {
            let dataset = load_file(&file, &config.table)?;
            print_json(&groups_output(&dataset))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Correlation { target, colors } => {
            run_matrix(&config, &target, ViewMode::Correlation, colors)
        }
        Command::Layout {
            target,
            bins,
            nice_bins,
        } => {
            let policy = match (bins, nice_bins) {
                (Some(n), _) => BinPolicy::Even(n),
                (None, Some(n)) => BinPolicy::Nice(n),
                (None, None) => config.bins,
            };
            run_matrix(&config, &target, ViewMode::Layout(policy), false)
        }
    }
}

fn resolve_config(path: Option<&Path>, preset: Option<&str>) -> Result<LatticeConfig> {
    match (path, preset) {
        (Some(path), _) => LatticeConfig::from_file(path),
        (None, Some(name)) => LatticeConfig::preset(name),
        (None, None) => bail!("Pass --config <file.json> or --preset <abalone|iris>"),
    }
}

fn groups_output(dataset: &Dataset) -> GroupsOutput<'_> {
    let colors = GroupColors::new(dataset.group_keys());
    let groups = dataset
        .group_keys()
        .map(|key| GroupSummary {
            label: key.to_string(),
            rows: dataset.group(key).map(|g| g.len()).unwrap_or(0),
            color: colors.color_for(key),
        })
        .collect();
    GroupsOutput {
        groups,
        report: dataset.report(),
    }
}

fn run_matrix(
    config: &LatticeConfig,
    target: &Target,
    mode: ViewMode,
    colors: bool,
) -> Result<ExitCode> {
    let dataset = load_file(&target.file, &config.table)?;
    let mut selector = MatrixSelector::new(dataset, mode);

    if let Some(names) = &target.features {
        let order = FeatureList::new(names.iter().cloned()).context("invalid --features")?;
        selector.set_features(order)?;
    }

    let label = target
        .group
        .clone()
        .or_else(|| config.default_group.clone())
        .or_else(|| selector.group_labels().into_iter().next())
        .context("dataset has no rows")?;

    let (error, code) = match selector.select_group(&label) {
        Ok(_) => (None, ExitCode::SUCCESS),
        Err(e) => (Some(e.to_string()), ExitCode::from(2)),
    };

    let snapshot = selector.snapshot();
    let fills = match (&snapshot.cells, colors) {
        (MatrixCells::Correlation(m), true) => {
            let scale = DivergingScale::default();
            Some(m.cells.iter().map(|c| scale.color(c.value)).collect())
        }
        _ => None,
    };

    print_json(&MatrixOutput {
        error,
        fills,
        snapshot,
    })?;
    Ok(code)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{text}");
    Ok(())
}
