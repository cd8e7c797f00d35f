use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use osu_converter::{ConvertOptions, LanePolicy};
use tracing_subscriber::EnvFilter;

mod package;

#[derive(Debug, Parser)]
#[command(name = "osu_cli")]
#[command(about = "osu!mania chart to beatmap JSON converter", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert one chart file
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        convert: ConvertArgs,
    },
    /// Convert every chart in an unpacked archive directory and copy its assets
    Package {
        dir: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        convert: ConvertArgs,
    },
    /// Convert every unpacked archive directory below ROOT
    Batch {
        root: PathBuf,
        #[arg(short, long, default_value = "beatmaps")]
        output: PathBuf,
        #[command(flatten)]
        convert: ConvertArgs,
    },
}

#[derive(Debug, clap::Args)]
struct ConvertArgs {
    /// How overlapping notes in one lane are handled
    #[arg(long, value_enum, default_value_t = PolicyArg::SuppressOverlap)]
    policy: PolicyArg,

    /// Seed for the random lane split of 4K and 5K charts
    #[arg(long, env = "OSU_CLI_SEED")]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    SuppressOverlap,
    SortOnly,
}

impl ConvertArgs {
    fn options(&self) -> ConvertOptions {
        let policy = match self.policy {
            PolicyArg::SuppressOverlap => LanePolicy::SuppressOverlap,
            PolicyArg::SortOnly => LanePolicy::SortOnly,
        };
        ConvertOptions {
            policy,
            seed: self.seed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Convert {
            input,
            output,
            convert,
        } => {
            let chart = osu_converter::convert_file_with_options(&input, convert.options())
                .map_err(|e| anyhow::anyhow!(e.to_string()))
                .with_context(|| format!("convert failed: {}", input.display()))?;

            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            package::write_chart_json(&chart, &out_path)?;
        }
        Command::Package {
            dir,
            output,
            convert,
        } => {
            let report = package::convert_package(&dir, &output, convert.options())?;
            println!("{}", report.summary());
        }
        Command::Batch {
            root,
            output,
            convert,
        } => {
            let reports = package::convert_batch(&root, &output, convert.options())?;
            for (dir, report) in &reports {
                println!("{}: {}", dir.display(), report.summary());
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("osu_cli={level}").parse()?)
                .add_directive(format!("osu_converter={level}").parse()?),
        )
        .init();
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("json");
    out
}
