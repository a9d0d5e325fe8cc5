//! repr-eval CLI - speech representation scoring tool

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use repr_eval::{DistanceMetric, Pooling};

mod commands;

/// Speech representation evaluation tool.
#[derive(Parser)]
#[command(name = "repr-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a submission against the dev-set task definitions
    Evaluate {
        /// Submission directory containing per-clip feature files
        submission: PathBuf,

        /// Dataset directory containing the task-definition files
        dataset: PathBuf,

        /// Output JSON report file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Submission identifier recorded in the report
        #[arg(long, default_value = "submission")]
        submission_id: String,

        /// Frame distance metric
        #[arg(long, value_enum, default_value_t = MetricArg::Angular)]
        metric: MetricArg,

        /// Pooling applied before similarity scoring
        #[arg(long, value_enum, default_value_t = PoolingArg::Mean)]
        pooling: PoolingArg,

        /// Score similarity pairs on DTW-aligned sequences instead of
        /// pooled vectors
        #[arg(long)]
        aligned: bool,

        /// Score the phonetic task on discrete unit labels
        #[arg(long)]
        discrete: bool,

        /// Shift between two feature frames in seconds
        #[arg(long, default_value_t = 0.01)]
        frame_shift: f64,
    },

    /// Estimate the bitrate of a discrete unit submission
    Bitrate {
        /// Submission directory containing per-clip unit files
        submission: PathBuf,

        /// File listing the clip ids of the track, one per line
        #[arg(short, long)]
        clips: PathBuf,

        /// Shift between two unit frames in seconds
        #[arg(long, default_value_t = 0.01)]
        frame_shift: f64,
    },
}

/// Frame distance metric argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    Angular,
    Euclidean,
}

impl From<MetricArg> for DistanceMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Angular => Self::Angular,
            MetricArg::Euclidean => Self::Euclidean,
        }
    }
}

/// Pooling strategy argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PoolingArg {
    Mean,
    Max,
    Min,
}

impl From<PoolingArg> for Pooling {
    fn from(arg: PoolingArg) -> Self {
        match arg {
            PoolingArg::Mean => Self::Mean,
            PoolingArg::Max => Self::Max,
            PoolingArg::Min => Self::Min,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Evaluate {
            submission,
            dataset,
            output,
            submission_id,
            metric,
            pooling,
            aligned,
            discrete,
            frame_shift,
        } => commands::evaluate::run(commands::evaluate::Args {
            submission,
            dataset,
            output,
            submission_id,
            metric: metric.into(),
            pooling: pooling.into(),
            aligned,
            discrete,
            frame_shift,
        }),
        Commands::Bitrate {
            submission,
            clips,
            frame_shift,
        } => commands::bitrate::run(&submission, &clips, frame_shift),
    }
}
