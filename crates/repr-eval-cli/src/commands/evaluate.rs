//! Evaluate command: score a submission and write the JSON report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use repr_eval::{
    DirectorySource, DistanceMetric, EvalConfig, EvalSession, PhoneticTask, Pooling,
    Representation, SimilarityScoring, TaskDefinitions, dataset,
};

/// Task-definition filenames expected under the dataset directory.
const WITHIN_TRIPLETS: &str = "triplets_within.csv";
const ACROSS_TRIPLETS: &str = "triplets_across.csv";
const LEXICAL_PAIRS: &str = "lexical_pairs.csv";
const SEMANTIC_PAIRS: &str = "semantic_pairs.csv";
const SYNTACTIC_PAIRS: &str = "syntactic_pairs.csv";
const BITRATE_CLIPS: &str = "bitrate_clips.txt";

/// Arguments for the evaluate command.
pub struct Args {
    pub submission: PathBuf,
    pub dataset: PathBuf,
    pub output: Option<PathBuf>,
    pub submission_id: String,
    pub metric: DistanceMetric,
    pub pooling: Pooling,
    pub aligned: bool,
    pub discrete: bool,
    pub frame_shift: f64,
}

pub fn run(args: Args) -> Result<()> {
    let tasks = load_tasks(&args.dataset)
        .with_context(|| format!("loading task definitions from {}", args.dataset.display()))?;

    let scoring = if args.aligned {
        SimilarityScoring::Aligned
    } else {
        SimilarityScoring::Pooled(args.pooling)
    };
    let representation = if args.discrete {
        Representation::Discrete
    } else {
        Representation::Continuous
    };

    let config = EvalConfig::builder()
        .submission_id(args.submission_id)
        .metric(args.metric)
        .scoring(scoring)
        .representation(representation)
        .build();
    let source = DirectorySource::new(&args.submission).with_frame_shift(args.frame_shift);
    let session = EvalSession::new(config, Arc::new(source));

    let report = session.evaluate(&tasks);

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }

    if !report.is_complete() {
        anyhow::bail!("one or more tasks failed; see report for details");
    }
    Ok(())
}

/// Build the task definitions from whichever files the dataset provides.
fn load_tasks(dataset: &Path) -> Result<TaskDefinitions> {
    let mut tasks = TaskDefinitions::default();

    let within = dataset.join(WITHIN_TRIPLETS);
    let across = dataset.join(ACROSS_TRIPLETS);
    if within.is_file() && across.is_file() {
        tasks.phonetic = Some(PhoneticTask {
            within: dataset::load_triplets(within)?,
            across: dataset::load_triplets(across)?,
        });
    } else if within.is_file() || across.is_file() {
        anyhow::bail!(
            "phonetic task needs both {WITHIN_TRIPLETS} and {ACROSS_TRIPLETS}"
        );
    }

    for (file, slot) in [
        (LEXICAL_PAIRS, &mut tasks.lexical),
        (SEMANTIC_PAIRS, &mut tasks.semantic),
        (SYNTACTIC_PAIRS, &mut tasks.syntactic),
    ] {
        let path = dataset.join(file);
        if path.is_file() {
            *slot = Some(dataset::load_judgment_pairs(path)?);
        }
    }

    let clips = dataset.join(BITRATE_CLIPS);
    if clips.is_file() {
        tasks.bitrate = Some(dataset::load_clip_list(clips)?);
    }

    let defined = [
        tasks.phonetic.is_some(),
        tasks.lexical.is_some(),
        tasks.semantic.is_some(),
        tasks.syntactic.is_some(),
        tasks.bitrate.is_some(),
    ];
    if !defined.iter().any(|&d| d) {
        anyhow::bail!("no task-definition files found in {}", dataset.display());
    }
    Ok(tasks)
}
