//! Loading of the benchmark's fixed task-definition data.
//!
//! The dataset distribution ships the evaluation items as CSV files:
//! triplet lists for the phonetic task and judgment-pair lists for the
//! lexical, semantic and syntactic tasks. These files are produced by the
//! benchmark organizers and are never regenerated here; the loaders only
//! parse and sanity-check them.
//!
//! Expected columns:
//!
//! - triplets: `a,b,x,target,group` with `target` being `A` or `B`
//! - judgment pairs: `item_a,item_b,score` plus optional `weight` and
//!   `frequency` columns
//! - clip lists (for the bitrate track): one clip id per line, `#`
//!   comments allowed

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::metrics::abx::{Triplet, TripletTarget};
use crate::metrics::similarity::JudgmentPair;

#[derive(Debug, Deserialize)]
struct TripletRecord {
    a: String,
    b: String,
    x: String,
    target: String,
    group: String,
}

/// Load a triplet list from a CSV file.
pub fn load_triplets(path: impl AsRef<Path>) -> Result<Vec<Triplet>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut triplets = Vec::new();

    for (row, record) in reader.deserialize::<TripletRecord>().enumerate() {
        let record = record?;
        let target = match record.target.trim() {
            "A" | "a" => TripletTarget::A,
            "B" | "b" => TripletTarget::B,
            other => {
                return Err(Error::Dataset(format!(
                    "{}: row {}: target must be 'A' or 'B', got '{other}'",
                    path.display(),
                    row + 1
                )));
            }
        };
        triplets.push(Triplet {
            a: record.a,
            b: record.b,
            x: record.x,
            target,
            group: record.group,
        });
    }

    if triplets.is_empty() {
        return Err(Error::Dataset(format!(
            "{}: no triplets found",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), triplets = triplets.len(), "loaded triplet list");
    Ok(triplets)
}

#[derive(Debug, Deserialize)]
struct PairRecord {
    item_a: String,
    item_b: String,
    score: f64,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    frequency: Option<u64>,
}

/// Load a judgment-pair list from a CSV file.
pub fn load_judgment_pairs(path: impl AsRef<Path>) -> Result<Vec<JudgmentPair>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut pairs = Vec::new();

    for record in reader.deserialize::<PairRecord>() {
        let record = record?;
        pairs.push(JudgmentPair {
            item_a: record.item_a,
            item_b: record.item_b,
            human_score: record.score,
            weight: record.weight,
            frequency: record.frequency,
        });
    }

    if pairs.is_empty() {
        return Err(Error::Dataset(format!(
            "{}: no judgment pairs found",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), pairs = pairs.len(), "loaded judgment pairs");
    Ok(pairs)
}

/// Load a clip-id list, one id per line.
pub fn load_clip_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let clips: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect();

    if clips.is_empty() {
        return Err(Error::Dataset(format!(
            "{}: no clip ids found",
            path.display()
        )));
    }
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_triplets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triplets.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "a,b,x,target,group").unwrap();
        writeln!(file, "c1,c2,c3,A,ctx-p-t").unwrap();
        writeln!(file, "c4,c5,c6,b,ctx-k-d").unwrap();

        let triplets = load_triplets(&path).unwrap();
        assert_eq!(triplets.len(), 2);
        assert_eq!(triplets[0].target, TripletTarget::A);
        assert_eq!(triplets[1].target, TripletTarget::B);
        assert_eq!(triplets[1].group, "ctx-k-d");
    }

    #[test]
    fn test_load_triplets_bad_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triplets.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "a,b,x,target,group").unwrap();
        writeln!(file, "c1,c2,c3,X,g").unwrap();

        assert!(matches!(
            load_triplets(&path).unwrap_err(),
            Error::Dataset(_)
        ));
    }

    #[test]
    fn test_load_judgment_pairs_with_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "item_a,item_b,score,weight,frequency").unwrap();
        writeln!(file, "w1,w2,7.5,0.8,12").unwrap();
        writeln!(file, "w3,w4,2.0,,").unwrap();

        let pairs = load_judgment_pairs(&path).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].weight, Some(0.8));
        assert_eq!(pairs[0].frequency, Some(12));
        assert_eq!(pairs[1].weight, None);
        assert!((pairs[1].human_score - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_clip_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clips.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# dev clips").unwrap();
        writeln!(file, "c1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "c2").unwrap();

        let clips = load_clip_list(&path).unwrap();
        assert_eq!(clips, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_empty_files_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "a,b,x,target,group").unwrap();
        assert!(load_triplets(&path).is_err());
    }
}
