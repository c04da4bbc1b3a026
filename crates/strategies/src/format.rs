//! Output formatting for rankings and ground truth.
//!
//! Two textual modes, applied uniformly when printing rankings and
//! ground truth; formatting is a presentation concern external to the
//! scoring logic.
//!
//! - **Simple**: `user \t item \t score` per ranked entry,
//!   `user \t item \t relevance` for ground truth
//! - **TrecEval**: standard 6-column trec_eval run layout
//!   (`query Q0 item rank score tag`) and qrel layout
//!   (`query 0 item relevance`)

use anyhow::{anyhow, Result};
use pref_store::{ItemId, PreferenceStore, UserId};
use std::collections::BTreeSet;
use std::io::Write;

/// Output mode selector from the configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Simple,
    TrecEval,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(OutputFormat::Simple),
            "trec" | "trec_eval" | "trec-eval" => Ok(OutputFormat::TrecEval),
            other => Err(anyhow!("Unknown output format: {}", other)),
        }
    }
}

/// A user's predicted scores restricted to a candidate set, sorted
/// score-descending with item-id ascending on ties.
pub fn ranked_scores(
    predictions: &PreferenceStore,
    user: UserId,
    candidates: &BTreeSet<ItemId>,
) -> Vec<(ItemId, f64)> {
    let mut ranked: Vec<(ItemId, f64)> = candidates
        .iter()
        .filter_map(|&item| predictions.preference(user, item).map(|s| (item, s)))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}

/// Write one user's ranking in the selected format.
///
/// `user` is textual so RelPlusN pseudo-users print unchanged.
pub fn write_ranking<W: Write>(
    w: &mut W,
    format: OutputFormat,
    user: &str,
    ranked: &[(ItemId, f64)],
    tag: &str,
) -> Result<()> {
    for (rank, &(item, score)) in ranked.iter().enumerate() {
        match format {
            OutputFormat::Simple => writeln!(w, "{}\t{}\t{}", user, item, score)?,
            OutputFormat::TrecEval => {
                writeln!(w, "{} Q0 {} {} {} {}", user, item, rank + 1, score, tag)?
            }
        }
    }
    Ok(())
}

/// Write one user's ground truth in the selected format.
pub fn write_ground_truth<W: Write>(
    w: &mut W,
    format: OutputFormat,
    user: &str,
    relevant: &[(ItemId, f64)],
) -> Result<()> {
    for &(item, relevance) in relevant {
        match format {
            OutputFormat::Simple => writeln!(w, "{}\t{}\t{}", user, item, relevance)?,
            OutputFormat::TrecEval => writeln!(w, "{} 0 {} {}", user, item, relevance)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Cursor<Vec<u8>>),
    {
        let mut buf = Cursor::new(Vec::new());
        f(&mut buf);
        String::from_utf8(buf.into_inner()).unwrap()
    }

    #[test]
    fn test_simple_ranking_lines() {
        let out = render(|w| {
            write_ranking(w, OutputFormat::Simple, "1", &[(10, 0.9), (20, 0.4)], "run").unwrap()
        });
        assert_eq!(out, "1\t10\t0.9\n1\t20\t0.4\n");
    }

    #[test]
    fn test_trec_ranking_lines() {
        let out = render(|w| {
            write_ranking(w, OutputFormat::TrecEval, "1_21", &[(10, 0.9), (20, 0.4)], "relplusn")
                .unwrap()
        });
        assert_eq!(out, "1_21 Q0 10 1 0.9 relplusn\n1_21 Q0 20 2 0.4 relplusn\n");
    }

    #[test]
    fn test_ground_truth_lines() {
        let simple = render(|w| {
            write_ground_truth(w, OutputFormat::Simple, "1", &[(10, 5.0)]).unwrap()
        });
        assert_eq!(simple, "1\t10\t5\n");

        let trec = render(|w| {
            write_ground_truth(w, OutputFormat::TrecEval, "1", &[(10, 5.0)]).unwrap()
        });
        assert_eq!(trec, "1 0 10 5\n");
    }

    #[test]
    fn test_ranked_scores_order_and_ties() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 10, 0.5);
        predictions.add_preference(1, 20, 0.9);
        predictions.add_preference(1, 30, 0.5);
        predictions.add_preference(1, 40, 0.1); // outside the candidate set

        let candidates = BTreeSet::from([10, 20, 30, 50]);
        let ranked = ranked_scores(&predictions, 1, &candidates);
        // 50 has no prediction and is dropped; ties broken by item id
        assert_eq!(ranked, vec![(20, 0.9), (10, 0.5), (30, 0.5)]);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("simple".parse::<OutputFormat>().unwrap(), OutputFormat::Simple);
        assert_eq!("trec_eval".parse::<OutputFormat>().unwrap(), OutputFormat::TrecEval);
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
