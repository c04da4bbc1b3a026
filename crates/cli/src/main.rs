use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use metrics::{
    build_metric, ErrorStrategy, EvaluationMetric, ItemDistance, JaccardItemDistance,
    MetricInputs, MetricKind,
};
use pref_store::{parser, IndexedPreferenceStore, PreferenceStore, UserId};
use rayon::prelude::*;
use serde::Serialize;
use splitters::{CrossValidationSplitter, RandomSplitter, Splitter, TemporalSplitter};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strategies::{build_strategy, CandidateStrategy, OutputFormat, RelPlusN, StrategyKind};
use tracing::info;

/// rec-eval - offline evaluation of recommender outputs
#[derive(Parser)]
#[command(name = "rec-eval")]
#[command(about = "Split, select candidates, score and compare recommender outputs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a preference file into training/test pairs
    Split {
        /// Preference file (user \t item \t preference \t timestamp)
        input: PathBuf,

        /// Split algorithm: random, cross-validation or temporal
        #[arg(long, default_value = "random")]
        algorithm: String,

        /// Fraction of preferences assigned to training
        #[arg(long, default_value_t = 0.8)]
        train_fraction: f64,

        /// Number of folds (cross-validation only)
        #[arg(long, default_value_t = 5)]
        folds: usize,

        /// Split each user independently
        #[arg(long)]
        per_user: bool,

        /// Per-item granularity (see the splitter docs)
        #[arg(long)]
        per_item: bool,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Directory receiving train_<i>.tsv / test_<i>.tsv
        #[arg(long, default_value = "splits")]
        output_dir: PathBuf,
    },

    /// Rank predictions over a candidate strategy and emit ground truth
    Strategy {
        #[arg(long)]
        training: PathBuf,

        #[arg(long)]
        test: PathBuf,

        /// Predictions file (user \t item \t score)
        #[arg(long)]
        predictions: PathBuf,

        /// all-items, train-items, test-items, user-test or rel-plus-n
        #[arg(long, default_value = "all-items")]
        strategy: String,

        /// Relevance threshold
        #[arg(long, default_value_t = 4.0)]
        threshold: f64,

        /// N for rel-plus-n
        #[arg(long)]
        n: Option<usize>,

        /// Sampling seed for rel-plus-n
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output format: simple or trec_eval
        #[arg(long, default_value = "simple")]
        format: String,

        #[arg(long)]
        ranking_out: PathBuf,

        #[arg(long)]
        ground_truth_out: PathBuf,
    },

    /// Compute metrics for one or more folds of predictions
    Evaluate {
        /// One predictions file per fold
        #[arg(long, required = true)]
        predictions: Vec<PathBuf>,

        /// One test file per fold, aligned with --predictions
        #[arg(long, required = true)]
        test: Vec<PathBuf>,

        /// Optional training files (novelty/profile metrics), aligned
        #[arg(long)]
        training: Vec<PathBuf>,

        /// Optional item-feature file (item \t tag|tag|...) for
        /// distance-based metrics
        #[arg(long)]
        features: Option<PathBuf>,

        /// Metric names (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "mae,rmse,precision,ndcg")]
        metrics: Vec<String>,

        /// Ranking cutoffs (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "5,10")]
        cutoffs: Vec<usize>,

        #[arg(long, default_value_t = 4.0)]
        threshold: f64,

        /// Missing-prediction strategy for the error metrics
        #[arg(long, default_value = "not_consider_nan")]
        error_strategy: String,

        /// Emit a JSON report instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Paired significance test between two systems' per-user values
    Compare {
        /// Per-user value file for system A (user \t value)
        system_a: PathBuf,

        /// Per-user value file for system B
        system_b: PathBuf,

        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Split {
            input,
            algorithm,
            train_fraction,
            folds,
            per_user,
            per_item,
            seed,
            output_dir,
        } => handle_split(
            &input,
            &algorithm,
            train_fraction,
            folds,
            per_user,
            per_item,
            seed,
            &output_dir,
        ),
        Commands::Strategy {
            training,
            test,
            predictions,
            strategy,
            threshold,
            n,
            seed,
            format,
            ranking_out,
            ground_truth_out,
        } => handle_strategy(
            &training,
            &test,
            &predictions,
            &strategy,
            threshold,
            n,
            seed,
            &format,
            &ranking_out,
            &ground_truth_out,
        ),
        Commands::Evaluate {
            predictions,
            test,
            training,
            features,
            metrics,
            cutoffs,
            threshold,
            error_strategy,
            json,
        } => handle_evaluate(
            &predictions,
            &test,
            &training,
            features.as_deref(),
            &metrics,
            cutoffs,
            threshold,
            &error_strategy,
            json,
        ),
        Commands::Compare {
            system_a,
            system_b,
            alpha,
        } => handle_compare(&system_a, &system_b, alpha),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_split(
    input: &Path,
    algorithm: &str,
    train_fraction: f64,
    folds: usize,
    per_user: bool,
    per_item: bool,
    seed: u64,
    output_dir: &Path,
) -> Result<()> {
    let data = parser::read_preferences(input)
        .with_context(|| format!("Failed to load preferences from {}", input.display()))?;
    info!(
        "Loaded {} preferences ({} users, {} items)",
        data.num_preferences(),
        data.num_users(),
        data.num_items()
    );

    let splitter: Box<dyn Splitter> = match algorithm {
        "random" => Box::new(
            RandomSplitter::new(train_fraction, seed)
                .with_per_user(per_user)
                .with_per_item(per_item),
        ),
        "cross-validation" => Box::new(CrossValidationSplitter::new(folds, per_user, seed)),
        "temporal" => Box::new(
            TemporalSplitter::new(train_fraction)
                .with_per_user(per_user)
                .with_per_item(per_item),
        ),
        other => return Err(anyhow!("Unknown split algorithm: {}", other)),
    };

    let pairs = splitter.split(&data);
    std::fs::create_dir_all(output_dir)?;
    for (fold, pair) in pairs.iter().enumerate() {
        write_store(&pair.training, &output_dir.join(format!("train_{}.tsv", fold)))?;
        write_store(&pair.test, &output_dir.join(format!("test_{}.tsv", fold)))?;
        println!(
            "{} fold {}: {} training / {} test preferences",
            "✓".green(),
            fold,
            pair.training.num_preferences(),
            pair.test.num_preferences()
        );
    }
    Ok(())
}

fn write_store(store: &PreferenceStore, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    parser::write_preferences(store, &mut writer)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_strategy(
    training: &Path,
    test: &Path,
    predictions: &Path,
    strategy_name: &str,
    threshold: f64,
    n: Option<usize>,
    seed: u64,
    format: &str,
    ranking_out: &Path,
    ground_truth_out: &Path,
) -> Result<()> {
    let training_store = Arc::new(IndexedPreferenceStore::from_store(
        &parser::read_preferences(training)?,
    ));
    let test_plain = parser::read_preferences(test)?;
    let test_store = Arc::new(IndexedPreferenceStore::from_store(&test_plain));
    let predicted = parser::read_predictions(predictions)?;

    let kind: StrategyKind = strategy_name.parse()?;
    let format: OutputFormat = format.parse()?;

    let mut ranking = BufWriter::new(File::create(ranking_out)?);
    let mut ground_truth = BufWriter::new(File::create(ground_truth_out)?);

    if kind == StrategyKind::RelPlusN {
        // One synthetic ranking task per relevant item
        let n = n.ok_or_else(|| anyhow!("rel-plus-n requires --n"))?;
        let strategy = RelPlusN::new(training_store, test_store, threshold, n, seed);
        for user in test_plain.users().collect::<Vec<_>>() {
            for task in strategy.ranking_tasks(user)? {
                let ranked = strategies::ranked_scores(&predicted, user, &task.items);
                strategies::write_ranking(
                    &mut ranking,
                    format,
                    &task.pseudo_user,
                    &ranked,
                    strategy_name,
                )?;
                let relevance = test_plain
                    .preference(user, task.relevant_item)
                    .unwrap_or_default();
                strategies::write_ground_truth(
                    &mut ground_truth,
                    format,
                    &task.pseudo_user,
                    &[(task.relevant_item, relevance)],
                )?;
            }
        }
    } else {
        let strategy = build_strategy(kind, training_store, test_store, threshold, None)?;
        for user in test_plain.users().collect::<Vec<_>>() {
            let candidates = strategy.candidate_items(user)?;
            let ranked = strategies::ranked_scores(&predicted, user, &candidates);
            strategies::write_ranking(
                &mut ranking,
                format,
                &user.to_string(),
                &ranked,
                strategy_name,
            )?;
            let relevant: Vec<_> = test_plain
                .user_item_preferences()
                .get(&user)
                .map(|items| {
                    items
                        .iter()
                        .filter(|&(_, &s)| s >= threshold)
                        .map(|(&item, &s)| (item, s))
                        .collect()
                })
                .unwrap_or_default();
            strategies::write_ground_truth(
                &mut ground_truth,
                format,
                &user.to_string(),
                &relevant,
            )?;
        }
    }
    println!(
        "{} wrote rankings to {} and ground truth to {}",
        "✓".green(),
        ranking_out.display(),
        ground_truth_out.display()
    );
    Ok(())
}

/// Per-fold metric values plus the across-fold means.
#[derive(Debug, Serialize)]
struct EvaluationReport {
    folds: Vec<FoldReport>,
    means: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
struct FoldReport {
    fold: usize,
    values: BTreeMap<String, f64>,
}

#[allow(clippy::too_many_arguments)]
fn handle_evaluate(
    predictions: &[PathBuf],
    test: &[PathBuf],
    training: &[PathBuf],
    features: Option<&Path>,
    metric_names: &[String],
    cutoffs: Vec<usize>,
    threshold: f64,
    error_strategy: &str,
    json: bool,
) -> Result<()> {
    if predictions.len() != test.len() {
        return Err(anyhow!(
            "Need one --test file per --predictions file ({} vs {})",
            predictions.len(),
            test.len()
        ));
    }
    if !training.is_empty() && training.len() != predictions.len() {
        return Err(anyhow!("--training must be given once per fold or not at all"));
    }

    // Fatal configuration errors surface before any fold work starts
    let kinds: Vec<MetricKind> = metric_names
        .iter()
        .map(|name| name.parse())
        .collect::<Result<_>>()?;
    let error_strategy: ErrorStrategy = error_strategy.parse()?;
    let distance: Option<Arc<dyn ItemDistance>> = match features {
        Some(path) => Some(Arc::new(read_item_features(path)?)),
        None => None,
    };

    // Folds are data-independent; evaluate them in parallel
    let folds: Vec<FoldReport> = (0..predictions.len())
        .into_par_iter()
        .map(|fold| -> Result<FoldReport> {
            let inputs = MetricInputs {
                predictions: Arc::new(parser::read_predictions(&predictions[fold])?),
                test: Arc::new(parser::read_preferences(&test[fold])?),
                training: match training.get(fold) {
                    Some(path) => Some(Arc::new(IndexedPreferenceStore::from_store(
                        &parser::read_preferences(path)?,
                    ))),
                    None => None,
                },
                distance: distance.clone(),
                threshold,
                cutoffs: cutoffs.clone(),
                error_strategy,
            };

            let mut values = BTreeMap::new();
            for &kind in &kinds {
                let mut metric = build_metric(kind, &inputs)?;
                metric.compute();
                values.insert(metric.name(), metric.value());
            }
            Ok(FoldReport { fold, values })
        })
        .collect::<Result<_>>()?;

    let mut means = BTreeMap::new();
    if let Some(first) = folds.first() {
        for name in first.values.keys() {
            let sum: f64 = folds.iter().map(|f| f.values[name]).sum();
            means.insert(name.clone(), sum / folds.len() as f64);
        }
    }
    let report = EvaluationReport { folds, means };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &EvaluationReport) {
    println!("{}", "Evaluation results".bold().blue());
    for fold in &report.folds {
        println!("fold {}:", fold.fold);
        for (name, value) in &fold.values {
            println!("  {:<16} {:.4}", name, value);
        }
    }
    if report.folds.len() > 1 {
        println!("{}", "mean over folds:".bold());
        for (name, value) in &report.means {
            println!("  {:<16} {:.4}", name, value);
        }
    }
}

fn handle_compare(system_a: &Path, system_b: &Path, alpha: f64) -> Result<()> {
    let a = read_per_user_values(system_a)?;
    let b = read_per_user_values(system_b)?;

    let test = stats::paired_t_test(&a, &b)?;
    let (lo, hi) = stats::confidence_interval_paired(alpha, &a, &b)?;
    let d = stats::cohens_d(&a, &b)?;
    let d_ls = stats::cohens_d_ls(&a, &b)?;

    println!("{}", "Paired comparison".bold().blue());
    println!("  n                {}", test.n);
    println!("  mean difference  {:.4}", test.mean_difference);
    println!("  std error        {:.4}", test.std_error);
    println!("  t statistic      {:.4}", test.t_statistic);
    println!("  p value          {:.4}", test.p_value);
    println!(
        "  {:.0}% CI           [{:.4}, {:.4}]",
        (1.0 - alpha) * 100.0,
        lo,
        hi
    );
    println!("  Cohen's d        {:.4}", d);
    println!("  d (least sq.)    {:.4}", d_ls);

    if test.p_value < alpha {
        println!("{}", format!("significant at alpha = {}", alpha).green());
    } else {
        println!("{}", format!("not significant at alpha = {}", alpha).yellow());
    }
    Ok(())
}

/// Parse a per-user value file: `user \t value` per line.
fn read_per_user_values(path: &Path) -> Result<BTreeMap<UserId, f64>> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
    );
    let mut values = BTreeMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut fields = trimmed.split('\t');
        let user: UserId = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| anyhow!("Bad user id at {}:{}", path.display(), idx + 1))?;
        let value: f64 = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| anyhow!("Bad value at {}:{}", path.display(), idx + 1))?;
        values.insert(user, value);
    }
    Ok(values)
}

/// Parse an item-feature file: `item \t tag|tag|...` per line.
fn read_item_features(path: &Path) -> Result<JaccardItemDistance> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
    );
    let mut features: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut fields = trimmed.split('\t');
        let item: u64 = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| anyhow!("Bad item id at {}:{}", path.display(), idx + 1))?;
        let tags = fields
            .next()
            .ok_or_else(|| anyhow!("Missing tags at {}:{}", path.display(), idx + 1))?;
        features.insert(item, tags.split('|').map(|t| t.to_string()).collect());
    }
    Ok(JaccardItemDistance::new(features))
}
