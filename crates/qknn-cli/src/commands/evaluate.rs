//! Evaluate command implementation.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use qknn_core::{Evaluation, Evaluator, QknnConfig, train_test_split};

use super::common::{
    Overrides, describe_encoding, load_config, load_dataset, prepare_features, print_result,
};

/// Report written by `--export`.
#[derive(Debug, Serialize)]
struct Report<'a> {
    dataset: String,
    config: &'a QknnConfig,
    n_train: usize,
    n_test: usize,
    evaluation: &'a Evaluation,
}

/// Execute the evaluate command.
pub fn execute(
    dataset_path: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
    export: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;

    println!(
        "{} {}",
        style("Evaluating").green().bold(),
        style(dataset_path.display()).cyan()
    );

    let dataset = load_dataset(dataset_path)?;
    let classes: BTreeSet<_> = dataset.labels.iter().collect();
    print_result(
        "Samples",
        format!(
            "{} ({} features, {} classes)",
            dataset.len(),
            dataset.num_features(),
            classes.len()
        ),
    );

    let (_, features) = prepare_features(&dataset, &config)?;
    let split = train_test_split(
        &features,
        &dataset.labels,
        config.split.test_size,
        config.split.seed,
    )?;
    let training = split.training_set()?;
    info!(
        "Split into {} training and {} test samples",
        training.len(),
        split.test_features.len()
    );

    print_result(
        "Split",
        format!(
            "{} train / {} test",
            training.len(),
            split.test_features.len()
        ),
    );
    print_result(
        "Model",
        format!(
            "{} kernel, k={}, {}",
            config.kernel,
            config.k,
            describe_encoding(&config)
        ),
    );
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!(
        "Classifying {} test samples...",
        split.test_features.len()
    ));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result =
        Evaluator::from_config(&config).evaluate(&split.test_features, &split.test_labels, &training);
    spinner.finish_and_clear();
    let evaluation = result?;

    if let Some((predicted, truth)) = evaluation.first_example() {
        println!(
            "Predicted label: {} vs true label: {}",
            style(dataset.label_name(predicted)).yellow(),
            style(dataset.label_name(truth)).yellow()
        );
    }
    println!(
        "Accuracy for QkNN with amplitude encoding ({}): {}",
        describe_encoding(&config),
        style(format!("{:.4}", evaluation.accuracy)).green().bold()
    );
    print_result(
        "Correct",
        format!("{}/{}", evaluation.correct, evaluation.total()),
    );

    if let Some(path) = export {
        let report = Report {
            dataset: dataset_path.display().to_string(),
            config: &config,
            n_train: training.len(),
            n_test: evaluation.total(),
            evaluation: &evaluation,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        println!(
            "{} Report written to {}",
            style("✓").green().bold(),
            style(path.display()).cyan()
        );
    }

    Ok(())
}
