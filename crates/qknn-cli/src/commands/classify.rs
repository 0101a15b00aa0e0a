//! Classify command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use qknn_core::{KernelKnn, TrainingSet};

use super::common::{
    Overrides, describe_encoding, load_config, load_dataset, parse_query, prepare_features,
    print_result,
};

/// Execute the classify command.
pub fn execute(
    dataset_path: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
    raw_query: &str,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;
    let dataset = load_dataset(dataset_path)?;

    let query = parse_query(raw_query)?;
    if query.len() != dataset.num_features() {
        anyhow::bail!(
            "Query has {} values but the dataset has {} features",
            query.len(),
            dataset.num_features()
        );
    }

    let (scaler, features) = prepare_features(&dataset, &config)?;
    let query = match &scaler {
        Some(scaler) => scaler
            .transform_row(&query)
            .context("Failed to standardize query")?,
        None => query,
    };

    let training = TrainingSet::from_parts(features, dataset.labels.clone())?;
    let knn = KernelKnn::from_config(&config);
    let encoded_training = knn.prepare(&training)?;
    let encoded_query = knn.encoder().encode(&query)?;

    let label = knn.classify_encoded(&encoded_query, &encoded_training, config.k)?;
    let neighbors = knn.neighbors(&encoded_query, &encoded_training, config.k)?;

    println!(
        "{} {}",
        style("Predicted label:").green().bold(),
        style(dataset.label_name(label)).yellow().bold()
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
    println!("{}", style("Nearest neighbours:").bold());
    println!("  {:>6}  {:>10}  {:>8}", "index", "distance", "label");
    for n in &neighbors {
        println!(
            "  {:>6}  {:>10.6}  {:>8}",
            n.index,
            n.distance,
            dataset.label_name(n.label)
        );
    }

    Ok(())
}
