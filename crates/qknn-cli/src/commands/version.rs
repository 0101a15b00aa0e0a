//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - quantum-kernel k-nearest-neighbour classification",
        style("qknn").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qknn-core  Amplitude encoding, kernels, classifier and evaluation");
    println!("  qknn-cli   Command-line interface");
    println!();
    println!("Kernels:    closed_form, circuit");
    println!("License:    {}", style("Apache-2.0").dim());
}
