use libgasbench_core::{BenchError, SuiteConfig};

/// Print an error and its suggestions to stderr
pub fn print_error(err: &BenchError) {
    eprintln!("error: {}", err);
    let suggestions = err.suggestions();
    if !suggestions.is_empty() {
        eprintln!();
        eprintln!("Suggestions:");
        for suggestion in suggestions {
            eprintln!("  - {}", suggestion);
        }
    }
}

/// Summarise a suite that passed validation
pub fn print_validated(config: &SuiteConfig) {
    let variants: Vec<&str> = config.variants.iter().map(|v| v.name.as_str()).collect();
    println!("variants: {}", variants.join(", "));
    for scenario in &config.scenarios {
        println!(
            "scenario {}: {} steps, {} assertions",
            scenario.name,
            scenario.steps.len(),
            scenario.assertions.len()
        );
    }
    println!("ok");
}
