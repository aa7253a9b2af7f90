use focus_metrics::batch::{run_batch, write_outputs};
use focus_metrics::config::load_config;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let report = run_batch(&config).map_err(|e| e.to_string())?;
    let outputs = write_outputs(&config, &report).map_err(|e| e.to_string())?;

    println!(
        "Scored {} image(s) ({} failed) in {:.1} ms",
        report.records.len(),
        report.failures.len(),
        report.total_ms
    );
    for failure in &report.failures {
        println!("  skipped {}: {}", failure.name, failure.reason);
    }
    println!("Saved table to {}", outputs.table.display());
    if let Some(json) = &outputs.json_report {
        println!("Saved report to {}", json.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: focus_batch <config.json>".to_string()
}
