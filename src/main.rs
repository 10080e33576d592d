//! Skin Condition Ensemble Diagnosis - Main Entry Point
//!
//! Loads the image and text classifiers, prompts for a case, and prints the
//! ensembled diagnosis with its top-ranked labels.

use anyhow::Result;
use derm_ensemble::{
    config::{AppConfig, LoggingConfig, OutputFormat},
    models::inference::EnsembleEngine,
    prompt::Prompter,
};
use std::io::{self, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(format!("derm_ensemble={}", logging.level).parse()?)
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting ensemble diagnosis");
    info!(
        image_model = %config.models.image_model,
        text_model = %config.models.text_model,
        "Configuration loaded"
    );

    let mut engine = EnsembleEngine::new(&config)?;
    let labels: Vec<&str> = engine.labels().iter().collect();
    info!(count = labels.len(), labels = ?labels, "Class labels");

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let inputs = prompter.collect()?;
    info!(
        image = %inputs.image_path,
        image_weight = inputs.weight.image(),
        text_weight = inputs.weight.text(),
        "Inputs collected"
    );

    let diagnosis = engine.diagnose(
        Path::new(&inputs.image_path),
        &inputs.description,
        inputs.weight,
    )?;

    let mut stdout = prompter.into_output();
    match config.output.format {
        OutputFormat::Text => write!(stdout, "{}", diagnosis)?,
        OutputFormat::Json => writeln!(stdout, "{}", diagnosis.to_json()?)?,
    }
    stdout.flush()?;

    info!(
        diagnosis_id = %diagnosis.diagnosis_id,
        label = %diagnosis.label,
        models_agree = diagnosis.models_agree,
        "Diagnosis complete"
    );
    engine.metrics().log_summary();

    Ok(())
}
