use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use a3s_pii::{BatchProcessor, PiiError, RecordProcessor, ScanConfig};

#[derive(Parser)]
#[command(
    name = "a3s-pii",
    about = "a3s-pii: flag and redact PII in a CSV of JSON records"
)]
struct Cli {
    /// Input CSV with an id column and an embedded JSON payload column
    input: PathBuf,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Column holding the record identifier
    #[arg(long)]
    id_column: Option<String>,

    /// Column holding the JSON payload
    #[arg(long)]
    data_column: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(&cli, &config);
    match &result {
        Ok(_) | Err(PiiError::InputNotFound(_)) => println!("{}", status_line(&result)),
        Err(_) => eprintln!("{}", status_line(&result)),
    }
    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Config file values with command-line flags applied on top
fn resolve_config(cli: &Cli) -> a3s_pii::Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(id_column) = &cli.id_column {
        config.id_column = id_column.clone();
    }
    if let Some(data_column) = &cli.data_column {
        config.data_column = data_column.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Run the batch and return the path written
fn run(cli: &Cli, config: &ScanConfig) -> a3s_pii::Result<PathBuf> {
    // checked before anything is created on disk
    if !cli.input.is_file() {
        return Err(PiiError::InputNotFound(cli.input.clone()));
    }

    let custom = config.build_classifier()?;
    let processor = match &custom {
        Some(classifier) => RecordProcessor::new(classifier),
        None => RecordProcessor::builtin(),
    };
    let batch = BatchProcessor::new(processor, config);
    let summary = batch.process_file(&cli.input, &config.output)?;

    tracing::debug!(?summary, "Summary");
    Ok(config.output.clone())
}

fn status_line(result: &a3s_pii::Result<PathBuf>) -> String {
    match result {
        Ok(output) => format!("saved the file '{}'", output.display()),
        Err(e @ PiiError::InputNotFound(_)) => e.to_string(),
        Err(e) => format!("error: {}", e),
    }
}
