use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ingesta::config::{load_settings, Settings};
use ingesta::logging::init_logging;
use ingesta::report::{export, write_report, ReportFormat};
use ingesta::{ExecuteCommand, IngestionService, Status};

/// Ingesta - batch ingestion of spreadsheet and XML files
#[derive(Parser, Debug)]
#[command(name = "ingesta")]
#[command(version)]
#[command(about = "Runs the configured ingestion jobs and prints the run report", long_about = None)]
struct Cli {
    /// Settings file (JSON). Defaults to ~/.ingesta/settings.json when present
    #[arg(short = 's', long = "settings")]
    settings: Option<PathBuf>,

    /// Only run the named job (repeatable)
    #[arg(short = 'j', long = "job")]
    jobs: Vec<String>,

    /// Report output format
    #[arg(long = "format", value_enum, default_value_t = ReportFormat::Csv)]
    format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Mark the run as scheduled rather than manually triggered
    #[arg(long = "scheduled", conflicts_with = "jobs")]
    scheduled: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match resolve_settings(cli.settings.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_logging(&settings.log_level, settings.log_format) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let service = match IngestionService::from_settings(&settings) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let command = if cli.scheduled {
        ExecuteCommand::from_scheduler()
    } else {
        ExecuteCommand::manual(cli.jobs)
    };
    let report = service.execute(&command);

    if let Some(directory) = &settings.report_directory {
        let path = directory.join(format!("report-{}.{}", report.id, cli.format.extension()));
        let written = std::fs::create_dir_all(directory)
            .map_err(|e| e.to_string())
            .and_then(|()| write_report(&report, cli.format, &path).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Warning: could not save report in {}: {}", directory.display(), e);
        }
    }

    let emitted = match &cli.output {
        Some(path) => write_report(&report, cli.format, path).map_err(|e| e.to_string()),
        None => export(&report, cli.format)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                std::io::stdout()
                    .write_all(&bytes)
                    .map_err(|e| e.to_string())
            }),
    };
    if let Err(e) = emitted {
        eprintln!("Error: failed to write report: {}", e);
        return ExitCode::from(2);
    }

    if report.status == Status::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn resolve_settings(path: Option<&PathBuf>) -> Result<Settings, ingesta::ConfigError> {
    if let Some(path) = path {
        return load_settings(path);
    }

    let default_path = dirs::home_dir().map(|home| home.join(".ingesta").join("settings.json"));
    match default_path {
        Some(path) if path.is_file() => load_settings(&path),
        _ => Ok(Settings::default()),
    }
}
