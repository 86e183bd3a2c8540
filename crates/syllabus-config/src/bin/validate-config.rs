//! Config validation CLI tool
//!
//! Validates a syllabus configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use syllabus_util::{default_config_path, format_datetime_full};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a syllabus configuration file.");
            eprintln!();
            eprintln!("Default location: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match syllabus_config::load_config(&config_path) {
        Ok(settings) => {
            let calendar = settings.service.calendar;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", syllabus_config::CURRENT_CONFIG_VERSION);
            println!("  Calendar: {}", calendar);
            match settings.service.expand.max_occurrences {
                Some(limit) => println!("  Occurrence cap: {} per session", limit),
                None => println!("  Occurrence cap: none"),
            }
            println!("  Sessions: {}", settings.sessions.len());

            if !settings.sessions.is_empty() {
                println!();
                println!("Sessions:");
                for session in &settings.sessions {
                    let schedule = match session.active_rule() {
                        Some(rule) => format!("recurring ({})", rule),
                        None => "one-off".to_string(),
                    };
                    println!(
                        "  - {} [{}]: {} from {}",
                        session.id,
                        schedule,
                        session.title,
                        format_datetime_full(session.start_time, calendar)
                    );
                    if !session.excluded_dates.is_empty() {
                        println!("      excluded: {}", session.excluded_dates.len());
                    }
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                syllabus_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                syllabus_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                syllabus_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                syllabus_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        syllabus_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
