//! Config validation CLI tool
//!
//! Validates a dwelld configuration file and reports any errors.

use dwell_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a dwelld configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match dwell_config::load_config(&config_path) {
        Ok(config) => {
            let t = &config.tracking;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", dwell_config::CURRENT_CONFIG_VERSION);
            println!("  Listen address: {}", config.service.listen_addr);
            println!("  Data directory: {}", config.service.data_dir.display());
            println!(
                "  Heartbeat: every {}s (min {}s, max credit {}s)",
                t.heartbeat_interval.as_secs(),
                t.min_interval.as_secs(),
                t.max_increment.as_secs()
            );
            println!(
                "  Sessions: rotate after {}s, at most {} concurrent",
                t.max_session.as_secs(),
                t.max_parallel_sessions
            );
            println!("  Subsections: {}", config.subsections.len());

            if !config.subsections.is_empty() {
                println!();
                println!("Subsections:");
                for subsection in &config.subsections {
                    let threshold = match subsection.required_time_minutes {
                        Some(minutes) => format!("{} min recommended", minutes),
                        None => format!("{}s minimum", subsection.min_time_seconds),
                    };
                    println!("  - {}: {}", subsection.subsection_id, threshold);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                dwell_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                dwell_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                dwell_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                dwell_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        dwell_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
