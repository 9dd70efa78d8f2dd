//! Config validation CLI tool
//!
//! Validates a fieldtrack configuration file and reports any errors.

use fieldtrack_util::{default_config_path, format_duration};
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
            eprintln!("Validates a fieldtrack configuration file.");
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

    match fieldtrack_config::load_config(&config_path) {
        Ok(config) => {
            let c = &config.classifier;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", fieldtrack_config::CURRENT_CONFIG_VERSION);
            println!(
                "  {}: ({:.6}, {:.6}) radius {} m",
                c.home.name, c.home.center.latitude, c.home.center.longitude, c.home.radius_meters
            );
            println!("  Stationary spread: {} m", c.stationary_distance_meters);
            println!("  Dwell time: {}", format_duration(c.dwell_time));
            println!("  Moving speed: {} m/s", c.moving_speed_mps);
            println!(
                "  Moving distance: {} m within {}",
                c.moving_distance_meters,
                format_duration(c.moving_window)
            );
            println!("  Sampling interval: {}", format_duration(c.sampling_interval));
            println!("  History capacity: {} fixes", c.max_history_len());
            println!("  Stale fix after: {}", format_duration(config.stale_fix_after));
            println!("  Data dir: {}", config.data_dir.display());

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                fieldtrack_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                fieldtrack_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                fieldtrack_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                fieldtrack_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        fieldtrack_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
