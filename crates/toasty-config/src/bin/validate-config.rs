//! Config validation CLI tool
//!
//! Validates a toastyd configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use toasty_config::{ConfigError, DriverConfig, CURRENT_CONFIG_VERSION};
use toasty_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a toastyd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match toasty_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!(
                "  Grace window: {}s, rolling window: {}s, cancel cooldown: {}s",
                policy.admission.grace_window.as_secs(),
                policy.admission.rolling_window.as_secs(),
                policy.admission.cancel_cooldown.as_secs()
            );
            println!(
                "  Priming: {} min, then {} ms pause",
                policy.actuation.priming_minutes,
                policy.actuation.priming_delay.as_millis()
            );
            match &policy.actuation.driver {
                DriverConfig::Command(cmd) => {
                    println!("  Driver: command ({})", cmd.argv.join(" "));
                }
                DriverConfig::Mock => println!("  Driver: mock"),
            }
            println!("  Beds: {}", policy.beds.len());

            if !policy.beds.is_empty() {
                println!();
                println!("Beds:");
                for bed in &policy.beds {
                    println!(
                        "  - {} [level {}, max {} min]: {}",
                        bed.bed_num, bed.level, bed.max_time, bed.name
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
