//! Standalone binary to validate runtime config files against the config schema.
//!
//! Usage: `validate_config [--schema] <file.json|file.yaml>...`
//! Falls back to `AIRI_CORE_CONFIG` when no file is given.

use airi_core::config::{ConfigBackend, ConfigValidator, FileBackend};
use airi_core::Error;
use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut print_schema = false;
    let mut files = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--schema" => print_schema = true,
            _ => files.push(PathBuf::from(arg)),
        }
    }

    let validator = ConfigValidator::shared()?;
    if print_schema {
        println!("{}", serde_json::to_string_pretty(validator.json_schema())?);
        if files.is_empty() {
            return Ok(());
        }
    }

    if files.is_empty() {
        match std::env::var("AIRI_CORE_CONFIG") {
            Ok(path) => files.push(PathBuf::from(path)),
            Err(_) => bail!("no config file given (pass a path or set AIRI_CORE_CONFIG)"),
        }
    }

    let mut failed = 0usize;
    println!("=== Validating Config Files ===");
    for path in &files {
        print!("Validating {}... ", path.display());
        if !path.exists() {
            println!("❌");
            println!("  file not found");
            failed += 1;
            continue;
        }
        let raw = FileBackend::new(path)
            .get()
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        match validator.validate(&raw) {
            Ok(_) => println!("✅"),
            Err(Error::ConfigValidation { issues }) => {
                println!("❌");
                for issue in &issues {
                    println!("  {}", issue);
                }
                failed += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("validating {}", path.display())),
        }
    }

    println!("\n=== Summary ===");
    if failed == 0 {
        println!("✅ All config files are valid!");
        Ok(())
    } else {
        println!("❌ {} of {} file(s) failed validation", failed, files.len());
        std::process::exit(1);
    }
}
