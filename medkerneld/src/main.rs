//! # Medical Kernel Host Daemon
//!
//! Main entry point for the host runtime.

use medkerneld::{HostRuntime, HostRuntimeConfig};
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("medkerneld");

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(program);
        process::exit(1);
    });

    let mut runtime = HostRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    if let Err(e) = runtime.run() {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<HostRuntimeConfig, String> {
    let mut config = HostRuntimeConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--cycles" | "-n" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --cycles")?;
                config.max_cycles = value
                    .parse()
                    .map_err(|_| format!("Invalid cycles value: {}", value))?;
            }
            "--tick-ms" | "-t" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --tick-ms")?;
                config.tick_interval_ms = value
                    .parse()
                    .map_err(|_| format!("Invalid tick-ms value: {}", value))?;
            }
            "--events" | "-e" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --events")?;
                config.events_path = Some(PathBuf::from(value));
            }
            "--quiet" | "-q" => {
                config.quiet = true;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -n, --cycles <N>         Cycles to run (0 = unlimited, default)");
    eprintln!("  -t, --tick-ms <MS>       Milliseconds between ticks (default 500)");
    eprintln!("  -e, --events <FILE>      Write JSON lines to FILE instead of stdout");
    eprintln!("  -q, --quiet              Only kernel warnings and errors");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --cycles 20 --tick-ms 0", program);
    eprintln!("  {} --events run.jsonl --quiet", program);
}
