//! # Host Runtime
//!
//! The main loop that ticks the kernel on a wall-clock cadence and streams
//! its output as JSON lines. Kernel events and task telemetry come out of
//! the workload's queue together, so lines appear in the order things
//! happened within a cycle.

use crate::demo::{MedicalDemo, Telemetry};
use kernel_api::KernelError;
use services_logger::{JsonLinesSink, LogEntry, LogLevel, SinkError};
use sim_kernel::{CycleOutcome, Kernel, KernelConfig};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Output error: {0}")]
    Output(#[from] SinkError),

    #[error("Failed to open event log {}: {source}", path.display())]
    OpenEvents { path: PathBuf, source: io::Error },
}

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct HostRuntimeConfig {
    /// Cycles to run (0 = unlimited)
    pub max_cycles: u64,
    /// Wall-clock time between cycles, in milliseconds
    pub tick_interval_ms: u64,
    /// Write output here instead of stdout
    pub events_path: Option<PathBuf>,
    /// Only warnings and errors from the kernel itself
    pub quiet: bool,
    /// Kernel settings
    pub kernel: KernelConfig,
}

impl Default for HostRuntimeConfig {
    fn default() -> Self {
        Self {
            max_cycles: 0,
            tick_interval_ms: 500,
            events_path: None,
            quiet: false,
            kernel: KernelConfig::default(),
        }
    }
}

type Output = JsonLinesSink<Box<dyn Write>>;

/// Host runtime
pub struct HostRuntime {
    config: HostRuntimeConfig,
    kernel: Kernel,
    demo: MedicalDemo,
    output: Output,
    cycles: u64,
}

impl HostRuntime {
    /// Creates a runtime writing to stdout or to `config.events_path`
    pub fn new(config: HostRuntimeConfig) -> Result<Self, HostRuntimeError> {
        let writer: Box<dyn Write> = match &config.events_path {
            Some(path) => Box::new(File::create(path).map_err(|source| {
                HostRuntimeError::OpenEvents {
                    path: path.clone(),
                    source,
                }
            })?),
            None => Box::new(io::stdout()),
        };
        Self::with_output(config, writer)
    }

    /// Creates a runtime writing to `writer`
    ///
    /// Boots the kernel and installs the medical workload; nothing runs
    /// until [`run`](Self::run) or [`step`](Self::step).
    pub fn with_output(
        config: HostRuntimeConfig,
        writer: Box<dyn Write>,
    ) -> Result<Self, HostRuntimeError> {
        let min_level = if config.quiet {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        let mut output: Output = JsonLinesSink::new(writer).with_min_level(min_level);

        announce(&mut output, "Medical Device Kernel Demo")?;
        announce(&mut output, "Kernel: Initializing...")?;

        let mut kernel = Kernel::with_config(config.kernel.clone());
        let demo = MedicalDemo::install(&mut kernel)?;
        write_telemetry(&mut output, demo.drain())?;

        announce(&mut output, "Kernel: Initialization complete.")?;

        Ok(Self {
            config,
            kernel,
            demo,
            output,
            cycles: 0,
        })
    }

    /// Runs the host loop
    ///
    /// Returns after `max_cycles` cycles, or never if that is 0.
    pub fn run(&mut self) -> Result<(), HostRuntimeError> {
        announce(&mut self.output, "Kernel: Starting multitasking...")?;

        let interval = Duration::from_millis(self.config.tick_interval_ms);
        while self.config.max_cycles == 0 || self.cycles < self.config.max_cycles {
            self.step()?;
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }

        Ok(())
    }

    /// Runs one kernel cycle and flushes whatever it produced
    pub fn step(&mut self) -> Result<CycleOutcome, HostRuntimeError> {
        let outcome = self.kernel.tick();
        self.cycles += 1;
        write_telemetry(&mut self.output, self.demo.drain())?;
        Ok(outcome)
    }

    /// Cycles run so far
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn demo(&self) -> &MedicalDemo {
        &self.demo
    }

    pub fn config(&self) -> &HostRuntimeConfig {
        &self.config
    }
}

/// Host messages bypass the level filter
fn announce(output: &mut Output, message: &str) -> Result<(), SinkError> {
    output.write_line(&LogEntry::new(LogLevel::Info, message).to_json())
}

/// Writes queued telemetry in order
///
/// Only kernel events go through the level filter; task lines always pass.
fn write_telemetry(output: &mut Output, items: Vec<Telemetry>) -> Result<(), SinkError> {
    for item in items {
        match item {
            Telemetry::Event(record) => output.write_entry(&LogEntry::from(&record))?,
            Telemetry::Log(entry) => output.write_line(&entry.to_json())?,
            Telemetry::Data(sample) => output.write_line(&sample)?,
        }
    }
    Ok(())
}
