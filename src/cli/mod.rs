//! Command-line interface for Latmon.
//!
//! `latmon synth` demonstrates the engine under a generated concurrent
//! block I/O workload; `latmon replay` drives a captured trigger-event
//! stream through the probe on a replayed clock.

use crate::core::{Config, LatmonError, ManualClock, MonotonicClock, Result, SystemClock};
use crate::export::{self, ExportFormat};
use crate::probes::block_io::{BlockIoProbe, KernelVersion};
use crate::probes::{ProbeEvent, ProbeEventKind};
use crate::synth::{self, SynthOptions};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

/// Latency histograms from paired begin/end probe events
#[derive(Parser, Debug)]
#[command(name = "latmon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "LATMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "LATMON_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a synthetic concurrent block I/O workload and print the
    /// resulting histograms
    Synth {
        /// Number of I/O operations to generate
        #[arg(long, env = "LATMON_EVENTS", default_value_t = 2_000)]
        events: u64,

        /// Worker threads driving begin/end pairs
        #[arg(long, env = "LATMON_WORKERS", default_value_t = 4)]
        workers: usize,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: ExportFormat,
    },

    /// Replay a captured trigger-event stream (JSON lines)
    Replay {
        /// Event stream file
        file: PathBuf,

        /// Kernel version of the capture source, selects the disk
        /// resolver
        #[arg(long, default_value = "6.1.0")]
        kernel: KernelVersion,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: ExportFormat,
    },

    /// Validate configuration and exit
    CheckConfig,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration: file (if any), then CLI overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    LatmonError::config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                let config: Config = serde_yaml::from_str(&content).map_err(|e| {
                    LatmonError::config(format!("Failed to parse config file {:?}: {}", path, e))
                })?;
                tracing::info!("Loaded configuration from: {:?}", path);
                config
            },
            None => Config::default(),
        };

        if self.debug {
            config.logging.level = crate::core::LogLevel::Debug;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Initialize logging from the configuration, honoring `RUST_LOG`.
pub fn init_logging(config: &Config) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Execute the parsed command.
pub fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    init_logging(&config);

    match cli.command {
        Command::Synth {
            events,
            workers,
            format,
        } => {
            let probe = Arc::new(BlockIoProbe::new(
                &config.engine,
                Arc::new(SystemClock::new()) as Arc<dyn MonotonicClock>,
                // The synthetic trigger source fabricates both disk
                // backpointers, so any resolver works; pretend to be
                // a current kernel.
                KernelVersion(6, 1, 0),
            ));

            synth::run(&probe, SynthOptions { events, workers })?;
            report(&probe, config.engine.max_latency_slot, format)
        },

        Command::Replay {
            file,
            kernel,
            format,
        } => {
            let clock = Arc::new(ManualClock::new(0));
            let probe = BlockIoProbe::new(
                &config.engine,
                Arc::clone(&clock) as Arc<dyn MonotonicClock>,
                kernel,
            );

            let reader = std::io::BufReader::new(std::fs::File::open(&file)?);
            for (lineno, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let event: ProbeEvent = serde_json::from_str(&line).map_err(|e| {
                    LatmonError::replay(format!("{}:{}: {}", file.display(), lineno + 1, e))
                })?;

                clock.advance_to(event.at_ns);
                match event.kind {
                    ProbeEventKind::Insert => probe.on_insert(&event.request),
                    ProbeEventKind::Issue => probe.on_issue(&event.request),
                    ProbeEventKind::Complete => probe.on_complete(&event.request),
                }
            }

            report(&probe, config.engine.max_latency_slot, format)
        },

        Command::CheckConfig => {
            println!("Configuration OK");
            Ok(())
        },
    }
}

fn report(probe: &BlockIoProbe, max_slot: u16, format: ExportFormat) -> Result<()> {
    let snapshot = probe.snapshot();
    let groups = export::group_snapshot(&snapshot, max_slot);

    match format {
        ExportFormat::Text => {
            let stdout = std::io::stdout();
            export::render_text(&groups, max_slot, &mut stdout.lock())?;
        },
        ExportFormat::Json => {
            println!("{}", export::render_json(&groups)?);
        },
    }

    let stats = probe.session().stats();
    tracing::info!(
        in_flight = stats.in_flight,
        dropped_begins = stats.dropped_begins,
        dropped_increments = stats.dropped_increments,
        unmatched_ends = stats.unmatched_ends,
        "session summary"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_synth_defaults() {
        let cli = Cli::try_parse_from(["latmon", "synth"]).unwrap();
        match cli.command {
            Command::Synth {
                events, workers, ..
            } => {
                assert_eq!(events, 2_000);
                assert_eq!(workers, 4);
            },
            _ => panic!("expected synth command"),
        }
    }

    #[test]
    fn test_cli_parses_replay_kernel() {
        let cli =
            Cli::try_parse_from(["latmon", "replay", "events.jsonl", "--kernel", "5.10.0"])
                .unwrap();
        match cli.command {
            Command::Replay { kernel, .. } => assert_eq!(kernel, KernelVersion(5, 10, 0)),
            _ => panic!("expected replay command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_format() {
        assert!(Cli::try_parse_from(["latmon", "synth", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "latmon",
            "--config",
            "/nonexistent/latmon.yaml",
            "check-config",
        ])
        .unwrap();
        assert!(cli.load_config().is_err());
    }
}
