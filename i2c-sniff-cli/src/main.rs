//! I2C Sniffer CLI Application
//!
//! This is the host-side driver for the i2c-sniff-decoder library.
//! It adds:
//! - TOML configuration with command-line overrides
//! - Replay of recorded line-sample traces (or a built-in demo trace)
//! - Text and JSON transaction reports

use anyhow::{Context, Result};
use clap::Parser;
use i2c_sniff_decoder::{Decoder, DecoderConfig, ReplayLines, Reporter, Sniffer};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::{AnyReporter, JsonReporter, TextReporter};

/// I2C Sniffer - Decode two-wire bus transactions from line samples
#[derive(Parser, Debug)]
#[command(name = "i2c-sniff")]
#[command(about = "Decode I2C transactions from polled SDA/SCL samples", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a line-sample trace (one "<sda><scl>" pair per line)
    #[arg(short, long, value_name = "FILE", conflicts_with = "demo")]
    trace: Option<PathBuf>,

    /// Replay the built-in demo trace
    #[arg(long)]
    demo: bool,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of transaction slots
    #[arg(long, value_name = "N")]
    capacity: Option<usize>,

    /// Maximum bytes kept per transaction
    #[arg(long, value_name = "N")]
    max_bytes: Option<usize>,

    /// Closed transactions collected before each capture is reported
    #[arg(long, value_name = "N")]
    threshold: Option<usize>,

    /// Never stretch the clock
    #[arg(long)]
    no_stretch: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for decoded transactions (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("I2C Sniffer CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", i2c_sniff_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);

    // Reject bad settings before any sample is replayed
    config
        .decoder
        .validate()
        .context("Invalid decoder configuration")?;

    let samples = if let Some(path) = &args.trace {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file: {:?}", path))?;
        i2c_sniff_decoder::parse_trace(&text)
            .with_context(|| format!("Failed to parse trace file: {:?}", path))?
    } else if args.demo {
        i2c_sniff_decoder::demo_trace()
    } else {
        println!("I2C Sniffer - No input specified");
        println!("\nQuick Start:");
        println!("  i2c-sniff --demo");
        println!("  i2c-sniff --trace capture.txt --format json");
        println!("\nUse --help for more options");
        return Ok(());
    };

    print_banner(&config.decoder, args.quiet);

    let out: Box<dyn Write> = match &config.output.path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        )),
        None => Box::new(io::stdout()),
    };
    let reporter = match config.output.format {
        OutputFormat::Text => AnyReporter::Text(TextReporter::new(out)),
        OutputFormat::Json => AnyReporter::Json(JsonReporter::new(out)),
    };

    replay(samples, config.decoder, reporter)?;
    Ok(())
}

/// Command-line flags win over the configuration file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(capacity) = args.capacity {
        config.decoder.buffer_capacity = capacity;
    }
    if let Some(max_bytes) = args.max_bytes {
        config.decoder.max_transaction_bytes = max_bytes;
    }
    if let Some(threshold) = args.threshold {
        config.decoder.capture_threshold = threshold;
    }
    if args.no_stretch {
        config.decoder.stretch = None;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(output) = &args.output {
        config.output.path = Some(output.clone());
    }
}

fn print_banner(config: &DecoderConfig, quiet: bool) {
    if quiet {
        return;
    }
    eprintln!("I2C protocol analyzer started");
    eprintln!("  transaction capturing depth      = {:6}", config.buffer_capacity);
    eprintln!("  transaction maximum byte length  = {:6}", config.max_transaction_bytes);
    eprintln!("  memory size for data capturing   = {:6}", config.memory_footprint());
}

fn replay<R: Reporter>(
    samples: Vec<i2c_sniff_decoder::LineSample>,
    config: DecoderConfig,
    reporter: R,
) -> Result<R> {
    log::info!("Replaying {} samples", samples.len());

    let decoder = Decoder::new(config)?;
    let mut sniffer = Sniffer::new(ReplayLines::new(samples), decoder, reporter);
    let stats = sniffer.run(&AtomicBool::new(false))?;

    log::info!(
        "Done: {} polls, {} start(s), {} repeated start(s), {} stop(s)",
        stats.polls,
        stats.starts,
        stats.repeated_starts,
        stats.stops
    );
    log::info!(
        "Reported {} transaction(s) in {} capture(s), {} clock stretch(es)",
        stats.transactions_reported,
        stats.captures,
        stats.stretches
    );
    if stats.overflows > 0 {
        log::warn!("{} transaction(s) were truncated", stats.overflows);
    }
    if stats.report_failures > 0 {
        anyhow::bail!("{} capture(s) could not be written", stats.report_failures);
    }

    let (_, _, reporter) = sniffer.into_parts();
    Ok(reporter)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_beat_config_file() {
        let args = Args::parse_from([
            "i2c-sniff",
            "--demo",
            "--threshold",
            "4",
            "--no-stretch",
            "--format",
            "json",
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.decoder.capture_threshold, 4);
        assert!(config.decoder.stretch.is_none());
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.decoder.buffer_capacity, 32);
    }

    #[test]
    fn test_trace_and_demo_conflict() {
        assert!(Args::try_parse_from(["i2c-sniff", "--demo", "--trace", "t.txt"]).is_err());
    }

    #[test]
    fn test_demo_replay_to_text() {
        let reporter = TextReporter::new(Vec::new());
        let reporter = replay(i2c_sniff_decoder::demo_trace(), DecoderConfig::new(), reporter).unwrap();

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "#00000 ( 2) : [S] 0xA0-W[A] 0x00[A] 0x10[A] [P]",
                "#00001 ( 1) : [S] 0xA0-W[A] 0x10[A]",
                "#00002 ( 2) : [R] 0xA0-R[A] 0xDE[A] 0xAD[N] [P]",
            ]
        );
    }
}
