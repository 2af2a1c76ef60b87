//! leap_actuator: command-line entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use leap_actuator::app::{run, Mode, RunOptions, SourceKind};
use leap_actuator::config::AppConfig;
use leap_actuator::serial::SinkTarget;

#[derive(Parser)]
#[command(name = "leap_actuator", version, about = "LeapMotion hand tracking to serial actuator bridge")]
struct Cli {
    /// TOML config file; built-in tuning when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serial device to write commands to (asked for when omitted)
    #[arg(long, global = true)]
    port: Option<PathBuf>,

    /// Print commands to stdout instead of opening a port
    #[arg(long, global = true)]
    dry_run: bool,

    /// Where hand samples come from
    #[arg(long, value_enum, default_value = "sim", global = true)]
    source: SourceArg,

    /// Pose trace for `--source replay`
    #[arg(long, global = true)]
    trace: Option<PathBuf>,

    /// Replay speed multiplier; 0 replays as fast as possible
    #[arg(long, default_value_t = 1.0, global = true)]
    speed: f32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the HID mouse emulator
    Pointer,
    /// Drive the four-servo arm
    Arm,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg { Sim, Leap, Replay }

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    let mode = match cli.command {
        Commands::Pointer => Mode::Pointer,
        Commands::Arm     => Mode::Arm,
    };

    let source = match cli.source {
        SourceArg::Sim  => SourceKind::Sim,
        SourceArg::Leap => SourceKind::Leap,
        SourceArg::Replay => {
            let trace = match cli.trace {
                Some(t) => t,
                None    => bail!("--source replay needs --trace FILE"),
            };
            SourceKind::Replay { trace, speed: cli.speed }
        }
    };

    let sink = if cli.dry_run {
        SinkTarget::DryRun
    } else {
        match cli.port {
            Some(p) => SinkTarget::Serial(p),
            None    => SinkTarget::Serial(prompt_port()?),
        }
    };

    info!("{:?} mode, source {:?}, writing to {}", mode, source, sink);

    let stats = run(RunOptions { mode, source, sink, config })?;
    println!(
        "  {} frames, {} commands sent, {} failed",
        stats.frames, stats.sent, stats.failed
    );
    Ok(())
}

fn prompt_port() -> Result<PathBuf> {
    let line = read_line("  Serial port (e.g. /dev/ttyACM0 or COM3): ")
        .context("reading serial port from stdin")?;
    let port = line.trim();
    if port.is_empty() {
        bail!("no serial port given; pass --port PATH or --dry-run");
    }
    Ok(PathBuf::from(port))
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf)
}
