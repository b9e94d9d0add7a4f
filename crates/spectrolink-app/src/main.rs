//! SpectroLink acquisition console.
//!
//! ```bash
//! # List serial ports
//! spectrolink ports
//!
//! # Acquire 132-sample frames from /dev/ttyUSB0 and record straight away
//! spectrolink acquire --port /dev/ttyUSB0 --samples 132 --record sweep.csv
//! ```

mod command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use spectrolink_core::{
    list_ports, AcquisitionConfig, AcquisitionHandle, ChannelDisplay, Mode, Playback,
    SerialByteSource, SerialConfig,
};
use spectrolink_decode::Frame;
use std::io::BufRead;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use command::{Command, HELP};

/// Frames the display may fall behind by before they are dropped.
const DISPLAY_BACKLOG: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "spectrolink")]
#[command(author, version, about = "Spectrum analyzer acquisition over a serial link", long_about = None)]
struct Cli {
    /// Logging verbosity level (RUST_LOG overrides)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    Ports,

    /// Acquire frames from a device and take commands on stdin
    Acquire {
        /// Serial port path (e.g., /dev/ttyUSB0 or COM3)
        #[arg(short, long)]
        port: String,

        #[arg(short, long, default_value_t = 115_200)]
        baud: u32,

        /// Samples per frame
        #[arg(short = 'n', long, default_value = "132")]
        samples: NonZeroUsize,

        /// Read timeout in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,

        /// Start recording into this file immediately
        #[arg(long)]
        record: Option<PathBuf>,

        /// Print frames as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct FrameLine<'a> {
    source: &'a str,
    peak_bin: Option<usize>,
    peak: Option<u16>,
    samples: &'a Frame,
}

fn render(source: &str, frame: &Frame, json: bool) -> String {
    let peak = frame.peak();
    if json {
        let line = FrameLine {
            source,
            peak_bin: peak.map(|(bin, _)| bin),
            peak: peak.map(|(_, v)| v),
            samples: frame,
        };
        serde_json::to_string(&line).unwrap_or_default()
    } else {
        match peak {
            Some((bin, value)) => format!(
                "[{source}] {} samples, peak {value} at bin {bin}",
                frame.len()
            ),
            None => format!("[{source}] empty frame"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    info!("SpectroLink v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Ports => {
            print_ports();
            Ok(())
        }
        Commands::Acquire {
            port,
            baud,
            samples,
            timeout_ms,
            record,
            json,
        } => {
            let serial = SerialConfig {
                port_name: port,
                baud_rate: baud,
                timeout: Duration::from_millis(timeout_ms),
                ..Default::default()
            };
            run_acquire(&serial, AcquisitionConfig { sample_count: samples }, record, json)
        }
    }
}

fn print_ports() {
    let ports = list_ports();
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for p in ports {
        match (p.vid, p.pid) {
            (Some(vid), Some(pid)) => println!(
                "{} ({:04X}:{:04X}) {}",
                p.port_name,
                vid,
                pid,
                p.product.as_deref().unwrap_or("")
            ),
            _ => println!("{} [{}]", p.port_name, p.port_type),
        }
    }
}

fn run_acquire(
    serial: &SerialConfig,
    config: AcquisitionConfig,
    record: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let source = SerialByteSource::open(serial).context("cannot acquire the device")?;
    info!(
        "listening on {}, {} samples per frame",
        source.name().unwrap_or_else(|| serial.port_name.clone()),
        config.sample_count
    );
    let (display, frames) = ChannelDisplay::new(DISPLAY_BACKLOG);
    let handle = AcquisitionHandle::spawn(source, display, config)?;

    // Display updates run beside the prompt and end once the loop drops its sender.
    let printer = std::thread::spawn(move || {
        for frame in frames {
            println!("{}", render("live", &frame, json));
        }
    });

    if let Some(path) = record {
        handle
            .start_recording_csv(&path)
            .with_context(|| format!("cannot record to {}", path.display()))?;
        println!("recording to {}", path.display());
    }

    let mut playback: Option<Playback> = None;
    println!("{HELP}");
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match line.parse::<Command>() {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if cmd == Command::Quit {
            break;
        }
        if let Err(e) = execute(&handle, &mut playback, cmd, json) {
            eprintln!("error: {e:#}");
        }
    }

    let status = handle.shutdown()?;
    join_display(printer);
    println!(
        "received {} frames, wasted {}",
        status.received, status.wasted
    );
    Ok(())
}

fn join_display(printer: std::thread::JoinHandle<()>) {
    if printer.join().is_err() {
        error!("display thread panicked");
    }
}

fn execute(
    handle: &AcquisitionHandle,
    playback: &mut Option<Playback>,
    cmd: Command,
    json: bool,
) -> Result<()> {
    match cmd {
        Command::Record(path) => {
            handle.start_recording_csv(&path)?;
            println!("recording to {}", path.display());
        }
        Command::Stop => match handle.status().mode {
            Mode::Recording => {
                handle.stop_recording()?;
                println!("recording stopped");
            }
            Mode::Playback => {
                handle.stop_playback()?;
                *playback = None;
                println!("playback stopped");
            }
            Mode::Idle => println!("nothing to stop"),
        },
        Command::Load(path) => {
            let loaded = handle
                .start_playback(&path)
                .with_context(|| format!("cannot load {}", path.display()))?;
            show(playback.insert(loaded), json);
        }
        Command::Next => step(playback, Playback::forward, json)?,
        Command::Prev => step(playback, Playback::backward, json)?,
        Command::Status => {
            let status = handle.status();
            println!(
                "mode: {}, received: {}, wasted: {}",
                status.mode, status.received, status.wasted
            );
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn step(
    playback: &mut Option<Playback>,
    advance: fn(&mut Playback) -> bool,
    json: bool,
) -> Result<()> {
    let Some(pb) = playback.as_mut() else {
        anyhow::bail!("no record loaded");
    };
    if advance(pb) {
        show(pb, json);
    } else {
        println!("{}", pb.label());
    }
    Ok(())
}

fn show(playback: &Playback, json: bool) {
    match playback.current() {
        Some(frame) => println!("{} {}", playback.label(), render("record", frame, json)),
        None => println!("{}", playback.label()),
    }
}
