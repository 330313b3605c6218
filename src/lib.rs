pub mod decoding;
pub mod live;
pub mod models;
pub mod replay;
pub mod report;
pub mod segmentation;
pub mod settings;
pub mod signal;
mod utils;

use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;

pub use decoding::{DecodeProfile, Decoded, Decoder, ErrorBitVariant, ParseError};
pub use live::{LiveEvent, LiveSession};
pub use models::{ConfigRecord, ControllerState, SampleRecord, StateInterval, Timestamp};
pub use replay::{replay_file, replay_lines, ReplayReport};
pub use settings::Settings;

const USAGE: &str = "usage: doorwatch [--settings <file>] <logfile | ->";

#[derive(Debug, PartialEq)]
enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Debug, PartialEq)]
struct CliArgs {
    settings: Option<PathBuf>,
    input: Input,
}

fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut settings = None;
    let mut input = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                let path = args.next().context(USAGE)?;
                settings = Some(PathBuf::from(path));
            }
            "-" if input.is_none() => input = Some(Input::Stdin),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path if input.is_none() => input = Some(Input::File(PathBuf::from(path))),
            extra => bail!("unexpected argument {extra}\n{USAGE}"),
        }
    }

    Ok(CliArgs {
        settings,
        input: input.context(USAGE)?,
    })
}

/// Command-line entry point: replay a log file, or follow stdin live with `-`.
pub fn run() -> Result<()> {
    // RUST_LOG overrides the info default
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("doorwatch starting...");

    let args = parse_args(std::env::args().skip(1))?;
    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .apply_env()?;

    match args.input {
        Input::File(path) => {
            let report = replay_file(&path, &settings)?;
            print!(
                "{}",
                report::render_report(&report, settings.error_bit_variant())
            );
            Ok(())
        }
        Input::Stdin => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
            runtime.block_on(follow_stdin(&settings))
        }
    }
}

async fn follow_stdin(settings: &Settings) -> Result<()> {
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let (session, mut events) = LiveSession::start_with_events(reader, settings)?;
    let variant = settings.error_bit_variant();

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                LiveEvent::Sample(sample) => {
                    println!("{}", sample.timestamp);
                    print!("{}", report::render_sample(&sample, variant));
                }
                LiveEvent::Config(config) => println!("config {}", config.to_wire()),
                LiveEvent::Message(text) => println!("> {text}"),
                LiveEvent::Interval(interval) => {
                    println!("{}", report::render_interval(&interval))
                }
                LiveEvent::Rejected { line, error } => eprintln!("line {line}: {error}"),
            }
        }
    });

    let summary = session.wait().await?;
    printer.await.context("event printer task failed to join")?;

    info!(
        "session {} done: {} lines read, {} rejected",
        summary.session_id,
        summary.lines_read,
        summary.stats.rejected()
    );
    Ok(())
}
