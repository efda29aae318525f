use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transport_catalogue::error::RequestError;
use transport_catalogue::requests::{self, InputDocument};
use transport_catalogue::snapshot;

#[derive(Parser)]
#[command(name = "transport-catalogue")]
#[command(about = "Transit catalogue with shortest-time itinerary routing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load phase: read the base document on stdin, build the catalogue
    /// and routing graph, write the snapshot to serialization_settings.file.
    #[command(name = "make_base")]
    MakeBase,

    /// Query phase: read the stat document on stdin, restore the snapshot
    /// from serialization_settings.file, write the responses to stdout.
    #[command(name = "process_requests")]
    ProcessRequests,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "aborting");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), RequestError> {
    let document = read_document(io::stdin().lock())?;
    match command {
        Command::MakeBase => make_base(document),
        Command::ProcessRequests => process_requests(document),
    }
}

fn read_document<R: Read>(mut reader: R) -> Result<InputDocument, RequestError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    Ok(serde_json::from_str(&raw)?)
}

fn make_base(document: InputDocument) -> Result<(), RequestError> {
    let settings = document
        .routing_settings
        .ok_or(RequestError::MissingSection {
            section: "routing_settings",
        })?;
    let serialization = document
        .serialization_settings
        .ok_or(RequestError::MissingSection {
            section: "serialization_settings",
        })?;

    let (catalogue, router) = requests::build_base(&document.base_requests, settings)?;

    let file = File::create(&serialization.file)?;
    snapshot::save(&catalogue, &router, BufWriter::new(file))?;
    info!(file = %serialization.file.display(), "base written");
    Ok(())
}

fn process_requests(document: InputDocument) -> Result<(), RequestError> {
    let serialization = document
        .serialization_settings
        .ok_or(RequestError::MissingSection {
            section: "serialization_settings",
        })?;

    let file = File::open(&serialization.file)?;
    let (catalogue, router) = snapshot::load(BufReader::new(file))?;

    let responses =
        requests::process_stat_requests(&catalogue, &router, &document.stat_requests);

    let stdout = io::stdout().lock();
    let mut writer = BufWriter::new(stdout);
    serde_json::to_writer_pretty(&mut writer, &responses)?;
    writeln!(writer)?;
    Ok(())
}
