use clap::{Parser, Subcommand};
use colstream::config::Config;
use colstream::error::Result;
use colstream::plan::{Filter, PlanBuilder};
use colstream::stream::{CodecKind, StreamCursor, StreamReport};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colstream")]
#[command(about = "Reader for columnar near-data processing result streams")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a captured result stream and print a summary
    Dump {
        /// Captured stream file
        file: PathBuf,

        /// Codec the stream was compressed with
        #[arg(long)]
        codec: Option<CodecKind>,

        /// Number of rows to print
        #[arg(long)]
        trace_max: Option<usize>,

        /// Stop after this many records
        #[arg(long)]
        max_records: Option<u64>,
    },
    /// Print the processing plan sent when opening a stream
    Plan {
        /// File to scan on the storage side
        #[arg(long)]
        file: String,

        /// Columns to return, comma separated
        #[arg(long, value_delimiter = ',')]
        project: Vec<String>,

        /// Drop rows where this column is null
        #[arg(long)]
        not_null: Vec<String>,

        /// Output compression
        #[arg(long)]
        compression: Option<CodecKind>,

        /// Output compression level
        #[arg(long)]
        level: Option<u32>,

        #[arg(long, default_value_t = 0)]
        row_group: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path.clone())?,
        None => Config::default(),
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.config {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => info!("Using default configuration"),
    }

    match cli.command {
        Command::Dump {
            file,
            codec,
            trace_max,
            max_records,
        } => dump(&config, file, codec, trace_max, max_records),
        Command::Plan {
            file,
            project,
            not_null,
            compression,
            level,
            row_group,
        } => {
            let plan = not_null
                .into_iter()
                .fold(PlanBuilder::new(file), |builder, column| {
                    builder.filter(Filter::is_not_null(column))
                })
                .project(project)
                .output(
                    compression.unwrap_or(config.stream.codec),
                    level.unwrap_or(config.request.compression_level),
                )
                .row_group(row_group)
                .build();
            println!("{}", plan.to_xml()?);
            Ok(())
        }
    }
}

fn dump(
    config: &Config,
    path: PathBuf,
    codec: Option<CodecKind>,
    trace_max: Option<usize>,
    max_records: Option<u64>,
) -> Result<()> {
    let mut options = config.stream_options();
    if let Some(codec) = codec {
        options.codec = codec;
    }
    let trace_max = trace_max.unwrap_or(config.trace.record_max);

    info!("Reading {} with codec {}", path.display(), options.codec);
    let file = File::open(&path)?;
    let mut cursor = StreamCursor::new(BufReader::new(file), options);

    let started = Instant::now();
    match cursor.read_schema().map(|schema| schema.clone()) {
        Ok(schema) => {
            for column in schema.columns() {
                println!("Column {}: {}", column.index, column.logical_type);
            }
        }
        Err(e) => {
            finish(cursor.report(Some(e), started));
            return Ok(());
        }
    }

    let mut printed = 0usize;
    let mut seen = 0u64;
    let report = cursor.drain_with(|batch| {
        for row in 0..batch.record_count() {
            if printed >= trace_max {
                break;
            }
            if let Some(line) = batch.format_row(row) {
                println!("{}", line);
            }
            printed += 1;
        }
        seen += batch.record_count() as u64;
        max_records.map_or(true, |max| seen < max)
    });

    finish(report);
    Ok(())
}

/// Print the transfer summary and exit non-zero if the stream failed
fn finish(report: StreamReport) {
    println!("{}", report.summary());

    if let Some(e) = report.error {
        error!("Stream failed: {}", e);
        std::process::exit(1);
    }
}
