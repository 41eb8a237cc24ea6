//! Command-line interface for trade-ingest
//!
//! # Usage Examples
//!
//! ```bash
//! # Publish a CSV of trades to the trade-data topic
//! trade-ingest publish \
//!   --source trades_data.csv \
//!   --topic trade-data \
//!   --brokers 127.0.0.1:9092
//!
//! # Tune backpressure and retry behavior
//! trade-ingest publish \
//!   --source trades_data.csv \
//!   --topic trade-data \
//!   --queue-capacity 500 \
//!   --max-retries 5
//!
//! # Headerless file with explicit column names, halting on bad rows
//! trade-ingest publish \
//!   --source trades.csv \
//!   --topic trade-data \
//!   --no-headers --column-names id,symbol,price,qty \
//!   --on-source-error halt
//! ```
//!
//! Exit codes: 0 - completed with every record acknowledged; 1 - completed
//! with failed records; 2 - cancelled (Ctrl-C, halt policy, or a fatal
//! transport error).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use trade_ingest::{
    exit_code, CsvRecordSource, CsvSourceOptions, KafkaTransport, LogObserver, Publisher,
    PublisherConfig, SourceErrorPolicy,
};
use trade_ingest_publisher::{DEFAULT_MAX_RETRIES, DEFAULT_QUEUE_CAPACITY};

#[derive(Parser)]
#[command(name = "trade-ingest")]
#[command(about = "Publishes tabular trade records from CSV files to a Kafka topic")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish records from a CSV file to a Kafka topic
    Publish {
        /// Path to the source CSV file
        #[arg(long)]
        source: PathBuf,

        /// Target Kafka topic
        #[arg(long)]
        topic: String,

        /// Kafka bootstrap servers
        #[arg(long, default_value = "127.0.0.1:9092", env = "KAFKA_BROKERS")]
        brokers: String,

        /// Bounded publish queue capacity (delivery credits)
        #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
        queue_capacity: usize,

        /// Maximum delivery retries per record
        #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
        max_retries: u32,

        /// Seconds to wait for in-flight deliveries when cancelled
        #[arg(long, default_value_t = 30)]
        drain_timeout_secs: u64,

        /// CSV field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,

        /// Treat the first row as data, not headers (requires --column-names)
        #[arg(long)]
        no_headers: bool,

        /// Comma-separated column names, overriding the header row
        #[arg(long, value_delimiter = ',')]
        column_names: Option<Vec<String>>,

        /// What to do when a source row cannot be parsed
        #[arg(long, value_enum, default_value = "skip")]
        on_source_error: SourceErrorArg,

        /// Create the topic if it does not exist
        #[arg(long)]
        create_topic: bool,

        /// Partition count when creating the topic
        #[arg(long, default_value_t = 1)]
        partitions: i32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceErrorArg {
    /// Log the row and continue
    Skip,
    /// Stop the run on the first unreadable row
    Halt,
}

impl From<SourceErrorArg> for SourceErrorPolicy {
    fn from(arg: SourceErrorArg) -> Self {
        match arg {
            SourceErrorArg::Skip => SourceErrorPolicy::Skip,
            SourceErrorArg::Halt => SourceErrorPolicy::Halt,
        }
    }
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            2
        }
    };
    std::process::exit(code);
}

async fn run() -> anyhow::Result<i32> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            source,
            topic,
            brokers,
            queue_capacity,
            max_retries,
            drain_timeout_secs,
            delimiter,
            no_headers,
            column_names,
            on_source_error,
            create_topic,
            partitions,
        } => {
            let delimiter = u8::try_from(delimiter)
                .ok()
                .filter(u8::is_ascii)
                .context("delimiter must be a single ASCII character")?;

            let options = CsvSourceOptions {
                has_headers: !no_headers,
                delimiter,
                column_names,
            };
            let records = CsvRecordSource::open(&source, options)
                .with_context(|| format!("failed to open source {}", source.display()))?;

            let transport = KafkaTransport::connect(&brokers)
                .with_context(|| format!("failed to connect to Kafka at {brokers}"))?;
            if create_topic {
                transport
                    .create_topic_if_not_exists(&topic, partitions)
                    .await
                    .with_context(|| format!("failed to create topic '{topic}'"))?;
            }

            let config = PublisherConfig::new(&topic)
                .with_queue_capacity(queue_capacity)
                .with_max_retries(max_retries)
                .with_drain_timeout(Duration::from_secs(drain_timeout_secs))
                .with_source_error_policy(on_source_error.into());

            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("interrupt received, cancelling run");
                        cancel.cancel();
                    }
                });
            }

            let publisher = Publisher::new(records, Arc::new(transport), config)
                .with_observer(Arc::new(LogObserver));
            let summary = publisher.run(cancel).await;

            Ok(exit_code(&summary))
        }
    }
}
