mod cli;

use crate::cli::{Command, LogFormatArg, CLI};
use anyhow::Context;
use clap::Parser;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use linklet_core::{Candidate, ClickEvent, EventLog, TracingEventLog};
use linklet_generator::{Allocator, Generator, RandomGenerator, RandomGeneratorSettings};
use linklet_shortener::{ClickOutcome, ShortenerService, ShortenerSettings, SlotOutcome, UrlRecord};
use linklet_storage::FileBackend;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        data_dir = %config.data_dir.display(),
        base_url = %config.base_url,
        log_format = %config.log_format,
        "starting linklet"
    );

    let backend = FileBackend::open(config.data_dir.clone())
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;
    let log: Arc<dyn EventLog> = Arc::new(TracingEventLog);
    let settings = ShortenerSettings::builder()
        .base_url(config.base_url.clone())
        .build();

    let generator = RandomGenerator::new(RandomGeneratorSettings::default())?;
    let service =
        ShortenerService::open(Arc::new(backend), Allocator::new(generator), log, settings);
    run(service, config.command)
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

fn run<G: Generator>(mut service: ShortenerService<G>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Shorten {
            url,
            validity,
            code,
        } => {
            let candidate = Candidate::new(url)
                .with_validity(validity.unwrap_or_default())
                .with_shortcode(code.unwrap_or_default());
            let record = service.shorten(candidate)?;
            print_record(&record);
        }
        Command::Batch { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let candidates: Vec<Candidate> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of candidates", file.display()))?;

            let report = service.shorten_batch(&candidates)?;
            for (index, slot) in report.slots.iter().enumerate() {
                match slot {
                    SlotOutcome::Skipped => println!("#{}: skipped", index + 1),
                    SlotOutcome::Rejected(errors) => println!("#{}: {errors}", index + 1),
                    SlotOutcome::Failed(e) => println!("#{}: {e}", index + 1),
                    SlotOutcome::Created(record) => {
                        print!("#{}: ", index + 1);
                        print_record(record);
                    }
                }
            }
        }
        Command::Click {
            code,
            source,
            location,
        } => {
            let event = ClickEvent::new(Timestamp::now(), source.into())
                .with_location(location.unwrap_or_default());
            match service.record_click(&code, event) {
                ClickOutcome::Recorded { count, durable } => {
                    println!("{code}: {count} clicks");
                    if !durable {
                        println!("warning: click could not be saved and will be lost on exit");
                    }
                }
                ClickOutcome::NotFound => anyhow::bail!("short code {code} does not exist"),
            }
        }
        Command::List => {
            let records = service.load_all();
            if records.is_empty() {
                println!("no shortened URLs yet");
            }
            for record in &records {
                print_record(record);
            }
        }
        Command::Stats { code } => {
            let stats = service
                .stats(&code)
                .with_context(|| format!("short code {code} does not exist"))?;
            println!("{} -> {}", stats.shortened_link, stats.original_url);
            println!("  created: {}", local_time(stats.creation_date));
            println!(
                "  expires: {}{}",
                local_time(stats.expiry_date),
                if stats.expired { " (expired)" } else { "" }
            );
            println!("  clicks:  {}", stats.total_clicks);
            for click in &stats.clicks {
                println!(
                    "    {}  {:<8}  {}",
                    local_time(click.timestamp),
                    click.source.to_string(),
                    click.location
                );
            }
        }
    }
    Ok(())
}

fn print_record(record: &UrlRecord) {
    println!(
        "{} -> {} (expires {})",
        record.shortened_link,
        record.original_url,
        local_time(record.expiry_date)
    );
}

fn local_time(timestamp: Timestamp) -> String {
    if timestamp == Timestamp::MAX {
        return "never".to_string();
    }
    timestamp
        .to_zoned(TimeZone::system())
        .strftime("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}
