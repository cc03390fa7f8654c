// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zayavka - a Telegram support-ticketing bot.
//!
//! Binary entry point: configuration, logging, wiring, and the event
//! dispatch loop.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use zayavka_config::ZayavkaConfig;
use zayavka_core::{Mailer, TicketStore, ZayavkaError};
use zayavka_engine::{spawn_fanout, Engine, EngineDeps, MediaStaging};
use zayavka_geo::NominatimGeocoder;
use zayavka_report::{write_report, ReportFilter};
use zayavka_storage::SqliteStore;
use zayavka_telegram::TelegramChannel;

/// Zayavka - a Telegram support-ticketing bot.
#[derive(Parser, Debug)]
#[command(name = "zayavka", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot.
    Serve,
    /// Create the database and apply migrations, then exit.
    InitDb,
    /// Export tickets to an XLSX report.
    Export {
        /// Which tickets to include.
        #[arg(value_enum, default_value_t = ExportFilter::AllTime)]
        filter: ExportFilter,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFilter {
    /// Tickets created today from 08:00 local time.
    Today,
    /// Every ticket on record.
    AllTime,
}

impl From<ExportFilter> for ReportFilter {
    fn from(filter: ExportFilter) -> Self {
        match filter {
            ExportFilter::Today => ReportFilter::Today,
            ExportFilter::AllTime => ReportFilter::AllTime,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match zayavka_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            for error in &errors {
                eprintln!("zayavka: config error: {error}");
            }
            std::process::exit(1);
        }
    };

    init_logging(&config.bot.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve(config).await,
        Some(Commands::InitDb) => init_db(&config).await,
        Some(Commands::Export { filter }) => export(&config, filter.into()).await,
        None => {
            println!("zayavka: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn init_db(config: &ZayavkaConfig) -> Result<(), ZayavkaError> {
    SqliteStore::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "database initialized");
    Ok(())
}

async fn export(config: &ZayavkaConfig, filter: ReportFilter) -> Result<(), ZayavkaError> {
    let store = SqliteStore::open(&config.storage.database_path).await?;
    let rows = store.report_rows(filter.since().as_deref()).await?;
    let path = write_report(&rows, filter, config.report.output_dir.as_ref())?;
    println!("{}", path.display());
    Ok(())
}

async fn serve(config: ZayavkaConfig) -> Result<(), ZayavkaError> {
    let token = config
        .bot
        .token
        .as_deref()
        .ok_or_else(|| ZayavkaError::Config("bot.token is required for serve".into()))?;

    let store = SqliteStore::open(&config.storage.database_path).await?;

    let mut channel =
        TelegramChannel::new(token, Duration::from_secs(config.bot.download_timeout_secs))?;
    channel.connect();
    let channel = Arc::new(channel);

    let geocoder = NominatimGeocoder::new(
        config.geocode.endpoint.clone(),
        Duration::from_secs(config.geocode.timeout_secs),
    )?;

    let mailer: Option<Arc<dyn Mailer>> =
        match (&config.email.from_address, &config.email.password) {
            (Some(from), Some(password)) => Some(Arc::new(zayavka_email::SmtpMailer::new(
                &config.email.smtp_host,
                from,
                password,
            )?)),
            _ => {
                info!("email credentials not configured, notifications go to chat only");
                None
            }
        };

    let (fanout, _fanout_worker) = spawn_fanout(channel.clone(), mailer);

    let media = MediaStaging::new(
        &config.media.staging_dir,
        &config.media.media_root,
        Duration::from_secs(config.media.staging_ttl_hours * 3600),
    );
    if let Err(e) = media.sweep().await {
        warn!(error = %e, "startup staging sweep failed");
    }

    let engine = Engine::new(EngineDeps {
        profiles: Arc::new(store.clone()),
        tickets: Arc::new(store.clone()),
        sessions: Arc::new(store.clone()),
        transport: channel.clone(),
        geocoder: Arc::new(geocoder),
        fanout,
        hours: config.hours.to_operating_hours(),
        media,
    });

    info!("zayavka serving");
    loop {
        let event = channel.receive().await?;
        if let Err(e) = engine.handle_event(event).await {
            error!(error = %e, "event handling failed");
        }
    }
}
