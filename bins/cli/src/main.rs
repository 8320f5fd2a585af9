//! travelfx command-line front end.
//!
//! Converts amounts, builds trip budget breakdowns and estimates trip costs.
//! Results are printed to stdout as JSON; logs go to stderr.

mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travelfx_core::budget::TravelStyle;
use travelfx_shared::{AppConfig, AppError, AppResult, CurrencyCode};

use crate::app::App;
use crate::commands::TripFile;

#[derive(Parser)]
#[command(
    name = "travelfx",
    version,
    about = "Trip budgets and currency conversion from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an amount between two currencies
    #[command(allow_negative_numbers = true)]
    Convert {
        /// Amount to convert
        amount: Decimal,
        /// Source currency code
        from: CurrencyCode,
        /// Target currency code
        to: CurrencyCode,
    },

    /// Total a trip file by category and print its breakdown
    Breakdown {
        /// Path to a JSON trip file
        file: PathBuf,
        /// Report in this currency instead of the file's
        #[arg(short, long)]
        base: Option<CurrencyCode>,
    },

    /// Estimate what a trip will cost
    Estimate {
        /// Trip length in days
        #[arg(short, long)]
        days: u32,
        /// Number of travelers
        #[arg(short, long, default_value_t = 1)]
        travelers: u32,
        /// Travel style
        #[arg(short, long, value_enum, default_value_t = Style::Moderate)]
        style: Style,
        /// Currency to report in (USD when omitted)
        #[arg(short, long)]
        currency: Option<CurrencyCode>,
    },

    /// List supported currencies
    Currencies,
}

#[derive(Clone, Copy, ValueEnum)]
enum Style {
    Budget,
    Moderate,
    Luxury,
}

impl From<Style> for TravelStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Budget => Self::Budget,
            Style::Moderate => Self::Moderate,
            Style::Luxury => Self::Luxury,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travelfx=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let app = App::new(config)?;

    app.load_snapshot();
    let outcome = run(&app, cli.command);
    app.save_snapshot();

    match outcome {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(err) => {
            error!(code = err.error_code(), severity = ?err.severity(), "{err}");
            Err(err.into())
        }
    }
}

fn run(app: &App, command: Commands) -> AppResult<String> {
    match command {
        Commands::Convert { amount, from, to } => to_json(&commands::convert(app, amount, from, to)?),
        Commands::Breakdown { file, base } => {
            let trip = TripFile::read(&file)?;
            to_json(&commands::breakdown(app, trip, base)?)
        }
        Commands::Estimate {
            days,
            travelers,
            style,
            currency,
        } => to_json(&commands::estimate(
            app,
            days,
            travelers,
            style.into(),
            currency,
        )?),
        Commands::Currencies => to_json(&commands::currencies(app)),
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Internal(err.to_string()))
}
