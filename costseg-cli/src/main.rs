use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{debug, info};

use costseg_cli::config::AppConfig;
use costseg_cli::logging::init_logging;
use costseg_cli::output::{self, OutputFormat};
use costseg_core::calculations::parse_flexible_date;
use costseg_core::{
    AssetClass, CommercialEstimator, DepreciationSchedule, EstimatorPayload, FieldValue,
    ResidentialEstimator,
};
use costseg_data::{EstimateMode, GuidelineLoader, RequestFields, example_payload};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Cost segregation estimator.
///
/// Splits a property's depreciable basis into MACRS asset classes and
/// projects the depreciation a study would unlock.
#[derive(Debug, Parser)]
#[command(name = "costseg", version, about)]
struct Cli {
    /// Configuration file. Defaults to `costseg.toml` in the working
    /// directory when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Estimate a single- or multi-family rental.
    Residential {
        /// Request file (`.json` or legacy `.txt`). Defaults apply when omitted.
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Estimate a commercial property from a guideline table.
    Commercial {
        /// Request file (`.json` or legacy `.txt`). Defaults apply when omitted.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Guideline CSV. Falls back to `guidelines` in the config file.
        #[arg(long)]
        guidelines: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Depreciation schedule for one asset class.
    ///
    /// With `--study-year` this is the lookback through that year; without it
    /// the whole recovery life is listed.
    Schedule {
        /// Basis in dollars (`$250,000` style decoration is accepted).
        #[arg(long, value_parser = parse_amount)]
        basis: Decimal,

        /// Asset class: 5, 7, 15, 27.5 or 39.
        #[arg(long, value_parser = parse_class)]
        class: AssetClass,

        /// Date placed in service.
        #[arg(long, value_parser = parse_date)]
        in_service: NaiveDate,

        #[arg(long)]
        study_year: Option<i32>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print an example request for a mode.
    Example { mode: EstimateMode },
}

// ─── argument parsers ────────────────────────────────────────────────────────

fn parse_amount(raw: &str) -> Result<Decimal, String> {
    FieldValue::parse(raw)
        .as_decimal()
        .ok_or_else(|| format!("'{raw}' is not an amount"))
}

fn parse_class(raw: &str) -> Result<AssetClass, String> {
    AssetClass::parse(raw).ok_or_else(|| format!("unknown asset class '{raw}'"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_flexible_date(&FieldValue::parse(raw)).ok_or_else(|| format!("'{raw}' is not a date"))
}

// ─── commands ────────────────────────────────────────────────────────────────

fn load_request(
    mode: EstimateMode,
    input: Option<&Path>,
) -> Result<RequestFields> {
    match input {
        Some(path) => RequestFields::load(mode, path)
            .with_context(|| format!("Failed to load request: {}", path.display())),
        None => {
            debug!(%mode, "no request file, using defaults");
            Ok(RequestFields::new(mode))
        }
    }
}

fn run_residential(
    config: &AppConfig,
    input: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let request = load_request(EstimateMode::Residential, input)?;

    let mut estimator = ResidentialEstimator::default();
    if let Some(year) = config.as_of_year {
        estimator = estimator.with_current_year(year);
    }
    let result = estimator.calculate(&request.to_residential_input());
    info!(
        tier = %result.tier,
        accelerated = %result.allocation.accelerated,
        "residential estimate complete"
    );

    Ok(match format {
        OutputFormat::Json => output::to_json(&result)?,
        OutputFormat::Table => output::residential_table(&result),
        OutputFormat::Payload => output::to_json(&EstimatorPayload::from_residential(
            &result,
            config.tax_savings_rate,
        ))?,
    })
}

fn run_commercial(
    config: &AppConfig,
    input: Option<&Path>,
    guidelines: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let Some(guidelines) = guidelines.or(config.guidelines.as_deref()) else {
        bail!("no guideline table: pass --guidelines or set `guidelines` in costseg.toml");
    };
    let table = GuidelineLoader::load_from_file(guidelines)
        .with_context(|| format!("Failed to load guidelines: {}", guidelines.display()))?;

    let request = load_request(EstimateMode::Commercial, input)?;
    let result = CommercialEstimator::default().calculate(&request.to_commercial_input(), &table);
    info!(
        property_type = %result.input.property_type,
        lookup_failed = result.lookup_failed,
        "commercial estimate complete"
    );

    Ok(match format {
        OutputFormat::Json => output::to_json(&result)?,
        OutputFormat::Table => output::commercial_table(&result),
        OutputFormat::Payload => output::to_json(&EstimatorPayload::from_commercial(
            &result,
            config.tax_savings_rate,
        ))?,
    })
}

fn run_schedule(
    basis: Decimal,
    class: AssetClass,
    in_service: NaiveDate,
    study_year: Option<i32>,
    format: OutputFormat,
) -> Result<String> {
    let schedule = DepreciationSchedule::statutory();

    Ok(match (study_year, format) {
        (_, OutputFormat::Payload) => {
            bail!("the payload format applies to residential and commercial estimates")
        }
        (Some(year), OutputFormat::Json) => {
            output::to_json(&schedule.lookback(basis, in_service, year, class))?
        }
        (Some(year), OutputFormat::Table) => {
            output::lookback_schedule_table(&schedule.lookback(basis, in_service, year, class))
        }
        (None, OutputFormat::Json) => {
            output::to_json(&schedule.full_schedule(basis, in_service, class))?
        }
        (None, OutputFormat::Table) => {
            output::full_schedule_table(&schedule.full_schedule(basis, in_service, class))
        }
    })
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(config.log_filter.as_deref());
    debug!(?config, "configuration loaded");

    let rendered = match cli.command {
        Command::Residential { input, format } => {
            run_residential(&config, input.as_deref(), format)?
        }
        Command::Commercial {
            input,
            guidelines,
            format,
        } => run_commercial(&config, input.as_deref(), guidelines.as_deref(), format)?,
        Command::Schedule {
            basis,
            class,
            in_service,
            study_year,
            format,
        } => run_schedule(basis, class, in_service, study_year, format)?,
        Command::Example { mode } => output::to_json(&example_payload(mode))?,
    };

    println!("{rendered}");
    Ok(())
}
