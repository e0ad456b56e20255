use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use referral_tiers::config::Settings;
use referral_tiers::db;
use referral_tiers::listing::{build_listing, TierListing};
use referral_tiers::month::YearMonth;
use referral_tiers::report::{self, format_mslr};
use referral_tiers::selector::{self, TierFilter};
use referral_tiers::tier::{FixedThresholdTierStrategy, PercentileTierStrategy, TierStrategy};

#[derive(Parser)]
#[command(name = "referral-tiers")]
#[command(about = "Referral tier scoring for dental practice campaign targeting", long_about = None)]
struct Cli {
    /// Optional TOML settings file.
    #[arg(short, long, default_value = "referral-tiers.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Rank offices against the top share of the cohort
    Percentile,
    /// Judge each office against fixed engagement thresholds
    Fixed,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample offices and referral history
    Seed,
    /// Import monthly referral counts from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show L12, R3 and months since last referral per office
    Profiles {
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// List offices for campaign targeting
    Tiers {
        #[arg(long, value_enum, default_value_t = StrategyArg::Percentile)]
        strategy: StrategyArg,
        /// `all`, one tier, or a comma-separated list such as `vip,warm`
        #[arg(long, default_value = "all")]
        tier: String,
        /// Case-insensitive match against office name or address
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value_t = 25)]
        limit: usize,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Generate a markdown tier report
    Report {
        #[arg(long, value_enum, default_value_t = StrategyArg::Percentile)]
        strategy: StrategyArg,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn strategy_for(arg: StrategyArg, settings: &Settings) -> anyhow::Result<Box<dyn TierStrategy>> {
    let strategy: Box<dyn TierStrategy> = match arg {
        StrategyArg::Percentile => Box::new(PercentileTierStrategy::new(settings.percentile)?),
        StrategyArg::Fixed => Box::new(FixedThresholdTierStrategy::new(settings.fixed)),
    };
    Ok(strategy)
}

async fn load_listing(
    pool: &sqlx::PgPool,
    as_of: NaiveDate,
    strategy: &dyn TierStrategy,
) -> anyhow::Result<TierListing> {
    let offices = db::fetch_offices(pool).await?;
    let records = db::fetch_referrals(pool).await?;
    let listing = build_listing(offices, &records, as_of, strategy)
        .context("failed to classify referral cohort")?;

    if !listing.rejected.is_empty() {
        tracing::warn!(
            rows = listing.rejected.len(),
            "some referral rows were excluded from aggregation"
        );
    }
    Ok(listing)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    let database_url = settings
        .database_url()
        .context("DATABASE_URL or REFERRAL_TIERS_DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let today = Utc::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let rows = db::seed(&pool, YearMonth::of(today)).await?;
            println!("Seed data inserted ({rows} monthly rows).");
        }
        Commands::Import { csv } => {
            let summary = db::import_csv(&pool, &csv).await?;
            println!(
                "Imported {} monthly rows from {} ({} skipped).",
                summary.upserted,
                csv.display(),
                summary.skipped
            );
        }
        Commands::Profiles { as_of } => {
            let as_of = as_of.unwrap_or(today);
            let listing = load_listing(&pool, as_of, &PercentileTierStrategy::default()).await?;

            if listing.offices.is_empty() {
                println!("No offices on file.");
                return Ok(());
            }

            println!("Referral profiles as of {as_of}:");
            for entry in listing.offices.iter() {
                println!(
                    "- {}: L12 {} / R3 {} / MSLR {}",
                    entry.office.name,
                    entry.profile.l12,
                    entry.profile.r3,
                    format_mslr(entry.profile.mslr)
                );
            }
            for rejection in listing.rejected.iter() {
                println!(
                    "! excluded row for office {} ({:?}): {}",
                    rejection.record.office_id, rejection.record.year_month, rejection.error
                );
            }
        }
        Commands::Tiers {
            strategy,
            tier,
            query,
            limit,
            as_of,
        } => {
            let as_of = as_of.unwrap_or(today);
            let filter: TierFilter = tier.parse()?;
            let strategy = strategy_for(strategy, &settings)?;
            let mut listing = load_listing(&pool, as_of, strategy.as_ref()).await?;

            selector::sort_for_targeting(&mut listing.offices);
            let selected = selector::filter_by_tier_and_query(&listing.offices, &filter, &query);

            if selected.is_empty() {
                println!("No offices match this selection.");
                return Ok(());
            }

            println!("Offices by {} tier as of {as_of}:", strategy.name());
            for entry in selected.iter().take(limit) {
                println!(
                    "- [{}] {} ({}) L12 {} / R3 {} / MSLR {}",
                    entry.tier,
                    entry.office.name,
                    entry.office.address,
                    entry.profile.l12,
                    entry.profile.r3,
                    format_mslr(entry.profile.mslr)
                );
            }
        }
        Commands::Report {
            strategy,
            as_of,
            out,
        } => {
            let as_of = as_of.unwrap_or(today);
            let strategy = strategy_for(strategy, &settings)?;
            let listing = load_listing(&pool, as_of, strategy.as_ref()).await?;
            let report = report::build_report(
                strategy.name(),
                as_of,
                &listing.offices,
                &listing.rejected,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
