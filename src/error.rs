//! Error type for the referral tier core and its Postgres plumbing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A value from a collaborator could not be parsed, e.g. a `year_month`
    /// that is not `YYYY-MM`.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
