use std::path::Path;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{MonthlyReferralRecord, Office};
use crate::month::YearMonth;

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_office(pool: &PgPool, name: &str, address: &str) -> Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO referral_tiers.offices (id, name, address)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET address = EXCLUDED.address
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(address)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

async fn upsert_referrals(
    pool: &PgPool,
    office_id: Uuid,
    year_month: &str,
    referral_count: i64,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO referral_tiers.monthly_referrals
        (id, office_id, year_month, referral_count)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (office_id, year_month) DO UPDATE
        SET referral_count = EXCLUDED.referral_count, recorded_at = now()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(office_id)
    .bind(year_month)
    .bind(referral_count)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Loads four sample offices with fourteen months of history ending at `anchor`.
pub async fn seed(pool: &PgPool, anchor: YearMonth) -> Result<usize> {
    let offices: [(&str, &str, [i64; 14]); 4] = [
        (
            "Bright Smiles Dental",
            "12 Oak St, Springfield",
            [3, 2, 4, 1, 2, 3, 2, 1, 3, 2, 4, 3, 1, 2],
        ),
        (
            "Cedar Family Dentistry",
            "4 Cedar Ave, Shelbyville",
            [1, 0, 1, 1, 0, 2, 0, 1, 0, 1, 0, 1, 0, 0],
        ),
        (
            "Oak Ridge Pediatric",
            "900 Ridge Rd, Springfield",
            [0, 0, 0, 0, 1, 2, 0, 1, 0, 0, 1, 0, 2, 1],
        ),
        (
            "Harbor Dental Group",
            "1 Harbor Way, Ogdenville",
            [0; 14],
        ),
    ];

    let mut inserted = 0usize;
    for (name, address, history) in offices {
        let office_id = upsert_office(pool, name, address).await?;

        // history[0] is the anchor month, later entries go back in time.
        for (age, count) in history.iter().enumerate() {
            let month = anchor.add_months(-(age as i64));
            inserted += upsert_referrals(pool, office_id, &month.to_string(), *count).await? as usize;
        }
    }

    tracing::info!(rows = inserted, "seeded referral history");
    Ok(inserted)
}

pub async fn fetch_offices(pool: &PgPool) -> Result<Vec<Office>> {
    let rows = sqlx::query(
        "SELECT id, name, address FROM referral_tiers.offices ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Office {
            id: row.get("id"),
            name: row.get("name"),
            address: row.get("address"),
        })
        .collect())
}

/// Every stored monthly row; validation happens during aggregation.
pub async fn fetch_referrals(pool: &PgPool) -> Result<Vec<MonthlyReferralRecord>> {
    let rows = sqlx::query(
        "SELECT office_id, year_month, referral_count \
         FROM referral_tiers.monthly_referrals \
         ORDER BY office_id, year_month",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(MonthlyReferralRecord {
            office_id: row.get("office_id"),
            year_month: row.get("year_month"),
            referral_count: row.get("referral_count"),
        });
    }

    Ok(records)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub upserted: usize,
    pub skipped: usize,
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    office_name: String,
    #[serde(default)]
    address: String,
    year_month: String,
    referral_count: i64,
}

/// Imports `office_name,address,year_month,referral_count` rows.
///
/// Rows with a malformed month or a negative count are skipped and logged
/// instead of being stored.
pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary::default();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;

        let probe = MonthlyReferralRecord {
            office_id: Uuid::nil(),
            year_month: row.year_month.clone(),
            referral_count: row.referral_count,
        };
        if let Err(error) = probe.validate() {
            tracing::warn!(row = line + 1, office = %row.office_name, %error, "skipping csv row");
            summary.skipped += 1;
            continue;
        }

        let office_id = upsert_office(pool, &row.office_name, &row.address).await?;
        if upsert_referrals(pool, office_id, &row.year_month, row.referral_count).await? > 0 {
            summary.upserted += 1;
        }
    }

    tracing::info!(
        upserted = summary.upserted,
        skipped = summary.skipped,
        path = %csv_path.display(),
        "imported referral csv"
    );
    Ok(summary)
}
