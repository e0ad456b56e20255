use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{MonthlyReferralRecord, OfficeReferralProfile};
use crate::month::YearMonth;

/// Length of the L12 window, in calendar months, including the anchor month.
pub const TRAILING_YEAR_MONTHS: i64 = 12;
/// Length of the R3 window, in calendar months, including the anchor month.
pub const TRAILING_QUARTER_MONTHS: i64 = 3;

/// Reduces one office's monthly rows to its referral profile as of `now`.
///
/// Both windows end at the calendar month containing `now`; rows dated after
/// that month are ignored. Fails on the first row that is malformed, negative,
/// or belongs to another office.
pub fn aggregate(
    office_id: Uuid,
    records: &[MonthlyReferralRecord],
    now: NaiveDate,
) -> Result<OfficeReferralProfile> {
    let mut months = Vec::with_capacity(records.len());

    for record in records {
        if record.office_id != office_id {
            return Err(Error::InvalidArgument(format!(
                "record for office {} passed while aggregating office {}",
                record.office_id, office_id
            )));
        }
        months.push(record.validate()?);
    }

    Ok(profile_from_months(office_id, &months, YearMonth::of(now)))
}

fn profile_from_months(
    office_id: Uuid,
    months: &[(YearMonth, u32)],
    anchor: YearMonth,
) -> OfficeReferralProfile {
    let mut profile = OfficeReferralProfile::empty(office_id);
    let mut last_referral: Option<YearMonth> = None;

    for &(month, count) in months {
        let age = month.months_until(anchor);
        if age < 0 {
            continue;
        }

        if age < TRAILING_YEAR_MONTHS {
            profile.l12 = profile.l12.saturating_add(count);
        }
        if age < TRAILING_QUARTER_MONTHS {
            profile.r3 = profile.r3.saturating_add(count);
        }
        if count > 0 && last_referral.map_or(true, |latest| month > latest) {
            last_referral = Some(month);
        }
    }

    profile.mslr = last_referral
        .map(|month| u32::try_from(month.months_until(anchor)).unwrap_or(u32::MAX));
    profile
}

#[derive(Debug)]
pub struct RejectedRecord {
    pub record: MonthlyReferralRecord,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct CohortProfiles {
    /// One profile per requested office, in request order.
    pub profiles: Vec<OfficeReferralProfile>,
    pub rejected: Vec<RejectedRecord>,
}

/// Aggregates a mixed batch of rows for a whole cohort of offices.
///
/// Rows that fail validation, or that name an office outside `office_ids`,
/// are excluded from every sum and reported in `rejected`.
pub fn aggregate_cohort(
    office_ids: &[Uuid],
    records: &[MonthlyReferralRecord],
    now: NaiveDate,
) -> CohortProfiles {
    let anchor = YearMonth::of(now);
    let mut by_office: HashMap<Uuid, Vec<(YearMonth, u32)>> =
        office_ids.iter().map(|id| (*id, Vec::new())).collect();
    let mut rejected = Vec::new();

    for record in records {
        let Some(months) = by_office.get_mut(&record.office_id) else {
            tracing::warn!(office_id = %record.office_id, "skipping referral row for unknown office");
            rejected.push(RejectedRecord {
                record: record.clone(),
                error: Error::InvalidArgument(format!("unknown office {}", record.office_id)),
            });
            continue;
        };

        match record.validate() {
            Ok(month) => months.push(month),
            Err(error) => {
                tracing::warn!(
                    office_id = %record.office_id,
                    year_month = %record.year_month,
                    %error,
                    "excluding referral row from aggregation"
                );
                rejected.push(RejectedRecord {
                    record: record.clone(),
                    error,
                });
            }
        }
    }

    let profiles = office_ids
        .iter()
        .map(|id| {
            let months = by_office.get(id).map(Vec::as_slice).unwrap_or_default();
            let profile = profile_from_months(*id, months, anchor);
            tracing::debug!(
                office_id = %id,
                l12 = profile.l12,
                r3 = profile.r3,
                mslr = ?profile.mslr,
                "aggregated referral profile"
            );
            profile
        })
        .collect();

    CohortProfiles { profiles, rejected }
}
