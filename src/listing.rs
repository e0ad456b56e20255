use chrono::NaiveDate;

use crate::aggregate::{aggregate_cohort, RejectedRecord};
use crate::error::Result;
use crate::models::{MonthlyReferralRecord, Office, TieredOffice};
use crate::tier::{classify_cohort, TierStrategy};

/// Offices with their computed tier, plus the rows left out of the sums.
#[derive(Debug, Default)]
pub struct TierListing {
    pub offices: Vec<TieredOffice>,
    pub rejected: Vec<RejectedRecord>,
}

/// Aggregates raw rows and tiers every office as of `now`.
///
/// The offices given form the cohort, so an empty office list yields an
/// empty listing, with no rejected rows, rather than a percentile error.
pub fn build_listing(
    offices: Vec<Office>,
    records: &[MonthlyReferralRecord],
    now: NaiveDate,
    strategy: &dyn TierStrategy,
) -> Result<TierListing> {
    if offices.is_empty() {
        return Ok(TierListing::default());
    }

    let ids: Vec<_> = offices.iter().map(|office| office.id).collect();
    let cohort = aggregate_cohort(&ids, records, now);
    let tiers = classify_cohort(strategy, &cohort.profiles)?;

    let offices = offices
        .into_iter()
        .zip(cohort.profiles)
        .zip(tiers)
        .map(|((office, profile), tier)| TieredOffice {
            office,
            profile,
            tier,
        })
        .collect();

    Ok(TierListing {
        offices,
        rejected: cohort.rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tier;
    use crate::tier::{FixedThresholdTierStrategy, PercentileTierStrategy};
    use uuid::Uuid;

    fn office(name: &str) -> Office {
        Office {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: String::new(),
        }
    }

    fn row(office: &Office, year_month: &str, referral_count: i64) -> MonthlyReferralRecord {
        MonthlyReferralRecord {
            office_id: office.id,
            year_month: year_month.to_string(),
            referral_count,
        }
    }

    #[test]
    fn listing_pairs_offices_with_profiles_and_tiers() {
        let busy = office("Busy");
        let quiet = office("Quiet");
        let records = vec![row(&busy, "2026-10", 5), row(&busy, "2026-05", 9), row(&quiet, "2026-bad", 1)];
        let now = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let listing =
            build_listing(vec![busy.clone(), quiet.clone()], &records, now, &PercentileTierStrategy::default())
                .unwrap();

        assert_eq!(listing.offices.len(), 2);
        assert_eq!(listing.offices[0].office, busy);
        assert_eq!(listing.offices[0].profile.l12, 14);
        assert_eq!(listing.offices[0].tier, Tier::Vip);
        assert_eq!(listing.offices[1].tier, Tier::Dormant);
        assert_eq!(listing.rejected.len(), 1);
    }

    #[test]
    fn empty_office_list_is_not_an_error() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let stray = office("Stray");
        let records = vec![row(&stray, "2026-10", 3), row(&stray, "2026-09", 1)];

        let listing =
            build_listing(Vec::new(), &records, now, &FixedThresholdTierStrategy::default()).unwrap();
        assert!(listing.offices.is_empty());
        assert!(listing.rejected.is_empty());
    }
}
