use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::RejectedRecord;
use crate::models::{Tier, TieredOffice};
use crate::selector::sort_for_targeting;

#[derive(Debug, Clone, PartialEq)]
pub struct TierSummary {
    pub tier: Tier,
    pub count: usize,
    pub avg_l12: f64,
}

/// One entry per tier in targeting order, including empty tiers.
pub fn summarize_by_tier(offices: &[TieredOffice]) -> Vec<TierSummary> {
    Tier::ALL
        .iter()
        .map(|&tier| {
            let (count, total) = offices
                .iter()
                .filter(|office| office.tier == tier)
                .fold((0usize, 0u64), |(count, total), office| {
                    (count + 1, total + u64::from(office.profile.l12))
                });

            TierSummary {
                tier,
                count,
                avg_l12: if count == 0 {
                    0.0
                } else {
                    total as f64 / count as f64
                },
            }
        })
        .collect()
}

pub fn format_mslr(mslr: Option<u32>) -> String {
    match mslr {
        Some(months) => months.to_string(),
        None => "never".to_string(),
    }
}

pub fn build_report(
    strategy: &str,
    as_of: NaiveDate,
    offices: &[TieredOffice],
    rejected: &[RejectedRecord],
) -> String {
    let summaries = summarize_by_tier(offices);
    let mut ranked = offices.to_vec();
    sort_for_targeting(&mut ranked);

    let mut output = String::new();

    let _ = writeln!(output, "# Referral Tier Report");
    let _ = writeln!(
        output,
        "Generated as of {} using the {} tier strategy",
        as_of, strategy
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Tier Mix");

    if offices.is_empty() {
        let _ = writeln!(output, "No offices on file.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} offices (avg L12 {:.1})",
                summary.tier, summary.count, summary.avg_l12
            );
        }
    }

    for tier in Tier::ALL {
        let members: Vec<&TieredOffice> = ranked.iter().filter(|office| office.tier == tier).collect();
        if members.is_empty() {
            continue;
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## {} Offices", tier);
        for office in members {
            let _ = writeln!(
                output,
                "- {} ({}) L12 {} / R3 {} / months since last referral {}",
                office.office.name,
                office.office.address,
                office.profile.l12,
                office.profile.r3,
                format_mslr(office.profile.mslr)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Excluded Referral Rows");

    if rejected.is_empty() {
        let _ = writeln!(output, "All referral rows were usable.");
    } else {
        for rejection in rejected.iter() {
            let _ = writeln!(
                output,
                "- office {} month {:?} count {}: {}",
                rejection.record.office_id,
                rejection.record.year_month,
                rejection.record.referral_count,
                rejection.error
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{MonthlyReferralRecord, Office, OfficeReferralProfile};
    use uuid::Uuid;

    fn office(name: &str, tier: Tier, l12: u32, mslr: Option<u32>) -> TieredOffice {
        let id = Uuid::new_v4();
        TieredOffice {
            office: Office {
                id,
                name: name.to_string(),
                address: "1 Main St".to_string(),
            },
            profile: OfficeReferralProfile {
                office_id: id,
                l12,
                r3: 1,
                mslr,
            },
            tier,
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn summaries_cover_every_tier() {
        let offices = vec![
            office("A", Tier::Vip, 20, Some(0)),
            office("B", Tier::Vip, 10, Some(0)),
            office("C", Tier::Cold, 1, Some(2)),
        ];

        let summaries = summarize_by_tier(&offices);
        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries[0].tier, Tier::Vip);
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].avg_l12 - 15.0).abs() < 0.001);
        assert_eq!(summaries[1].count, 0);
        assert_eq!(summaries[1].avg_l12, 0.0);
        assert_eq!(summaries[2].count, 1);
    }

    #[test]
    fn report_lists_tiers_and_exclusions() {
        let offices = vec![
            office("Bright Smiles", Tier::Vip, 20, Some(0)),
            office("Harbor Dental", Tier::Dormant, 0, None),
        ];
        let rejected = vec![RejectedRecord {
            record: MonthlyReferralRecord {
                office_id: offices[0].office.id,
                year_month: "2026/10".to_string(),
                referral_count: 2,
            },
            error: Error::Parse("expected YYYY-MM".to_string()),
        }];

        let report = build_report("percentile", as_of(), &offices, &rejected);
        assert!(report.starts_with("# Referral Tier Report"));
        assert!(report.contains("using the percentile tier strategy"));
        assert!(report.contains("- VIP: 1 offices (avg L12 20.0)"));
        assert!(report.contains("## VIP Offices"));
        assert!(report.contains("## Dormant Offices"));
        assert!(!report.contains("## Warm Offices"));
        assert!(report.contains("months since last referral never"));
        assert!(report.contains("\"2026/10\""));
    }

    #[test]
    fn report_handles_empty_directory() {
        let report = build_report("fixed", as_of(), &[], &[]);
        assert!(report.contains("No offices on file."));
        assert!(report.contains("All referral rows were usable."));
    }
}
