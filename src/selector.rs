use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{Tier, TieredOffice};

/// Which tiers a campaign targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TierFilter {
    #[default]
    All,
    Only(Vec<Tier>),
}

impl TierFilter {
    pub fn matches(&self, tier: Tier) -> bool {
        match self {
            TierFilter::All => true,
            TierFilter::Only(tiers) => tiers.contains(&tier),
        }
    }
}

impl FromStr for TierFilter {
    type Err = Error;

    /// Accepts `all`, a single tier, or a comma-separated list of tiers.
    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Ok(TierFilter::All);
        }

        let mut tiers = Vec::new();
        for part in value.split(',') {
            let tier: Tier = part.parse()?;
            if !tiers.contains(&tier) {
                tiers.push(tier);
            }
        }
        Ok(TierFilter::Only(tiers))
    }
}

/// Keeps offices in the selected tiers whose name or address contains
/// `query`, ignoring case. Input order is preserved.
pub fn filter_by_tier_and_query<'a>(
    offices: &'a [TieredOffice],
    tier_filter: &TierFilter,
    query: &str,
) -> Vec<&'a TieredOffice> {
    let needle = query.to_lowercase();

    offices
        .iter()
        .filter(|office| tier_filter.matches(office.tier))
        .filter(|office| {
            needle.is_empty()
                || office.office.name.to_lowercase().contains(&needle)
                || office.office.address.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Orders offices for a campaign list: best tier first, then busiest, then by name.
pub fn sort_for_targeting(offices: &mut [TieredOffice]) {
    offices.sort_by(|a, b| {
        a.tier
            .rank()
            .cmp(&b.tier.rank())
            .then_with(|| b.profile.l12.cmp(&a.profile.l12))
            .then_with(|| a.office.name.cmp(&b.office.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Office, OfficeReferralProfile};
    use uuid::Uuid;

    fn office(name: &str, address: &str, tier: Tier, l12: u32) -> TieredOffice {
        let id = Uuid::new_v4();
        TieredOffice {
            office: Office {
                id,
                name: name.to_string(),
                address: address.to_string(),
            },
            profile: OfficeReferralProfile {
                office_id: id,
                l12,
                r3: 0,
                mslr: None,
            },
            tier,
        }
    }

    fn sample() -> Vec<TieredOffice> {
        vec![
            office("Bright Smiles Dental", "12 Oak St, Springfield", Tier::Vip, 30),
            office("Cedar Family Dentistry", "4 Cedar Ave, Shelbyville", Tier::Warm, 7),
            office("Oak Ridge Pediatric", "900 Ridge Rd, Springfield", Tier::Vip, 22),
            office("Harbor Dental Group", "1 Harbor Way, Ogdenville", Tier::Dormant, 0),
        ]
    }

    fn names(offices: &[&TieredOffice]) -> Vec<String> {
        offices.iter().map(|o| o.office.name.clone()).collect()
    }

    #[test]
    fn vip_filter_keeps_vips_in_order() {
        let offices = sample();
        let selected = filter_by_tier_and_query(&offices, &"VIP".parse().unwrap(), "");
        assert_eq!(names(&selected), vec!["Bright Smiles Dental", "Oak Ridge Pediatric"]);
    }

    #[test]
    fn query_matches_name_or_address_ignoring_case() {
        let offices = sample();
        let selected = filter_by_tier_and_query(&offices, &TierFilter::All, "OAK");
        assert_eq!(names(&selected), vec!["Bright Smiles Dental", "Oak Ridge Pediatric"]);

        let selected = filter_by_tier_and_query(&offices, &TierFilter::All, "harbor");
        assert_eq!(names(&selected), vec!["Harbor Dental Group"]);
    }

    #[test]
    fn query_whitespace_is_part_of_the_match() {
        let offices = vec![
            office("Dentalcare Partners", "8 Pine St, Springfield", Tier::Warm, 5),
            office("Harbor Dental Group", "1 Harbor Way, Ogdenville", Tier::Warm, 3),
        ];

        let selected = filter_by_tier_and_query(&offices, &TierFilter::All, "Dental ");
        assert_eq!(names(&selected), vec!["Harbor Dental Group"]);

        let selected = filter_by_tier_and_query(&offices, &TierFilter::All, " ");
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn tier_and_query_combine() {
        let offices = sample();
        let filter: TierFilter = "warm,dormant".parse().unwrap();
        let selected = filter_by_tier_and_query(&offices, &filter, "dent");
        assert_eq!(names(&selected), vec!["Cedar Family Dentistry", "Harbor Dental Group"]);
    }

    #[test]
    fn all_filter_with_empty_query_returns_everything() {
        let offices = sample();
        assert_eq!(filter_by_tier_and_query(&offices, &"all".parse().unwrap(), "").len(), 4);
    }

    #[test]
    fn unknown_tier_word_is_a_parse_error() {
        assert!(matches!("vip,hot".parse::<TierFilter>(), Err(Error::Parse(_))));
    }

    #[test]
    fn targeting_order_ranks_tier_then_volume() {
        let mut offices = sample();
        sort_for_targeting(&mut offices);
        let ordered: Vec<&str> = offices.iter().map(|o| o.office.name.as_str()).collect();
        assert_eq!(
            ordered,
            vec![
                "Bright Smiles Dental",
                "Oak Ridge Pediatric",
                "Cedar Family Dentistry",
                "Harbor Dental Group",
            ]
        );
    }
}
