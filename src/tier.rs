//! Referral tier classification.
//!
//! Two classifiers exist and must not be merged: the percentile classifier
//! ranks an office against the cohort it is listed with, the fixed-threshold
//! classifier judges each office alone. Callers pick one through
//! [`TierStrategy`].

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{OfficeReferralProfile, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PercentileThresholds {
    /// Share of the cohort, by L12, that is eligible for VIP.
    pub vip_top_percent: u32,
    pub warm_min_l12: u32,
    pub warm_min_r3: u32,
}

impl Default for PercentileThresholds {
    fn default() -> Self {
        Self {
            vip_top_percent: 20,
            warm_min_l12: 4,
            warm_min_r3: 1,
        }
    }
}

impl PercentileThresholds {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.vip_top_percent) {
            return Err(Error::InvalidArgument(format!(
                "vip_top_percent must be between 1 and 100, got {}",
                self.vip_top_percent
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FixedThresholds {
    pub vip_min_l12: u32,
    pub vip_min_r3: u32,
    pub vip_max_mslr: u32,
    pub warm_min_l12: u32,
    pub warm_min_r3: u32,
}

impl Default for FixedThresholds {
    fn default() -> Self {
        Self {
            vip_min_l12: 12,
            vip_min_r3: 3,
            vip_max_mslr: 4,
            warm_min_l12: 6,
            warm_min_r3: 2,
        }
    }
}

/// L12 value an office must reach to be VIP within its cohort.
///
/// The cohort is ranked by L12 descending and the value at index
/// `ceil(n * top_percent / 100) - 1` is the cutoff, so ties at the cutoff
/// are included.
pub fn vip_threshold(cohort_l12: &[u32], top_percent: u32) -> Result<u32> {
    threshold_in_ranked(&rank_descending(cohort_l12.to_vec()), top_percent)
}

fn rank_descending(mut values: Vec<u32>) -> Vec<u32> {
    values.sort_unstable_by(|a, b| b.cmp(a));
    values
}

fn threshold_in_ranked(ranked: &[u32], top_percent: u32) -> Result<u32> {
    if ranked.is_empty() {
        return Err(Error::InvalidArgument(
            "cannot rank an office against an empty cohort".to_string(),
        ));
    }
    if !(1..=100).contains(&top_percent) {
        return Err(Error::InvalidArgument(format!(
            "top_percent must be between 1 and 100, got {top_percent}"
        )));
    }

    let len = ranked.len() as u64;
    let eligible = (len * u64::from(top_percent)).div_ceil(100);
    let index = eligible.saturating_sub(1) as usize;
    Ok(ranked[index.min(ranked.len() - 1)])
}

/// Cohort-relative tier with the default thresholds.
pub fn classify_tier_percentile(
    profile: &OfficeReferralProfile,
    cohort_l12: &[u32],
) -> Result<Tier> {
    classify_tier_percentile_with(profile, cohort_l12, &PercentileThresholds::default())
}

pub fn classify_tier_percentile_with(
    profile: &OfficeReferralProfile,
    cohort_l12: &[u32],
    thresholds: &PercentileThresholds,
) -> Result<Tier> {
    let threshold = vip_threshold(cohort_l12, thresholds.vip_top_percent)?;
    Ok(percentile_tier(profile, threshold, thresholds))
}

fn percentile_tier(
    profile: &OfficeReferralProfile,
    vip_threshold: u32,
    thresholds: &PercentileThresholds,
) -> Tier {
    if profile.l12 == 0 {
        Tier::Dormant
    } else if vip_threshold > 0 && profile.l12 >= vip_threshold {
        Tier::Vip
    } else if profile.l12 >= thresholds.warm_min_l12 || profile.r3 >= thresholds.warm_min_r3 {
        Tier::Warm
    } else {
        Tier::Cold
    }
}

/// Engagement tier from fixed thresholds with the default values.
pub fn classify_tier_fixed(profile: &OfficeReferralProfile) -> Tier {
    classify_tier_fixed_with(profile, &FixedThresholds::default())
}

pub fn classify_tier_fixed_with(profile: &OfficeReferralProfile, thresholds: &FixedThresholds) -> Tier {
    let recent = profile
        .mslr
        .is_some_and(|months| months <= thresholds.vip_max_mslr);

    if profile.l12 >= thresholds.vip_min_l12 && profile.r3 >= thresholds.vip_min_r3 && recent {
        Tier::Vip
    } else if profile.l12 >= thresholds.warm_min_l12 && profile.r3 >= thresholds.warm_min_r3 {
        Tier::Warm
    } else if profile.r3 == 0 && profile.l12 > 0 {
        Tier::Dormant
    } else {
        Tier::Cold
    }
}

/// Everything a strategy may need to know about the offices being ranked together.
#[derive(Debug, Clone, Default)]
pub struct CohortContext {
    /// L12 values, highest first.
    ranked_l12: Vec<u32>,
}

impl CohortContext {
    pub fn new(l12_values: Vec<u32>) -> Self {
        Self {
            ranked_l12: rank_descending(l12_values),
        }
    }

    pub fn from_profiles(profiles: &[OfficeReferralProfile]) -> Self {
        Self::new(profiles.iter().map(|profile| profile.l12).collect())
    }

    pub fn ranked_l12(&self) -> &[u32] {
        &self.ranked_l12
    }

    pub fn vip_threshold(&self, top_percent: u32) -> Result<u32> {
        threshold_in_ranked(&self.ranked_l12, top_percent)
    }
}

pub trait TierStrategy: Send + Sync {
    /// Stable name for logs and reports.
    fn name(&self) -> &str;

    fn classify(&self, profile: &OfficeReferralProfile, cohort: &CohortContext) -> Result<Tier>;
}

#[derive(Debug, Clone, Default)]
pub struct PercentileTierStrategy {
    pub thresholds: PercentileThresholds,
}

impl PercentileTierStrategy {
    pub fn new(thresholds: PercentileThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }
}

impl TierStrategy for PercentileTierStrategy {
    fn name(&self) -> &str {
        "percentile"
    }

    fn classify(&self, profile: &OfficeReferralProfile, cohort: &CohortContext) -> Result<Tier> {
        let threshold = cohort.vip_threshold(self.thresholds.vip_top_percent)?;
        Ok(percentile_tier(profile, threshold, &self.thresholds))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedThresholdTierStrategy {
    pub thresholds: FixedThresholds,
}

impl FixedThresholdTierStrategy {
    pub fn new(thresholds: FixedThresholds) -> Self {
        Self { thresholds }
    }
}

impl TierStrategy for FixedThresholdTierStrategy {
    fn name(&self) -> &str {
        "fixed"
    }

    fn classify(&self, profile: &OfficeReferralProfile, _cohort: &CohortContext) -> Result<Tier> {
        Ok(classify_tier_fixed_with(profile, &self.thresholds))
    }
}

/// Classifies every profile against the cohort formed by all of them.
pub fn classify_cohort(
    strategy: &dyn TierStrategy,
    profiles: &[OfficeReferralProfile],
) -> Result<Vec<Tier>> {
    let cohort = CohortContext::from_profiles(profiles);
    let tiers = profiles
        .iter()
        .map(|profile| strategy.classify(profile, &cohort))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        strategy = strategy.name(),
        offices = profiles.len(),
        "classified referral cohort"
    );
    Ok(tiers)
}
