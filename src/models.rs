use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::month::YearMonth;

/// One office's referral total for one calendar month, as stored by the
/// data-access collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyReferralRecord {
    pub office_id: Uuid,
    pub year_month: String,
    pub referral_count: i64,
}

impl MonthlyReferralRecord {
    /// Checks the month format and the count sign, returning the typed pair.
    pub fn validate(&self) -> Result<(YearMonth, u32)> {
        let month: YearMonth = self.year_month.parse()?;
        if self.referral_count < 0 {
            return Err(Error::InvalidArgument(format!(
                "negative referral_count {} for office {} in {}",
                self.referral_count, self.office_id, self.year_month
            )));
        }
        let count = u32::try_from(self.referral_count).map_err(|_| {
            Error::InvalidArgument(format!(
                "referral_count {} for office {} is out of range",
                self.referral_count, self.office_id
            ))
        })?;
        Ok((month, count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfficeReferralProfile {
    pub office_id: Uuid,
    /// Referrals in the trailing twelve calendar months.
    pub l12: u32,
    /// Referrals in the trailing three calendar months.
    pub r3: u32,
    /// Months since the last referral; `None` when the office never referred.
    pub mslr: Option<u32>,
}

impl OfficeReferralProfile {
    pub fn empty(office_id: Uuid) -> Self {
        Self {
            office_id,
            l12: 0,
            r3: 0,
            mslr: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Vip,
    Warm,
    Cold,
    Dormant,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Vip, Tier::Warm, Tier::Cold, Tier::Dormant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Vip => "VIP",
            Tier::Warm => "Warm",
            Tier::Cold => "Cold",
            Tier::Dormant => "Dormant",
        }
    }

    /// Targeting priority, lowest first.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Vip => 0,
            Tier::Warm => 1,
            Tier::Cold => 2,
            Tier::Dormant => 3,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vip" => Ok(Tier::Vip),
            "warm" => Ok(Tier::Warm),
            "cold" => Ok(Tier::Cold),
            "dormant" => Ok(Tier::Dormant),
            _ => Err(Error::Parse(format!("unknown tier {value:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Office {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredOffice {
    pub office: Office,
    pub profile: OfficeReferralProfile,
    pub tier: Tier,
}
