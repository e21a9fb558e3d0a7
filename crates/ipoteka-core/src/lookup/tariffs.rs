//! Tariff tables and pricing constants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::banks::{BankConfig, PropertyRateMap, RiskKind, TariffPeriod};
use crate::types::{Gender, ObjectType};

/// Life rates (percent of the borrower's share) by gender and age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeTable {
    /// Age of the first entry in `male` / `female`
    pub first_age: u32,

    /// Ages outside the table use the nearest entry instead of a gap
    #[serde(default)]
    pub clamp_age: bool,

    pub male: Vec<Decimal>,
    pub female: Vec<Decimal>,
}

impl LifeTable {
    pub fn rate(&self, gender: Gender, age: u32) -> Option<Decimal> {
        let rates = match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        };
        if rates.is_empty() {
            return None;
        }
        let index = age as i64 - self.first_age as i64;
        if self.clamp_age {
            let clamped = index.clamp(0, rates.len() as i64 - 1);
            return rates.get(clamped as usize).copied();
        }
        usize::try_from(index).ok().and_then(|i| rates.get(i)).copied()
    }
}

/// Default property rates, used when a bank has no rate for a kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTariffs {
    pub default: PropertyRateMap,
}

impl PropertyTariffs {
    /// Rate in percent for `kind`, bank schedule first.
    pub fn rate(
        &self,
        bank: &BankConfig,
        kind: ObjectType,
        period: TariffPeriod,
        with_life: bool,
    ) -> Option<Decimal> {
        bank.property_rates
            .rates_for(period, with_life)
            .and_then(|rates| rates.get(kind))
            .or_else(|| self.default.get(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleTariffs {
    pub default_rate: Decimal,
}

impl TitleTariffs {
    pub fn rate(&self, bank: &BankConfig, period: TariffPeriod, with_life: bool) -> Decimal {
        bank.title_rates
            .rate_for(period, with_life)
            .unwrap_or(self.default_rate)
    }
}

/// Maximum life sum for an age band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeCap {
    #[serde(default)]
    pub min_age: Option<u32>,
    pub max_age: u32,
    pub max_sum: Decimal,
}

/// Outcome of the age check on the first borrower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeLimit {
    ExamRequired,
    Cap(Decimal),
    Unlimited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeAgeLimits {
    pub exam_from_age: u32,
    pub caps: Vec<AgeCap>,
}

impl LifeAgeLimits {
    pub fn limit_for(&self, age: u32) -> AgeLimit {
        if age >= self.exam_from_age {
            return AgeLimit::ExamRequired;
        }
        self.caps
            .iter()
            .find(|cap| cap.min_age.map_or(true, |min| age >= min) && age <= cap.max_age)
            .map(|cap| AgeLimit::Cap(cap.max_sum))
            .unwrap_or(AgeLimit::Unlimited)
    }
}

/// One amount per risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAmounts {
    pub life: Decimal,
    pub property: Decimal,
    pub title: Decimal,
}

impl RiskAmounts {
    pub fn get(&self, risk: RiskKind) -> Decimal {
        match risk {
            RiskKind::Life => self.life,
            RiskKind::Property => self.property,
            RiskKind::Title => self.title,
        }
    }
}

/// Thresholds of the Variant 2 search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant2Settings {
    /// Discount applied to the undiscounted property premium
    pub property_discount_percent: Decimal,

    /// Candidates saving less than this are dropped
    pub min_saving: Decimal,

    /// Savings up to this value count as "within band"
    pub preferred_max_saving: Decimal,

    /// Out-of-band candidates are ranked by distance to this saving
    pub target_saving: Decimal,

    /// Savings above this trigger sum escalation
    pub escalation_threshold: Decimal,

    /// Saving that escalation aims for
    pub escalation_target: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// Floor for every individual premium, before and after discount
    pub minimum_premium: RiskAmounts,

    /// Discounts used when the bank has no percent of its own
    pub default_discount_percent: RiskAmounts,

    /// Life multiplier for the medical-underwriting surcharge
    pub underwriting_loading: Decimal,

    pub variant2: Variant2Settings,
}

impl Pricing {
    /// Discount percent for `risk` at `bank`.
    pub fn discount_percent(&self, bank: &BankConfig, risk: RiskKind) -> Decimal {
        bank.discount_percent
            .get(risk)
            .unwrap_or_else(|| self.default_discount_percent.get(risk))
    }
}
