//! Bank registry: aliases, markup rules, discount permissions and the
//! per-bank tariff schedules that change on a cutoff date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ObjectType;

/// One of the three priced risks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskKind {
    Life,
    Property,
    Title,
}

/// Which risks a bank lets us discount. Missing entries mean "no".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountFlags {
    pub life: bool,
    pub property: bool,
    pub title: bool,
}

impl DiscountFlags {
    pub fn allows(&self, risk: RiskKind) -> bool {
        match risk {
            RiskKind::Life => self.life,
            RiskKind::Property => self.property,
            RiskKind::Title => self.title,
        }
    }
}

/// Per-risk discount percents; `None` means the engine default applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountPercents {
    pub life: Option<Decimal>,
    pub property: Option<Decimal>,
    pub title: Option<Decimal>,
}

impl DiscountPercents {
    pub fn get(&self, risk: RiskKind) -> Option<Decimal> {
        match risk {
            RiskKind::Life => self.life,
            RiskKind::Property => self.property,
            RiskKind::Title => self.title,
        }
    }
}

/// Rule change that applies to contracts signed on or after `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffRule {
    pub date: NaiveDate,
    #[serde(default)]
    pub markup_percent: Option<Decimal>,
    #[serde(default)]
    pub discounts: Option<DiscountFlags>,
}

/// Tariff period of a request relative to its bank's cutoff date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffPeriod {
    /// No contract date in the request.
    Undated,
    BeforeCutoff,
    AfterCutoff,
}

/// Which life tariff table a bank uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeTariffRule {
    pub table: String,
    #[serde(default)]
    pub after_cutoff: Option<String>,
    /// Borrowers older than this stay on `table` even after the cutoff.
    #[serde(default)]
    pub after_cutoff_max_age: Option<u32>,
}

impl Default for LifeTariffRule {
    fn default() -> Self {
        Self {
            table: "base".to_string(),
            after_cutoff: None,
            after_cutoff_max_age: None,
        }
    }
}

impl LifeTariffRule {
    /// Name of the table to price a borrower of `age` with.
    pub fn table_for(&self, period: TariffPeriod, age: u32) -> &str {
        match (period, self.after_cutoff.as_deref()) {
            (TariffPeriod::AfterCutoff, Some(table)) => match self.after_cutoff_max_age {
                Some(max_age) if age > max_age => &self.table,
                _ => table,
            },
            _ => &self.table,
        }
    }

    /// All table names this rule can refer to.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.table.as_str()).chain(self.after_cutoff.as_deref())
    }
}

/// Property rates in percent of the insured amount, per object type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRateMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub townhouse: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_brick: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_wood: Option<Decimal>,
}

impl PropertyRateMap {
    pub fn get(&self, kind: ObjectType) -> Option<Decimal> {
        match kind {
            ObjectType::Flat => self.flat,
            ObjectType::Apartment => self.apartment,
            ObjectType::Townhouse => self.townhouse,
            ObjectType::HouseBrick => self.house_brick,
            ObjectType::HouseWood => self.house_wood,
        }
    }
}

/// A set of property rates, optionally split by "with life" / "alone".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<PropertyRateMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_life: Option<PropertyRateMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alone: Option<PropertyRateMap>,
}

impl PropertyRates {
    fn pick(&self, with_life: bool) -> Option<&PropertyRateMap> {
        let split = if with_life {
            self.with_life.as_ref()
        } else {
            self.alone.as_ref()
        };
        split.or(self.rates.as_ref())
    }
}

/// Bank-specific property rates, with optional per-period sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchedule {
    #[serde(flatten)]
    pub standard: PropertyRates,
    #[serde(default)]
    pub before_cutoff: Option<PropertyRates>,
    #[serde(default)]
    pub after_cutoff: Option<PropertyRates>,
}

impl PropertySchedule {
    pub fn rates_for(&self, period: TariffPeriod, with_life: bool) -> Option<&PropertyRateMap> {
        let dated = match period {
            TariffPeriod::Undated => None,
            TariffPeriod::BeforeCutoff => self.before_cutoff.as_ref(),
            TariffPeriod::AfterCutoff => self.after_cutoff.as_ref(),
        };
        dated
            .and_then(|rates| rates.pick(with_life))
            .or_else(|| self.standard.pick(with_life))
    }
}

/// A title rate, optionally split by "with life" / "alone".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleRates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_life: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alone: Option<Decimal>,
}

impl TitleRates {
    fn pick(&self, with_life: bool) -> Option<Decimal> {
        let split = if with_life { self.with_life } else { self.alone };
        split.or(self.rate)
    }
}

/// Bank-specific title rates, with optional per-period values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleSchedule {
    #[serde(flatten)]
    pub standard: TitleRates,
    #[serde(default)]
    pub before_cutoff: Option<TitleRates>,
    #[serde(default)]
    pub after_cutoff: Option<TitleRates>,
}

impl TitleSchedule {
    pub fn rate_for(&self, period: TariffPeriod, with_life: bool) -> Option<Decimal> {
        let dated = match period {
            TariffPeriod::Undated => None,
            TariffPeriod::BeforeCutoff => self.before_cutoff.as_ref(),
            TariffPeriod::AfterCutoff => self.after_cutoff.as_ref(),
        };
        dated
            .and_then(|rates| rates.pick(with_life))
            .or_else(|| self.standard.pick(with_life))
    }
}

/// Static configuration of one bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankConfig {
    /// Canonical name, e.g. "Сбербанк"
    pub name: String,

    /// Lowercase spellings agents use for this bank
    pub aliases: Vec<String>,

    /// Fixed markup over the debt; `None` means the client supplies it
    pub markup_percent: Option<Decimal>,

    /// The request must carry a markup percent for this bank
    #[serde(default)]
    pub client_markup_required: bool,

    #[serde(default)]
    pub discounts: DiscountFlags,

    #[serde(default)]
    pub discount_percent: DiscountPercents,

    /// Life discounts are off when any borrower is at least this old
    #[serde(default)]
    pub life_discount_max_age: Option<u32>,

    #[serde(default)]
    pub cutoff: Option<CutoffRule>,

    #[serde(default)]
    pub life_tariff: LifeTariffRule,

    #[serde(default)]
    pub property_rates: PropertySchedule,

    #[serde(default)]
    pub title_rates: TitleSchedule,
}

impl BankConfig {
    /// Tariff period of a contract signed on `contract_date`.
    ///
    /// Comparison is by calendar day.
    pub fn period(&self, contract_date: Option<NaiveDate>) -> TariffPeriod {
        match (contract_date, &self.cutoff) {
            (None, _) => TariffPeriod::Undated,
            (Some(date), Some(cutoff)) if date >= cutoff.date => TariffPeriod::AfterCutoff,
            (Some(_), _) => TariffPeriod::BeforeCutoff,
        }
    }

    /// Whether `text` names this bank exactly or by one of its aliases.
    pub fn matches(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        self.name.to_lowercase() == needle || self.aliases.iter().any(|a| a.to_lowercase() == needle)
    }
}

/// Ordered list of supported banks. Order matters for alias matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankRegistry {
    banks: Vec<BankConfig>,
}

impl BankRegistry {
    pub fn new(banks: Vec<BankConfig>) -> Self {
        Self { banks }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BankConfig> {
        self.banks.iter()
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Look up by canonical name only.
    pub fn get(&self, name: &str) -> Option<&BankConfig> {
        self.banks.iter().find(|b| b.name == name)
    }

    /// Look up by canonical name, then case-insensitively by name or alias.
    pub fn resolve(&self, name_or_alias: &str) -> Option<&BankConfig> {
        self.get(name_or_alias)
            .or_else(|| self.banks.iter().find(|b| b.matches(name_or_alias)))
    }

    pub fn names(&self) -> Vec<&str> {
        self.banks.iter().map(|b| b.name.as_str()).collect()
    }
}
