//! Lookup data: bank registry, tariff tables, underwriting table and
//! add-on product tariffs.
//!
//! Lookup data is an immutable value. It is built once (the bundled copy
//! is cached for the life of the process) and passed by reference into
//! extraction, validation and the decision engine.

mod addons;
mod banks;
pub mod schema;
mod tariffs;
mod underwriting;

pub use addons::{
    band_for, AddonTariffs, BastionTariff, BastionTariffs, ExpressPack, LiabilityPack,
    MyFlatTariff, SumBand,
};
pub use banks::{
    BankConfig, BankRegistry, CutoffRule, DiscountFlags, DiscountPercents, LifeTariffRule,
    PropertyRateMap, PropertyRates, PropertySchedule, RiskKind, TariffPeriod, TitleRates,
    TitleSchedule,
};
pub use tariffs::{
    AgeCap, AgeLimit, LifeAgeLimits, LifeTable, Pricing, PropertyTariffs, RiskAmounts,
    TitleTariffs, Variant2Settings,
};
pub use underwriting::{AgeGroup, HeightRow, UnderwritingCell, UnderwritingTable};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Lookup document shipped with the crate.
const BUNDLED_LOOKUP_YAML: &str = include_str!("../../data/lookup.yaml");

static BUNDLED: OnceLock<Result<LookupData, String>> = OnceLock::new();

/// Errors that can occur when loading lookup data.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Failed to read lookup file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to map lookup data: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Lookup data does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Lookup data is inconsistent: {0}")]
    Integrity(String),
}

/// Everything the engine reads but never computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupData {
    /// Version label of the tariff set
    pub version: String,

    pub pricing: Pricing,

    pub banks: BankRegistry,

    pub property: PropertyTariffs,

    pub title: TitleTariffs,

    pub life_age_limits: LifeAgeLimits,

    pub underwriting: UnderwritingTable,

    pub addons: AddonTariffs,

    /// Life tables by name, referenced from each bank's `life_tariff`
    pub life_tables: BTreeMap<String, LifeTable>,
}

impl LookupData {
    /// Parse lookup data from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, LookupError> {
        let document: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_document(document)
    }

    /// Parse lookup data from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LookupError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Parse lookup data from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, LookupError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// The lookup data bundled with this crate.
    pub fn bundled() -> Result<&'static LookupData, LookupError> {
        BUNDLED
            .get_or_init(|| Self::from_yaml(BUNDLED_LOOKUP_YAML).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| LookupError::Integrity(format!("bundled lookup data: {}", e)))
    }

    fn from_document(document: serde_json::Value) -> Result<Self, LookupError> {
        schema::validate_lookup_schema(&document).map_err(LookupError::SchemaViolation)?;
        let data: LookupData = serde_json::from_value(document)?;
        data.validate()?;
        tracing::debug!(
            version = %data.version,
            banks = data.banks.len(),
            life_tables = data.life_tables.len(),
            "Loaded lookup data"
        );
        Ok(data)
    }

    pub fn life_table(&self, name: &str) -> Option<&LifeTable> {
        self.life_tables.get(name)
    }

    /// Cross-reference checks the schema cannot express.
    fn validate(&self) -> Result<(), LookupError> {
        self.validate_unique_bank_names()?;

        for bank in self.banks.iter() {
            for table in bank.life_tariff.referenced_tables() {
                if !self.life_tables.contains_key(table) {
                    return Err(LookupError::Integrity(format!(
                        "bank {} refers to unknown life table {}",
                        bank.name, table
                    )));
                }
            }
            if bank.client_markup_required && bank.markup_percent.is_some() {
                return Err(LookupError::Integrity(format!(
                    "bank {} has a fixed markup but requires a client markup",
                    bank.name
                )));
            }
        }

        let groups = self.underwriting.age_groups.len();
        let buckets = self.underwriting.weight_bounds.len() + 1;
        for row in &self.underwriting.heights {
            if row.rows.len() != groups || row.rows.iter().any(|cells| cells.len() != buckets) {
                return Err(LookupError::Integrity(format!(
                    "underwriting rows for height {} must be {} × {}",
                    row.height, groups, buckets
                )));
            }
        }

        Ok(())
    }

    fn validate_unique_bank_names(&self) -> Result<(), LookupError> {
        let mut seen = HashSet::new();
        for bank in self.banks.iter() {
            if !seen.insert(bank.name.as_str()) {
                return Err(LookupError::Integrity(format!(
                    "Duplicate bank name: {}",
                    bank.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bundled_data_loads() {
        let data = LookupData::bundled().unwrap();
        assert_eq!(data.banks.len(), 22);
        assert!(data.life_table("base").is_some());
        assert_eq!(data.pricing.minimum_premium.life, dec!(600));
        assert_eq!(data.title.default_rate, dec!(0.2));
    }

    #[test]
    fn test_bundled_registry_order_and_rules() {
        let data = LookupData::bundled().unwrap();
        let names = data.banks.names();
        assert_eq!(names.first(), Some(&"Абсолют Банк"));

        let alfa = data.banks.get("Альфа Банк").unwrap();
        assert!(alfa.client_markup_required);
        assert!(alfa.markup_percent.is_none());

        let mkb = data.banks.get("МКБ").unwrap();
        assert_eq!(mkb.discount_percent.title, Some(dec!(30)));

        let sber = data.banks.get("Сбербанк").unwrap();
        assert_eq!(sber.life_discount_max_age, Some(55));
    }

    #[test]
    fn test_underwriting_transcribed() {
        let data = LookupData::bundled().unwrap();
        // 180 cm, 30-45, 75 kg (bucket 9)
        assert_eq!(
            data.underwriting.lookup(35, 180, 75),
            UnderwritingCell::Factor(dec!(1))
        );
        // 140 cm, 16-29, 38 kg (bucket 0)
        assert_eq!(
            data.underwriting.lookup(20, 140, 38),
            UnderwritingCell::Factor(dec!(1.25))
        );
        assert!(data.underwriting.lookup(20, 140, 120).is_exam());
    }

    #[test]
    fn test_unknown_life_table_rejected() {
        let yaml = BUNDLED_LOOKUP_YAML.replace("life_tariff: {table: mkb}", "life_tariff: {table: nope}");
        let err = LookupData::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, LookupError::Integrity(_)));
    }

    #[test]
    fn test_duplicate_bank_rejected() {
        let yaml = BUNDLED_LOOKUP_YAML.replace("name: Зенит", "name: МКБ");
        let err = LookupData::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate bank name"));
    }

    #[test]
    fn test_schema_violation_reported() {
        let yaml = BUNDLED_LOOKUP_YAML.replace("default_rate: 0.2", "default_rate: zero");
        let err = LookupData::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, LookupError::SchemaViolation(_)));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(matches!(
            LookupData::from_yaml("banks: [").unwrap_err(),
            LookupError::YamlError(_)
        ));
    }
}
