//! Core types for parsed mortgage insurance requests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Borrower gender as written in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "м"),
            Gender::Female => write!(f, "ж"),
        }
    }
}

/// Kind of insured real estate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Flat,
    Apartment,
    Townhouse,
    HouseBrick,
    HouseWood,
}

impl ObjectType {
    /// Key used in the property tariff tables.
    pub fn tariff_key(&self) -> &'static str {
        match self {
            ObjectType::Flat => "flat",
            ObjectType::Apartment => "apartment",
            ObjectType::Townhouse => "townhouse",
            ObjectType::HouseBrick => "house_brick",
            ObjectType::HouseWood => "house_wood",
        }
    }

    pub fn is_house(&self) -> bool {
        matches!(self, ObjectType::HouseBrick | ObjectType::HouseWood)
    }

    /// Russian name for reports and messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectType::Flat => "квартира",
            ObjectType::Apartment => "апартаменты",
            ObjectType::Townhouse => "таунхаус",
            ObjectType::HouseBrick => "дом (кирпич/блоки)",
            ObjectType::HouseWood => "дом (дерево)",
        }
    }
}

/// Wall material of a house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Brick,
    Wood,
    Gasobet,
}

/// Which of the three product risks were requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risks {
    pub life: bool,
    pub property: bool,
    pub title: bool,
}

impl Risks {
    pub fn any(&self) -> bool {
        self.life || self.property || self.title
    }
}

/// Advisory bucket of the extraction confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// A borrower found in the request text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    /// Full years at the evaluation date, not at the contract date.
    pub age: Option<u32>,
    pub share_percent: u32,
}

/// Structured form of a free-text request.
///
/// Every field is best-effort; completeness is checked by
/// [`crate::validation::validate`] before any premium is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRequest {
    pub bank: Option<String>,
    pub bank_confidence: f64,
    pub debt_amount: Option<Decimal>,
    #[serde(default)]
    pub debt_amount_candidates: Vec<Decimal>,
    pub contract_date: Option<NaiveDate>,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    pub risks: Risks,
    pub object_type: Option<ObjectType>,
    pub material: Option<Material>,
    pub gas_present: Option<bool>,
    pub markup_percent: Option<Decimal>,
    /// Flat discount the client asked for ("скидка 15%").
    pub variant3_discount: Option<Decimal>,
    #[serde(default)]
    pub borrowers: Vec<Borrower>,
    pub height: Option<u32>,
    pub weight: Option<u32>,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Default for ParsedRequest {
    fn default() -> Self {
        Self {
            bank: None,
            bank_confidence: 0.0,
            debt_amount: None,
            debt_amount_candidates: Vec::new(),
            contract_date: None,
            dates: Vec::new(),
            risks: Risks::default(),
            object_type: None,
            material: None,
            gas_present: None,
            markup_percent: None,
            variant3_discount: None,
            borrowers: Vec::new(),
            height: None,
            weight: None,
            confidence: 0.0,
            confidence_level: ConfidenceLevel::Low,
            notes: Vec::new(),
        }
    }
}

impl ParsedRequest {
    pub fn first_borrower(&self) -> Option<&Borrower> {
        self.borrowers.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(ConfidenceLevel::from_score(0.9), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.85), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.6), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.59), ConfidenceLevel::Low);
    }

    #[test]
    fn test_gender_serializes_short() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"f\"");
    }

    #[test]
    fn test_object_type_keys() {
        assert_eq!(ObjectType::HouseWood.tariff_key(), "house_wood");
        assert!(ObjectType::HouseBrick.is_house());
        assert!(!ObjectType::Townhouse.is_house());
    }
}
