//! Premium decision engine.
//!
//! Prices the requested risks for the resolved bank and builds the three
//! variants shown to the client:
//!
//! 1. **Variant 1**: every premium without discount.
//! 2. **Variant 2**: raised discounts paid for by a supplementary property
//!    product, offered only when it beats Variant 1.
//! 3. **Variant 3**: a flat discount the client asked for.
//!
//! Only an unknown bank fails the whole computation. Tariff gaps degrade
//! the affected risk or variant and are reported as values.

mod life;
mod property;
mod title;
mod variant2;
mod variant3;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lookup::{BankConfig, DiscountFlags, LookupData, LookupError, TariffPeriod, UnderwritingCell};
use crate::money::{percent_of, round2};
use crate::types::{Gender, ObjectType, ParsedRequest};

pub use variant2::AddonProduct;

/// Errors that stop a quote from being computed.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Банк \"{0}\" не найден в конфигурации.")]
    UnknownBank(String),

    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("Lookup data error: {0}")]
    Lookup(#[from] LookupError),
}

/// Warning shown when a bank expects the client's markup and none was given.
pub const MISSING_MARKUP_WARNING: &str =
    "Для этого банка укажите надбавку в процентах (например: \"15% надбавка\")";

/// Debt plus the bank's markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuredAmount {
    pub debt: Decimal,
    /// Markup percent that was applied, if any
    pub markup_percent: Option<Decimal>,
    pub markup: Decimal,
    /// The percent came from the request rather than the bank
    pub client_markup: bool,
    pub amount: Decimal,
}

/// Premium of one risk before and after its standard discount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPremium {
    pub premium_no_discount: Decimal,
    pub premium_with_discount: Decimal,
    pub discount_applied: bool,
}

impl RiskPremium {
    pub fn zero() -> Self {
        Self {
            premium_no_discount: Decimal::ZERO,
            premium_with_discount: Decimal::ZERO,
            discount_applied: false,
        }
    }
}

/// Life premium of one borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerPremium {
    /// 1-based position in the request
    pub number: usize,
    pub gender: Gender,
    pub age: u32,
    pub share_percent: u32,
    /// Life table the rate came from
    pub table: String,
    pub rate: Decimal,
    pub premium: Decimal,
    pub premium_with_discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeQuote {
    /// Insured amount after the age cap
    pub insured_amount: Decimal,
    pub borrowers: Vec<BorrowerPremium>,
    pub premium: RiskPremium,
    pub discount_percent: Decimal,
    /// Underwriting result for the first borrower, when height and weight were given
    pub underwriting: Option<UnderwritingCell>,
    pub exam_required: bool,
    /// Age 65+: nothing is priced until the exam is passed
    pub blocked: bool,
    /// Client-facing messages (exam, cap, loading)
    pub messages: Vec<String>,
    /// Borrowers that could not be priced
    pub diagnostics: Vec<String>,
}

impl LifeQuote {
    /// Messages joined the way they are shown next to the life line.
    pub fn message(&self) -> Option<String> {
        if self.messages.is_empty() {
            None
        } else {
            Some(self.messages.join("; "))
        }
    }

    /// Total that counts toward Variant 2 when no raised discount applies.
    pub fn total(&self) -> Decimal {
        if self.premium.discount_applied {
            self.premium.premium_with_discount
        } else {
            self.premium.premium_no_discount
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyQuote {
    /// Object type the rate was taken for
    pub kind: ObjectType,
    pub rate: Decimal,
    pub premium: RiskPremium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleQuote {
    pub rate: Decimal,
    pub premium: RiskPremium,
}

/// A risk that was either priced or hit a gap in the tariffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Priced<T> {
    Priced(T),
    Unavailable { reason: String },
}

impl<T> Priced<T> {
    pub fn priced(&self) -> Option<&T> {
        match self {
            Priced::Priced(value) => Some(value),
            Priced::Unavailable { .. } => None,
        }
    }
}

/// No discounts at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant1 {
    pub property: Option<Decimal>,
    /// Per borrower, in request order
    pub life: Vec<Decimal>,
    pub title: Option<Decimal>,
    pub total: Decimal,
}

/// One line of the supplementary product in Variant 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonLine {
    pub product: String,
    /// What is covered, e.g. "отделка и инженерное оборудование"
    pub objects: String,
    pub coverage: AddonCoverage,
    pub premium: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddonCoverage {
    /// A single insured sum
    Sum { sum: Decimal },
    /// Fixed package with separate finish and movable sums
    Package { finish: Decimal, movable: Decimal },
}

/// Raised discounts plus a supplementary product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant2 {
    pub product: AddonProduct,
    pub property: Option<Decimal>,
    pub life: Option<Decimal>,
    /// Per borrower, in request order
    pub life_borrowers: Vec<Decimal>,
    pub title: Option<Decimal>,
    pub addons: Vec<AddonLine>,
    pub addon_premium: Decimal,
    pub total: Decimal,
    /// Variant 1 total minus this total
    pub saving: Decimal,
    /// Sums were raised to bring the saving down
    pub escalated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Variant2Outcome {
    Offered(Variant2),
    Unavailable { reason: String },
}

impl Variant2Outcome {
    pub fn offered(&self) -> Option<&Variant2> {
        match self {
            Variant2Outcome::Offered(v) => Some(v),
            Variant2Outcome::Unavailable { .. } => None,
        }
    }
}

/// Flat client-requested discount on every undiscounted premium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant3 {
    pub discount_percent: Decimal,
    pub property: Option<Decimal>,
    pub life_borrowers: Vec<Decimal>,
    pub title: Option<Decimal>,
    pub total: Decimal,
}

/// Everything computed for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub bank: String,
    pub contract_date: Option<NaiveDate>,
    pub period: TariffPeriod,
    pub insured: InsuredAmount,
    pub life: Option<LifeQuote>,
    pub property: Option<Priced<PropertyQuote>>,
    pub title: Option<TitleQuote>,
    pub variant1: Variant1,
    pub variant2: Variant2Outcome,
    pub variant3: Option<Variant3>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Markup and discount permissions after the cutoff rule is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankTerms {
    pub markup_percent: Option<Decimal>,
    pub discounts: DiscountFlags,
}

impl BankTerms {
    pub fn for_period(bank: &BankConfig, period: TariffPeriod) -> Self {
        match (&bank.cutoff, period) {
            (Some(cutoff), TariffPeriod::AfterCutoff) => Self {
                markup_percent: cutoff.markup_percent.or(bank.markup_percent),
                discounts: cutoff.discounts.unwrap_or(bank.discounts),
            },
            _ => Self {
                markup_percent: bank.markup_percent,
                discounts: bank.discounts,
            },
        }
    }
}

/// Shared inputs of the per-risk pricers.
pub(crate) struct PricingContext<'a> {
    pub lookup: &'a LookupData,
    pub bank: &'a BankConfig,
    pub terms: BankTerms,
    pub request: &'a ParsedRequest,
    pub period: TariffPeriod,
    pub insured_amount: Decimal,
}

impl PricingContext<'_> {
    pub fn minimum(&self, risk: crate::lookup::RiskKind) -> Decimal {
        self.lookup.pricing.minimum_premium.get(risk)
    }

    pub fn discount_percent(&self, risk: crate::lookup::RiskKind) -> Decimal {
        self.lookup.pricing.discount_percent(self.bank, risk)
    }
}

/// Computes quotes against one set of lookup data.
pub struct QuoteEngine<'a> {
    lookup: &'a LookupData,
}

impl<'a> QuoteEngine<'a> {
    pub fn new(lookup: &'a LookupData) -> Self {
        Self { lookup }
    }

    /// Price a validated request.
    pub fn compute(&self, request: &ParsedRequest) -> Result<QuoteResult, QuoteError> {
        let bank_name = request.bank.clone().unwrap_or_default();
        let bank = self
            .lookup
            .banks
            .resolve(&bank_name)
            .ok_or_else(|| QuoteError::UnknownBank(bank_name.clone()))?;

        let period = bank.period(request.contract_date);
        let terms = BankTerms::for_period(bank, period);
        let mut warnings = Vec::new();
        let insured = insured_amount(request, &terms, &mut warnings);

        let ctx = PricingContext {
            lookup: self.lookup,
            bank,
            terms,
            request,
            period,
            insured_amount: insured.amount,
        };

        let life = request.risks.life.then(|| life::price(&ctx));
        let property = request.risks.property.then(|| property::price(&ctx));
        let title = request.risks.title.then(|| title::price(&ctx));

        if let Some(life) = &life {
            warnings.extend(life.diagnostics.iter().cloned());
        }
        if let Some(Priced::Unavailable { reason }) = &property {
            warnings.push(format!("Страхование имущества: {}", reason));
        }

        let variant1 = variant1(life.as_ref(), property.as_ref(), title.as_ref());
        let variant2 = variant2::build(&ctx, life.as_ref(), property.as_ref(), title.as_ref(), variant1.total);
        let variant3 = request.variant3_discount.map(|pct| {
            variant3::build(pct, life.as_ref(), property.as_ref(), title.as_ref())
        });

        tracing::info!(
            bank = %bank.name,
            period = ?period,
            insured = %insured.amount,
            variant1 = %variant1.total,
            variant2 = ?variant2.offered().map(|v| v.total),
            "Computed quote"
        );

        Ok(QuoteResult {
            bank: bank.name.clone(),
            contract_date: request.contract_date,
            period,
            insured,
            life,
            property,
            title,
            variant1,
            variant2,
            variant3,
            warnings,
        })
    }
}

/// Price `request` with `lookup`. See [`QuoteEngine::compute`].
pub fn compute_quote(request: &ParsedRequest, lookup: &LookupData) -> Result<QuoteResult, QuoteError> {
    QuoteEngine::new(lookup).compute(request)
}

fn insured_amount(request: &ParsedRequest, terms: &BankTerms, warnings: &mut Vec<String>) -> InsuredAmount {
    let debt = request.debt_amount.unwrap_or(Decimal::ZERO);
    let (percent, client_markup) = match terms.markup_percent {
        Some(pct) => (pct, false),
        None => match request.markup_percent.filter(|pct| *pct > Decimal::ZERO) {
            Some(pct) => (pct, true),
            None => {
                warnings.push(MISSING_MARKUP_WARNING.to_string());
                (Decimal::ZERO, false)
            }
        },
    };

    if percent <= Decimal::ZERO {
        return InsuredAmount {
            debt,
            markup_percent: None,
            markup: Decimal::ZERO,
            client_markup: false,
            amount: debt,
        };
    }

    let markup = round2(percent_of(debt, percent));
    InsuredAmount {
        debt,
        markup_percent: Some(percent),
        markup,
        client_markup,
        amount: debt + markup,
    }
}

fn variant1(
    life: Option<&LifeQuote>,
    property: Option<&Priced<PropertyQuote>>,
    title: Option<&TitleQuote>,
) -> Variant1 {
    let property = property
        .and_then(Priced::priced)
        .map(|p| p.premium.premium_no_discount);
    let life_lines: Vec<Decimal> = life
        .map(|l| l.borrowers.iter().map(|b| b.premium).collect())
        .unwrap_or_default();
    let title = title.map(|t| t.premium.premium_no_discount);

    let total = round2(
        property.unwrap_or_default()
            + life.map_or(Decimal::ZERO, |l| l.premium.premium_no_discount)
            + title.unwrap_or_default(),
    );
    Variant1 {
        property,
        life: life_lines,
        title,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Borrower, Risks};
    use rust_decimal_macros::dec;

    fn lookup() -> &'static LookupData {
        LookupData::bundled().unwrap()
    }

    pub(super) fn flat_request(bank: &str) -> ParsedRequest {
        ParsedRequest {
            bank: Some(bank.to_string()),
            bank_confidence: 1.0,
            debt_amount: Some(dec!(2500000)),
            risks: Risks {
                life: true,
                property: true,
                title: false,
            },
            object_type: Some(ObjectType::Flat),
            borrowers: vec![Borrower {
                date_of_birth: NaiveDate::from_ymd_opt(1985, 8, 15),
                gender: Some(Gender::Male),
                age: Some(41),
                share_percent: 100,
            }],
            ..ParsedRequest::default()
        }
    }

    #[test]
    fn test_unknown_bank_fails() {
        let err = compute_quote(&flat_request("Несуществующий"), lookup()).unwrap_err();
        assert_eq!(err.to_string(), "Банк \"Несуществующий\" не найден в конфигурации.");
    }

    #[test]
    fn test_alias_resolves_to_canonical_bank() {
        let quote = compute_quote(&flat_request("сбер"), lookup()).unwrap();
        assert_eq!(quote.bank, "Сбербанк");
    }

    #[test]
    fn test_fixed_markup_raises_insured_amount() {
        let quote = compute_quote(&flat_request("Зенит"), lookup()).unwrap();
        assert_eq!(quote.insured.markup, dec!(250000));
        assert_eq!(quote.insured.amount, dec!(2750000));
        assert!(!quote.insured.client_markup);
    }

    #[test]
    fn test_client_markup_and_missing_markup_warning() {
        let mut request = flat_request("Альфа Банк");
        request.markup_percent = Some(dec!(15));
        let quote = compute_quote(&request, lookup()).unwrap();
        assert_eq!(quote.insured.amount, dec!(2875000));
        assert!(quote.insured.client_markup);

        request.markup_percent = None;
        let quote = compute_quote(&request, lookup()).unwrap();
        assert_eq!(quote.insured.amount, dec!(2500000));
        assert!(quote.warnings.contains(&MISSING_MARKUP_WARNING.to_string()));
    }

    #[test]
    fn test_cutoff_overrides_markup_and_discounts() {
        let mut request = flat_request("ВТБ");
        request.contract_date = NaiveDate::from_ymd_opt(2025, 2, 1);
        let quote = compute_quote(&request, lookup()).unwrap();
        assert_eq!(quote.period, TariffPeriod::AfterCutoff);
        assert_eq!(quote.insured.amount, dec!(2500000));
        let life = quote.life.unwrap();
        assert!(!life.premium.discount_applied);

        request.contract_date = NaiveDate::from_ymd_opt(2025, 1, 31);
        let quote = compute_quote(&request, lookup()).unwrap();
        assert_eq!(quote.period, TariffPeriod::BeforeCutoff);
        assert_eq!(quote.insured.amount, dec!(2750000));
    }

    #[test]
    fn test_variant1_sums_undiscounted_premiums() {
        let quote = compute_quote(&flat_request("Сбербанк"), lookup()).unwrap();
        // 2 500 000 × 0.678% life, 2 500 000 × 0.10% flat
        assert_eq!(quote.variant1.life, vec![dec!(16950)]);
        assert_eq!(quote.variant1.property, Some(dec!(2500)));
        assert_eq!(quote.variant1.total, dec!(19450));
    }

    #[test]
    fn test_quote_serializes_to_json() {
        let quote = compute_quote(&flat_request("Сбербанк"), lookup()).unwrap();
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["bank"], "Сбербанк");
        assert_eq!(json["property"]["status"], "priced");
        assert!(json["variant2"]["status"].is_string());
    }
}
