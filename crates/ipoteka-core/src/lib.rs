//! # ipoteka-core
//!
//! Quoting engine for mortgage-linked insurance.
//!
//! This crate turns an agent's free-text request into premium options:
//! - Which bank, debt, object and borrowers does the request describe?
//! - Is anything missing before a price can be given?
//! - What does the client pay under each variant?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same text, lookup data and evaluation date always produce the same quote
//! 2. **Extraction never fails**: Unrecognized text yields empty fields, not errors
//! 3. **Kopeck-exact**: Every premium is rounded to 2 places at each step, never in floating point
//! 4. **Gaps are values**: A missing tariff degrades one risk or variant; only an unknown bank fails
//!
//! ## Example
//!
//! ```rust,ignore
//! use ipoteka_core::{quote_text, render_report, LookupData};
//!
//! let lookup = LookupData::bundled()?;
//! let text = "Сбербанк, остаток 2 500 000, квартира, жизнь + имущество, муж 15.08.1985";
//! let quote = quote_text(text, lookup, today)?;
//!
//! println!("{}", render_report(&quote));
//! match quote.variant2 {
//!     Variant2Outcome::Offered(v2) => println!("Variant 2 saves {}", v2.saving),
//!     Variant2Outcome::Unavailable { reason } => println!("No Variant 2: {}", reason),
//! }
//! ```

pub mod engine;
pub mod extract;
pub mod lookup;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use engine::{
    compute_quote, AddonCoverage, AddonLine, AddonProduct, BorrowerPremium, InsuredAmount, LifeQuote,
    Priced, PropertyQuote, QuoteEngine, QuoteError, QuoteResult, RiskPremium, TitleQuote, Variant1,
    Variant2, Variant2Outcome, Variant3,
};
pub use extract::{extract, extract_as_of};
pub use lookup::{BankConfig, BankRegistry, LookupData, LookupError, TariffPeriod};
pub use report::render_report;
pub use types::{Borrower, ConfidenceLevel, Gender, Material, ObjectType, ParsedRequest, Risks};
pub use validation::validate;

use chrono::NaiveDate;

/// Extract, validate and price a free-text request.
///
/// This is the main entry point. Ages are computed at `as_of`.
///
/// # Errors
///
/// * `QuoteError::Validation` - the request is missing something; every
///   problem is listed
/// * `QuoteError::UnknownBank` - the bank passed validation but is absent
///   from `lookup`
pub fn quote_text(raw: &str, lookup: &LookupData, as_of: NaiveDate) -> Result<QuoteResult, QuoteError> {
    let request = extract_as_of(raw, &lookup.banks, as_of);
    quote_request(&request, lookup)
}

/// Validate an already extracted request, then price it.
pub fn quote_request(request: &ParsedRequest, lookup: &LookupData) -> Result<QuoteResult, QuoteError> {
    validate(request, lookup).map_err(QuoteError::Validation)?;
    compute_quote(request, lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_basic_quote() {
        let lookup = LookupData::bundled().unwrap();
        let text = "Сбербанк\nостаток 2 500 000\nквартира\nжизнь + имущество\nмуж 15.08.1985";
        let quote = quote_text(text, lookup, as_of()).unwrap();

        assert_eq!(quote.bank, "Сбербанк");
        assert!(quote.life.is_some());
        assert!(quote.variant1.total > rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn test_incomplete_request_lists_problems() {
        let lookup = LookupData::bundled().unwrap();
        let err = quote_text("привет", lookup, as_of()).unwrap_err();

        match err {
            QuoteError::Validation(errors) => assert!(errors.len() >= 3),
            other => panic!("unexpected error: {}", other),
        }
    }
}
