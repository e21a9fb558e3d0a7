//! Variant 3: the client's own discount on every undiscounted premium.
//!
//! No minimum premium applies here; the discount is taken off lines that
//! are already floored.

use rust_decimal::Decimal;

use super::{LifeQuote, Priced, PropertyQuote, TitleQuote, Variant3};
use crate::money::{discount_multiplier, round2};

pub(crate) fn build(
    discount_percent: Decimal,
    life: Option<&LifeQuote>,
    property: Option<&Priced<PropertyQuote>>,
    title: Option<&TitleQuote>,
) -> Variant3 {
    let multiplier = discount_multiplier(discount_percent);
    let apply = |premium: Decimal| round2(premium * multiplier);

    let property = property
        .and_then(Priced::priced)
        .map(|p| apply(p.premium.premium_no_discount));
    let life_borrowers: Vec<Decimal> = life
        .map(|l| l.borrowers.iter().map(|b| apply(b.premium)).collect())
        .unwrap_or_default();
    let title = title.map(|t| apply(t.premium.premium_no_discount));

    let total = round2(
        property.unwrap_or_default() + life_borrowers.iter().sum::<Decimal>() + title.unwrap_or_default(),
    );
    Variant3 {
        discount_percent,
        property,
        life_borrowers,
        title,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::super::compute_quote;
    use super::super::tests::flat_request;
    use crate::lookup::LookupData;
    use rust_decimal_macros::dec;

    #[test]
    fn test_variant3_only_when_requested() {
        let quote = compute_quote(&flat_request("Сбербанк"), LookupData::bundled().unwrap()).unwrap();
        assert!(quote.variant3.is_none());
    }

    #[test]
    fn test_variant3_discounts_each_line() {
        let mut request = flat_request("Сбербанк");
        request.variant3_discount = Some(dec!(15));
        request.risks.title = true;
        let quote = compute_quote(&request, LookupData::bundled().unwrap()).unwrap();
        let v3 = quote.variant3.unwrap();
        assert_eq!(v3.property, Some(dec!(2125)));
        assert_eq!(v3.life_borrowers, vec![dec!(14407.50)]);
        assert_eq!(v3.title, Some(dec!(4250)));
        assert_eq!(v3.total, dec!(20782.50));
    }

    #[test]
    fn test_variant3_goes_below_floor() {
        let mut request = flat_request("Сбербанк");
        request.debt_amount = Some(dec!(100000));
        request.risks.life = false;
        request.variant3_discount = Some(dec!(50));
        let quote = compute_quote(&request, LookupData::bundled().unwrap()).unwrap();
        assert_eq!(quote.variant3.unwrap().property, Some(dec!(300)));
    }
}
