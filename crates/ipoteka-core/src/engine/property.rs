//! Property premium.

use super::{Priced, PricingContext, PropertyQuote, RiskPremium};
use crate::lookup::RiskKind;
use crate::money::{discount_multiplier, percent_of, round2};
use crate::types::ObjectType;

pub(crate) const NO_PROPERTY_RATE: &str = "Тариф для типа объекта не найден";

/// Object type the property tariff is read for. Apartments are priced as flats.
pub(crate) fn tariff_kind(object_type: Option<ObjectType>) -> ObjectType {
    match object_type {
        None | Some(ObjectType::Apartment) => ObjectType::Flat,
        Some(kind) => kind,
    }
}

pub(crate) fn price(ctx: &PricingContext<'_>) -> Priced<PropertyQuote> {
    let kind = tariff_kind(ctx.request.object_type);
    let with_life = ctx.request.risks.life;
    let Some(rate) = ctx.lookup.property.rate(ctx.bank, kind, ctx.period, with_life) else {
        tracing::warn!(bank = %ctx.bank.name, kind = kind.tariff_key(), "No property rate");
        return Priced::Unavailable {
            reason: NO_PROPERTY_RATE.to_string(),
        };
    };

    let minimum = ctx.minimum(RiskKind::Property);
    let premium = round2(percent_of(ctx.insured_amount, rate));
    let discount_applied = ctx.terms.discounts.allows(RiskKind::Property);
    let discounted = if discount_applied {
        round2(premium * discount_multiplier(ctx.discount_percent(RiskKind::Property)))
    } else {
        premium
    };

    Priced::Priced(PropertyQuote {
        kind,
        rate,
        premium: RiskPremium {
            premium_no_discount: premium.max(minimum),
            premium_with_discount: discounted.max(minimum),
            discount_applied,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::compute_quote;
    use super::super::tests::flat_request;
    use crate::lookup::LookupData;
    use crate::types::{Material, ParsedRequest};
    use rust_decimal_macros::dec;

    fn property(request: &ParsedRequest) -> PropertyQuote {
        let quote = compute_quote(request, LookupData::bundled().unwrap()).unwrap();
        quote.property.unwrap().priced().cloned().unwrap()
    }

    #[test]
    fn test_apartment_priced_as_flat() {
        assert_eq!(tariff_kind(Some(ObjectType::Apartment)), ObjectType::Flat);
        assert_eq!(tariff_kind(None), ObjectType::Flat);
        assert_eq!(tariff_kind(Some(ObjectType::HouseWood)), ObjectType::HouseWood);
    }

    #[test]
    fn test_flat_with_default_discount() {
        let quote = property(&flat_request("Сбербанк"));
        assert_eq!(quote.rate, dec!(0.10));
        assert_eq!(quote.premium.premium_no_discount, dec!(2500));
        assert_eq!(quote.premium.premium_with_discount, dec!(2250));
    }

    #[test]
    fn test_wooden_house_rate() {
        let mut request = flat_request("Сбербанк");
        request.object_type = Some(ObjectType::HouseWood);
        request.material = Some(Material::Wood);
        request.gas_present = Some(false);
        let quote = property(&request);
        assert_eq!(quote.rate, dec!(0.43));
        assert_eq!(quote.premium.premium_no_discount, dec!(10750));
    }

    #[test]
    fn test_no_discount_when_bank_forbids() {
        let mut request = flat_request("Дом.РФ");
        request.debt_amount = Some(dec!(300000));
        let quote = property(&request);
        assert!(!quote.premium.discount_applied);
        assert_eq!(quote.premium.premium_no_discount, dec!(600));
        assert_eq!(quote.premium.premium_with_discount, dec!(600));
    }
}
