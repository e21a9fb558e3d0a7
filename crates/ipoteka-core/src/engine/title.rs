//! Title premium.

use super::{PricingContext, RiskPremium, TitleQuote};
use crate::lookup::RiskKind;
use crate::money::{discount_multiplier, percent_of, round2};

pub(crate) fn price(ctx: &PricingContext<'_>) -> TitleQuote {
    let rate = ctx.lookup.title.rate(ctx.bank, ctx.period, ctx.request.risks.life);
    let minimum = ctx.minimum(RiskKind::Title);
    let premium = round2(percent_of(ctx.insured_amount, rate));
    let discount_applied = ctx.terms.discounts.allows(RiskKind::Title);
    let discounted = if discount_applied {
        round2(premium * discount_multiplier(ctx.discount_percent(RiskKind::Title)))
    } else {
        premium
    };

    TitleQuote {
        rate,
        premium: RiskPremium {
            premium_no_discount: premium.max(minimum),
            premium_with_discount: discounted.max(minimum),
            discount_applied,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::compute_quote;
    use super::super::tests::flat_request;
    use crate::lookup::LookupData;
    use crate::types::Risks;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_title_default_rate_and_discount() {
        let mut request = flat_request("Сбербанк");
        request.risks = Risks {
            life: false,
            property: false,
            title: true,
        };
        let quote = compute_quote(&request, LookupData::bundled().unwrap()).unwrap();
        let title = quote.title.unwrap();
        assert_eq!(title.rate, dec!(0.2));
        assert_eq!(title.premium.premium_no_discount, dec!(5000));
        assert_eq!(title.premium.premium_with_discount, dec!(3500));
    }

    #[test]
    fn test_gazprombank_title_depends_on_life_and_period() {
        let mut request = flat_request("Газпромбанк");
        request.contract_date = NaiveDate::from_ymd_opt(2023, 1, 1);
        request.risks.title = true;
        let quote = compute_quote(&request, LookupData::bundled().unwrap()).unwrap();
        assert_eq!(quote.title.unwrap().rate, dec!(0.28));

        request.risks.life = false;
        request.contract_date = NaiveDate::from_ymd_opt(2024, 5, 2);
        let quote = compute_quote(&request, LookupData::bundled().unwrap()).unwrap();
        assert_eq!(quote.title.unwrap().rate, dec!(0.457));
    }
}
