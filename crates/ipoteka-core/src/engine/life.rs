//! Life premium: age limits, medical underwriting and per-borrower pricing.

use rust_decimal::Decimal;

use super::{BorrowerPremium, LifeQuote, PricingContext, RiskPremium};
use crate::lookup::{AgeLimit, RiskKind, UnderwritingCell};
use crate::money::{discount_multiplier, format_rubles, percent_of, round2};

const EXAM_BY_AGE: &str = "Необходимо пройти медобследование (возраст 65+ лет)";
const EXAM_BY_UNDERWRITING: &str = "Необходимо пройти медобследование";

pub(crate) fn price(ctx: &PricingContext<'_>) -> LifeQuote {
    let request = ctx.request;
    let first_age = request.first_borrower().and_then(|b| b.age);
    let mut insured_amount = ctx.insured_amount;
    let mut messages = Vec::new();

    if let Some(age) = first_age {
        match ctx.lookup.life_age_limits.limit_for(age) {
            AgeLimit::ExamRequired => {
                tracing::debug!(age, "Life cover blocked until medical exam");
                return blocked(insured_amount);
            }
            AgeLimit::Cap(cap) if insured_amount > cap => {
                insured_amount = cap;
                messages.push(format!(
                    "Максимальная страховая сумма для возраста {} лет: {} ₽",
                    age,
                    format_rubles(cap)
                ));
            }
            AgeLimit::Cap(_) | AgeLimit::Unlimited => {}
        }
    }

    let underwriting = match (request.height, request.weight, first_age) {
        (Some(height), Some(weight), Some(age)) => {
            Some(ctx.lookup.underwriting.lookup(age, height, weight))
        }
        _ => None,
    };
    let exam_required = underwriting.is_some_and(|cell| cell.is_exam());
    let loading = match underwriting {
        Some(UnderwritingCell::Factor(factor)) if factor > Decimal::ONE => Some(factor),
        _ => None,
    };
    if exam_required {
        messages.push(EXAM_BY_UNDERWRITING.to_string());
    }
    if loading.is_some() {
        messages.push("Применена надбавка +25% к тарифу жизни (мед. андеррайтинг)".to_string());
    }

    let too_old_for_discount = ctx.bank.life_discount_max_age.is_some_and(|max| {
        request
            .borrowers
            .iter()
            .any(|b| b.age.is_some_and(|age| age >= max))
    });
    let discount_eligible =
        ctx.terms.discounts.life && !exam_required && loading.is_none() && !too_old_for_discount;
    let discount_percent = ctx.discount_percent(RiskKind::Life);
    let multiplier = discount_multiplier(discount_percent);
    let minimum = ctx.minimum(RiskKind::Life);

    let mut borrowers = Vec::new();
    let mut diagnostics = Vec::new();
    for (i, borrower) in request.borrowers.iter().enumerate() {
        let number = i + 1;
        let (Some(age), Some(gender)) = (borrower.age, borrower.gender) else {
            diagnostics.push(format!("Заемщик {}: не указан возраст или пол", number));
            continue;
        };
        let table_name = ctx.bank.life_tariff.table_for(ctx.period, age);
        let Some(rate) = ctx
            .lookup
            .life_table(table_name)
            .and_then(|table| table.rate(gender, age))
        else {
            tracing::warn!(bank = %ctx.bank.name, table = table_name, age, "No life rate for borrower");
            diagnostics.push(format!(
                "Заемщик {}: нет тарифа для возраста {} лет",
                number, age
            ));
            continue;
        };
        tracing::debug!(number, table = table_name, %rate, "Selected life rate");

        let share_amount = percent_of(insured_amount, Decimal::from(borrower.share_percent));
        let mut premium = round2(percent_of(share_amount, rate));
        if i == 0 {
            if let Some(factor) = loading {
                premium = round2(premium * factor);
            }
        }
        let discounted = if discount_eligible {
            round2(premium * multiplier)
        } else {
            premium
        };

        borrowers.push(BorrowerPremium {
            number,
            gender,
            age,
            share_percent: borrower.share_percent,
            table: table_name.to_string(),
            rate,
            premium: premium.max(minimum),
            premium_with_discount: discounted.max(minimum),
        });
    }

    let total_without: Decimal = borrowers.iter().map(|b| b.premium).sum();
    let total_with: Decimal = if discount_eligible {
        borrowers.iter().map(|b| b.premium_with_discount).sum()
    } else {
        total_without
    };

    LifeQuote {
        insured_amount,
        borrowers,
        premium: RiskPremium {
            premium_no_discount: total_without,
            premium_with_discount: total_with,
            discount_applied: discount_eligible,
        },
        discount_percent,
        underwriting,
        exam_required,
        blocked: false,
        messages,
        diagnostics,
    }
}

fn blocked(insured_amount: Decimal) -> LifeQuote {
    LifeQuote {
        insured_amount,
        borrowers: Vec::new(),
        premium: RiskPremium::zero(),
        discount_percent: Decimal::ZERO,
        underwriting: None,
        exam_required: true,
        blocked: true,
        messages: vec![EXAM_BY_AGE.to_string()],
        diagnostics: Vec::new(),
    }
}
