//! Plain-text rendering of a computed quote.

use std::fmt::Write;

use rust_decimal::Decimal;

use crate::engine::{
    AddonCoverage, AddonLine, LifeQuote, QuoteResult, Variant2Outcome, MISSING_MARKUP_WARNING,
};
use crate::money::{format_money, format_rubles};

/// Render `quote` the way it is sent back to the agent.
pub fn render_report(quote: &QuoteResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, quote);
    out
}

fn write_report(out: &mut String, quote: &QuoteResult) -> std::fmt::Result {
    let insured = &quote.insured;
    writeln!(out, "Банк: {}", quote.bank)?;
    writeln!(out, "Остаток долга: {} ₽", format_money(insured.debt))?;
    writeln!(out)?;

    match insured.markup_percent {
        Some(pct) => {
            let who = if insured.client_markup { " (клиент)" } else { "" };
            writeln!(out, "Надбавка {}%{}: {} ₽", pct.normalize(), who, format_money(insured.markup))?;
            writeln!(out, "Страховая сумма: {} ₽", format_money(insured.amount))?;
        }
        None if quote.warnings.iter().any(|w| w == MISSING_MARKUP_WARNING) => {
            writeln!(out, "Внимание: {}", MISSING_MARKUP_WARNING)?;
        }
        None => writeln!(out, "Страховая сумма: {} ₽", format_money(insured.amount))?,
    }
    writeln!(out)?;

    let v1 = &quote.variant1;
    writeln!(out, "Вариант 1:")?;
    if let Some(property) = v1.property {
        writeln!(out, "Имущество {}", format_money(property))?;
    }
    if let Some(life) = &quote.life {
        write_life(out, life, &v1.life)?;
    }
    if let Some(title) = v1.title {
        writeln!(out, "титул {}", format_money(title))?;
    }
    writeln!(out, "ИТОГО тариф/ взнос {}", format_money(v1.total))?;
    writeln!(out)?;

    match &quote.variant2 {
        Variant2Outcome::Offered(v2) => {
            writeln!(out, "Вариант 2 (повышенные скидки + доп. риски):")?;
            if let Some(property) = v2.property {
                writeln!(out, "имущество {}", format_money(property))?;
            }
            if let Some(life) = &quote.life {
                write_life(out, life, &v2.life_borrowers)?;
            }
            for addon in &v2.addons {
                writeln!(out, "{}", addon_line(addon))?;
            }
            if let Some(title) = v2.title {
                writeln!(out, "титул {}", format_money(title))?;
            }
            writeln!(out, "Итого тариф взнос {}", format_money(v2.total))?;
        }
        Variant2Outcome::Unavailable { reason } => {
            writeln!(out, "Вариант 2: {}", reason)?;
        }
    }

    if let Some(v3) = &quote.variant3 {
        writeln!(out)?;
        writeln!(out, "Вариант 3 (скидка {}%):", v3.discount_percent.normalize())?;
        if let Some(property) = v3.property {
            writeln!(out, "имущество {}", format_money(property))?;
        }
        if let Some(life) = &quote.life {
            write_life(out, life, &v3.life_borrowers)?;
        }
        if let Some(title) = v3.title {
            writeln!(out, "титул {}", format_money(title))?;
        }
        writeln!(out, "ИТОГО тариф/ взнос {}", format_money(v3.total))?;
    }

    let notes: Vec<&String> = quote
        .warnings
        .iter()
        .filter(|w| w.as_str() != MISSING_MARKUP_WARNING)
        .collect();
    if !notes.is_empty() {
        writeln!(out)?;
        for note in notes {
            writeln!(out, "Внимание: {}", note)?;
        }
    }
    Ok(())
}

/// Life lines; the life message follows the first borrower, or stands alone
/// when life is blocked.
fn write_life(out: &mut String, life: &LifeQuote, premiums: &[Decimal]) -> std::fmt::Result {
    let message = life.message();
    if life.blocked || life.borrowers.is_empty() {
        if let Some(message) = message {
            writeln!(out, "{}", message)?;
        }
        return Ok(());
    }

    let several = life.borrowers.len() > 1;
    for (i, (borrower, premium)) in life.borrowers.iter().zip(premiums).enumerate() {
        let label = if several {
            format!("заемщик {}", borrower.number)
        } else {
            "заемщик".to_string()
        };
        write!(out, "жизнь {} {}", label, format_money(*premium))?;
        if i == 0 {
            if let Some(message) = &message {
                write!(out, " {}", message)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn addon_line(addon: &AddonLine) -> String {
    let premium = format_money(addon.premium);
    match addon.coverage {
        AddonCoverage::Sum { sum } => format!(
            "доп риск - {} ({}) на сумму {} ₽ премия {}",
            addon.product,
            addon.objects,
            format_rubles(sum),
            premium
        ),
        AddonCoverage::Package { finish, movable } => {
            let movable = if movable > Decimal::ZERO {
                format!("{} ₽", format_rubles(movable))
            } else {
                "не страхуется".to_string()
            };
            format!(
                "доп риск - {} ({}) отделка {} ₽, движимое {} премия {}",
                addon.product,
                addon.objects,
                format_rubles(finish),
                movable,
                premium
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_quote;
    use crate::lookup::LookupData;
    use crate::types::{Borrower, Gender, ObjectType, ParsedRequest, Risks};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn request(bank: &str, age: u32) -> ParsedRequest {
        ParsedRequest {
            bank: Some(bank.to_string()),
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
                age: Some(age),
                share_percent: 100,
            }],
            ..ParsedRequest::default()
        }
    }

    fn render(request: &ParsedRequest) -> String {
        render_report(&compute_quote(request, LookupData::bundled().unwrap()).unwrap())
    }

    #[test]
    fn test_report_sections() {
        let report = render(&request("Сбербанк", 41));
        let expected = "\
Банк: Сбербанк
Остаток долга: 2 500 000,00 ₽

Страховая сумма: 2 500 000,00 ₽

Вариант 1:
Имущество 2 500,00
жизнь заемщик 16 950,00
ИТОГО тариф/ взнос 19 450,00

Вариант 2 (повышенные скидки + доп. риски):
имущество 1 750,00
жизнь заемщик 13 560,00
доп риск - Моя квартира (отделка и инженерное оборудование) на сумму 200 000 ₽ премия 1 900,00
Итого тариф взнос 17 210,00
";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_fixed_markup_lines() {
        let report = render(&request("Зенит", 41));
        assert!(report.contains("Надбавка 10%: 250 000,00 ₽\nСтраховая сумма: 2 750 000,00 ₽"));
    }

    #[test]
    fn test_missing_client_markup_warning() {
        let report = render(&request("Альфа Банк", 41));
        assert!(report.contains("Внимание: Для этого банка укажите надбавку"));
        assert!(!report.contains("Страховая сумма"));
    }

    #[test]
    fn test_blocked_life_shows_only_message() {
        let report = render(&request("Сбербанк", 66));
        assert!(report.contains("Вариант 1:\nИмущество 2 500,00\nНеобходимо пройти медобследование (возраст 65+ лет)\n"));
        assert!(!report.contains("жизнь заемщик"));
    }

    #[test]
    fn test_package_line() {
        let addon = AddonLine {
            product: "Экспресс квартира".to_string(),
            objects: "отделка и инженерное оборудование, движимое имущество".to_string(),
            coverage: AddonCoverage::Package {
                finish: dec!(50000),
                movable: dec!(0),
            },
            premium: dec!(550),
        };
        assert_eq!(
            addon_line(&addon),
            "доп риск - Экспресс квартира (отделка и инженерное оборудование, движимое имущество) \
             отделка 50 000 ₽, движимое не страхуется премия 550,00"
        );
    }

    #[test]
    fn test_variant3_section() {
        let mut request = request("Сбербанк", 41);
        request.variant3_discount = Some(dec!(15));
        let report = render(&request);
        assert!(report.contains("Вариант 3 (скидка 15%):\nимущество 2 125,00\nжизнь заемщик 14 407,50\nИТОГО тариф/ взнос 16 532,50\n"));
    }
}
