//! Full pipeline runs: text in, quote or validation errors out.

use chrono::NaiveDate;
use ipoteka_core::{
    extract_as_of, quote_text, render_report, validate, Gender, LookupData, ObjectType, QuoteError,
    Variant2Outcome,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn lookup() -> &'static LookupData {
    LookupData::bundled().unwrap()
}

#[test]
fn test_sberbank_flat_male() {
    let text = "Сбербанк остаток 2 500 000 ₽ квартира муж 15.08.1985";

    let request = extract_as_of(text, &lookup().banks, as_of());
    assert_eq!(request.bank.as_deref(), Some("Сбербанк"));
    assert_eq!(request.debt_amount, Some(dec!(2500000)));
    assert!(request.risks.life);
    assert!(request.risks.property);
    assert!(!request.risks.title);
    assert_eq!(request.object_type, Some(ObjectType::Flat));
    assert_eq!(request.borrowers.len(), 1);
    assert_eq!(request.borrowers[0].gender, Some(Gender::Male));
    assert_eq!(request.borrowers[0].date_of_birth, NaiveDate::from_ymd_opt(1985, 8, 15));
    assert_eq!(request.borrowers[0].age, Some(41));
    assert_eq!(validate(&request, lookup()), Ok(()));

    let quote = quote_text(text, lookup(), as_of()).unwrap();
    assert_eq!(quote.insured.amount, dec!(2500000));
    assert_eq!(quote.variant1.life, vec![dec!(16950)]);
    assert_eq!(quote.variant1.property, Some(dec!(2500)));
    assert_eq!(quote.variant1.total, dec!(19450));

    if let Variant2Outcome::Offered(v2) = &quote.variant2 {
        assert!(v2.total < quote.variant1.total);
    }

    let report = render_report(&quote);
    assert!(report.contains("Имущество 2 500,00"));
    assert!(report.contains("жизнь заемщик 16 950,00"));
    assert!(report.contains("ИТОГО тариф/ взнос 19 450,00"));
}

#[test]
fn test_borrower_aged_66_needs_exam() {
    let text = "Сбербанк остаток 2 500 000 ₽ квартира муж 01.01.1960";

    let quote = quote_text(text, lookup(), as_of()).unwrap();
    let life = quote.life.as_ref().unwrap();
    assert!(life.blocked);
    assert_eq!(life.premium.premium_no_discount, Decimal::ZERO);
    assert_eq!(
        life.message().as_deref(),
        Some("Необходимо пройти медобследование (возраст 65+ лет)")
    );
    assert_eq!(quote.variant1.total, dec!(2500));

    let report = render_report(&quote);
    assert!(report.contains("Вариант 1:\nИмущество 2 500,00\nНеобходимо пройти медобследование (возраст 65+ лет)\n"));
    assert!(!report.contains("жизнь заемщик"));
}

#[test]
fn test_alfa_without_markup_is_rejected() {
    let text = "Альфа остаток 2 500 000 ₽ квартира муж 15.08.1985";

    match quote_text(text, lookup(), as_of()) {
        Err(QuoteError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("нужно указать процент надбавки"));
        }
        other => panic!("expected validation error, got {:?}", other.map(|q| q.variant1.total)),
    }
}

#[test]
fn test_alfa_with_client_markup() {
    let text = "Альфа остаток 2 000 000 ₽ квартира, надбавка 15%, муж 15.08.1985";

    let quote = quote_text(text, lookup(), as_of()).unwrap();
    assert_eq!(quote.insured.markup_percent, Some(dec!(15)));
    assert!(quote.insured.client_markup);
    assert_eq!(quote.insured.amount, dec!(2300000));
    assert!(render_report(&quote).contains("Надбавка 15% (клиент): 300 000,00 ₽"));
}

#[test]
fn test_two_borrowers_with_shares() {
    let text = "ВТБ остаток 3 000 000 квартира\nмуж 15.08.1985 60%\nжена 01.01.1990 40%";

    let quote = quote_text(text, lookup(), as_of()).unwrap();
    let life = quote.life.as_ref().unwrap();
    assert_eq!(life.borrowers.len(), 2);
    assert_eq!(life.borrowers[0].share_percent, 60);
    assert_eq!(life.borrowers[1].share_percent, 40);
    assert_eq!(life.borrowers[1].gender, Gender::Female);

    let report = render_report(&quote);
    assert!(report.contains("жизнь заемщик 1 "));
    assert!(report.contains("жизнь заемщик 2 "));
}
