//! Completeness checks between extraction and pricing.
//!
//! Validation is pure and reports every problem at once, in a fixed order,
//! as user-facing Russian messages.

use crate::lookup::LookupData;
use crate::types::{Material, ObjectType, ParsedRequest};

/// Check that `request` carries everything the engine needs.
pub fn validate(request: &ParsedRequest, lookup: &LookupData) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let bank = request.bank.as_deref().and_then(|name| lookup.banks.resolve(name));
    match (&request.bank, bank) {
        (None, _) => errors.push(
            "Название банка не найдено. Укажите название банка в запросе \
             (например: 'Сбербанк', 'ВТБ', 'Альфа Банк' и т.д.)"
                .to_string(),
        ),
        (Some(name), None) => errors.push(format!(
            "Банк \"{}\" не поддерживается. Поддерживаемые банки: {}",
            name,
            lookup.banks.names().join(", ")
        )),
        (Some(_), Some(_)) => {}
    }

    if request.debt_amount.map_or(true, |debt| debt <= rust_decimal::Decimal::ZERO) {
        errors.push(
            "Остаток задолженности не найден. Укажите остаток долга в рублях \
             (например: 'остаток 2 500 000 ₽' или 'осз 2500000')"
                .to_string(),
        );
    }

    if !request.risks.any() {
        errors.push(
            "Тип страхования не указан. Укажите что нужно застраховать: \
             'жизнь', 'имущество' или 'титул'"
                .to_string(),
        );
    }

    if request.risks.life {
        if request.borrowers.is_empty() {
            errors.push(
                "Для страхования жизни нужны данные заемщика. Укажите дату рождения и пол \
                 (например: 'муж 15.08.1985' или 'жен 23.04.1990')"
                    .to_string(),
            );
        }
        for (i, borrower) in request.borrowers.iter().enumerate() {
            let n = i + 1;
            if borrower.date_of_birth.is_none() {
                errors.push(format!(
                    "У заемщика {} не указана дата рождения. Формат: 'муж/жен DD.MM.YYYY'",
                    n
                ));
            }
            if borrower.gender.is_none() {
                errors.push(format!("У заемщика {} не указан пол. Укажите 'муж' или 'жен'", n));
            }
        }
    }

    if request.risks.property {
        match request.object_type {
            None => errors.push(
                "Для страхования имущества укажите тип объекта: \
                 'квартира', 'дом', 'таунхаус', 'апартаменты'"
                    .to_string(),
            ),
            Some(kind) if kind.is_house() => {
                if request.material.is_none() {
                    errors.push(
                        "Для дома укажите материал стен: 'кирпич', 'дерево', 'панель', 'монолит'"
                            .to_string(),
                    );
                }
                let wooden =
                    kind == ObjectType::HouseWood || request.material == Some(Material::Wood);
                if wooden && request.gas_present.is_none() {
                    errors.push(
                        "Для деревянного дома укажите наличие газа: 'с газом' или 'без газа'"
                            .to_string(),
                    );
                }
            }
            Some(_) => {}
        }
    }

    if let Some(bank) = bank {
        if bank.markup_percent.is_none()
            && bank.client_markup_required
            && request.markup_percent.is_none()
        {
            errors.push(format!(
                "Для банка \"{}\" нужно указать процент надбавки (например: \"{} 6%\" или \"ставка 6%\")",
                bank.name, bank.name
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = errors.len(), "Request failed validation");
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Borrower, Gender, Risks};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn lookup() -> &'static LookupData {
        LookupData::bundled().unwrap()
    }

    fn borrower() -> Borrower {
        Borrower {
            date_of_birth: NaiveDate::from_ymd_opt(1985, 8, 15),
            gender: Some(Gender::Male),
            age: Some(41),
            share_percent: 100,
        }
    }

    fn complete() -> ParsedRequest {
        ParsedRequest {
            bank: Some("Сбербанк".to_string()),
            bank_confidence: 1.0,
            debt_amount: Some(dec!(2500000)),
            risks: Risks {
                life: true,
                property: true,
                title: false,
            },
            object_type: Some(ObjectType::Flat),
            borrowers: vec![borrower()],
            ..ParsedRequest::default()
        }
    }

    #[test]
    fn test_complete_request_passes() {
        assert_eq!(validate(&complete(), lookup()), Ok(()));
    }

    #[test]
    fn test_empty_request_reports_everything_in_order() {
        let errors = validate(&ParsedRequest::default(), lookup()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("Название банка не найдено"));
        assert!(errors[1].starts_with("Остаток задолженности не найден"));
        assert!(errors[2].starts_with("Тип страхования не указан"));
    }

    #[test]
    fn test_unknown_bank_lists_supported() {
        let request = ParsedRequest {
            bank: Some("Несуществующий".to_string()),
            ..complete()
        };
        let errors = validate(&request, lookup()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Сбербанк, Т-Банк / Росбанк"));
    }

    #[test]
    fn test_zero_debt_rejected() {
        let request = ParsedRequest {
            debt_amount: Some(dec!(0)),
            ..complete()
        };
        assert!(validate(&request, lookup()).is_err());
    }

    #[test]
    fn test_borrower_fields_numbered_from_one() {
        let mut second = borrower();
        second.date_of_birth = None;
        second.gender = None;
        let request = ParsedRequest {
            borrowers: vec![borrower(), second],
            ..complete()
        };
        let errors = validate(&request, lookup()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("У заемщика 2 не указана дата рождения"));
        assert!(errors[1].starts_with("У заемщика 2 не указан пол"));
    }

    #[test]
    fn test_wooden_house_needs_gas() {
        let request = ParsedRequest {
            object_type: Some(ObjectType::HouseWood),
            material: Some(Material::Wood),
            ..complete()
        };
        let errors = validate(&request, lookup()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("наличие газа"));

        let with_gas = ParsedRequest {
            gas_present: Some(false),
            ..request
        };
        assert!(validate(&with_gas, lookup()).is_ok());
    }

    #[test]
    fn test_house_needs_material() {
        let request = ParsedRequest {
            object_type: Some(ObjectType::HouseBrick),
            ..complete()
        };
        let errors = validate(&request, lookup()).unwrap_err();
        assert!(errors[0].starts_with("Для дома укажите материал стен"));
    }

    #[test]
    fn test_client_markup_required() {
        let request = ParsedRequest {
            bank: Some("Альфа Банк".to_string()),
            ..complete()
        };
        let errors = validate(&request, lookup()).unwrap_err();
        assert_eq!(
            errors,
            vec!["Для банка \"Альфа Банк\" нужно указать процент надбавки (например: \"Альфа Банк 6%\" или \"ставка 6%\")".to_string()]
        );

        let with_markup = ParsedRequest {
            markup_percent: Some(dec!(6)),
            ..request
        };
        assert!(validate(&with_markup, lookup()).is_ok());
    }

    #[test]
    fn test_markup_optional_for_banks_off_the_list() {
        let request = ParsedRequest {
            bank: Some("Газпромбанк".to_string()),
            ..complete()
        };
        assert!(validate(&request, lookup()).is_ok());
    }
}
