//! Free-text extraction.
//!
//! Turns an agent's request ("Сбербанк остаток 2 500 000 ₽ квартира муж
//! 15.08.1985") into a [`ParsedRequest`]. Extraction never fails: every
//! field is best-effort and completeness is left to
//! [`crate::validation::validate`].
//!
//! All matching runs on the normalized, lowercased text.

pub mod bank;
pub mod borrowers;
pub mod dates;
pub mod normalize;
pub mod patterns;

use std::ops::Range;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::lookup::{BankConfig, BankRegistry};
use crate::types::{Borrower, ConfidenceLevel, Material, ObjectType, ParsedRequest, Risks};

pub use bank::{detect_bank, BankMatch};
pub use normalize::{normalize_text, parse_amount};

use borrowers::{extract_borrowers, gender_only_borrower, normalize_shares, RawBorrower};
use dates::{age_at, extract_contract_date, find_dates};
use normalize::{blank_dates, find_large_numbers, parse_percent, MIN_LARGE_NUMBER};
use patterns::{
    BRICK_PATTERN, DATE_PATTERN, DEBT_AFTER_KEYWORD, DEBT_BEFORE_KEYWORD,
    DISCOUNT_AFTER_KEYWORD, DISCOUNT_BEFORE_KEYWORD, FLAT_PATTERN, GAS_ABSENT, GAS_PRESENT,
    GENDER_WORD, HEIGHT_PATTERN, HOUSE_PATTERN, MARKUP_AFTER_KEYWORD, MARKUP_BEFORE_KEYWORD,
    PERCENT_PATTERN, RISK_ABBREVIATION, WEIGHT_PATTERN, WOOD_PATTERN,
};

const LIFE_STEMS: &[&str] = &["жизн", "life", "личн"];
const PROPERTY_STEMS: &[&str] = &[
    "имущ",
    "квартир",
    "квар",
    "апарт",
    "таун",
    "частный дом",
    "жилой дом",
];
const TITLE_STEMS: &[&str] = &["титул", "title"];

/// Phrases that ask for life and property together.
const LIFE_AND_PROPERTY: &[&str] = &["ж+им", "ж + им", "жизнь и имущ", "2 риска", "два риска"];

/// Characters inspected around a percent when deciding if it is a markup.
const PERCENT_CONTEXT_CHARS: usize = 25;

const HEIGHT_RANGE: std::ops::RangeInclusive<u32> = 120..=220;
const WEIGHT_RANGE: std::ops::RangeInclusive<u32> = 30..=200;
const PLAUSIBLE_BORROWER_AGE: std::ops::RangeInclusive<u32> = 18..=100;

/// Extract a request, computing ages as of today.
pub fn extract(raw: &str, registry: &BankRegistry) -> ParsedRequest {
    extract_as_of(raw, registry, chrono::Local::now().date_naive())
}

/// Extract a request, computing borrower ages as of `as_of`.
pub fn extract_as_of(raw: &str, registry: &BankRegistry, as_of: NaiveDate) -> ParsedRequest {
    let lower = normalize_text(raw).to_lowercase();
    let mut request = ParsedRequest::default();

    let bank_match = detect_bank(&lower, registry);
    let bank_config = bank_match.as_ref().and_then(|m| registry.get(&m.name));
    if let Some(m) = &bank_match {
        if m.confidence < 1.0 {
            request.notes.push(format!(
                "Банк \"{}\" определен приблизительно (совпадение {:.2})",
                m.name, m.confidence
            ));
        }
        request.bank = Some(m.name.clone());
        request.bank_confidence = m.confidence;
    }

    let (debt, candidates) = extract_debt(&lower);
    request.debt_amount = debt;
    request.debt_amount_candidates = candidates;
    if request.debt_amount_candidates.len() > 1 {
        request
            .notes
            .push("Найдено несколько сумм, выбран остаток по ключевому слову или первая сумма".to_string());
    }

    request.contract_date = extract_contract_date(&lower);
    request.dates = find_dates(&lower).into_iter().map(|m| m.date).collect();

    let masked = mask_bank(&lower, bank_config);
    request.object_type = detect_object_type(&masked);
    request.material = detect_material(&masked);
    request.gas_present = detect_gas(&lower);
    request.height = first_in_range(&HEIGHT_PATTERN, &lower, HEIGHT_RANGE);
    request.weight = first_in_range(&WEIGHT_PATTERN, &lower, WEIGHT_RANGE);
    request.markup_percent = extract_markup(&lower);
    request.variant3_discount = extract_discount(&lower);

    let mut raw_borrowers = extract_borrowers(&lower, request.contract_date);
    if raw_borrowers.is_empty() {
        if let Some(borrower) = gender_only_borrower(&lower) {
            request.notes.push("Дата рождения заемщика не указана".to_string());
            raw_borrowers.push(borrower);
        }
    }

    request.risks = detect_risks(&masked);
    if raw_borrowers.is_empty() && request.risks.life {
        if let Some(borrower) = plausible_borrower(&request, as_of) {
            request.notes.push("Заемщик определен по дате без указания пола".to_string());
            raw_borrowers.push(borrower);
        }
    }

    if !raw_borrowers.is_empty() {
        request.risks.life = true;
    }
    if request.object_type.is_some() {
        request.risks.property = true;
    }

    request.borrowers = settle_borrowers(raw_borrowers, as_of);
    request.confidence = confidence(&request);
    request.confidence_level = ConfidenceLevel::from_score(request.confidence);

    tracing::debug!(
        bank = ?request.bank,
        debt = ?request.debt_amount,
        borrowers = request.borrowers.len(),
        confidence = request.confidence,
        "Extracted request"
    );
    request
}

/// Debt amount and every large-number candidate, the chosen one first.
fn extract_debt(lower: &str) -> (Option<Decimal>, Vec<Decimal>) {
    let blanked = blank_dates(lower);
    let large = find_large_numbers(lower);

    let keyed = DEBT_AFTER_KEYWORD
        .captures_iter(&blanked)
        .filter_map(|caps| {
            let number = caps.get(1)?;
            if blanked[number.end()..].trim_start().starts_with('%') {
                return None;
            }
            parse_amount(number.as_str())
        })
        .find(|amount| *amount >= MIN_LARGE_NUMBER)
        .or_else(|| {
            DEBT_BEFORE_KEYWORD
                .captures_iter(&blanked)
                .filter_map(|caps| parse_amount(caps.get(1)?.as_str()))
                .find(|amount| *amount >= MIN_LARGE_NUMBER)
        });

    let Some(chosen) = keyed.or_else(|| large.first().copied()) else {
        return (None, Vec::new());
    };

    let mut candidates = vec![chosen];
    let mut skipped = false;
    for amount in large {
        if !skipped && amount == chosen {
            skipped = true;
            continue;
        }
        candidates.push(amount);
    }
    (Some(chosen), candidates)
}

/// Blank out the detected bank's name and aliases so "Дом.РФ" never reads
/// as a house.
fn mask_bank(lower: &str, bank: Option<&BankConfig>) -> String {
    let Some(bank) = bank else {
        return lower.to_string();
    };
    let mut names: Vec<String> = bank
        .aliases
        .iter()
        .map(|a| a.to_lowercase())
        .chain(std::iter::once(bank.name.to_lowercase()))
        .collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));

    let mut masked = lower.to_string();
    for name in names.iter().filter(|n| !n.is_empty()) {
        masked = masked.replace(name.as_str(), " ");
    }
    masked
}

fn contains_any(text: &str, stems: &[&str]) -> bool {
    stems.iter().any(|stem| text.contains(stem))
}

fn detect_risks(masked: &str) -> Risks {
    let mut risks = Risks {
        life: contains_any(masked, LIFE_STEMS),
        property: contains_any(masked, PROPERTY_STEMS) || RISK_ABBREVIATION.is_match(masked),
        title: contains_any(masked, TITLE_STEMS),
    };
    if contains_any(masked, LIFE_AND_PROPERTY) {
        risks.life = true;
        risks.property = true;
    }
    risks
}

fn detect_object_type(masked: &str) -> Option<ObjectType> {
    if masked.contains("таун") {
        Some(ObjectType::Townhouse)
    } else if masked.contains("апарт") {
        Some(ObjectType::Apartment)
    } else if FLAT_PATTERN.is_match(masked) {
        Some(ObjectType::Flat)
    } else if HOUSE_PATTERN.is_match(masked) {
        if BRICK_PATTERN.is_match(masked) {
            Some(ObjectType::HouseBrick)
        } else if WOOD_PATTERN.is_match(masked) {
            Some(ObjectType::HouseWood)
        } else {
            Some(ObjectType::HouseBrick)
        }
    } else {
        None
    }
}

fn detect_material(masked: &str) -> Option<Material> {
    if masked.contains("кирпич") || masked.contains("блок") {
        Some(Material::Brick)
    } else if WOOD_PATTERN.is_match(masked) {
        Some(Material::Wood)
    } else if masked.contains("газобетон") {
        Some(Material::Gasobet)
    } else {
        None
    }
}

fn detect_gas(lower: &str) -> Option<bool> {
    if GAS_PRESENT.is_match(lower) {
        Some(true)
    } else if GAS_ABSENT.is_match(lower) {
        Some(false)
    } else {
        None
    }
}

fn first_in_range(
    pattern: &regex::Regex,
    lower: &str,
    range: std::ops::RangeInclusive<u32>,
) -> Option<u32> {
    pattern
        .captures_iter(lower)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .find(|value| range.contains(value))
}

/// Last `n` characters of `s`.
fn tail_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

/// First `n` characters of `s`.
fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn discount_spans(lower: &str) -> Vec<Range<usize>> {
    DISCOUNT_AFTER_KEYWORD
        .find_iter(lower)
        .chain(DISCOUNT_BEFORE_KEYWORD.find_iter(lower))
        .map(|m| m.range())
        .collect()
}

fn extract_markup(lower: &str) -> Option<Decimal> {
    let discounts = discount_spans(lower);
    let in_discount = |pos: usize| discounts.iter().any(|span| span.contains(&pos));

    let keyed = MARKUP_AFTER_KEYWORD
        .captures_iter(lower)
        .chain(MARKUP_BEFORE_KEYWORD.captures_iter(lower))
        .find_map(|caps| {
            let value = caps.get(1)?;
            if in_discount(value.start()) {
                return None;
            }
            parse_percent(value.as_str())
        });
    if keyed.is_some() {
        return keyed;
    }

    for caps in PERCENT_PATTERN.captures_iter(lower) {
        let Some(whole) = caps.get(0) else { continue };
        if in_discount(whole.start()) {
            continue;
        }

        let line_start = lower[..whole.start()].rfind('\n').map_or(0, |i| i + 1);
        let before = tail_chars(&lower[line_start..whole.start()], PERCENT_CONTEXT_CHARS);
        if DATE_PATTERN.is_match(before) || GENDER_WORD.is_match(before) {
            continue;
        }
        let rest = &lower[whole.end()..];
        let rest = rest.split('\n').next().unwrap_or(rest);
        if DATE_PATTERN.is_match(head_chars(rest, PERCENT_CONTEXT_CHARS)) {
            continue;
        }

        if let Some(pct) = caps.get(1).and_then(|m| parse_percent(m.as_str())) {
            return Some(pct);
        }
    }
    None
}

/// Flat discount the client asked for, in (0, 100].
fn extract_discount(lower: &str) -> Option<Decimal> {
    DISCOUNT_AFTER_KEYWORD
        .captures_iter(lower)
        .chain(DISCOUNT_BEFORE_KEYWORD.captures_iter(lower))
        .filter_map(|caps| parse_percent(caps.get(1)?.as_str()))
        .find(|pct| *pct > Decimal::ZERO && *pct <= Decimal::ONE_HUNDRED)
}

/// First date that looks like an adult's birth date and is not the contract date.
fn plausible_borrower(request: &ParsedRequest, as_of: NaiveDate) -> Option<RawBorrower> {
    request
        .dates
        .iter()
        .copied()
        .filter(|date| Some(*date) != request.contract_date)
        .find(|date| age_at(*date, as_of).is_some_and(|age| PLAUSIBLE_BORROWER_AGE.contains(&age)))
        .map(|date| RawBorrower {
            date_of_birth: Some(date),
            gender: None,
            share: Some(100),
        })
}

fn settle_borrowers(raw: Vec<RawBorrower>, as_of: NaiveDate) -> Vec<Borrower> {
    let shares: Vec<Option<u32>> = raw.iter().map(|b| b.share).collect();
    raw.into_iter()
        .zip(normalize_shares(&shares))
        .map(|(b, share_percent)| Borrower {
            date_of_birth: b.date_of_birth,
            gender: b.gender,
            age: b.date_of_birth.and_then(|dob| age_at(dob, as_of)),
            share_percent,
        })
        .collect()
}

fn confidence(request: &ParsedRequest) -> f64 {
    let mut score = 0.25 * request.bank_confidence;
    if request.debt_amount.is_some() {
        score += 0.25;
    }
    score += (0.1 * request.borrowers.len() as f64).min(0.25);
    if request.object_type.is_some() {
        score += 0.1;
    }
    if request.material.is_some() {
        score += 0.05;
    }
    if request.markup_percent.is_some() {
        score += 0.05;
    }
    score.clamp(0.0, 1.0)
}
