//! Text normalization and amount parsing.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{DATE_PATTERN, NUMBER_PATTERN};
use crate::money::round2;

/// Numbers below this are never debt candidates.
pub const MIN_LARGE_NUMBER: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Unify spacing, quotes, dashes and line endings.
///
/// Idempotent: `normalize_text(&normalize_text(s)) == normalize_text(s)`.
pub fn normalize_text(raw: &str) -> String {
    let unified: String = raw
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{2007}' => ' ',
            '«' | '»' | '“' | '”' | '„' => '"',
            '–' | '—' | '−' | '‒' => '-',
            _ => c,
        })
        .collect();
    let unified = unified.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<String> = unified.split('\n').map(collapse_spaces).collect();
    lines.join("\n").trim().to_string()
}

fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_run = false;
    for c in line.chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.trim().to_string()
}

/// Parse a money amount like `2 500 000 ₽`, `3.991.511,63` or `1500000.50 руб`.
///
/// The last comma is the decimal separator. Without a comma, several dots
/// are thousands separators and a single dot is decimal. Anything else
/// left over rejects the input.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let lower = input.to_lowercase();
    let stripped = lower
        .replace('₽', "")
        .replace("рублей", "")
        .replace("руб", "")
        .replace('р', "");
    let compact: String = stripped
        .trim_end_matches('.')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.is_empty() {
        return None;
    }

    let canonical = match compact.rfind(',') {
        Some(pos) => {
            let integer: String = compact[..pos].chars().filter(|c| *c != '.' && *c != ',').collect();
            let fraction = &compact[pos + 1..];
            if fraction.is_empty() {
                integer
            } else {
                format!("{}.{}", integer, fraction)
            }
        }
        None if compact.matches('.').count() > 1 => compact.replace('.', ""),
        None => compact,
    };

    let valid = !canonical.is_empty()
        && !canonical.starts_with('.')
        && canonical.chars().all(|c| c.is_ascii_digit() || c == '.')
        && canonical.matches('.').count() <= 1;
    if !valid {
        return None;
    }

    Decimal::from_str(&canonical).ok().map(round2)
}

/// Replace every date with a marker so it never reads as an amount.
pub fn blank_dates(text: &str) -> String {
    DATE_PATTERN.replace_all(text, "§").into_owned()
}

/// All numbers of at least [`MIN_LARGE_NUMBER`], in text order.
pub fn find_large_numbers(text: &str) -> Vec<Decimal> {
    // Thousands groups join on a plain space only, so matches never span lines.
    let blanked = blank_dates(text);
    NUMBER_PATTERN
        .find_iter(&blanked)
        .filter_map(|m| parse_amount(m.as_str()))
        .filter(|n| *n >= MIN_LARGE_NUMBER)
        .collect()
}

/// Parse a percent like `5,9` or `15`.
pub fn parse_percent(value: &str) -> Option<Decimal> {
    Decimal::from_str(&value.replace(',', ".")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_unifies_characters() {
        let raw = "Сбер\u{00A0}«кв»  —\tостаток\r\n  муж   15.08.1985  ";
        assert_eq!(normalize_text(raw), "Сбер \"кв\" - остаток\nмуж 15.08.1985");
    }

    #[test]
    fn test_normalize_trims_outer_blank_lines() {
        assert_eq!(normalize_text("\n\n  а\n\nб \n\n"), "а\n\nб");
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("2 500 000 ₽"), Some(dec!(2500000)));
        assert_eq!(parse_amount("3.991.511,63"), Some(dec!(3991511.63)));
        assert_eq!(parse_amount("3 991 511,63"), Some(dec!(3991511.63)));
        assert_eq!(parse_amount("1500000.5 руб"), Some(dec!(1500000.50)));
        assert_eq!(parse_amount("1.500.000"), Some(dec!(1500000)));
        assert_eq!(parse_amount("1 000 рублей"), Some(dec!(1000)));
    }

    #[test]
    fn test_parse_amount_rounds_to_kopecks() {
        assert_eq!(parse_amount("100,125"), Some(dec!(100.13)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("₽"), None);
        assert_eq!(parse_amount("12abc"), None);
        assert_eq!(parse_amount("1.2.3,4x"), None);
    }

    #[test]
    fn test_large_numbers_skip_dates_and_small_values() {
        let found = find_large_numbers("муж 15.08.1985\nостаток 2 500 000\nрост 180");
        assert_eq!(found, vec![dec!(2500000)]);
    }

    proptest! {
        #[test]
        fn test_normalize_is_idempotent(s in "[ \\t\\r\\nа-яА-Я0-9.,«»—–%\u{00A0}]{0,60}") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }
    }
}
