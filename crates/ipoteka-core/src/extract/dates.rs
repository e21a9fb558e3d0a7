//! Date parsing, age calculation and contract date detection.

use chrono::{Datelike, NaiveDate};

use super::patterns::{CONTRACT_DATE_PATTERNS, CREDIT_LINE, DATE_PATTERN};

/// A date and its byte span in the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub start: usize,
    pub end: usize,
}

/// Parse `D.M.YYYY`; years outside 1900–2100 and impossible days are rejected.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_PATTERN.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    if !(1900..=2100).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Every valid date in text order.
pub fn find_dates(text: &str) -> Vec<DateMatch> {
    DATE_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            parse_date(m.as_str()).map(|date| DateMatch {
                date,
                start: m.start(),
                end: m.end(),
            })
        })
        .collect()
}

/// Full years between `dob` and `as_of`; `None` for future or implausible dates.
pub fn age_at(dob: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    let mut years = as_of.year() - dob.year();
    if (as_of.month(), as_of.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok().filter(|age| *age <= 150)
}

/// Contract date: the rightmost trigger match, else the first date on the
/// first line that mentions the credit.
pub fn extract_contract_date(lower: &str) -> Option<NaiveDate> {
    let mut latest: Option<(usize, NaiveDate)> = None;
    for pattern in CONTRACT_DATE_PATTERNS.iter() {
        for caps in pattern.captures_iter(lower) {
            let (Some(whole), Some(date)) = (caps.get(0), caps.get(1).and_then(|m| parse_date(m.as_str())))
            else {
                continue;
            };
            if latest.map_or(true, |(pos, _)| whole.start() > pos) {
                latest = Some((whole.start(), date));
            }
        }
    }
    if let Some((_, date)) = latest {
        return Some(date);
    }

    lower
        .lines()
        .find(|line| CREDIT_LINE.is_match(line))
        .and_then(|line| find_dates(line).first().map(|m| m.date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_validates() {
        assert_eq!(parse_date("15.08.1985"), Some(d(1985, 8, 15)));
        assert_eq!(parse_date("1.2.2020"), Some(d(2020, 2, 1)));
        assert_eq!(parse_date("31.02.2000"), None);
        assert_eq!(parse_date("01.01.1899"), None);
    }

    #[test]
    fn test_age_counts_birthday() {
        let dob = d(1985, 8, 15);
        assert_eq!(age_at(dob, d(2026, 8, 14)), Some(40));
        assert_eq!(age_at(dob, d(2026, 8, 15)), Some(41));
        assert_eq!(age_at(d(2030, 1, 1), d(2026, 1, 1)), None);
    }

    #[test]
    fn test_contract_date_takes_rightmost_trigger() {
        let text = "кд от 01.02.2020\nмуж 15.08.1985\nкд. 21.02.2025г.";
        assert_eq!(extract_contract_date(text), Some(d(2025, 2, 21)));
    }

    #[test]
    fn test_contract_date_trigger_variants() {
        assert_eq!(extract_contract_date("кд.02.12.2025"), Some(d(2025, 12, 2)));
        assert_eq!(
            extract_contract_date("кредитный договор от 10.03.2021"),
            Some(d(2021, 3, 10))
        );
        assert_eq!(extract_contract_date("выдача 05.05.2024"), Some(d(2024, 5, 5)));
    }

    #[test]
    fn test_contract_date_line_fallback() {
        let text = "муж 15.08.1985\nдоговор 2019 года, 12.12.2019";
        assert_eq!(extract_contract_date(text), Some(d(2019, 12, 12)));
    }

    #[test]
    fn test_no_contract_date() {
        assert_eq!(extract_contract_date("муж 15.08.1985"), None);
    }
}
