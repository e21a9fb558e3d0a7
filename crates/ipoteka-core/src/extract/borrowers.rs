//! Borrower detection and share normalization.
//!
//! Each line is scanned by several passes in priority order:
//!
//! - (a) gender word, comma or space, date: `муж, 07.01.1985`
//! - (b) gender word with a share: `жен 04.06.1981 - 50%`, `он - 50% - 13.04.1968`
//! - (c) date, then gender word: `02.03.1980 женщина`
//! - (d) gender word, a few non-digits, date: `она родилась 25.11.1992`
//!
//! A date found by an earlier pass is never taken again by a later one.

use chrono::NaiveDate;
use regex::Captures;

use super::dates::parse_date;
use super::patterns::{
    CREDIT_TRIGGER, DATE_GENDER, GENDER_COMMA_DATE, GENDER_DATE_SHARE, GENDER_FAR_DATE,
    GENDER_NEAR_DATE, GENDER_SHARE_DATE, GENDER_WORD, KD_WORD, LINE_STARTS_WITH_DATE,
    SHARE_FOLLOWS,
};
use crate::types::Gender;

/// A borrower before ages and shares are settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBorrower {
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    /// Share written in the request, if any
    pub share: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    dob: NaiveDate,
    gender: Gender,
    share: Option<u32>,
}

pub fn gender_of(word: &str) -> Gender {
    if word.starts_with('ж') || word == "она" {
        Gender::Female
    } else {
        Gender::Male
    }
}

fn candidate(caps: &Captures<'_>, gender: usize, date: usize, share: Option<usize>) -> Option<Candidate> {
    Some(Candidate {
        start: caps.get(0)?.start(),
        dob: parse_date(caps.get(date)?.as_str())?,
        gender: gender_of(caps.get(gender)?.as_str()),
        share: match share {
            Some(i) => Some(caps.get(i)?.as_str().parse().ok()?),
            None => None,
        },
    })
}

/// Passes (a) and (b); returns candidates in priority order.
fn gender_first_candidates(text: &str) -> Vec<Candidate> {
    let mut found = Vec::new();

    for caps in GENDER_COMMA_DATE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if SHARE_FOLLOWS.is_match(&text[whole.end()..]) {
            continue;
        }
        found.extend(candidate(&caps, 1, 2, None));
    }
    for caps in GENDER_DATE_SHARE.captures_iter(text) {
        found.extend(candidate(&caps, 1, 2, Some(3)));
    }
    for caps in GENDER_SHARE_DATE.captures_iter(text) {
        found.extend(candidate(&caps, 1, 3, Some(2)));
    }
    found
}

fn line_candidates(line: &str) -> Vec<Candidate> {
    let starts_with_date = LINE_STARTS_WITH_DATE.is_match(line);
    let mut found = if starts_with_date {
        Vec::new()
    } else {
        gender_first_candidates(line)
    };
    let gender_first_found = !found.is_empty();

    for caps in DATE_GENDER.captures_iter(line) {
        found.extend(candidate(&caps, 2, 1, None));
    }

    if !starts_with_date && !gender_first_found {
        for caps in GENDER_NEAR_DATE.captures_iter(line) {
            found.extend(candidate(&caps, 1, 2, None));
        }
    }
    found
}

/// Keep the first candidate per birth date, skip the contract date, then
/// restore text order.
fn accept(
    candidates: Vec<Candidate>,
    taken: &[RawBorrower],
    contract_date: Option<NaiveDate>,
) -> Vec<RawBorrower> {
    let mut accepted: Vec<Candidate> = Vec::new();
    for c in candidates {
        let duplicate = taken.iter().any(|b| b.date_of_birth == Some(c.dob))
            || accepted.iter().any(|a| a.dob == c.dob);
        if Some(c.dob) == contract_date || duplicate {
            continue;
        }
        accepted.push(c);
    }
    accepted.sort_by_key(|c| c.start);
    accepted
        .into_iter()
        .map(|c| RawBorrower {
            date_of_birth: Some(c.dob),
            gender: Some(c.gender),
            share: c.share,
        })
        .collect()
}

/// Borrowers with a birth date, in text order.
pub fn extract_borrowers(lower: &str, contract_date: Option<NaiveDate>) -> Vec<RawBorrower> {
    let mut found: Vec<RawBorrower> = Vec::new();

    for line in lower.lines() {
        if CREDIT_TRIGGER.is_match(line) {
            continue;
        }
        let accepted = accept(line_candidates(line), &found, contract_date);
        found.extend(accepted);
    }

    if found.is_empty() {
        let mut candidates = gender_first_candidates(lower);
        for caps in GENDER_FAR_DATE.captures_iter(lower) {
            if caps.get(0).is_some_and(|m| KD_WORD.is_match(m.as_str())) {
                continue;
            }
            candidates.extend(candidate(&caps, 1, 2, None));
        }
        found = accept(candidates, &[], contract_date);
        if !found.is_empty() {
            tracing::debug!(count = found.len(), "Borrowers found by whole-text fallback");
        }
    }

    found
}

/// A borrower known only by a gender word.
pub fn gender_only_borrower(lower: &str) -> Option<RawBorrower> {
    let caps = GENDER_WORD.captures(lower)?;
    Some(RawBorrower {
        date_of_birth: None,
        gender: Some(gender_of(caps.get(1)?.as_str())),
        share: Some(100),
    })
}

/// Settle shares so they sum to exactly 100.
///
/// Without explicit shares 100 is split by floor division and the last
/// borrower takes the remainder. With some explicit shares the missing
/// ones count as zero and everything is rescaled to 100, the rounding
/// residue again going to the last borrower.
pub fn normalize_shares(shares: &[Option<u32>]) -> Vec<u32> {
    let n = shares.len();
    if n == 0 {
        return Vec::new();
    }
    if shares.iter().all(Option::is_none) {
        return equal_split(n);
    }

    let raw: Vec<u32> = shares.iter().map(|s| s.unwrap_or(0)).collect();
    let total: u32 = raw.iter().sum();
    if total == 0 {
        return equal_split(n);
    }
    if total == 100 {
        return raw;
    }

    let mut scaled: Vec<u32> = raw[..n - 1]
        .iter()
        .map(|s| (s * 200 + total) / (2 * total))
        .collect();

    // Rounding up several shares can overshoot; take the excess back from the end.
    let mut sum: u32 = scaled.iter().sum();
    for share in scaled.iter_mut().rev() {
        if sum <= 100 {
            break;
        }
        let cut = (*share).min(sum - 100);
        *share -= cut;
        sum -= cut;
    }

    scaled.push(100 - sum);
    scaled
}

fn equal_split(n: usize) -> Vec<u32> {
    let n = n as u32;
    let each = 100 / n;
    let mut shares = vec![each; n as usize - 1];
    shares.push(100 - each * (n - 1));
    shares
}
