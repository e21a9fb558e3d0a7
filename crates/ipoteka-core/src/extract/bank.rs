//! Bank identification: alias substrings first, then fuzzy token matching.

use crate::lookup::BankRegistry;

/// Fuzzy matches below this similarity are ignored.
pub const FUZZY_THRESHOLD: f64 = 0.7;

/// A bank recognized in the request text.
#[derive(Debug, Clone, PartialEq)]
pub struct BankMatch {
    pub name: String,
    pub confidence: f64,
}

/// Find the bank named in `lower` (normalized, lowercased text).
pub fn detect_bank(lower: &str, registry: &BankRegistry) -> Option<BankMatch> {
    for bank in registry.iter() {
        if bank.aliases.iter().any(|alias| lower.contains(&alias.to_lowercase())) {
            return Some(BankMatch {
                name: bank.name.clone(),
                confidence: 1.0,
            });
        }
    }

    let mut tokens: Vec<&str> = Vec::new();
    for token in lower.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '(' | ')')) {
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    let mut best: Option<BankMatch> = None;
    for bank in registry.iter() {
        for alias in &bank.aliases {
            let alias = alias.to_lowercase();
            for token in &tokens {
                let score = similarity(token, &alias);
                if best.as_ref().map_or(true, |b| score > b.confidence) {
                    best = Some(BankMatch {
                        name: bank.name.clone(),
                        confidence: score,
                    });
                }
            }
        }
    }

    if let Some(candidate) = &best {
        tracing::debug!(bank = %candidate.name, score = candidate.confidence, "Best fuzzy bank match");
    }
    best.filter(|b| b.confidence >= FUZZY_THRESHOLD)
}

/// `1 − levenshtein / max_len`, over Unicode scalar values.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupData;

    fn registry() -> &'static BankRegistry {
        &LookupData::bundled().unwrap().banks
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("сбер", "сбер"), 0);
        assert_eq!(levenshtein("сбр", "сбер"), 1);
        assert_eq!(levenshtein("", "втб"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_substring_match_wins_with_full_confidence() {
        let m = detect_bank("сбербанк остаток 2 500 000", registry()).unwrap();
        assert_eq!(m.name, "Сбербанк");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn test_alias_maps_to_canonical_name() {
        let m = detect_bank("ипотека открытие, квартира", registry()).unwrap();
        assert_eq!(m.name, "ВТБ");
    }

    #[test]
    fn test_fuzzy_match_below_one() {
        let m = detect_bank("сбр остаток 1 000 000", registry()).unwrap();
        assert_eq!(m.name, "Сбербанк");
        assert!(m.confidence < 1.0 && m.confidence >= FUZZY_THRESHOLD);
    }

    #[test]
    fn test_no_bank_in_text() {
        assert!(detect_bank("остаток 1 000 000 квартира", registry()).is_none());
    }
}
