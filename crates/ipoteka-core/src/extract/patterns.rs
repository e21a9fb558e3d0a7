//! Regex patterns shared by the extraction passes.
//!
//! Every pattern runs on normalized, lowercased text.

use lazy_static::lazy_static;
use regex::Regex;

/// `D.M.YYYY` with one or two digit day and month.
pub const DATE: &str = r"(\d{1,2}\.\d{1,2}\.\d{4})";

/// Gender words, longest alternatives first.
pub const GENDER: &str = r"\b(мужчина|женщина|мужч|муж|жена|жен|она|он)\b";

/// A number with optional `.`/`,` parts and single-space thousands groups.
pub const NUMBER: &str = r"(\d+(?:[.,]\d+)*(?: \d{3}\b(?:[.,]\d+)*)*)";

/// A percent value like `15`, `5,9` or `12.5`.
pub const PERCENT_VALUE: &str = r"(\d+(?:[.,]\d+)?)";

lazy_static! {
    // =========================================================================
    // NUMBERS AND DATES
    // =========================================================================

    pub static ref DATE_PATTERN: Regex = Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})").unwrap();

    pub static ref LINE_STARTS_WITH_DATE: Regex =
        Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{4}").unwrap();

    pub static ref NUMBER_PATTERN: Regex = Regex::new(NUMBER).unwrap();

    /// Debt keyword, then the amount
    pub static ref DEBT_AFTER_KEYWORD: Regex = Regex::new(&format!(
        r"\b(?:остаток|осз|ост|сумма кредита|долг)[^\d\n]{{0,10}}{NUMBER}"
    ))
    .unwrap();

    /// The amount, then the debt keyword
    pub static ref DEBT_BEFORE_KEYWORD: Regex = Regex::new(&format!(
        r"{NUMBER}[^\d\n]{{0,10}}\b(?:остаток|осз|ост|сумма кредита|долг)"
    ))
    .unwrap();

    pub static ref PERCENT_PATTERN: Regex =
        Regex::new(&format!(r"{PERCENT_VALUE}\s*%")).unwrap();

    // =========================================================================
    // CONTRACT DATE
    // =========================================================================

    /// Triggers that introduce the credit contract date
    pub static ref CONTRACT_DATE_PATTERNS: Vec<Regex> = [
        format!(r"\bкд[^\d]{{1,10}}{DATE}"),
        format!(r"кредитный\s+договор\s+от\s+{DATE}"),
        format!(r"кредит\s+от\s+{DATE}"),
        format!(r"выдача\s+{DATE}"),
        format!(r"договор\s+от\s+{DATE}"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    /// A line that talks about the credit contract
    pub static ref CREDIT_LINE: Regex =
        Regex::new(r"\bкд\b|\bкредит\b|\bдоговор\b").unwrap();

    /// Lines with these words never hold a borrower
    pub static ref CREDIT_TRIGGER: Regex =
        Regex::new(r"\bкд\b|кредитный договор|\bкредит|\bдоговор|\bвыдача").unwrap();

    pub static ref KD_WORD: Regex = Regex::new(r"\bкд\b").unwrap();

    // =========================================================================
    // BORROWERS
    // =========================================================================

    /// (a) `муж, 07.01.1985`
    pub static ref GENDER_COMMA_DATE: Regex =
        Regex::new(&format!(r"{GENDER}[,\s]+{DATE}")).unwrap();

    /// (b) `жен 04.06.1981 - 50%`
    pub static ref GENDER_DATE_SHARE: Regex = Regex::new(&format!(
        r"{GENDER}[^\d\n]{{0,20}}{DATE}[^\d\n]{{0,20}}(\d{{1,3}})\s*%"
    ))
    .unwrap();

    /// (b) `он - 50% - 13.04.1968`
    pub static ref GENDER_SHARE_DATE: Regex = Regex::new(&format!(
        r"{GENDER}[^\d\n]{{0,20}}(\d{{1,3}})\s*%[^\d\n]{{0,20}}{DATE}"
    ))
    .unwrap();

    /// (c) `02.03.1980 женщина`
    pub static ref DATE_GENDER: Regex =
        Regex::new(&format!(r"{DATE}\s+{GENDER}")).unwrap();

    /// (d) `она родилась 25.11.1992`
    pub static ref GENDER_NEAR_DATE: Regex =
        Regex::new(&format!(r"{GENDER}[^\d\n]{{0,20}}{DATE}")).unwrap();

    /// Global fallback: gender word and date may be further apart
    pub static ref GENDER_FAR_DATE: Regex =
        Regex::new(&format!(r"{GENDER}[^\d]{{0,30}}{DATE}")).unwrap();

    /// A share right after an (a) match defers it to (b)
    pub static ref SHARE_FOLLOWS: Regex = Regex::new(r"^[^\d\n]{0,20}\d{1,3}\s*%").unwrap();

    pub static ref GENDER_WORD: Regex = Regex::new(GENDER).unwrap();

    // =========================================================================
    // RISKS AND OBJECT
    // =========================================================================

    pub static ref RISK_ABBREVIATION: Regex = Regex::new(r"\b(?:кв|им|дом)\b").unwrap();

    pub static ref FLAT_PATTERN: Regex = Regex::new(r"кварт|квар|\bкв\b").unwrap();

    pub static ref HOUSE_PATTERN: Regex = Regex::new(r"\bдом").unwrap();

    pub static ref BRICK_PATTERN: Regex =
        Regex::new(r"кирпич|блок|ж/б|железобетон").unwrap();

    pub static ref WOOD_PATTERN: Regex = Regex::new(r"дерев|древес|каркас|брус").unwrap();

    pub static ref GAS_PRESENT: Regex =
        Regex::new(r"газ есть|есть газ|с газом|газ:\s*есть").unwrap();

    pub static ref GAS_ABSENT: Regex =
        Regex::new(r"газа нет|нет газа|без газа|газ отсутствует").unwrap();

    // =========================================================================
    // BODY MEASUREMENTS AND PERCENTS
    // =========================================================================

    pub static ref HEIGHT_PATTERN: Regex =
        Regex::new(r"\b(?:ростом|рост|height)\s*:?\s*(\d{2,3})\b").unwrap();

    pub static ref WEIGHT_PATTERN: Regex =
        Regex::new(r"\b(?:весом|вес|weight)\s*:?\s*(\d{2,3})\b").unwrap();

    /// `ставка 10%`, `надбавка: 15 %`, `ст 7%`
    pub static ref MARKUP_AFTER_KEYWORD: Regex = Regex::new(&format!(
        r"(?:ставк\w*|надбавк\w*|\bст\b)[^\d\n]{{0,20}}{PERCENT_VALUE}\s*%"
    ))
    .unwrap();

    /// `15% надбавка`
    pub static ref MARKUP_BEFORE_KEYWORD: Regex =
        Regex::new(&format!(r"{PERCENT_VALUE}\s*%\s*надбавк")).unwrap();

    /// `скидка 15%`
    pub static ref DISCOUNT_AFTER_KEYWORD: Regex = Regex::new(&format!(
        r"скидк\w*[^\d\n]{{0,15}}{PERCENT_VALUE}\s*%"
    ))
    .unwrap();

    /// `15% скидка`
    pub static ref DISCOUNT_BEFORE_KEYWORD: Regex =
        Regex::new(&format!(r"{PERCENT_VALUE}\s*%\s*скидк")).unwrap();
}
