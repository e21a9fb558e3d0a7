//! Medical underwriting table: height × age group × weight bucket.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single cell of the underwriting table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCell", into = "RawCell")]
pub enum UnderwritingCell {
    /// Multiplier on the life tariff (1.00 standard, 1.25 loaded)
    Factor(Decimal),
    /// Medical examination is required
    Exam,
}

impl UnderwritingCell {
    pub fn standard() -> Self {
        UnderwritingCell::Factor(Decimal::ONE)
    }

    pub fn is_exam(&self) -> bool {
        matches!(self, UnderwritingCell::Exam)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CellMarker {
    Exam,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCell {
    Factor(Decimal),
    Marker(CellMarker),
}

impl From<RawCell> for UnderwritingCell {
    fn from(raw: RawCell) -> Self {
        match raw {
            RawCell::Factor(f) => UnderwritingCell::Factor(f),
            RawCell::Marker(CellMarker::Exam) => UnderwritingCell::Exam,
        }
    }
}

impl From<UnderwritingCell> for RawCell {
    fn from(cell: UnderwritingCell) -> Self {
        match cell {
            UnderwritingCell::Factor(f) => RawCell::Factor(f),
            UnderwritingCell::Exam => RawCell::Marker(CellMarker::Exam),
        }
    }
}

/// Age group; a group without bounds catches every remaining age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroup {
    pub label: String,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
}

impl AgeGroup {
    fn contains(&self, age: u32) -> bool {
        self.min_age.map_or(true, |min| age >= min) && self.max_age.map_or(true, |max| age <= max)
    }
}

/// Rows for one height, one row per age group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightRow {
    pub height: u32,
    pub rows: Vec<Vec<UnderwritingCell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingTable {
    /// Weight bucket `i` holds weights below `weight_bounds[i]`
    pub weight_bounds: Vec<u32>,
    pub age_groups: Vec<AgeGroup>,
    pub heights: Vec<HeightRow>,
}

impl UnderwritingTable {
    /// Cell for the given borrower; gaps in the table read as standard risk.
    pub fn lookup(&self, age: u32, height: u32, weight: u32) -> UnderwritingCell {
        let Some(group) = self.age_groups.iter().position(|g| g.contains(age)) else {
            return UnderwritingCell::standard();
        };
        let Some(row) = self.nearest_height(height) else {
            return UnderwritingCell::standard();
        };
        let bucket = self.weight_bucket(weight);

        row.rows
            .get(group)
            .and_then(|cells| cells.get(bucket))
            .copied()
            .unwrap_or_else(UnderwritingCell::standard)
    }

    /// Closest height row; on a tie the lower height wins.
    fn nearest_height(&self, height: u32) -> Option<&HeightRow> {
        let mut rows: Vec<&HeightRow> = self.heights.iter().collect();
        rows.sort_by_key(|r| r.height);
        rows.into_iter().reduce(|best, row| {
            if row.height.abs_diff(height) < best.height.abs_diff(height) {
                row
            } else {
                best
            }
        })
    }

    fn weight_bucket(&self, weight: u32) -> usize {
        self.weight_bounds
            .iter()
            .position(|&bound| weight < bound)
            .unwrap_or(self.weight_bounds.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> UnderwritingTable {
        serde_yaml::from_str(
            r#"
weight_bounds: [60, 80]
age_groups:
  - {label: "16-29", min_age: 16, max_age: 29}
  - {label: "60+"}
heights:
  - height: 160
    rows:
      - [1.25, 1.00, exam]
      - [1.00, 1.25, exam]
  - height: 170
    rows:
      - [exam, 1.00, 1.25]
      - [exam, 1.00, 1.00]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_cells() {
        let t = table();
        assert_eq!(t.lookup(25, 160, 50), UnderwritingCell::Factor(dec!(1.25)));
        assert_eq!(t.lookup(25, 172, 70), UnderwritingCell::Factor(dec!(1)));
        assert!(t.lookup(25, 160, 95).is_exam());
    }

    #[test]
    fn test_nearest_height_prefers_lower_on_tie() {
        let t = table();
        // 165 is equally far from 160 and 170
        assert!(t.lookup(25, 165, 95).is_exam());
        assert_eq!(t.lookup(25, 165, 50), UnderwritingCell::Factor(dec!(1.25)));
    }

    #[test]
    fn test_catch_all_age_group() {
        let t = table();
        assert_eq!(t.lookup(40, 160, 70), UnderwritingCell::Factor(dec!(1.25)));
        assert_eq!(t.lookup(12, 170, 90), UnderwritingCell::Factor(dec!(1)));
    }

    #[test]
    fn test_weight_on_boundary_goes_up() {
        let t = table();
        assert_eq!(t.lookup(25, 160, 60), UnderwritingCell::Factor(dec!(1)));
    }
}
