//! Per-student mark records and the merge rules applied during sheet uploads.
//!
//! Two independent uploads feed the same record: the CAT 1 sheet carries
//! co1/co2 and the first half of co3, the CAT 2 sheet carries the second half
//! of co3 plus co4/co5. Merging is a pure function; the persistence adapter
//! writes the result in one upsert.

use serde::Serialize;

/// Raw total the percentage is computed against. Inherited from the upstream
/// marking scheme as-is; the stated per-component maxima sum to 150, so
/// totals can exceed 100. Known inconsistency, deliberately not corrected.
pub const MAX_RAW_TOTAL: f64 = 75.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentMark {
    pub register_no: String,
    pub name: Option<String>,
    pub co1: f64,
    pub co2: f64,
    pub co3_part_a: f64,
    pub co3_part_b: f64,
    pub co4: f64,
    pub co5: f64,
    pub total_percentage: f64,
}

/// Fields a single upload supplies. Absent fields leave the stored value
/// untouched, which is what lets the two CAT uploads compose.
#[derive(Debug, Clone, Default)]
pub struct MarkUpdates {
    pub name: Option<String>,
    pub co1: Option<f64>,
    pub co2: Option<f64>,
    pub co3_part_a: Option<f64>,
    pub co3_part_b: Option<f64>,
    pub co4: Option<f64>,
    pub co5: Option<f64>,
}

/// `round(100 * total / 75, 2)`.
pub fn total_percentage(
    co1: f64,
    co2: f64,
    co3_part_a: f64,
    co3_part_b: f64,
    co4: f64,
    co5: f64,
) -> f64 {
    let total = co1 + co2 + co3_part_a + co3_part_b + co4 + co5;
    round2(100.0 * total / MAX_RAW_TOTAL)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Apply one upload's fields over the stored record (or a zeroed record on
/// first appearance) and recompute the derived total.
pub fn merge(register_no: &str, existing: Option<StudentMark>, updates: &MarkUpdates) -> StudentMark {
    let mut rec = existing.unwrap_or_else(|| StudentMark {
        register_no: register_no.to_string(),
        ..StudentMark::default()
    });
    if let Some(name) = &updates.name {
        rec.name = Some(name.clone());
    }
    if let Some(v) = updates.co1 {
        rec.co1 = v;
    }
    if let Some(v) = updates.co2 {
        rec.co2 = v;
    }
    if let Some(v) = updates.co3_part_a {
        rec.co3_part_a = v;
    }
    if let Some(v) = updates.co3_part_b {
        rec.co3_part_b = v;
    }
    if let Some(v) = updates.co4 {
        rec.co4 = v;
    }
    if let Some(v) = updates.co5 {
        rec.co5 = v;
    }
    rec.total_percentage = total_percentage(
        rec.co1,
        rec.co2,
        rec.co3_part_a,
        rec.co3_part_b,
        rec.co4,
        rec.co5,
    );
    rec
}

/// Trimmed register number, or None for rows that must be skipped outright:
/// blank cells and the literal `nan` a spreadsheet export writes for empty
/// cells.
pub fn normalize_register(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(t.to_string())
}

/// Best-effort numeric cell. Anything unparseable (text, blank, missing
/// column) silently becomes 0.0; a bad cell never fails the row.
pub fn parse_mark(cell: Option<&str>) -> f64 {
    cell.and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(0.0)
}
