//! Learning-friction scoring: where low marks and high doubt volume overlap,
//! that unit needs teaching attention first.

use crate::marks::StudentMark;
use serde::Serialize;

pub const UNIT_COUNT: usize = 5;

/// Assumed per-unit raw maximum. Applied uniformly, including to the combined
/// co3 (two 15-point halves) — inherited from the upstream scheme, not
/// corrected here.
pub const UNIT_MAX_MARK: f64 = 30.0;

/// Above this score the analyzer asks the generation collaborator for a
/// qualitative report; below it, insights stay empty.
pub const AI_INSIGHT_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrictionEntry {
    pub unit: String,
    pub avg_marks: f64,
    pub doubts: i64,
    pub friction_score: f64,
}

pub fn unit_label(index: usize) -> String {
    format!("Unit {}", index)
}

/// Average percentage per unit across all students, in unit order 1..=5.
/// Returns None for an empty roster; the caller reports "no data" instead of
/// dividing by zero.
pub fn unit_averages(students: &[StudentMark]) -> Option<[f64; UNIT_COUNT]> {
    if students.is_empty() {
        return None;
    }
    let mut sums = [0.0f64; UNIT_COUNT];
    for s in students {
        sums[0] += s.co1;
        sums[1] += s.co2;
        sums[2] += s.co3_part_a + s.co3_part_b;
        sums[3] += s.co4;
        sums[4] += s.co5;
    }
    let denom = students.len() as f64 * UNIT_MAX_MARK;
    Some(sums.map(|total| 100.0 * total / denom))
}

/// `doubts * 1.5 + (100 - avg) * 1.2`. Higher is more urgent.
pub fn friction_score(avg_marks: f64, doubts: i64) -> f64 {
    doubts as f64 * 1.5 + (100.0 - avg_marks) * 1.2
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Combine averages and doubt counts into entries sorted by urgency,
/// highest friction first.
pub fn friction_entries(avgs: &[f64; UNIT_COUNT], doubts: &[i64; UNIT_COUNT]) -> Vec<FrictionEntry> {
    let mut entries: Vec<FrictionEntry> = (0..UNIT_COUNT)
        .map(|i| FrictionEntry {
            unit: unit_label(i + 1),
            avg_marks: round1(avgs[i]),
            doubts: doubts[i],
            friction_score: friction_score(avgs[i], doubts[i]),
        })
        .collect();
    entries.sort_by(|a, b| {
        b.friction_score
            .partial_cmp(&a.friction_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

/// Deterministic stand-in used whenever the generation collaborator fails or
/// returns something unparseable. Derived only from the top unit's numbers so
/// the report is never empty above the threshold.
pub fn fallback_insight(top: &FrictionEntry) -> serde_json::Value {
    serde_json::json!({
        "unit": top.unit,
        "observation": format!("Detected high friction (Score: {})", top.friction_score.round()),
        "root_cause": "AI Analysis temporarily unavailable.",
        "recommendation": "Review Unit performance manually.",
    })
}
