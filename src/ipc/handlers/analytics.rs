use crate::ai;
use crate::friction::{self, UNIT_COUNT};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::marks::StudentMark;
use rusqlite::Connection;
use serde_json::json;

fn load_all_students(conn: &Connection) -> rusqlite::Result<Vec<StudentMark>> {
    let mut stmt = conn.prepare(
        "SELECT register_no, name, co1, co2, co3_part_a, co3_part_b, co4, co5, total_percentage
         FROM student_marks
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(StudentMark {
            register_no: r.get(0)?,
            name: r.get(1)?,
            co1: r.get(2)?,
            co2: r.get(3)?,
            co3_part_a: r.get(4)?,
            co3_part_b: r.get(5)?,
            co4: r.get(6)?,
            co5: r.get(7)?,
            total_percentage: r.get(8)?,
        })
    })?;
    rows.collect()
}

/// Doubt volume per unit index, matched loosely: any doubt whose unit label
/// contains the digit counts, so "Unit 3", "unit3" and "U3" all land on
/// Unit 3. Synthetic Init rows count too, mirroring the upstream query.
fn doubt_counts(conn: &Connection) -> rusqlite::Result<[i64; UNIT_COUNT]> {
    let mut counts = [0i64; UNIT_COUNT];
    for (i, slot) in counts.iter_mut().enumerate() {
        *slot = conn.query_row(
            "SELECT COUNT(*) FROM doubts WHERE unit LIKE ?",
            [format!("%{}%", i + 1)],
            |r| r.get(0),
        )?;
    }
    Ok(counts)
}

fn handle_deep_analytics(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let students = match load_all_students(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some(avgs) = friction::unit_averages(&students) else {
        return err(&req.id, "no_data", "No data", None);
    };
    let doubts = match doubt_counts(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let entries = friction::friction_entries(&avgs, &doubts);
    let friction_units = &entries[..2.min(entries.len())];

    let mut ai_insights: Vec<serde_json::Value> = Vec::new();
    if let Some(top) = friction_units.first() {
        if top.friction_score > friction::AI_INSIGHT_THRESHOLD {
            let prompt = ai::insight_prompt(&json!(friction_units));
            ai_insights = state
                .generator
                .generate(&prompt)
                .and_then(|reply| ai::parse_json_array(&reply))
                .unwrap_or_else(|_| vec![friction::fallback_insight(top)]);
        }
    }

    let poor_performers: Vec<&StudentMark> = students
        .iter()
        .filter(|s| s.total_percentage < 50.0)
        .collect();

    ok(
        &req.id,
        json!({
            "graph_data": entries,
            "ai_insights": ai_insights,
            "poor_performers": poor_performers,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks/deep-analytics" => Some(handle_deep_analytics(state, req)),
        _ => None,
    }
}
