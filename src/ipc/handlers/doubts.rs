use crate::ai;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

/// Topic assigned to the synthetic row that marks a unit's existence. Rows
/// with this topic are excluded from the doubt charts.
const SYSTEM_TOPIC: &str = "System";

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn insert_doubt(conn: &Connection, question: &str, topic: &str, unit: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO doubts(id, question, topic, unit, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            Uuid::new_v4().to_string(),
            question,
            topic,
            unit,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}

/// Log a student question against a unit. The topic label comes from the
/// generation collaborator; any failure there degrades to "General" rather
/// than losing the record.
fn handle_log(state: &mut AppState, req: &Request) -> serde_json::Value {
    let question = match required_str(req, "question") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let unit = match required_str(req, "unit") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let topic = state
        .generator
        .generate(&ai::topic_prompt(&question))
        .map(|raw| ai::clean_topic(&raw))
        .ok()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "General".to_string());

    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match insert_doubt(conn, &question, &topic, &unit) {
        Ok(()) => ok(&req.id, json!({ "topic": topic })),
        Err(e) => err(&req.id, "db_write_failed", e.to_string(), None),
    }
}

/// Ensure a unit exists in the analytics tables even before any student has
/// asked about it. Persistence half of the faculty material upload; the
/// document indexing itself happens in an external service.
fn handle_register_unit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let unit_raw = match required_str(req, "unit") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let unit = {
        let t = unit_raw.trim();
        if t.is_empty() { "Others" } else { t }.to_string()
    };

    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let already: Result<i64, _> = conn.query_row(
        "SELECT COUNT(*) FROM doubts WHERE unit = ?",
        [&unit],
        |r| r.get(0),
    );
    match already {
        Ok(0) => match insert_doubt(conn, "Init", SYSTEM_TOPIC, &unit) {
            Ok(()) => ok(&req.id, json!({ "unit": unit, "created": true })),
            Err(e) => err(&req.id, "db_write_failed", e.to_string(), None),
        },
        Ok(_) => ok(&req.id, json!({ "unit": unit, "created": false })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_units(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let units = conn
        .prepare("SELECT DISTINCT unit FROM doubts WHERE unit <> '' ORDER BY unit")
        .and_then(|mut stmt| {
            stmt.query_map([], |r| r.get::<_, String>(0))
                .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        });
    match units {
        Ok(v) => ok(&req.id, json!({ "units": v })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn grouped_counts(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<serde_json::Value>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |r| {
        let label: String = r.get(0)?;
        let count: i64 = r.get(1)?;
        Ok(json!({ "topic": label, "count": count }))
    })?;
    rows.collect()
}

/// Doubt volume per unit, student questions only.
fn handle_chart(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match grouped_counts(
        conn,
        "SELECT unit, COUNT(id) FROM doubts WHERE topic <> ?1 GROUP BY unit",
        &[&SYSTEM_TOPIC],
    ) {
        Ok(v) => ok(&req.id, json!({ "chart": v })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

/// Topic breakdown inside one unit.
fn handle_topics(state: &mut AppState, req: &Request) -> serde_json::Value {
    let unit = match required_str(req, "unit") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match grouped_counts(
        conn,
        "SELECT topic, COUNT(id) FROM doubts WHERE unit = ?1 AND topic <> ?2 GROUP BY topic",
        &[&unit, &SYSTEM_TOPIC],
    ) {
        Ok(v) => ok(&req.id, json!({ "topics": v })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "doubts/log" => Some(handle_log(state, req)),
        "faculty/register-unit" => Some(handle_register_unit(state, req)),
        "faculty/units" => Some(handle_units(state, req)),
        "analytics/chart" => Some(handle_chart(state, req)),
        "analytics/topics" => Some(handle_topics(state, req)),
        _ => None,
    }
}
