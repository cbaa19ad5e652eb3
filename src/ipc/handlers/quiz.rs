use crate::ai;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

/// Demo identity used when the caller supplies no email.
const DEFAULT_EMAIL: &str = "student@eduai.com";

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

fn email_param(req: &Request) -> String {
    req.params
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_EMAIL.to_string())
}

/// Ask the generation collaborator for 5 strict-JSON MCQs. A malformed reply
/// is reported as a generation failure, never as a raw parse panic.
fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let unit = match required_str(req, "unit") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result = state
        .generator
        .generate(&ai::quiz_prompt(&unit))
        .and_then(|reply| ai::parse_json_array(&reply));
    match result {
        Ok(questions) => ok(&req.id, json!({ "quiz": questions })),
        Err(e) => err(
            &req.id,
            "quiz_generation_failed",
            "Failed to generate quiz",
            Some(json!({ "details": e.to_string() })),
        ),
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let unit = match required_str(req, "unit") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(score) = req.params.get("score").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing score", None);
    };
    let email = email_param(req);

    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let res = conn.execute(
        "INSERT INTO quiz_scores(id, student_email, unit, score, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            Uuid::new_v4().to_string(),
            &email,
            &unit,
            score,
            chrono::Utc::now().to_rfc3339(),
        ),
    );
    match res {
        Ok(_) => ok(&req.id, json!({ "message": "Score saved!" })),
        Err(e) => err(&req.id, "db_write_failed", e.to_string(), None),
    }
}

/// Total XP is the sum of all quiz scores for the student.
fn handle_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let email = email_param(req);
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let stats: rusqlite::Result<(i64, i64)> = conn.query_row(
        "SELECT COALESCE(SUM(score), 0), COUNT(*) FROM quiz_scores WHERE student_email = ?",
        [&email],
        |r| Ok((r.get(0)?, r.get(1)?)),
    );
    match stats {
        Ok((xp, quizzes)) => ok(&req.id, json!({ "xp": xp, "quizzes": quizzes })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "quiz/generate" => Some(handle_generate(state, req)),
        "quiz/submit" => Some(handle_submit(state, req)),
        "student/stats" => Some(handle_stats(state, req)),
        _ => None,
    }
}
