use crate::columns;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::marks::{self, MarkUpdates, StudentMark};
use crate::table::{Row, Table};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;

const NAME_HINTS: &[&str] = &["NAME", "STUDENT"];

/// Which CAT sheet is being ingested. The two uploads touch disjoint mark
/// fields; both key rows on the register-number column.
#[derive(Debug, Clone, Copy)]
enum CatSheet {
    Cat1,
    Cat2,
}

impl CatSheet {
    fn register_hints(self) -> &'static [&'static str] {
        match self {
            CatSheet::Cat1 => &["REG", "ROLL"],
            CatSheet::Cat2 => &["REG", "REGISTER NUMBER"],
        }
    }

    /// Build this sheet's field updates for one row. Columns are re-resolved
    /// per row; the header set is constant so this is only a convenience, not
    /// a correctness concern. A missing or unparseable mark column writes 0.0
    /// (never skips the row), matching the tolerant per-row policy.
    fn updates(self, headers: &[String], row: &Row<'_>) -> MarkUpdates {
        let mark = |hints: &[&str]| -> f64 {
            let col = columns::resolve(headers, hints);
            marks::parse_mark(col.and_then(|c| row.cell(c)))
        };
        match self {
            CatSheet::Cat1 => MarkUpdates {
                name: columns::resolve(headers, NAME_HINTS)
                    .and_then(|c| row.cell(c))
                    .map(|s| s.trim().to_string()),
                co1: Some(mark(&["CO1"])),
                co2: Some(mark(&["CO2"])),
                co3_part_a: Some(mark(&["CO3"])),
                ..MarkUpdates::default()
            },
            CatSheet::Cat2 => MarkUpdates {
                co3_part_b: Some(mark(&["CO3"])),
                co4: Some(mark(&["CO4"])),
                co5: Some(mark(&["CO5"])),
                ..MarkUpdates::default()
            },
        }
    }
}

fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Accept the sheet inline (`params.csv`) or by path (`params.path`).
/// Unreadable input is a structural failure: nothing gets processed.
fn load_table(req: &Request) -> Result<Table, serde_json::Value> {
    let text = if let Some(csv) = req.params.get("csv").and_then(|v| v.as_str()) {
        csv.to_string()
    } else if let Some(path) = req.params.get("path").and_then(|v| v.as_str()) {
        match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                return Err(err(
                    &req.id,
                    "parse_failed",
                    e.to_string(),
                    Some(json!({ "path": path })),
                ))
            }
        }
    } else {
        return Err(err(&req.id, "bad_params", "missing params.csv or params.path", None));
    };
    Table::from_csv(&text).map_err(|e| err(&req.id, "parse_failed", e.to_string(), None))
}

fn get_student(conn: &Connection, register_no: &str) -> rusqlite::Result<Option<StudentMark>> {
    conn.query_row(
        "SELECT register_no, name, co1, co2, co3_part_a, co3_part_b, co4, co5, total_percentage
         FROM student_marks
         WHERE register_no = ?",
        [register_no],
        |r| {
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
        },
    )
    .optional()
}

/// One statement per merged row. Each row commits on its own, so a structural
/// failure mid-file leaves earlier rows persisted (matching the upstream
/// driver's partial-application behavior).
fn upsert_student(conn: &Connection, rec: &StudentMark) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO student_marks(
            register_no, name, co1, co2, co3_part_a, co3_part_b, co4, co5, total_percentage
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(register_no) DO UPDATE SET
            name = excluded.name,
            co1 = excluded.co1,
            co2 = excluded.co2,
            co3_part_a = excluded.co3_part_a,
            co3_part_b = excluded.co3_part_b,
            co4 = excluded.co4,
            co5 = excluded.co5,
            total_percentage = excluded.total_percentage",
        (
            &rec.register_no,
            &rec.name,
            rec.co1,
            rec.co2,
            rec.co3_part_a,
            rec.co3_part_b,
            rec.co4,
            rec.co5,
            rec.total_percentage,
        ),
    )?;
    Ok(())
}

fn handle_upload(state: &mut AppState, req: &Request, sheet: CatSheet) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let table = match load_table(req) {
        Ok(t) => t,
        Err(e) => return e,
    };
    let headers = table.headers();

    let Some(reg_col) = columns::resolve(headers, sheet.register_hints()) else {
        return err(
            &req.id,
            "missing_column",
            format!(
                "Could not find 'Register Number' column. Found: {}",
                headers.join(", ")
            ),
            Some(json!({ "headers": headers })),
        );
    };

    let mut count = 0usize;
    for row in table.rows() {
        let raw_reg = row.cell(reg_col).unwrap_or("");
        let Some(register_no) = marks::normalize_register(raw_reg) else {
            // Blank or nan register: the row is neither merged nor counted.
            continue;
        };

        let existing = match get_student(conn, &register_no) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
        let merged = marks::merge(&register_no, existing, &sheet.updates(headers, &row));
        if let Err(e) = upsert_student(conn, &merged) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
        count += 1;
    }

    ok(
        &req.id,
        json!({ "message": format!("Successfully synced {} students", count) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "upload-cat1" => Some(handle_upload(state, req, CatSheet::Cat1)),
        "upload-cat2" => Some(handle_upload(state, req, CatSheet::Cat2)),
        _ => None,
    }
}
