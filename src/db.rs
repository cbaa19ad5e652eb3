use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("eduai.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_marks(
            register_no TEXT PRIMARY KEY,
            name TEXT,
            co1 REAL NOT NULL DEFAULT 0,
            co2 REAL NOT NULL DEFAULT 0,
            co3_part_a REAL NOT NULL DEFAULT 0,
            co3_part_b REAL NOT NULL DEFAULT 0,
            co4 REAL NOT NULL DEFAULT 0,
            co5 REAL NOT NULL DEFAULT 0,
            total_percentage REAL NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS doubts(
            id TEXT PRIMARY KEY,
            question TEXT NOT NULL,
            topic TEXT NOT NULL,
            unit TEXT NOT NULL,
            timestamp TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_doubts_unit ON doubts(unit)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quiz_scores(
            id TEXT PRIMARY KEY,
            student_email TEXT NOT NULL,
            unit TEXT NOT NULL,
            score INTEGER NOT NULL,
            timestamp TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quiz_scores_email ON quiz_scores(student_email)",
        [],
    )?;

    // Early workspaces stored marks without the student's display name.
    ensure_student_marks_name(&conn)?;

    Ok(conn)
}

fn ensure_student_marks_name(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "student_marks", "name")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE student_marks ADD COLUMN name TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
