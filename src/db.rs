use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::pipeline::{CleanedText, ExtractedField, ExtractedFields, RawResponse, ReportKind};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("opening {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS projects (
            id          INTEGER PRIMARY KEY,
            code        TEXT UNIQUE NOT NULL,
            niche       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            started_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reports (
            id          INTEGER PRIMARY KEY,
            project_id  INTEGER NOT NULL REFERENCES projects(id),
            kind        TEXT NOT NULL,
            raw         TEXT NOT NULL,
            cleaned     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_reports_project ON reports(project_id, kind);

        -- Extracted action-plan fields
        CREATE TABLE IF NOT EXISTS summaries (
            project_id  INTEGER NOT NULL REFERENCES projects(id),
            field       TEXT NOT NULL,
            value       TEXT NOT NULL,
            matched     BOOLEAN NOT NULL,
            UNIQUE(project_id, field)
        );
        ",
    )?;
    Ok(())
}

// ── Projects ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub code: String,
    pub niche: String,
    pub description: String,
    pub started_at: String,
}

/// `YT-YYYYmmdd-HHMMSS`
pub fn project_code(at: NaiveDateTime) -> String {
    at.format("YT-%Y%m%d-%H%M%S").to_string()
}

pub fn create_project(
    conn: &Connection,
    niche: &str,
    description: &str,
    at: NaiveDateTime,
) -> Result<Project> {
    let code = project_code(at);
    let started_at = at.format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO projects (code, niche, description, started_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![code, niche.trim(), description.trim(), started_at],
    )
    .with_context(|| format!("creating project {}", code))?;
    Ok(Project {
        id: conn.last_insert_rowid(),
        code,
        niche: niche.trim().to_string(),
        description: description.trim().to_string(),
        started_at,
    })
}

fn project_from_row(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        code: row.get(1)?,
        niche: row.get(2)?,
        description: row.get(3)?,
        started_at: row.get(4)?,
    })
}

/// Newest first.
pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, niche, description, started_at FROM projects ORDER BY started_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([], project_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_project(conn: &Connection, code: &str) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            "SELECT id, code, niche, description, started_at FROM projects WHERE code = ?1",
            [code],
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

// ── Reports ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub id: i64,
    pub kind: String,
    pub raw: String,
    pub cleaned: String,
    pub created_at: String,
}

impl ReportRow {
    pub fn kind(&self) -> ReportKind {
        ReportKind::parse(&self.kind)
    }
}

fn report_from_row(row: &rusqlite::Row) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        raw: row.get(2)?,
        cleaned: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_report(
    conn: &Connection,
    project_id: i64,
    kind: &ReportKind,
    raw: &RawResponse,
    cleaned: &CleanedText,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO reports (project_id, kind, raw, cleaned) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![project_id, kind.as_str(), raw.as_str(), cleaned.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent report of one kind; later ingests replace earlier ones.
pub fn latest_report(
    conn: &Connection,
    project_id: i64,
    kind: &ReportKind,
) -> Result<Option<ReportRow>> {
    let row = conn
        .query_row(
            "SELECT id, kind, raw, cleaned, created_at FROM reports
             WHERE project_id = ?1 AND kind = ?2
             ORDER BY id DESC LIMIT 1",
            rusqlite::params![project_id, kind.as_str()],
            report_from_row,
        )
        .optional()?;
    Ok(row)
}

/// Every stored report in ingest order.
pub fn project_history(conn: &Connection, project_id: i64) -> Result<Vec<ReportRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, raw, cleaned, created_at FROM reports
         WHERE project_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map([project_id], report_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Summaries ──

pub fn save_summary(conn: &Connection, project_id: i64, fields: &ExtractedFields) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO summaries (project_id, field, value, matched) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(project_id, field) DO UPDATE SET value = excluded.value, matched = excluded.matched",
        )?;
        for f in fields.iter() {
            count += stmt.execute(rusqlite::params![project_id, f.name, f.value, f.matched])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_summary(conn: &Connection, project_id: i64) -> Result<ExtractedFields> {
    let mut stmt = conn.prepare(
        "SELECT field, value, matched FROM summaries WHERE project_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([project_id], |row| {
            Ok(ExtractedField {
                name: row.get(0)?,
                value: row.get(1)?,
                matched: row.get(2)?,
            })
        })?
        .collect::<Result<ExtractedFields, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::clean;
    use chrono::NaiveDate;

    fn mem() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn project_codes_and_listing() {
        let conn = mem();
        let a = create_project(&conn, " finanças ", "first", at(9, 30, 0)).unwrap();
        let b = create_project(&conn, "games", "second", at(10, 0, 0)).unwrap();
        assert_eq!(a.code, "YT-20250314-093000");
        assert_eq!(a.niche, "finanças");

        let listed = list_projects(&conn).unwrap();
        assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b.id, a.id]);
        assert_eq!(find_project(&conn, &a.code).unwrap(), Some(a));
        assert!(find_project(&conn, "YT-missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_code_rejected() {
        let conn = mem();
        create_project(&conn, "a", "", at(9, 0, 0)).unwrap();
        assert!(create_project(&conn, "b", "", at(9, 0, 0)).is_err());
    }

    #[test]
    fn latest_report_wins() {
        let conn = mem();
        let p = create_project(&conn, "tech", "", at(9, 0, 0)).unwrap();
        for text in ["content='first'", "content='second'"] {
            let raw = RawResponse::from(text);
            insert_report(&conn, p.id, &ReportKind::Ceo, &raw, &clean(&raw)).unwrap();
        }
        let raw = RawResponse::from("hunter text");
        insert_report(&conn, p.id, &ReportKind::Hunter, &raw, &clean(&raw)).unwrap();

        let ceo = latest_report(&conn, p.id, &ReportKind::Ceo).unwrap().unwrap();
        assert_eq!(ceo.cleaned, "second");
        assert_eq!(ceo.kind(), ReportKind::Ceo);
        assert!(latest_report(&conn, p.id, &ReportKind::Script).unwrap().is_none());
        assert_eq!(project_history(&conn, p.id).unwrap().len(), 3);
    }

    #[test]
    fn summary_upsert() {
        let conn = mem();
        let p = create_project(&conn, "tech", "", at(9, 0, 0)).unwrap();
        let first: ExtractedFields = vec![ExtractedField {
            name: "investment".to_string(),
            value: "Variable.".to_string(),
            matched: false,
        }]
        .into_iter()
        .collect();
        save_summary(&conn, p.id, &first).unwrap();

        let second: ExtractedFields = vec![ExtractedField {
            name: "investment".to_string(),
            value: "R$ 300".to_string(),
            matched: true,
        }]
        .into_iter()
        .collect();
        save_summary(&conn, p.id, &second).unwrap();

        let stored = fetch_summary(&conn, p.id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get("investment"), Some("R$ 300"));
    }
}
