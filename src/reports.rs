//! Operations over a project's stored reports: summary cards and file exports.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::info;

use crate::db::{self, Project};
use crate::pipeline::compose::{export_file_name, full_report};
use crate::pipeline::extract::{best_idea_field, extract, extract_field, fields};
use crate::pipeline::{
    export_report, normalize, ExportFormat, ExtractedFields, RawResponse, ReportKind, ReportMeta,
};

/// CEO action-plan cards plus the Hunter's best and first ideas. Missing
/// reports leave their fields at the defaults.
pub fn summarize_project(conn: &Connection, project_id: i64) -> Result<ExtractedFields> {
    let ceo = db::latest_report(conn, project_id, &ReportKind::Ceo)?;
    let hunter = db::latest_report(conn, project_id, &ReportKind::Hunter)?;

    let ceo_blocks = normalize(ceo.as_ref().map_or("", |r| r.cleaned.as_str()));
    let hunter_blocks = normalize(hunter.as_ref().map_or("", |r| r.cleaned.as_str()));

    let mut summary = extract(&ceo_blocks, &fields::ceo_action_plan());
    summary.extend([
        best_idea_field(&hunter_blocks),
        extract_field(&hunter_blocks, &fields::first_idea()),
    ]);
    Ok(summary)
}

/// Render one report and write it under `dir`, creating the directory.
pub fn write_export(
    dir: &Path,
    project: &Project,
    kind: ReportKind,
    content: &str,
    format: ExportFormat,
    at: NaiveDateTime,
) -> Result<PathBuf> {
    let name = export_file_name(&kind, &project.code, at, format);
    let meta = ReportMeta {
        kind,
        project_code: project.code.clone(),
        niche: project.niche.clone(),
        generated_at: at,
    };
    let doc = export_report(&RawResponse::new(content), &meta, format);
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, doc.as_str()).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), kind = %meta.kind, "exported");
    Ok(path)
}

/// Latest report of every persona plus the combined full report, written in
/// parallel. Empty when nothing is stored.
pub fn export_all(
    conn: &Connection,
    dir: &Path,
    project: &Project,
    format: ExportFormat,
    at: NaiveDateTime,
) -> Result<Vec<PathBuf>> {
    let mut sections: Vec<(ReportKind, String)> = Vec::new();
    for kind in ReportKind::personas() {
        if let Some(r) = db::latest_report(conn, project.id, &kind)? {
            sections.push((kind, r.cleaned));
        }
    }
    if sections.is_empty() {
        return Ok(Vec::new());
    }
    let combined = {
        let refs: Vec<(ReportKind, &str)> =
            sections.iter().map(|(k, s)| (k.clone(), s.as_str())).collect();
        full_report(&refs)
    };
    sections.push((ReportKind::Full, combined));

    sections
        .into_par_iter()
        .map(|(kind, content)| write_export(dir, project, kind, &content, format, at))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::clean;
    use chrono::NaiveDate;

    fn mem() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(9, 30, 0).unwrap()
    }

    fn store(conn: &Connection, project: &Project, kind: ReportKind, text: &str) {
        let raw = RawResponse::from(text);
        db::insert_report(conn, project.id, &kind, &raw, &clean(&raw)).unwrap();
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("agent_reports_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    const CEO: &str = "## 🚀 PRÓXIMO PASSO IMEDIATO
- **Ação concreta para hoje:** Gravar o primeiro vídeo
- **Investimento inicial:** R$ 300
- **Primeira semana:** Publicar 3 vídeos";

    const HUNTER: &str = "## 📊 3 IDEIAS DE CANAIS
### IDEIA 1: Canal Mistérios
- **RPM Estimado:** $6
### IDEIA 2: Canal Finanças";

    #[test]
    fn summary_order_and_values() {
        let conn = mem();
        let p = db::create_project(&conn, "mistérios", "", at()).unwrap();
        store(&conn, &p, ReportKind::Hunter, HUNTER);
        store(&conn, &p, ReportKind::Ceo, CEO);

        let summary = summarize_project(&conn, p.id).unwrap();
        let names: Vec<&str> = summary.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                fields::IMMEDIATE_ACTION,
                fields::INVESTMENT,
                fields::FIRST_WEEK_PLAN,
                fields::BEST_IDEA,
                fields::FIRST_IDEA,
            ]
        );
        assert!(summary.iter().all(|f| f.matched));
        assert_eq!(summary.get(fields::IMMEDIATE_ACTION), Some("Gravar o primeiro vídeo"));
        assert_eq!(summary.get(fields::BEST_IDEA), Some("IDEIA 1: Canal Mistérios - **RPM Estimado:** $6"));
        assert_eq!(summary.get(fields::FIRST_IDEA), Some("IDEIA 1: Canal Mistérios"));
    }

    #[test]
    fn summary_without_reports_is_all_defaults() {
        let conn = mem();
        let p = db::create_project(&conn, "tech", "", at()).unwrap();
        let summary = summarize_project(&conn, p.id).unwrap();
        assert_eq!(summary.len(), 5);
        assert!(summary.iter().all(|f| !f.matched));
        assert_eq!(summary.get(fields::BEST_IDEA), Some(fields::BEST_IDEA_DEFAULT));
    }

    #[test]
    fn export_written_to_disk() {
        let conn = mem();
        let p = db::create_project(&conn, "tech", "", at()).unwrap();
        let dir = scratch_dir("single");
        let path = write_export(&dir, &p, ReportKind::Ceo, "## Decisão\n- SIM", ExportFormat::Text, at()).unwrap();

        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(export_file_name(&ReportKind::Ceo, &p.code, at(), ExportFormat::Text).as_str())
        );
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(&p.code));
        assert!(text.contains("Decisão"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn export_all_adds_full_report() {
        let conn = mem();
        let p = db::create_project(&conn, "tech", "", at()).unwrap();
        let dir = scratch_dir("all");
        assert!(export_all(&conn, &dir, &p, ExportFormat::Html, at()).unwrap().is_empty());

        store(&conn, &p, ReportKind::Hunter, HUNTER);
        store(&conn, &p, ReportKind::Ceo, CEO);
        let written = export_all(&conn, &dir, &p, ExportFormat::Html, at()).unwrap();
        assert_eq!(written.len(), 3);
        let full = dir.join(export_file_name(&ReportKind::Full, &p.code, at(), ExportFormat::Html));
        assert!(written.contains(&full));
        assert!(fs::read_to_string(&full).unwrap().contains("Canal Mistérios"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
