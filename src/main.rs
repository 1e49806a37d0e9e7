use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use tracing::{debug, info};

use agent_reports::db::{self, Project};
use agent_reports::pipeline::extract::best_idea;
use agent_reports::pipeline::{clean, normalize, ArtifactTable, ExportFormat, RawResponse, ReportKind};
use agent_reports::prompts;
use agent_reports::reports::{export_all, summarize_project, write_export};
use agent_reports::settings::Settings;

#[derive(Parser)]
#[command(name = "agent_reports", about = "Clean, summarize and export persona reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the SQLite archive
    Init,
    /// Start a new project for a niche
    New {
        niche: String,
        #[arg(short, long, default_value = "New project")]
        description: String,
    },
    /// List projects, newest first
    Projects,
    /// Show every report stored for a project
    History {
        code: String,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a raw model reply for a project (reads stdin without --file)
    Ingest {
        code: String,
        /// hunter, booster, ceo, script
        kind: ReportKind,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Export the latest report of one kind
    Export {
        code: String,
        kind: ReportKind,
        /// html or txt (default from settings)
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },
    /// Export every stored report plus the combined full report
    ExportAll {
        code: String,
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },
    /// Action plan and best idea pulled from the stored reports
    Summary {
        code: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt for one persona
    Prompt {
        #[arg(value_enum)]
        target: PromptTarget,
        /// Project to take the niche and earlier reports from
        #[arg(short, long)]
        project: Option<String>,
        /// Niche, when no project is given
        #[arg(short, long)]
        niche: Option<String>,
    },
    /// Strip a raw reply and print the cleaned markdown (reads stdin without --file)
    Clean {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PromptTarget {
    Hunter,
    Booster,
    Ceo,
    Script,
    Niche,
    Thumbnail,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    debug!(?settings, "settings loaded");

    let result = match cli.command {
        Commands::Init => {
            open(&settings)?;
            println!("Archive ready at {}", settings.db_path.display());
            Ok(())
        }
        Commands::New { niche, description } => {
            if niche.trim().is_empty() {
                bail!("niche must not be empty");
            }
            let conn = open(&settings)?;
            let project = db::create_project(&conn, &niche, &description, now())?;
            info!(code = %project.code, niche = %project.niche, "project created");
            println!("{}", project.code);
            Ok(())
        }
        Commands::Projects => {
            let conn = open(&settings)?;
            let projects = db::list_projects(&conn)?;
            if projects.is_empty() {
                println!("No projects yet. Run 'new <niche>' first.");
                return Ok(());
            }
            println!("{:<20} | {:<19} | {:<24} | {}", "Code", "Started", "Niche", "Description");
            println!("{}", "-".repeat(90));
            for p in &projects {
                println!(
                    "{:<20} | {:<19} | {:<24} | {}",
                    p.code,
                    p.started_at,
                    truncate(&p.niche, 24),
                    truncate(&p.description, 30)
                );
            }
            println!("\n{} projects", projects.len());
            Ok(())
        }
        Commands::History { code, json } => {
            let conn = open(&settings)?;
            let project = load_project(&conn, &code)?;
            let reports = db::project_history(&conn, project.id)?;
            if json {
                let out = serde_json::json!({ "project": project, "reports": reports });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }
            println!("{} - {} ({})", project.code, project.niche, project.started_at);
            if reports.is_empty() {
                println!("No reports stored.");
            }
            for r in &reports {
                println!(
                    "  #{:<4} {:<8} {}  {}",
                    r.id,
                    r.kind,
                    r.created_at,
                    truncate(r.cleaned.lines().next().unwrap_or_default(), 60)
                );
            }
            Ok(())
        }
        Commands::Ingest { code, kind, file } => {
            let conn = open(&settings)?;
            let project = load_project(&conn, &code)?;
            let raw = RawResponse::from(read_input(file.as_deref())?);
            let cleaned = clean(&raw);
            if cleaned.is_empty() {
                bail!("nothing left after cleaning; refusing to store an empty {} report", kind);
            }
            let id = db::insert_report(&conn, project.id, &kind, &raw, &cleaned)?;
            info!(
                report_id = id,
                %kind,
                raw_len = raw.as_str().len(),
                cleaned_len = cleaned.as_str().len(),
                table_version = ArtifactTable::builtin().version(),
                "report stored"
            );
            println!("Stored {} report #{} for {}", kind, id, project.code);
            Ok(())
        }
        Commands::Export { code, kind, format } => {
            let conn = open(&settings)?;
            let project = load_project(&conn, &code)?;
            let format = resolve_format(format, &settings)?;
            let Some(report) = db::latest_report(&conn, project.id, &kind)? else {
                bail!("no {} report stored for {}", kind, project.code);
            };
            let path = write_export(&settings.export_dir, &project, kind, &report.cleaned, format, now())?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::ExportAll { code, format } => {
            let conn = open(&settings)?;
            let project = load_project(&conn, &code)?;
            let format = resolve_format(format, &settings)?;

            let written = export_all(&conn, &settings.export_dir, &project, format, now())?;
            if written.is_empty() {
                println!("No reports stored for {}.", project.code);
                return Ok(());
            }
            for path in &written {
                println!("Wrote {}", path.display());
            }
            println!("{} files in {}", written.len(), settings.export_dir.display());
            Ok(())
        }
        Commands::Summary { code, json } => {
            let conn = open(&settings)?;
            let project = load_project(&conn, &code)?;
            let summary = summarize_project(&conn, project.id)?;
            db::save_summary(&conn, project.id, &summary)?;
            if json {
                let out = serde_json::json!({ "project": project.code, "fields": summary });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }
            println!("{} - {}", project.code, project.niche);
            for f in summary.iter() {
                let flag = if f.matched { "" } else { " (default)" };
                println!("  {:<16} {}{}", f.name, f.value, flag);
            }
            Ok(())
        }
        Commands::Prompt { target, project, niche } => {
            let text = build_prompt(&settings, target, project.as_deref(), niche.as_deref())?;
            println!("{}", text);
            Ok(())
        }
        Commands::Clean { file } => {
            let raw = RawResponse::from(read_input(file.as_deref())?);
            println!("{}", clean(&raw));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn open(settings: &Settings) -> Result<Connection> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

fn load_project(conn: &Connection, code: &str) -> Result<Project> {
    db::find_project(conn, code)?.with_context(|| format!("unknown project {}", code))
}

fn resolve_format(format: Option<ExportFormat>, settings: &Settings) -> Result<ExportFormat> {
    match format {
        Some(f) => Ok(f),
        None => settings.export_format(),
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn build_prompt(
    settings: &Settings,
    target: PromptTarget,
    code: Option<&str>,
    niche: Option<&str>,
) -> Result<String> {
    let year = Local::now().year();
    if let PromptTarget::Niche = target {
        return Ok(prompts::niche_suggestion(year));
    }

    let conn = open(settings)?;
    let project = code.map(|c| load_project(&conn, c)).transpose()?;
    let niche = match (niche, &project) {
        (Some(n), _) => n.to_string(),
        (None, Some(p)) => p.niche.clone(),
        (None, None) => bail!("pass --project or --niche"),
    };
    let stored = |kind: ReportKind| -> Result<String> {
        let Some(p) = &project else {
            return Ok(String::new());
        };
        Ok(db::latest_report(&conn, p.id, &kind)?
            .map(|r| r.cleaned)
            .unwrap_or_default())
    };

    let text = match target {
        PromptTarget::Hunter => prompts::hunter(&niche, year),
        PromptTarget::Booster => {
            let hunter = stored(ReportKind::Hunter)?;
            prompts::booster(&best_idea(&normalize(&hunter)), &niche, year)
        }
        PromptTarget::Ceo => {
            prompts::ceo(&niche, year, &stored(ReportKind::Hunter)?, &stored(ReportKind::Booster)?)
        }
        PromptTarget::Script => {
            prompts::script(&stored(ReportKind::Ceo)?, &stored(ReportKind::Booster)?)
        }
        PromptTarget::Thumbnail => prompts::thumbnail(&stored(ReportKind::Booster)?),
        PromptTarget::Niche => prompts::niche_suggestion(year),
    };
    Ok(text)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
