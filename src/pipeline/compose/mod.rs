mod html;
mod text;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;

use super::blocks::Block;

pub const BRAND: &str = "YouTube Automation CEO";

/// Which persona produced a report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Hunter,
    Booster,
    Ceo,
    Script,
    /// All reports of a project stitched together.
    Full,
    Other(String),
}

/// Display label and badge for one report kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub label: &'static str,
    pub badge: &'static str,
    pub badge_class: &'static str,
}

const EXECUTIVE: Presentation = Presentation {
    label: "Executive Decision Report",
    badge: "🎯 CEO DECISION",
    badge_class: "ceo-badge",
};

impl ReportKind {
    /// Never fails; unknown names are kept as [`ReportKind::Other`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hunter" => ReportKind::Hunter,
            "booster" => ReportKind::Booster,
            "ceo" | "ceo_verdict" => ReportKind::Ceo,
            "script" | "roteiro" | "copywriter" => ReportKind::Script,
            "full" | "completo" => ReportKind::Full,
            _ => ReportKind::Other(s.trim().to_string()),
        }
    }

    /// The four persona kinds, in pipeline order.
    pub fn personas() -> [ReportKind; 4] {
        [
            ReportKind::Hunter,
            ReportKind::Booster,
            ReportKind::Ceo,
            ReportKind::Script,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReportKind::Hunter => "hunter",
            ReportKind::Booster => "booster",
            ReportKind::Ceo => "ceo",
            ReportKind::Script => "script",
            ReportKind::Full => "full",
            ReportKind::Other(s) => s,
        }
    }

    pub fn presentation(&self) -> Presentation {
        match self {
            ReportKind::Hunter => Presentation {
                label: "Niche Analysis Report",
                badge: "🔍 HUNTER SPECIALIST",
                badge_class: "hunter-badge",
            },
            ReportKind::Booster => Presentation {
                label: "Optimization & SEO Report",
                badge: "🚀 BOOSTER SPECIALIST",
                badge_class: "booster-badge",
            },
            ReportKind::Script => Presentation {
                label: "Complete Video Script",
                badge: "✍️ VIRAL SCRIPTWRITER",
                badge_class: "copy-badge",
            },
            ReportKind::Ceo | ReportKind::Full | ReportKind::Other(_) => EXECUTIVE,
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            ReportKind::Hunter => "HUNTER",
            ReportKind::Booster => "BOOSTER",
            ReportKind::Script => "SCRIPT",
            ReportKind::Full => "FULL",
            ReportKind::Ceo | ReportKind::Other(_) => "CEO",
        }
    }

    /// Heading used for this kind inside the combined report.
    fn section_title(&self) -> &'static str {
        match self {
            ReportKind::Hunter => "🔍 HUNTER ANALYSIS",
            ReportKind::Booster => "🚀 BOOSTER OPTIMIZATION",
            ReportKind::Script => "✍️ VIDEO SCRIPT",
            _ => "🎯 CEO DECISION",
        }
    }
}

impl FromStr for ReportKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ReportKind::parse(s))
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Text,
}

#[derive(Debug, Error)]
#[error("unknown export format `{0}` (expected html or txt)")]
pub struct FormatParseError(pub String);

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Text => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" | "htm" => Ok(ExportFormat::Html),
            "txt" | "text" => Ok(ExportFormat::Text),
            other => Err(FormatParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    pub kind: ReportKind,
    pub project_code: String,
    pub niche: String,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDocument {
    Html(String),
    Text(String),
}

impl ExportDocument {
    pub fn format(&self) -> ExportFormat {
        match self {
            ExportDocument::Html(_) => ExportFormat::Html,
            ExportDocument::Text(_) => ExportFormat::Text,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExportDocument::Html(s) | ExportDocument::Text(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            ExportDocument::Html(s) | ExportDocument::Text(s) => s,
        }
    }
}

/// Build the export document. Pure: dates and the copyright year come from `meta`.
pub fn compose(blocks: &[Block], meta: &ReportMeta, format: ExportFormat) -> ExportDocument {
    match format {
        ExportFormat::Html => ExportDocument::Html(html::render(blocks, meta)),
        ExportFormat::Text => ExportDocument::Text(text::render(blocks, meta)),
    }
}

/// `<PREFIX>_<code>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn export_file_name(
    kind: &ReportKind,
    project_code: &str,
    at: NaiveDateTime,
    format: ExportFormat,
) -> String {
    let code: String = project_code
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let code = if code.is_empty() { "project".to_string() } else { code };
    format!(
        "{}_{}_{}.{}",
        kind.file_prefix(),
        code,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Stitch persona reports into one markdown document, skipping empty ones.
pub fn full_report(sections: &[(ReportKind, &str)]) -> String {
    let mut out = String::from("# FULL PROJECT REPORT\n");
    let mut first = true;
    for (kind, content) in sections {
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        if !first {
            out.push_str("\n---\n");
        }
        first = false;
        out.push_str(&format!("\n## {}\n{}\n", kind.section_title(), content));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::blocks::normalize;
    use chrono::NaiveDate;

    pub(super) fn meta(kind: &str) -> ReportMeta {
        ReportMeta {
            kind: ReportKind::parse(kind),
            project_code: "YT-20250314-093000".to_string(),
            niche: "finanças <pessoais>".to_string(),
            generated_at: NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(9, 30, 5)
                .unwrap(),
        }
    }

    #[test]
    fn unknown_kind_falls_back_to_executive() {
        let kind = ReportKind::parse("unknown_kind");
        assert_eq!(kind, ReportKind::Other("unknown_kind".to_string()));
        assert_eq!(kind.presentation(), EXECUTIVE);
        let doc = compose(&normalize("x"), &meta("unknown_kind"), ExportFormat::Html);
        assert!(doc.as_str().contains("Executive Decision Report"));
        assert!(doc.as_str().contains("ceo-badge"));
    }

    #[test]
    fn kind_aliases() {
        assert_eq!(ReportKind::parse("Roteiro"), ReportKind::Script);
        assert_eq!(ReportKind::parse(" HUNTER "), ReportKind::Hunter);
        assert_eq!("booster".parse::<ReportKind>().unwrap(), ReportKind::Booster);
    }

    #[test]
    fn format_parsing() {
        assert_eq!("TXT".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert_eq!("html".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn file_name_is_deterministic() {
        let m = meta("hunter");
        let name = export_file_name(&m.kind, &m.project_code, m.generated_at, ExportFormat::Html);
        assert_eq!(name, "HUNTER_YT-20250314-093000_20250314_093005.html");
        let odd = export_file_name(&ReportKind::Full, "a/b c", m.generated_at, ExportFormat::Text);
        assert_eq!(odd, "FULL_a_b_c_20250314_093005.txt");
    }

    #[test]
    fn full_report_skips_empty() {
        let out = full_report(&[
            (ReportKind::Hunter, "hunter text"),
            (ReportKind::Booster, "  "),
            (ReportKind::Ceo, "ceo text"),
        ]);
        assert!(out.starts_with("# FULL PROJECT REPORT"));
        assert!(out.contains("## 🔍 HUNTER ANALYSIS\nhunter text"));
        assert!(!out.contains("BOOSTER"));
        assert!(out.contains("---\n\n## 🎯 CEO DECISION\nceo text"));
    }

    #[test]
    fn compose_is_pure() {
        let blocks = normalize("## A\n- b");
        let m = meta("ceo");
        assert_eq!(
            compose(&blocks, &m, ExportFormat::Text),
            compose(&blocks, &m, ExportFormat::Text)
        );
        assert_eq!(compose(&blocks, &m, ExportFormat::Html).format(), ExportFormat::Html);
    }
}
