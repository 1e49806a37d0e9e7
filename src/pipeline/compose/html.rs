use chrono::Datelike;

use super::{ReportMeta, BRAND};
use crate::pipeline::blocks::{Block, ListItem, Span};

const STYLE: &str = r#"<style>
    body {
        font-family: 'Arial', sans-serif;
        line-height: 1.6;
        color: #333;
        max-width: 210mm;
        margin: 0 auto;
        padding: 20mm;
        background: #ffffff;
    }
    .header {
        text-align: center;
        border-bottom: 3px solid #3b82f6;
        padding-bottom: 20px;
        margin-bottom: 30px;
    }
    .logo { font-size: 24px; font-weight: bold; color: #3b82f6; margin-bottom: 10px; }
    .subtitle { color: #666; font-size: 14px; }
    .project-info {
        background: #f8f9fa;
        padding: 15px;
        border-radius: 8px;
        margin-bottom: 25px;
        border-left: 4px solid #3b82f6;
    }
    .section { margin-bottom: 30px; page-break-inside: avoid; }
    h1 { color: #1e40af; border-bottom: 2px solid #e5e7eb; padding-bottom: 10px; margin-top: 25px; }
    h2 { color: #374151; margin-top: 20px; }
    h3 { color: #4b5563; }
    .agent-badge {
        display: inline-block;
        padding: 4px 12px;
        border-radius: 20px;
        font-weight: bold;
        font-size: 12px;
        margin-bottom: 10px;
        color: white;
    }
    .hunter-badge { background: #0f766e; }
    .booster-badge { background: #7c3aed; }
    .ceo-badge { background: #1e3a8a; }
    .copy-badge { background: #be185d; }
    ul, ol { padding-left: 25px; margin: 10px 0; }
    li { margin: 5px 0; }
    .footer {
        text-align: center;
        margin-top: 50px;
        padding-top: 20px;
        border-top: 1px solid #e5e7eb;
        color: #6b7280;
        font-size: 12px;
    }
    .timestamp { color: #9ca3af; font-size: 11px; text-align: right; }
</style>"#;

pub(super) fn render(blocks: &[Block], meta: &ReportMeta) -> String {
    let p = meta.kind.presentation();
    let year = meta.generated_at.year();
    let code = escape(or_na(&meta.project_code));
    let niche = escape(or_na(&meta.niche));

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{label} - {code}</title>
{style}
</head>
<body>
<div class="header">
    <div class="logo">🎬 {brand}</div>
    <div class="subtitle">Channel Analysis &amp; Optimization System</div>
</div>
<span class="agent-badge {badge_class}">{badge}</span>
<h1>{label}</h1>
<div class="project-info">
    <div><strong>Project:</strong> {code}</div>
    <div><strong>Niche:</strong> {niche}</div>
    <div><strong>Analysis date:</strong> {date}</div>
    <div><strong>Reference year:</strong> {year}</div>
</div>
<div class="timestamp">Generated at: {stamp}</div>
<div class="content">
{content}
</div>
<div class="footer">
    <p>Document generated automatically by {brand}</p>
    <p>© {year} - All rights reserved</p>
    <p>Confidential - Internal use</p>
</div>
</body>
</html>
"#,
        label = p.label,
        badge = p.badge,
        badge_class = p.badge_class,
        style = STYLE,
        brand = BRAND,
        date = meta.generated_at.format("%d/%m/%Y %H:%M"),
        stamp = meta.generated_at.format("%d/%m/%Y %H:%M:%S"),
        content = render_content(blocks),
    )
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() {
        "N/A"
    } else {
        s.trim()
    }
}

/// Each `##` heading opens a section that runs until the next one.
fn render_content(blocks: &[Block]) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_section = false;

    for block in blocks {
        match block {
            Block::Heading { level, text, emphasis } => {
                if *level == 2 {
                    if in_section {
                        out.push("</section>".to_string());
                    }
                    out.push(r#"<section class="section">"#.to_string());
                    in_section = true;
                }
                out.push(format!("<h{0}>{1}</h{0}>", level, inline(text, emphasis)));
            }
            Block::Paragraph { text, emphasis } => {
                out.push(format!("<p>{}</p>", inline(text, emphasis)))
            }
            Block::List { ordered, start, items } => out.push(render_list(*ordered, *start, items)),
            Block::Blank => {}
        }
    }
    if in_section {
        out.push("</section>".to_string());
    }
    out.join("\n")
}

fn render_list(ordered: bool, start: u32, items: &[ListItem]) -> String {
    let mut out = String::new();
    if ordered && start != 1 {
        out.push_str(&format!(r#"<ol start="{}">"#, start));
    } else {
        out.push_str(if ordered { "<ol>" } else { "<ul>" });
    }

    let root_depth = items.first().map(|i| i.depth).unwrap_or(0);
    let mut stack: Vec<(u8, &str)> = vec![(root_depth, if ordered { "</ol>" } else { "</ul>" })];
    let mut li_open = false;

    for item in items {
        let top = stack.last().map(|(d, _)| *d).unwrap_or(root_depth);
        if item.depth > top {
            if !li_open {
                out.push_str("<li>");
            }
            if item.is_ordered() {
                out.push_str("<ol>");
                stack.push((item.depth, "</ol>"));
            } else {
                out.push_str("<ul>");
                stack.push((item.depth, "</ul>"));
            }
        } else {
            if li_open {
                out.push_str("</li>");
            }
            while stack.len() > 1 && stack.last().is_some_and(|(d, _)| *d > item.depth) {
                if let Some((_, close)) = stack.pop() {
                    out.push_str(close);
                    out.push_str("</li>");
                }
            }
        }
        out.push_str("<li>");
        out.push_str(&inline(&item.text, &item.emphasis));
        li_open = true;
    }

    if li_open {
        out.push_str("</li>");
    }
    while let Some((_, close)) = stack.pop() {
        out.push_str(close);
        if !stack.is_empty() {
            out.push_str("</li>");
        }
    }
    out
}

fn inline(text: &str, emphasis: &[Span]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for span in emphasis {
        if span.start < pos || span.end > text.len() || span.len() < 4 {
            continue;
        }
        out.push_str(&escape(&text[pos..span.start]));
        out.push_str("<strong>");
        out.push_str(&escape(&text[span.start + 2..span.end - 2]));
        out.push_str("</strong>");
        pos = span.end;
    }
    out.push_str(&escape(&text[pos..]));
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
