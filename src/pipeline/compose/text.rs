use chrono::Datelike;

use super::{ReportMeta, BRAND};
use crate::pipeline::blocks::{to_markdown, Block};

pub(super) fn render(blocks: &[Block], meta: &ReportMeta) -> String {
    let banner = "=".repeat(44);
    let rule = "=".repeat(50);
    let year = meta.generated_at.year();
    let code = non_empty(&meta.project_code);
    let niche = non_empty(&meta.niche);

    format!(
        "{banner}\n\
         REPORT {prefix} - {BRAND}\n\
         {banner}\n\
         \n\
         Project: {code}\n\
         Niche: {niche}\n\
         Date: {date}\n\
         Year: {year}\n\
         \n\
         {rule}\n\
         \n\
         {content}\n\
         \n\
         {rule}\n\
         \n\
         Automatically generated document\n\
         {BRAND}\n\
         © {year} - Confidential\n",
        prefix = meta.kind.file_prefix(),
        date = meta.generated_at.format("%d/%m/%Y %H:%M"),
        content = to_markdown(blocks),
    )
}

fn non_empty(s: &str) -> &str {
    match s.trim() {
        "" => "N/A",
        t => t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::blocks::normalize;
    use crate::pipeline::compose::tests::meta;

    #[test]
    fn banner_and_footer() {
        let txt = render(&normalize("## Plano\n- **Gravar** hoje"), &meta("booster"));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "=".repeat(44));
        assert_eq!(lines[1], "REPORT BOOSTER - YouTube Automation CEO");
        assert!(txt.contains("Project: YT-20250314-093000\n"));
        assert!(txt.contains("Niche: finanças <pessoais>\n"));
        assert!(txt.contains("Date: 14/03/2025 09:30\n"));
        assert!(txt.contains("## Plano\n- **Gravar** hoje"));
        assert!(txt.trim_end().ends_with("© 2025 - Confidential"));
    }

    #[test]
    fn empty_metadata_placeholder() {
        let mut m = meta("ceo");
        m.niche = "  ".to_string();
        let txt = render(&[], &m);
        assert!(txt.contains("Niche: N/A\n"));
    }
}
