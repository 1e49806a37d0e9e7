//! Persona prompts. Each asks for markdown laid out under the headings the
//! field tables look for, so the replies can be summarized afterwards.

use crate::pipeline::extract::truncate_chars;

/// Earlier reports are cut to this many characters inside the CEO prompt.
pub const CEO_CONTEXT_CHARS: usize = 1000;

pub fn hunter(niche: &str, year: i32) -> String {
    format!(
        "NICHE: {niche}
YEAR: {year}

As the Hunter agent, deliver a structured MARKDOWN analysis with:

## 🎯 NICHE CONTEXT
Short introduction to the niche in {year}

## 📊 3 CHANNEL IDEAS

### IDEA 1: [Channel name]
- **Estimated RPM:** [value]
- **Competition:** [Low/Medium/High]
- **Monthly potential:** [value]
- **80/20 elements:**
  1. [Element 1]
  2. [Element 2]
- **Rationale:** [explanation]

### IDEA 2: [Channel name]
[same structure]

### IDEA 3: [Channel name]
[same structure]

## 📈 CONCLUSION
Summary of the most promising opportunities.

Use clean markdown and leave out technical metadata."
    )
}

pub fn booster(best_idea: &str, niche: &str, year: i32) -> String {
    format!(
        "SELECTED CHANNEL IDEA: {best_idea}
NICHE: {niche}
YEAR: {year}

As the Booster agent, deliver an optimization plan in MARKDOWN with:

## 🎯 SEO AND CTR OPTIMIZATION

### 5 VIRAL TITLES
1. [Title 1]
2. [Title 2]

### THUMBNAIL IDEAS
• [Thumbnail description 1]
• [Thumbnail description 2]
End with one line `THE SCENE IS: <scene>` describing the strongest thumbnail.

### STRATEGIC KEYWORDS
- [Keyword 1]
- [Keyword 2]

## 🤖 AUTOMATION STRATEGY

### RECOMMENDED TOOLS ({year})
• Script: [tool]
• Voice: [tool]
• Editing: [tool]

### EXPANSION PLAN
• Translation into [languages]
• Related sub-niches

Keep the markdown clean and practical."
    )
}

pub fn ceo(niche: &str, year: i32, hunter_report: &str, booster_report: &str) -> String {
    format!(
        "EXECUTIVE REPORT - CEO DECISION {year}

**NICHE:** {niche}

**HUNTER ANALYSIS:**
{hunter}...

**BOOSTER OPTIMIZATION:**
{booster}...

As CEO, deliver a final decision in structured MARKDOWN:

## 📊 EXECUTIVE SUMMARY
- Main opportunity
- Estimated ROI
- Timeline

## ⚠️ RISK ANALYSIS
- Main challenges
- Mitigations

## 🚀 NEXT IMMEDIATE STEP
- Concrete action for today
- Initial investment
- First week

## ✅ FINAL DECISION
- Approval (YES/NO)
- Rationale

Be direct, professional and action focused.",
        hunter = truncate_chars(hunter_report, CEO_CONTEXT_CHARS),
        booster = truncate_chars(booster_report, CEO_CONTEXT_CHARS),
    )
}

pub fn script(ceo_report: &str, booster_report: &str) -> String {
    format!(
        "Write a complete video script based on this CEO decision:
{ceo_report}

Use these Booster optimizations (titles and themes):
{booster_report}

The script should take 3 to 5 minutes to read aloud."
    )
}

pub fn niche_suggestion(year: i32) -> String {
    format!(
        "Suggest 3 niches with high potential for YouTube Automation in {year}.
Consider:
1. Current YouTube trends in {year}
2. Estimated RPM (Revenue Per Mille)
3. Current competition level

**Return only the best niche** in this format:

🎯 **BEST NICHE FOR {year}:**
[Niche name]

📊 **REASONS:**
• [Reason 1]
• [Reason 2]

Leave out technical metadata."
    )
}

const SCENE_MARKERS: &[&str] = &["THE SCENE IS:", "A CENA É:"];
const THUMBNAIL_STYLE: &str = "YouTube thumbnail, 8k resolution, cinematic lighting, vibrant high contrast.";
const THUMBNAIL_FALLBACK: &str = "YouTube thumbnail, high contrast, money and success theme, 8k.";

/// Image prompt built from the scene line of a Booster report.
pub fn thumbnail(booster_report: &str) -> String {
    let scene = SCENE_MARKERS.iter().find_map(|m| {
        booster_report
            .split_once(m)
            .map(|(_, rest)| rest.split("```").next().unwrap_or_default().trim())
    });
    match scene {
        Some(scene) if !scene.is_empty() => format!("{THUMBNAIL_STYLE} Scene: {scene}"),
        _ => THUMBNAIL_FALLBACK.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::blocks::normalize;
    use crate::pipeline::extract::{best_idea, extract, fields};

    #[test]
    fn hunter_layout_feeds_best_idea() {
        let reply = hunter("finance", 2025)
            .replace("[Channel name]", "Money Lab")
            .replacen("[value]", "$4", 1);
        let idea = best_idea(&normalize(&reply));
        assert!(idea.starts_with("IDEA 1: Money Lab - "), "{idea}");
        assert!(idea.contains("$4"));
    }

    #[test]
    fn ceo_context_truncated() {
        let long = "x".repeat(CEO_CONTEXT_CHARS + 500);
        let prompt = ceo("tech", 2025, &long, "short");
        assert!(prompt.contains(&format!("{}...", "x".repeat(CEO_CONTEXT_CHARS))));
        assert!(!prompt.contains(&"x".repeat(CEO_CONTEXT_CHARS + 1)));
        assert!(prompt.contains("short..."));
    }

    #[test]
    fn ceo_layout_matches_action_plan_markers() {
        let reply = "## 🚀 NEXT IMMEDIATE STEP
- Concrete action for today: record the pilot
- Initial investment: $50
- First week: publish 3 videos

## ✅ FINAL DECISION
- Approval: YES";
        let got = extract(&normalize(reply), &fields::ceo_action_plan());
        assert!(got.iter().all(|f| f.matched));
        assert_eq!(got.get(fields::IMMEDIATE_ACTION), Some("record the pilot"));
        assert_eq!(got.get(fields::INVESTMENT), Some("$50"));
        assert_eq!(got.get(fields::FIRST_WEEK_PLAN), Some("publish 3 videos"));
    }

    #[test]
    fn year_is_interpolated() {
        assert!(niche_suggestion(2031).contains("BEST NICHE FOR 2031"));
        assert!(booster("idea", "tech", 2031).contains("RECOMMENDED TOOLS (2031)"));
    }

    #[test]
    fn thumbnail_scene() {
        let booster = "### THUMBNAIL IDEAS\nA CENA É: a man counting cash\n```\nrest";
        assert_eq!(
            thumbnail(booster),
            format!("{THUMBNAIL_STYLE} Scene: a man counting cash")
        );
        assert_eq!(thumbnail("no scene here"), THUMBNAIL_FALLBACK);
    }
}
