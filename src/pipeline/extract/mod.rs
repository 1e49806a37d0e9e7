pub mod fields;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::blocks::Block;

const MARKER_PUNCT: &[char] = &[' ', '\t', ':', '*', '-', '•', '–'];

/// How to locate one named value inside a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Case-insensitive substrings; the leftmost hit on the earliest line starts the capture.
    pub start_markers: Vec<String>,
    /// Tried only when no start marker is found anywhere.
    #[serde(default)]
    pub fallback_markers: Vec<String>,
    #[serde(default)]
    pub end_markers: Vec<String>,
    pub default: String,
    #[serde(default = "default_capture_lines")]
    pub max_capture_lines: usize,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Prefix the value with the line the start marker was found on.
    #[serde(default)]
    pub include_marker_line: bool,
}

fn default_capture_lines() -> usize {
    10
}

fn default_max_chars() -> usize {
    300
}

impl FieldSpec {
    pub fn new(name: &str, default: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            start_markers: Vec::new(),
            fallback_markers: Vec::new(),
            end_markers: Vec::new(),
            default: default.to_string(),
            max_capture_lines: default_capture_lines(),
            max_chars: default_max_chars(),
            include_marker_line: false,
        }
    }

    pub fn starts(mut self, markers: &[&str]) -> Self {
        self.start_markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn or_starts(mut self, markers: &[&str]) -> Self {
        self.fallback_markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn ends(mut self, markers: &[&str]) -> Self {
        self.end_markers = markers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn capture_lines(mut self, n: usize) -> Self {
        self.max_capture_lines = n;
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.max_chars = n;
        self
    }

    pub fn with_marker_line(mut self) -> Self {
        self.include_marker_line = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedField {
    pub name: String,
    pub value: String,
    /// False when `value` is the configured default.
    pub matched: bool,
}

/// One entry per configured field, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractedFields(Vec<ExtractedField>);

impl ExtractedFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedField> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<ExtractedField> for ExtractedFields {
    fn extend<I: IntoIterator<Item = ExtractedField>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<ExtractedField> for ExtractedFields {
    fn from_iter<I: IntoIterator<Item = ExtractedField>>(iter: I) -> Self {
        ExtractedFields(iter.into_iter().collect())
    }
}

/// A block flattened to a single line. `full` is what markers are matched
/// against (`prefix` + body, list and heading markers included).
struct Line {
    full: String,
    prefix_len: usize,
    heading: Option<u8>,
}

impl Line {
    fn body(&self) -> &str {
        &self.full[self.prefix_len..]
    }

    fn is_blank(&self) -> bool {
        self.full.trim().is_empty()
    }
}

fn flatten(blocks: &[Block]) -> Vec<Line> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { level, text, .. } => {
                let prefix = format!("{} ", "#".repeat(*level as usize));
                lines.push(Line {
                    prefix_len: prefix.len(),
                    full: prefix + text,
                    heading: Some(*level),
                });
            }
            Block::Paragraph { text, .. } => lines.push(Line {
                full: text.clone(),
                prefix_len: 0,
                heading: None,
            }),
            Block::List { items, .. } => {
                for item in items {
                    let prefix = format!("{}{} ", "  ".repeat(item.depth as usize), item.marker);
                    lines.push(Line {
                        prefix_len: prefix.len(),
                        full: prefix + &item.text,
                        heading: None,
                    });
                }
            }
            Block::Blank => lines.push(Line {
                full: String::new(),
                prefix_len: 0,
                heading: None,
            }),
        }
    }
    lines
}

fn marker_regex(markers: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    match RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "marker list did not compile");
            None
        }
    }
}

/// Pull every configured field out of `blocks`. Never fails: a field whose
/// markers are absent gets its default.
pub fn extract(blocks: &[Block], specs: &[FieldSpec]) -> ExtractedFields {
    let lines = flatten(blocks);
    let fields = specs
        .iter()
        .map(|spec| match capture(&lines, spec) {
            Some(value) => ExtractedField {
                name: spec.name.clone(),
                value,
                matched: true,
            },
            None => {
                debug!(field = %spec.name, "no marker matched, using default");
                ExtractedField {
                    name: spec.name.clone(),
                    value: spec.default.clone(),
                    matched: false,
                }
            }
        })
        .collect();
    ExtractedFields(fields)
}

/// Single-field form of [`extract`].
pub fn extract_field(blocks: &[Block], spec: &FieldSpec) -> ExtractedField {
    let mut fields = extract(blocks, std::slice::from_ref(spec));
    fields.0.remove(0)
}

fn find_start(lines: &[Line], markers: &[String]) -> Option<(usize, usize)> {
    let re = marker_regex(markers)?;
    lines
        .iter()
        .enumerate()
        .find_map(|(i, l)| re.find(&l.full).map(|m| (i, m.end())))
}

fn capture(lines: &[Line], spec: &FieldSpec) -> Option<String> {
    let end_re = marker_regex(&spec.end_markers);
    let (start_idx, hit_end) = find_start(lines, &spec.start_markers)
        .or_else(|| find_start(lines, &spec.fallback_markers))?;
    let start = &lines[start_idx];
    let stop_level = start.heading.map_or(2, |lvl| lvl.max(2));

    let mut parts: Vec<String> = Vec::new();
    let mut done = false;

    if !spec.include_marker_line {
        let tail = &start.full[hit_end..];
        let tail = match end_re.as_ref().and_then(|re| re.find(tail)) {
            Some(m) => {
                done = true;
                &tail[..m.start()]
            }
            None => tail,
        };
        push_part(&mut parts, tail.trim_start_matches(MARKER_PUNCT));
    }

    if !done {
        for line in lines.iter().skip(start_idx + 1).take(spec.max_capture_lines) {
            if line.is_blank() {
                continue;
            }
            if end_re.as_ref().is_some_and(|re| re.is_match(&line.full)) {
                break;
            }
            if line.heading.is_some_and(|lvl| lvl <= stop_level) {
                break;
            }
            push_part(&mut parts, line.body());
        }
    }

    let captured = truncate_chars(&parts.join(" "), spec.max_chars);
    if spec.include_marker_line {
        let head = start.body().trim();
        let value = if captured.is_empty() {
            head.to_string()
        } else {
            format!("{} - {}", head, captured)
        };
        return Some(truncate_chars(&value, spec.max_chars)).filter(|v| !v.is_empty());
    }

    Some(captured).filter(|v| !v.is_empty())
}

fn push_part(parts: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        parts.push(text.to_string());
    }
}

/// First line longer than `min_len` characters, cut to `max_chars`. For
/// freeform text where no field markers apply.
pub fn first_substantial_line(blocks: &[Block], min_len: usize, max_chars: usize) -> Option<String> {
    flatten(blocks)
        .iter()
        .map(|l| l.body().trim())
        .find(|body| body.chars().count() > min_len)
        .map(|body| truncate_chars(body, max_chars))
}

/// The Hunter's top channel idea: marker capture, then the first substantial
/// line, then a fixed default.
pub fn best_idea(blocks: &[Block]) -> String {
    best_idea_field(blocks).value
}

/// [`best_idea`] with its match flag; the line fallback counts as a match.
pub fn best_idea_field(blocks: &[Block]) -> ExtractedField {
    let field = extract_field(blocks, &fields::best_idea());
    if field.matched {
        return field;
    }
    match first_substantial_line(blocks, 10, 100) {
        Some(value) => ExtractedField {
            value,
            matched: true,
            ..field
        },
        None => field,
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.trim_end().to_string(),
    }
}
