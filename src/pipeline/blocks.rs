use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,3})[ \t]+(.+)$").unwrap());
static LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?P<marker>[*\-•]|\d{1,3}\.)[ \t]+(?P<text>\S.*)$").unwrap()
});
static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Byte range of a `**…**` span inside the owning text, markers included.
pub type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
        emphasis: Vec<Span>,
    },
    Paragraph {
        text: String,
        emphasis: Vec<Span>,
    },
    List {
        ordered: bool,
        start: u32,
        items: Vec<ListItem>,
    },
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub depth: u8,
    pub marker: String,
    pub text: String,
    pub emphasis: Vec<Span>,
}

impl ListItem {
    pub fn is_ordered(&self) -> bool {
        self.marker.ends_with('.')
    }
}

struct OpenList {
    ordered: bool,
    start: u32,
    items: Vec<ListItem>,
}

impl OpenList {
    fn close(self) -> Block {
        Block::List {
            ordered: self.ordered,
            start: self.start,
            items: self.items,
        }
    }
}

/// Turn cleaned text into an ordered sequence of blocks, one pass over lines.
pub fn normalize(cleaned: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut list: Option<OpenList> = None;
    let mut pending_blank = false;

    for raw_line in cleaned.lines() {
        let line = raw_line.trim_end();

        if line.trim().is_empty() {
            if let Some(open) = list.take() {
                blocks.push(open.close());
            }
            pending_blank = !blocks.is_empty();
            continue;
        }

        if pending_blank {
            blocks.push(Block::Blank);
            pending_blank = false;
        }

        // ── List item: "- x", "* x", "• x", "3. x" ──
        if let Some(caps) = LIST_RE.captures(line) {
            let marker = caps["marker"].to_string();
            let text = caps["text"].trim().to_string();
            let item = ListItem {
                depth: indent_depth(&caps["indent"]),
                emphasis: emphasis_spans(&text),
                marker,
                text,
            };
            let ordered = item.is_ordered();

            // nested items join whatever list is open; top-level ones must match its style
            let joins = matches!(&list, Some(open) if item.depth > 0 || open.ordered == ordered);
            if joins {
                if let Some(open) = list.as_mut() {
                    open.items.push(item);
                }
                continue;
            }

            if let Some(open) = list.take() {
                blocks.push(open.close());
            }
            let start = if ordered {
                item.marker.trim_end_matches('.').parse().unwrap_or(1)
            } else {
                1
            };
            list = Some(OpenList {
                ordered,
                start,
                items: vec![item],
            });
            continue;
        }

        if let Some(open) = list.take() {
            blocks.push(open.close());
        }

        let prose = collapse_spaces(line.trim());

        // ── Heading: #, ##, ### ──
        if let Some(caps) = HEADING_RE.captures(&prose) {
            let text = caps[2].trim().to_string();
            blocks.push(Block::Heading {
                level: caps[1].len() as u8,
                emphasis: emphasis_spans(&text),
                text,
            });
            continue;
        }

        blocks.push(Block::Paragraph {
            emphasis: emphasis_spans(&prose),
            text: prose,
        });
    }

    if let Some(open) = list.take() {
        blocks.push(open.close());
    }

    blocks
}

/// Render blocks back to lightweight markup, one line per block or item.
pub fn to_markdown(blocks: &[Block]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { level, text, .. } => {
                lines.push(format!("{} {}", "#".repeat(*level as usize), text))
            }
            Block::Paragraph { text, .. } => lines.push(text.clone()),
            Block::List { items, .. } => {
                for item in items {
                    lines.push(format!(
                        "{}{} {}",
                        "  ".repeat(item.depth as usize),
                        item.marker,
                        item.text
                    ));
                }
            }
            Block::Blank => lines.push(String::new()),
        }
    }
    lines.join("\n")
}

fn emphasis_spans(text: &str) -> Vec<Span> {
    EMPHASIS_RE.find_iter(text).map(|m| m.range()).collect()
}

fn collapse_spaces(line: &str) -> String {
    HSPACE_RE.replace_all(line, " ").into_owned()
}

/// Two columns per nesting level; a tab counts as four.
fn indent_depth(indent: &str) -> u8 {
    let cols: usize = indent.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum();
    (cols / 2).min(u8::MAX as usize) as u8
}
