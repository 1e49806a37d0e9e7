use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use super::response::{CleanedText, RawResponse};

/// Bumped whenever a built-in rule is added, removed or changes meaning.
pub const ARTIFACT_TABLE_VERSION: u32 = 2;

/// Upper bound on rule passes for tables whose rules do not shrink the text.
pub const MAX_PASSES: usize = 32;

static CRLF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n").unwrap());
static TRAILING_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

static BUILTIN: LazyLock<ArtifactTable> = LazyLock::new(|| {
    let rules = BUILTIN_RULES
        .iter()
        .map(|r| ArtifactRule::new(r.name, r.phase, r.pattern, r.replacement).unwrap())
        .collect();
    ArtifactTable::new(ARTIFACT_TABLE_VERSION, rules)
});

/// Rules run phase by phase. Unwrapping must precede deletion so a payload
/// nested in a wrapper survives the wrapper's removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Unescape,
    Unwrap,
    Delete,
    Residue,
}

#[derive(Debug, Error)]
#[error("artifact rule `{name}` has an invalid pattern: {source}")]
pub struct ArtifactRuleError {
    pub name: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Clone)]
pub struct ArtifactRule {
    name: String,
    phase: Phase,
    pattern: Regex,
    replacement: String,
}

impl ArtifactRule {
    /// `replacement` follows `regex` expansion syntax (`${payload}`).
    pub fn new(
        name: &str,
        phase: Phase,
        pattern: &str,
        replacement: &str,
    ) -> Result<Self, ArtifactRuleError> {
        let pattern = Regex::new(pattern).map_err(|source| ArtifactRuleError {
            name: name.to_string(),
            source,
        })?;
        Ok(ArtifactRule {
            name: name.to_string(),
            phase,
            pattern,
            replacement: replacement.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Ordered set of artifact rules, tagged with a version so stored cleanups
/// can be traced back to the rules that produced them.
#[derive(Debug, Clone)]
pub struct ArtifactTable {
    version: u32,
    rules: Vec<ArtifactRule>,
}

impl ArtifactTable {
    pub fn new(version: u32, mut rules: Vec<ArtifactRule>) -> Self {
        // stable: keeps declaration order inside a phase
        rules.sort_by_key(|r| r.phase);
        ArtifactTable { version, rules }
    }

    /// Rules for the agent framework's `RunResponse` / `Message` dumps.
    pub fn builtin() -> &'static ArtifactTable {
        &BUILTIN
    }

    pub fn with_rule(mut self, rule: ArtifactRule) -> Self {
        self.rules.push(rule);
        self.rules.sort_by_key(|r| r.phase);
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[ArtifactRule] {
        &self.rules
    }

    /// One pass over every rule. Returns the new text and the rules that fired.
    fn apply_once(&self, text: &str) -> (String, Vec<&str>) {
        let mut out = CRLF_RE.replace_all(text, "\n").into_owned();
        let mut fired = Vec::new();
        for rule in &self.rules {
            if let Cow::Owned(next) = rule.pattern.replace_all(&out, rule.replacement.as_str()) {
                out = next;
                fired.push(rule.name());
            }
        }
        (TRAILING_WS_RE.replace_all(&out, "").trim().to_string(), fired)
    }
}

/// Remove serialization artifacts from a raw response.
///
/// Rules are re-applied until the text stops changing, so stripping an
/// already stripped text is a no-op. The built-in rules only ever shorten
/// the text. A custom table that lengthens it, or keeps rewriting it, stops
/// at the first growing pass or after [`MAX_PASSES`] and returns what it has.
pub fn strip(raw: &RawResponse, table: &ArtifactTable) -> CleanedText {
    if raw.is_empty() {
        return CleanedText::default();
    }

    let mut text = raw.as_str().to_string();
    let before = text.len();
    let mut passes = 0usize;
    let mut fired_rules: Vec<&str> = Vec::new();
    loop {
        let (next, fired) = table.apply_once(&text);
        passes += 1;
        if next == text {
            break;
        }
        for name in fired {
            if !fired_rules.contains(&name) {
                fired_rules.push(name);
            }
        }
        let grew = next.len() > text.len();
        text = next;
        if grew {
            warn!(
                table_version = table.version(),
                passes,
                rules = ?fired_rules,
                "artifact rules lengthened the text, stopping"
            );
            break;
        }
        if passes >= MAX_PASSES {
            warn!(
                table_version = table.version(),
                passes,
                rules = ?fired_rules,
                "artifact rules did not settle, stopping"
            );
            break;
        }
    }

    debug!(
        table_version = table.version(),
        passes,
        rules = ?fired_rules,
        removed = before.saturating_sub(text.len()),
        "stripped response"
    );
    CleanedText::new(text)
}

struct RuleSpec {
    name: &'static str,
    phase: Phase,
    pattern: &'static str,
    replacement: &'static str,
}

const BUILTIN_RULES: &[RuleSpec] = &[
    RuleSpec {
        name: "escaped_newline",
        phase: Phase::Unescape,
        pattern: r"\\n",
        replacement: "\n",
    },
    RuleSpec {
        name: "escaped_quote",
        phase: Phase::Unescape,
        pattern: r"\\'",
        replacement: "'",
    },
    RuleSpec {
        name: "response_wrapper",
        phase: Phase::Unwrap,
        pattern: r"(?s)\b(?:RunResponse|TeamRunResponse|ModelResponse)\((?P<payload>.*)\)",
        replacement: "${payload}",
    },
    RuleSpec {
        name: "content_single_quoted",
        phase: Phase::Unwrap,
        pattern: r"(?s)(?:\bcontent=')+(?P<payload>.*?)'+(?P<tail>[ \t]*,[ \t]*\w+=|[ \t]*\)|\s*$)",
        replacement: "${payload}${tail}",
    },
    RuleSpec {
        name: "content_double_quoted",
        phase: Phase::Unwrap,
        pattern: r#"(?s)(?:\bcontent=")+(?P<payload>.*?)"+(?P<tail>[ \t]*,[ \t]*\w+=|[ \t]*\)|\s*$)"#,
        replacement: "${payload}${tail}",
    },
    RuleSpec {
        name: "sentinel_run_name",
        phase: Phase::Delete,
        pattern: r"(?s)[ \t]*,?[ \t]*\bname=None.*?created_at=\d+",
        replacement: "",
    },
    RuleSpec {
        name: "sentinel_run_tool_call",
        phase: Phase::Delete,
        pattern: r"(?s)[ \t]*,?[ \t]*\btool_call_id=None.*?stop_after_tool_call=False",
        replacement: "",
    },
    RuleSpec {
        name: "sentinel_run_media",
        phase: Phase::Delete,
        pattern: r"(?s)[ \t]*,?[ \t]*\bimages=None.*?videos=None",
        replacement: "",
    },
    RuleSpec {
        name: "sentinel_run_audio",
        phase: Phase::Delete,
        pattern: r"(?s)[ \t]*,?[ \t]*\baudio=None.*?response_audio=None",
        replacement: "",
    },
    RuleSpec {
        name: "sentinel_run_tool_args",
        phase: Phase::Delete,
        pattern: r"(?s)[ \t]*,?[ \t]*\btool_name=None.*?tool_args=None",
        replacement: "",
    },
    RuleSpec {
        name: "sentinel_run_tool_error",
        phase: Phase::Delete,
        pattern: r"(?s)[ \t]*,?[ \t]*\btool_call_error=None.*?extra_data=None",
        replacement: "",
    },
    RuleSpec {
        name: "metrics_call",
        phase: Phase::Delete,
        pattern: r"[ \t]*,?[ \t]*\b(?:metrics|session_metrics)=(?:defaultdict|[A-Z]\w*)\((?:[^()]|\([^()]*\))*\)",
        replacement: "",
    },
    RuleSpec {
        name: "call_group",
        phase: Phase::Delete,
        pattern: r"[ \t]*,?[ \t]*\b(?:Message|MessageMetrics|Metrics|ToolExecution|Timer|defaultdict)\((?:[^()]|\([^()]*\))*\)",
        replacement: "",
    },
    RuleSpec {
        name: "brace_group",
        phase: Phase::Delete,
        pattern: r"[ \t]*,?[ \t]*\b(?:metrics|session_metrics|model_provider_data|extra_data|additional_input)=\{(?:[^{}]|\{[^{}]*\})*\}",
        replacement: "",
    },
    RuleSpec {
        name: "bracket_group",
        phase: Phase::Delete,
        pattern: r"[ \t]*,?[ \t]*\b(?:messages|tool_calls|formatted_tool_calls|tools|images|videos|audio|files|citations|references|reasoning_steps|reasoning_messages|member_responses|extra_messages)=\[(?:[^\[\]]|\[[^\[\]]*\])*\]",
        replacement: "",
    },
    RuleSpec {
        name: "quoted_field",
        phase: Phase::Delete,
        pattern: r"[ \t]*,?[ \t]*\b(?:run_id|agent_id|session_id|team_id|workflow_id|model|model_provider|content_type|event|role|provider)='[^']*'",
        replacement: "",
    },
    RuleSpec {
        name: "sentinel_token",
        phase: Phase::Delete,
        pattern: r"[ \t]*,?[ \t]*\b(?:name|references|workflow_id|extra_data|created_at|updated_at|stop_after_tool_call|tool_call_id|tool_name|tool_args|tool_call_error|tool_calls|images|videos|audio|response_audio|reasoning_content|thinking|citations|from_history|is_paused)=(?:None|True|False|-?\d+(?:\.\d+)?)\b",
        replacement: "",
    },
    RuleSpec {
        name: "dangling_key",
        phase: Phase::Residue,
        pattern: r"(?m)(?:[ \t]*,[ \t]*|^[ \t]*)[a-z_]+=[ \t]*$",
        replacement: "",
    },
    RuleSpec {
        name: "punctuation_residue",
        phase: Phase::Residue,
        pattern: r"(?m)^[ \t]*[,()\[\]{}][ \t,()\[\]{}]*$\n?",
        replacement: "",
    },
];
