use std::fmt;

/// Free-form text returned by a generation call, before any cleanup.
///
/// The transport may hand back a debug dump of its response object instead
/// of plain text; nothing about the shape is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse(String);

impl RawResponse {
    pub fn new(text: impl Into<String>) -> Self {
        RawResponse(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for RawResponse {
    fn from(s: &str) -> Self {
        RawResponse(s.to_string())
    }
}

impl From<String> for RawResponse {
    fn from(s: String) -> Self {
        RawResponse(s)
    }
}

impl From<Option<String>> for RawResponse {
    fn from(s: Option<String>) -> Self {
        RawResponse(s.unwrap_or_default())
    }
}

/// Natural-language text left after artifact removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedText(String);

impl CleanedText {
    pub(crate) fn new(text: String) -> Self {
        CleanedText(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CleanedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CleanedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
