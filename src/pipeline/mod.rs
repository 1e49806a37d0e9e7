pub mod blocks;
pub mod compose;
pub mod extract;
pub mod response;
pub mod strip;

pub use blocks::{normalize, to_markdown, Block, ListItem};
pub use compose::{compose, ExportDocument, ExportFormat, ReportKind, ReportMeta};
pub use extract::{extract, ExtractedField, ExtractedFields, FieldSpec};
pub use response::{CleanedText, RawResponse};
pub use strip::{strip, ArtifactTable};

/// Strip with the built-in artifact table.
pub fn clean(raw: &RawResponse) -> CleanedText {
    strip(raw, ArtifactTable::builtin())
}

/// Three-pass pipeline: raw → cleaned → blocks → export document.
pub fn export_report(raw: &RawResponse, meta: &ReportMeta, format: ExportFormat) -> ExportDocument {
    let cleaned = clean(raw);
    let blocks = normalize(cleaned.as_str());
    compose(&blocks, meta, format)
}

/// Three-pass pipeline: raw → cleaned → blocks → extracted fields.
pub fn summarize(raw: &RawResponse, specs: &[FieldSpec]) -> ExtractedFields {
    let cleaned = clean(raw);
    let blocks = normalize(cleaned.as_str());
    extract(&blocks, specs)
}
