use diffsarif_core::DiffUnit;
use diffsarif_review::sarif::SarifReport;
use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`.
///
/// Missing fields deserialize to empty values so the handler can answer
/// with a specific message instead of a generic decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// One changed file: its name and its diff text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
}

impl From<FileEntry> for DiffUnit {
    fn from(entry: FileEntry) -> Self {
        DiffUnit::new(entry.name, entry.code)
    }
}

/// Successful response of `POST /analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: SarifReport,
}
