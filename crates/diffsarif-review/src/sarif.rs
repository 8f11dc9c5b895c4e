use diffsarif_core::{IssueRecord, ReportConfig};
use serde::{Deserialize, Serialize};

/// SARIF version written into every report.
pub const SARIF_VERSION: &str = "2.1.0";

/// A SARIF v2.1.0 log with a single run.
///
/// Serializes to exactly `{"version", "runs"}` at the top level.
///
/// Intended for upload to code scanning UIs such as
/// `github/codeql-action/upload-sarif`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifReport {
    /// Always [`SARIF_VERSION`].
    pub version: String,
    /// Exactly one run.
    pub runs: Vec<SarifRun>,
}

/// One analysis run: the tool that produced it and its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: ToolDriver,
}

/// Fixed metadata describing the analysis tool.
///
/// # Examples
///
/// ```
/// use diffsarif_review::sarif::ToolDriver;
///
/// let driver = ToolDriver::default();
/// assert_eq!(driver.name, "diffsarif");
/// assert!(!driver.version.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDriver {
    pub name: String,
    pub version: String,
    pub information_uri: String,
}

impl ToolDriver {
    /// Build driver metadata from the `[report]` configuration table.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            name: config.tool_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            information_uri: config.information_uri.clone(),
        }
    }
}

impl Default for ToolDriver {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

/// A single finding with one physical location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifResult {
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    pub artifact_location: ArtifactLocation,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub start_line: u32,
    pub start_column: u32,
}

/// Map a parsed finding onto a SARIF result.
///
/// # Examples
///
/// ```
/// use diffsarif_core::IssueRecord;
/// use diffsarif_review::sarif::normalize;
///
/// let result = normalize(&IssueRecord {
///     message: "unused import".into(),
///     file: "app.py".into(),
///     line: 3,
///     column: 1,
/// });
/// let loc = &result.locations[0].physical_location;
/// assert_eq!(loc.artifact_location.uri, "app.py");
/// assert_eq!(loc.region.start_line, 3);
/// ```
pub fn normalize(record: &IssueRecord) -> SarifResult {
    SarifResult {
        message: SarifMessage {
            text: record.message.clone(),
        },
        locations: vec![SarifLocation {
            physical_location: PhysicalLocation {
                artifact_location: ArtifactLocation {
                    uri: record.file.clone(),
                },
                region: Region {
                    start_line: record.line,
                    start_column: record.column,
                },
            },
        }],
    }
}

impl From<&IssueRecord> for SarifResult {
    fn from(record: &IssueRecord) -> Self {
        normalize(record)
    }
}

/// Merge per-file result sets into one report.
///
/// Results keep arrival order: file order first, then the order within each
/// file. Nothing is deduplicated or sorted.
///
/// # Examples
///
/// ```
/// use diffsarif_review::sarif::{aggregate, ToolDriver};
///
/// let report = aggregate(ToolDriver::default(), Vec::new());
/// assert_eq!(report.version, "2.1.0");
/// assert!(report.results().is_empty());
/// ```
pub fn aggregate<I>(driver: ToolDriver, per_file: I) -> SarifReport
where
    I: IntoIterator<Item = Vec<SarifResult>>,
{
    let results: Vec<SarifResult> = per_file.into_iter().flatten().collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool { driver },
            results,
        }],
    }
}

impl SarifReport {
    /// Results of the single run.
    pub fn results(&self) -> &[SarifResult] {
        self.runs
            .first()
            .map(|run| run.results.as_slice())
            .unwrap_or_default()
    }

    /// Tool metadata of the single run.
    pub fn driver(&self) -> Option<&ToolDriver> {
        self.runs.first().map(|run| &run.tool.driver)
    }
}
