//! Format detection for fetched resources

use serde::{Deserialize, Serialize};

/// Wire format of a fetched resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Detect the format from a resource path.
    ///
    /// The file extension of the last path segment wins. Paths without a
    /// recognised extension fall back to a substring match, which is how the
    /// upstream manifests name their resources (`countries-aggregated_csv/...`).
    pub fn from_path(path: &str) -> Option<Self> {
        // Drop query string and fragment
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let segment = path.rsplit('/').next().unwrap_or(path);

        if let Some((_, ext)) = segment.rsplit_once('.') {
            match ext.to_ascii_lowercase().as_str() {
                "csv" => return Some(SourceFormat::Csv),
                "json" => return Some(SourceFormat::Json),
                _ => {}
            }
        }

        let lower = path.to_ascii_lowercase();
        if lower.contains("csv") {
            Some(SourceFormat::Csv)
        } else if lower.contains("json") {
            Some(SourceFormat::Json)
        } else {
            None
        }
    }

    /// Detect the format from an HTTP `Content-Type` header value
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/csv" | "application/csv" => Some(SourceFormat::Csv),
            "application/json" | "text/json" => Some(SourceFormat::Json),
            m if m.ends_with("+json") => Some(SourceFormat::Json),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
        }
    }
}
