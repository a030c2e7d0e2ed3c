//! Null value handling for decoded cells

use serde::{Deserialize, Serialize};

/// Null value configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NullConfig {
    /// Patterns to treat as null
    pub patterns: Vec<String>,

    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,

    /// Case sensitive matching
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                String::new(), // Empty cell
                "N/A".to_string(),
                "NA".to_string(),
                "NaN".to_string(),
                "null".to_string(),
                "None".to_string(),
            ],
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// Check if a raw cell should be treated as null
    pub fn is_null(&self, raw: &str) -> bool {
        let candidate = if self.trim_whitespace { raw.trim() } else { raw };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                candidate == pattern
            } else {
                candidate.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Add a null pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let config = NullConfig::default();
        assert!(config.is_null(""));
        assert!(config.is_null("   "));
        assert!(config.is_null("n/a"));
        assert!(config.is_null("NULL"));
        assert!(!config.is_null("0"));
        assert!(!config.is_null("Namibia"));
    }

    #[test]
    fn test_case_sensitive_matching() {
        let config = NullConfig {
            case_sensitive: true,
            ..NullConfig::default()
        };
        assert!(config.is_null("null"));
        assert!(!config.is_null("NULL"));
    }

    #[test]
    fn test_custom_pattern() {
        let config = NullConfig::default().with_pattern("-");
        assert!(config.is_null("-"));
    }
}
