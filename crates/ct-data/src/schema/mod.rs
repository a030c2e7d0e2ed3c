use chrono::NaiveDate;
use ct_core::Value;

use crate::config::SourceConfig;

/// Detected type of a text-encoded column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Date,
    Text,
    /// Every sampled cell was null
    Empty,
}

/// Schema detector for analyzing raw text cells and determining column types
pub struct SchemaDetector<'a> {
    config: &'a SourceConfig,
}

/// Information about a detected schema
#[derive(Debug, Clone)]
pub struct SchemaInfo {
    pub columns: Vec<ColumnInfo>,
}

/// A detected column
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub stats: ColumnStats,
}

/// Statistics about a sampled column
#[derive(Debug, Clone, Default)]
pub struct ColumnStats {
    pub null_count: usize,
    pub distinct_count: usize,
    /// Non-decreasing over the sample (only tracked for dates and numbers)
    pub is_sorted: bool,
}

impl SchemaInfo {
    /// Date columns whose sample is not in ascending order
    pub fn unsorted_date_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.column_type == ColumnType::Date && !c.stats.is_sorted)
            .map(|c| c.name.as_str())
    }
}

impl<'a> SchemaDetector<'a> {
    /// Create a new schema detector
    pub fn new(config: &'a SourceConfig) -> Self {
        Self { config }
    }

    /// Detect schema from sample rows
    pub fn detect_from_samples(&self, headers: &[String], samples: &[Vec<String>]) -> SchemaInfo {
        let sample = &samples[..samples.len().min(self.config.sample_size)];

        let columns = headers
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let (column_type, stats) = self.analyze_column(sample, col_idx);
                ColumnInfo {
                    name: name.clone(),
                    column_type,
                    stats,
                }
            })
            .collect();

        SchemaInfo { columns }
    }

    /// Analyze a single column
    fn analyze_column(&self, samples: &[Vec<String>], col_idx: usize) -> (ColumnType, ColumnStats) {
        let mut null_count = 0;
        let mut values: Vec<&str> = Vec::new();
        let mut is_int = true;
        let mut is_float = true;
        let mut is_date = true;

        for row in samples {
            match row.get(col_idx) {
                Some(raw) if !self.config.null_config.is_null(raw) => {
                    let value = raw.trim();
                    values.push(value);

                    if is_int && value.parse::<i64>().is_err() {
                        is_int = false;
                    }
                    if is_float && value.parse::<f64>().is_err() {
                        is_float = false;
                    }
                    if is_date && self.parse_date(value).is_none() {
                        is_date = false;
                    }
                }
                _ => null_count += 1,
            }
        }

        let column_type = if values.is_empty() {
            ColumnType::Empty
        } else if is_int {
            ColumnType::Integer
        } else if is_float {
            ColumnType::Float
        } else if is_date {
            ColumnType::Date
        } else {
            ColumnType::Text
        };

        let distinct_count = {
            let mut unique = std::collections::HashSet::new();
            for v in &values {
                unique.insert(*v);
            }
            unique.len()
        };

        let is_sorted = self.check_sorted(&values, column_type);

        let stats = ColumnStats {
            null_count,
            distinct_count,
            is_sorted,
        };

        (column_type, stats)
    }

    /// Check if sampled values are non-decreasing
    fn check_sorted(&self, values: &[&str], column_type: ColumnType) -> bool {
        if values.len() < 2 {
            return true;
        }

        match column_type {
            ColumnType::Integer | ColumnType::Float => {
                let parsed: Vec<f64> = values.iter().filter_map(|v| v.parse().ok()).collect();
                parsed.windows(2).all(|w| w[0] <= w[1])
            }
            ColumnType::Date => {
                let parsed: Vec<NaiveDate> = values.iter().filter_map(|v| self.parse_date(v)).collect();
                parsed.windows(2).all(|w| w[0] <= w[1])
            }
            _ => false,
        }
    }

    /// Parse a date using the configured layouts
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        self.config.parse_date(value)
    }

    /// Convert a raw cell to a value of the detected type.
    ///
    /// Cells outside the sample that do not parse are kept as text; the
    /// dataset builder then widens the whole column to text.
    pub fn parse_cell(&self, column_type: ColumnType, raw: &str) -> Value {
        if self.config.null_config.is_null(raw) {
            return Value::Null;
        }

        let trimmed = raw.trim();
        let parsed = match column_type {
            ColumnType::Integer => trimmed.parse::<i64>().ok().map(Value::Int),
            ColumnType::Float => trimmed.parse::<f64>().ok().map(Value::Float),
            ColumnType::Date => self.parse_date(trimmed).map(Value::Date),
            ColumnType::Text | ColumnType::Empty => None,
        };

        parsed.unwrap_or_else(|| Value::Str(raw.to_string()))
    }
}
