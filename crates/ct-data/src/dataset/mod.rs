//! Immutable, column-typed tables backed by Arrow record batches

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, NullArray, StringArray,
    UInt32Array,
};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{Datelike, NaiveDate};
use ct_core::Value;
use indexmap::IndexMap;

use crate::DataError;

/// Days from 0001-01-01 to the Unix epoch
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A snapshot of tabular data produced by one fetch-and-decode cycle.
///
/// Every operation returns a new dataset; the underlying batch is never
/// mutated.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    batch: RecordBatch,
}

/// Column kinds used while building Arrow arrays from cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Null,
    Int,
    Float,
    Date,
    Text,
}

impl Kind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Date(_) => Kind::Date,
            Value::Str(_) => Kind::Text,
        }
    }

    fn merge(self, other: Kind) -> Kind {
        match (self, other) {
            (Kind::Null, k) | (k, Kind::Null) => k,
            (a, b) if a == b => a,
            (Kind::Int, Kind::Float) | (Kind::Float, Kind::Int) => Kind::Float,
            _ => Kind::Text,
        }
    }
}

impl TabularDataset {
    /// Wrap an existing record batch
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// A dataset with no columns and no rows
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    /// Build a dataset from named columns of cells.
    ///
    /// Each column's Arrow type is the narrowest one holding all of its
    /// cells: integers widen to floats, any other mix becomes text.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, DataError> {
        let row_count = columns.first().map(|(_, values)| values.len()).unwrap_or(0);

        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        for (name, values) in &columns {
            let array = build_array(values);
            fields.push(Field::new(name, array.data_type().clone(), true));
            arrays.push(array);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(row_count));
        let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(Self { batch })
    }

    /// Build a dataset from rows, transposing them into columns
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Result<Self, DataError> {
        let mut cols: Vec<(String, Vec<Value>)> = columns
            .iter()
            .map(|name| (name.to_string(), Vec::with_capacity(rows.len())))
            .collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DataError::decode(
                    "inline rows",
                    format!("row {} has {} cells, expected {}", row_idx, row.len(), columns.len()),
                ));
            }
            for (col, value) in cols.iter_mut().zip(row) {
                col.1.push(value);
            }
        }

        Self::from_columns(cols)
    }

    /// Access the underlying record batch
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn row_count(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_count(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    fn column(&self, name: &str) -> Result<&ArrayRef, DataError> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// All cells of a column, in row order
    pub fn get_column(&self, name: &str) -> Result<Vec<Value>, DataError> {
        let array = self.column(name)?;
        Ok((0..array.len()).map(|row| cell(array, row)).collect())
    }

    /// A single cell
    pub fn value(&self, column: &str, row: usize) -> Result<Value, DataError> {
        let array = self.column(column)?;
        if row >= array.len() {
            return Err(DataError::RowOutOfRange {
                row,
                row_count: array.len(),
            });
        }
        Ok(cell(array, row))
    }

    /// A cell read as a number.
    ///
    /// Nulls read as `None`. Strings that parse as numbers are accepted;
    /// anything else is a type mismatch naming the column and row.
    pub fn numeric(&self, column: &str, row: usize) -> Result<Option<f64>, DataError> {
        match self.value(column, row)? {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(v as f64)),
            Value::Float(v) => Ok(Some(v)),
            Value::Str(s) => s.trim().parse::<f64>().map(Some).map_err(|_| DataError::TypeMismatch {
                column: column.to_string(),
                row,
                expected: "number",
                found: format!("string '{}'", s),
            }),
            other => Err(DataError::TypeMismatch {
                column: column.to_string(),
                row,
                expected: "number",
                found: other.type_name().to_string(),
            }),
        }
    }

    /// A cell read as display text, `None` for nulls
    pub fn text(&self, column: &str, row: usize) -> Result<Option<String>, DataError> {
        Ok(match self.value(column, row)? {
            Value::Null => None,
            Value::Str(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    /// A full row in column order
    pub fn row(&self, row: usize) -> Result<Vec<Value>, DataError> {
        if row >= self.row_count() {
            return Err(DataError::RowOutOfRange {
                row,
                row_count: self.row_count(),
            });
        }
        Ok(self.batch.columns().iter().map(|array| cell(array, row)).collect())
    }

    /// Rows whose `column` equals `value` exactly.
    ///
    /// No match yields an empty dataset with the same columns.
    pub fn filter(&self, column: &str, value: &Value) -> Result<Self, DataError> {
        let array = self.column(column)?;
        let mask: BooleanArray = (0..array.len())
            .map(|row| Some(cell(array, row) == *value))
            .collect();

        let batch = compute::filter_record_batch(&self.batch, &mask)?;
        Ok(Self { batch })
    }

    /// Sum of a column; nulls and non-numeric entries count as zero
    pub fn column_sum(&self, column: &str) -> Result<f64, DataError> {
        let array = self.column(column)?;
        let any = array.as_any();

        let sum = if let Some(ints) = any.downcast_ref::<Int64Array>() {
            compute::sum(ints).unwrap_or(0) as f64
        } else if let Some(floats) = any.downcast_ref::<Float64Array>() {
            compute::sum(floats).unwrap_or(0.0)
        } else if let Some(strings) = any.downcast_ref::<StringArray>() {
            strings
                .iter()
                .flatten()
                .filter_map(|s| s.trim().parse::<f64>().ok())
                .sum()
        } else {
            0.0
        };

        Ok(sum)
    }

    /// Keep only the named columns, in the order given
    pub fn select_columns(&self, names: &[&str]) -> Result<Self, DataError> {
        let schema = self.batch.schema();
        let indices = names
            .iter()
            .map(|name| {
                schema
                    .index_of(name)
                    .map_err(|_| DataError::ColumnNotFound(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            batch: self.batch.project(&indices)?,
        })
    }

    /// Stable sort by one column; nulls always sort last
    pub fn sort_by(&self, column: &str, descending: bool) -> Result<Self, DataError> {
        let values = self.get_column(column)?;

        let mut order: Vec<u32> = (0..values.len() as u32).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&values[a as usize], &values[b as usize]);
            match (a.is_null(), b.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = compare_values(a, b);
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            }
        });

        let indices = UInt32Array::from(order);
        let columns = self
            .batch
            .columns()
            .iter()
            .map(|array| compute::take(array.as_ref(), &indices, None))
            .collect::<Result<Vec<_>, _>>()?;

        let options = RecordBatchOptions::new().with_row_count(Some(self.row_count()));
        let batch = RecordBatch::try_new_with_options(self.batch.schema(), columns, &options)?;
        Ok(Self { batch })
    }

    /// Distinct values of a column in first-seen order
    pub fn distinct(&self, column: &str) -> Result<Vec<Value>, DataError> {
        let mut seen: IndexMap<(&'static str, String), Value> = IndexMap::new();
        for value in self.get_column(column)? {
            seen.entry((value.type_name(), value.to_string())).or_insert(value);
        }
        Ok(seen.into_values().collect())
    }

    /// Pretty-printed view of the first `max_rows` rows
    pub fn preview(&self, max_rows: usize) -> String {
        let head = self.batch.slice(0, max_rows.min(self.row_count()));
        match arrow::util::pretty::pretty_format_batches(&[head]) {
            Ok(table) => table.to_string(),
            Err(e) => format!("<unprintable dataset: {}>", e),
        }
    }
}

impl fmt::Display for TabularDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview(self.row_count()))
    }
}

/// Read one cell of an Arrow array
fn cell(array: &ArrayRef, row: usize) -> Value {
    if array.data_type() == &DataType::Null || array.is_null(row) {
        return Value::Null;
    }

    let any = array.as_any();
    if let Some(a) = any.downcast_ref::<Int64Array>() {
        Value::Int(a.value(row))
    } else if let Some(a) = any.downcast_ref::<Float64Array>() {
        Value::Float(a.value(row))
    } else if let Some(a) = any.downcast_ref::<StringArray>() {
        Value::Str(a.value(row).to_string())
    } else if let Some(a) = any.downcast_ref::<Date32Array>() {
        a.value_as_date(row).map(Value::Date).unwrap_or(Value::Null)
    } else {
        arrow::util::display::array_value_to_string(array.as_ref(), row)
            .map(Value::Str)
            .unwrap_or(Value::Null)
    }
}

/// Build an Arrow array holding `values`
fn build_array(values: &[Value]) -> ArrayRef {
    let kind = values
        .iter()
        .fold(Kind::Null, |acc, v| acc.merge(Kind::of(v)));

    match kind {
        Kind::Null => Arc::new(NullArray::new(values.len())),
        Kind::Int => Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        Kind::Float => Arc::new(Float64Array::from(
            values.iter().map(Value::as_f64).collect::<Vec<_>>(),
        )),
        Kind::Date => Arc::new(Date32Array::from(
            values
                .iter()
                .map(|v| v.as_date().map(date_to_days))
                .collect::<Vec<_>>(),
        )),
        Kind::Text => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| if v.is_null() { None } else { Some(v.to_string()) })
                .collect::<Vec<_>>(),
        )),
    }
}

/// Days since the Unix epoch, as stored by Arrow's Date32
fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Ordering between two non-null cells
fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.total_cmp(&y);
    }

    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Int(_) | Value::Float(_) => 0,
        Value::Date(_) => 1,
        Value::Str(_) => 2,
        Value::Null => 3,
    }
}
