//! In-memory tabular data and the closed set of dataset payload shapes.

use serde_json::{Map, Value};

/// One row, positionally aligned with `Table::columns`.
pub type Row = Vec<Value>;

/// Ordered rows with named columns.
///
/// Rows always have exactly one cell per column; missing cells are `Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Creates a table, padding or truncating each row to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Builds a table from JSON objects.
    ///
    /// Columns are the union of keys in first-seen order; absent keys become
    /// `Null`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        let records: Vec<&Map<String, Value>> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Builds a table column-wise. The longest column sets the row count;
    /// shorter columns are padded with `Null`.
    pub fn from_columns(columns: Vec<(&str, Vec<Value>)>) -> Self {
        let height = columns.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
        let names = columns.iter().map(|(name, _)| name.to_string()).collect();

        let mut rows: Vec<Row> = vec![Vec::with_capacity(columns.len()); height];
        for (_, values) in columns {
            let mut values = values.into_iter();
            for row in &mut rows {
                row.push(values.next().unwrap_or(Value::Null));
            }
        }

        Self {
            columns: names,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the value of `column` in `row`, if the column exists.
    pub fn cell<'a>(&self, row: &'a Row, column: &str) -> Option<&'a Value> {
        self.column_index(column).and_then(|i| row.get(i))
    }

    /// Keeps only rows matching `keep`, preserving order and columns.
    #[must_use]
    pub fn retain_rows<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.retain(|row| keep(row));
        self
    }

    /// Renders up to `limit` rows as a right-aligned text grid.
    pub fn render(&self, limit: usize) -> String {
        let shown = &self.rows[..self.rows.len().min(limit)];
        let cells: Vec<Vec<String>> = shown
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = vec![format_line(&self.columns, &widths)];
        for row in &cells {
            lines.push(format_line(row, &widths));
        }
        lines.join("\n")
    }
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{v:>w$}", w = *w))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Plain-text form of a cell: strings unquoted, `null` empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// What a dataset fetch produced.
///
/// Resolved once where records enter the process so that downstream code
/// never inspects raw JSON to decide how to treat it.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetPayload {
    /// Records with named columns.
    Tabular(Table),
    /// Records that are not JSON objects.
    List(Vec<Value>),
    /// Nothing available.
    Empty,
}

impl DatasetPayload {
    /// Classifies raw `records`.
    pub fn from_records(records: Vec<Value>) -> Self {
        if records.is_empty() {
            return Self::Empty;
        }

        if records.iter().all(Value::is_object) {
            Self::Tabular(Table::from_records(
                records.iter().filter_map(Value::as_object),
            ))
        } else {
            Self::List(records)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Tabular(table) => table.len(),
            Self::List(items) => items.len(),
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Tabular(table) => Some(table),
            _ => None,
        }
    }

    /// Short multi-line description: record count, columns and samples.
    pub fn describe(&self, sample_rows: usize) -> String {
        let mut lines = vec![format!("Records: {}", self.len())];

        match self {
            Self::Tabular(table) if !table.is_empty() => {
                lines.push(format!("Columns: {}", table.columns().join(", ")));
                lines.push(format!("Sample records (first {sample_rows}):"));
                lines.push(table.render(sample_rows));
            }
            Self::List(items) => {
                if let Some(first) = items.first() {
                    let sample =
                        serde_json::to_string_pretty(first).unwrap_or_else(|_| first.to_string());
                    lines.push(format!("Sample: {sample}"));
                }
            }
            _ => {}
        }

        lines.join("\n")
    }
}

impl From<Table> for DatasetPayload {
    fn from(table: Table) -> Self {
        if table.columns().is_empty() {
            Self::Empty
        } else {
            Self::Tabular(table)
        }
    }
}
