// ============================================================
// CSV ROW TYPES
// ============================================================
// Data structures representing parsed CSV content

use std::collections::HashMap;

/// A single row in a CSV file, keyed by the original header names.
#[derive(Debug, Clone)]
pub struct CsvRow {
    /// Row index (0-based, data rows only)
    pub index: usize,

    fields: HashMap<String, String>,
}

impl CsvRow {
    pub fn new(index: usize, fields: HashMap<String, String>) -> Self {
        Self { index, fields }
    }

    /// Raw field value for a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Result of parsing one CSV upload.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Original headers in file order
    pub headers: Vec<String>,

    /// Data rows in file order
    pub rows: Vec<CsvRow>,
}

impl ParsedTable {
    /// Whether the file declared the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}
