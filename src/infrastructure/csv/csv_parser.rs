// ============================================================
// CSV PARSER
// ============================================================
// Parse uploaded CSV bytes into untyped rows

use crate::domain::csv::{CsvRow, ParsedTable};
use crate::domain::error::AppError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;

/// CSV parser for uploaded files
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse raw upload bytes. Non-UTF-8 input is read lossily rather than
    /// rejected outright; structural errors still fail.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedTable, AppError> {
        let content = String::from_utf8_lossy(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<ParsedTable, AppError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let mut rows = Vec::new();
        let mut index = 0;

        for result in reader.records() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            rows.push(self.parse_row(index, &headers, &record));
            index += 1;
        }

        Ok(ParsedTable {
            headers: headers.iter().map(str::to_owned).collect(),
            rows,
        })
    }

    /// Parse a single CSV row
    fn parse_row(&self, index: usize, headers: &StringRecord, record: &StringRecord) -> CsvRow {
        let mut fields = HashMap::new();

        for (idx, header) in headers.iter().enumerate() {
            let value = record.get(idx).unwrap_or("").to_string();
            fields.insert(header.to_string(), value);
        }

        CsvRow::new(index, fields)
    }
}
