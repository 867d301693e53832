use crate::domain::csv::ParsedTable;
use crate::domain::dataset::EquipmentRecord;
use crate::domain::error::{AppError, Result};

/// Columns every upload must declare before any numeric coercion runs.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Equipment Name",
    "Type",
    "Flowrate",
    "Pressure",
    "Temperature",
];

/// Check the parsed table against the required schema. Reports every
/// missing column at once, not just the first, and rejects files with no
/// data rows so the aggregator never divides by zero.
pub fn validate_table(table: &ParsedTable) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !table.has_column(col))
        .copied()
        .collect();

    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    if table.rows.is_empty() {
        return Err(AppError::ValidationError(
            "CSV file contains no data rows".to_string(),
        ));
    }

    Ok(())
}

/// Convert validated untyped rows into typed equipment records. Any
/// measurement that does not coerce to a float fails hard, identifying the
/// offending row and column.
pub fn to_records(table: &ParsedTable) -> Result<Vec<EquipmentRecord>> {
    table
        .rows
        .iter()
        .map(|row| {
            Ok(EquipmentRecord {
                name: row.get("Equipment Name").unwrap_or("").to_string(),
                equipment_type: row.get("Type").unwrap_or("").to_string(),
                flowrate: numeric_field(row.index, row.get("Flowrate"), "Flowrate")?,
                pressure: numeric_field(row.index, row.get("Pressure"), "Pressure")?,
                temperature: numeric_field(row.index, row.get("Temperature"), "Temperature")?,
            })
        })
        .collect()
}

fn numeric_field(index: usize, value: Option<&str>, column: &str) -> Result<f64> {
    let raw = value.unwrap_or("");
    raw.trim()
        .parse::<f64>()
        .ok()
        // NaN/inf parse as f64 but can never produce a finite average
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            AppError::ParseError(format!(
                "Non-numeric value '{}' in column '{}' at row {}",
                raw,
                column,
                index + 1
            ))
        })
}
