use crate::error::{Result, SalesReportError};
use crate::schema::{RawTable, REQUIRED_COLUMNS};
use log::warn;

/// Required columns absent from `table`, in [`REQUIRED_COLUMNS`] order.
pub fn missing_columns(table: &RawTable) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|column| !table.has_column(column))
        .map(|column| column.to_string())
        .collect()
}

pub fn validate_columns(table: &RawTable) -> Result<()> {
    let missing = missing_columns(table);
    if missing.is_empty() {
        return Ok(());
    }

    warn!("Upload is missing required column(s): {}", missing.join(", "));
    Err(SalesReportError::MissingColumns(missing))
}

/// Passes the table through unchanged when every required column is present.
pub fn validate_table(table: RawTable) -> Result<RawTable> {
    validate_columns(&table)?;
    Ok(table)
}
