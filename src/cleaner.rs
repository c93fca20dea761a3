use crate::schema::{
    CleanedRecord, RawTable, DATE_COLUMN, PRODUCT_COLUMN, QUANTITY_COLUMN, SALESPERSON_COLUMN,
    UNIT_PRICE_COLUMN,
};
use crate::utils::{parse_day_first_date, parse_number};
use log::debug;

/// Output of the row cleaner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedDataset {
    /// Surviving rows, ascending by date, ties kept in upload order.
    pub records: Vec<CleanedRecord>,
    /// Rows excluded by coercion failure or a negative quantity/price.
    pub dropped_rows: usize,
}

impl CleanedDataset {
    /// No rows survived cleaning. Callers report this as "no valid data", not as an error.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

struct ColumnLayout {
    date: usize,
    product: usize,
    quantity: usize,
    unit_price: usize,
    salesperson: usize,
}

impl ColumnLayout {
    fn locate(table: &RawTable) -> Option<Self> {
        Some(Self {
            date: table.column_index(DATE_COLUMN)?,
            product: table.column_index(PRODUCT_COLUMN)?,
            quantity: table.column_index(QUANTITY_COLUMN)?,
            unit_price: table.column_index(UNIT_PRICE_COLUMN)?,
            salesperson: table.column_index(SALESPERSON_COLUMN)?,
        })
    }
}

/// Coerces every row of a validated table and keeps only fully valid ones.
///
/// A row survives when its date parses day-first, quantity and unit price
/// parse as finite numbers that are not negative, and both names are present.
/// Names are trimmed; a name that is blank after trimming is still kept.
/// Rows failing any check are dropped whole and only counted.
///
/// A table that lacks a required column yields an empty dataset with every
/// row counted as dropped; run [`crate::validation::validate_table`] first to
/// get a descriptive error instead.
pub fn clean_table(table: &RawTable) -> CleanedDataset {
    let Some(layout) = ColumnLayout::locate(table) else {
        return CleanedDataset {
            records: Vec::new(),
            dropped_rows: table.len(),
        };
    };

    let mut records: Vec<CleanedRecord> = (0..table.len())
        .filter_map(|row| clean_row(table, row, &layout))
        .collect();

    let dropped_rows = table.len() - records.len();
    if dropped_rows > 0 {
        debug!(
            "Dropped {} of {} rows during cleaning",
            dropped_rows,
            table.len()
        );
    }

    // `sort_by_key` is stable, so rows sharing a date keep their upload order.
    records.sort_by_key(|record| record.date);

    CleanedDataset {
        records,
        dropped_rows,
    }
}

fn clean_row(table: &RawTable, row: usize, layout: &ColumnLayout) -> Option<CleanedRecord> {
    let date = table.cell(row, layout.date).and_then(parse_day_first_date)?;
    let quantity = table.cell(row, layout.quantity).and_then(parse_number)?;
    let unit_price = table.cell(row, layout.unit_price).and_then(parse_number)?;
    let product_name = table.cell(row, layout.product)?.trim();
    let salesperson_name = table.cell(row, layout.salesperson)?.trim();

    if quantity < 0.0 || unit_price < 0.0 {
        return None;
    }

    Some(CleanedRecord::new(
        date,
        product_name,
        quantity,
        unit_price,
        salesperson_name,
    ))
}
