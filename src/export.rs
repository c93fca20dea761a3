//! Spreadsheet export of a cached report.
//!
//! Sheet names, their order and each sheet's column order are relied on by
//! downstream scripts and must not change:
//!
//! | Sheet | Columns |
//! |---|---|
//! | `Summary` | Metric, Value |
//! | `By_Product` | Product, Revenue |
//! | `By_Salesperson` | Salesperson, Revenue |
//! | `Monthly` | YearMonth, Revenue |
//! | `Cleaned_Data` | Date, Product, Quantity, Unit Price, Salesperson, Revenue |

use crate::error::Result;
use crate::schema::{AggregateBundle, CleanedRecord, RevenueEntry};
use chrono::{DateTime, Datelike, TimeZone};
use log::debug;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SUMMARY_SHEET: &str = "Summary";
pub const PRODUCT_SHEET: &str = "By_Product";
pub const SALESPERSON_SHEET: &str = "By_Salesperson";
pub const MONTHLY_SHEET: &str = "Monthly";
pub const CLEANED_DATA_SHEET: &str = "Cleaned_Data";

pub const SHEET_ORDER: [&str; 5] = [
    SUMMARY_SHEET,
    PRODUCT_SHEET,
    SALESPERSON_SHEET,
    MONTHLY_SHEET,
    CLEANED_DATA_SHEET,
];

pub const CLEANED_DATA_COLUMNS: [&str; 6] = [
    "Date",
    "Product",
    "Quantity",
    "Unit Price",
    "Salesperson",
    "Revenue",
];

enum SummaryValue<'a> {
    Number(f64),
    Text(&'a str),
}

/// Builds the five-sheet workbook and returns its bytes.
pub fn export_workbook(records: &[CleanedRecord], aggregates: &AggregateBundle) -> Result<Vec<u8>> {
    let header = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet().set_name(SUMMARY_SHEET)?;
    write_summary(summary, aggregates, &header)?;

    let products = workbook.add_worksheet().set_name(PRODUCT_SHEET)?;
    write_revenue_table(products, "Product", &aggregates.per_product, &header)?;

    let salespeople = workbook.add_worksheet().set_name(SALESPERSON_SHEET)?;
    write_revenue_table(salespeople, "Salesperson", &aggregates.per_salesperson, &header)?;

    let monthly = workbook.add_worksheet().set_name(MONTHLY_SHEET)?;
    write_revenue_table(monthly, "YearMonth", &aggregates.monthly, &header)?;

    let cleaned = workbook.add_worksheet().set_name(CLEANED_DATA_SHEET)?;
    write_cleaned_records(cleaned, records, &header, &date_format)?;

    let bytes = workbook.save_to_buffer()?;
    debug!(
        "Exported workbook with {} cleaned rows ({} bytes)",
        records.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// `sales_report_YYYYMMDD_HHMMSS.xlsx` for the given moment.
pub fn download_file_name<Tz>(now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("sales_report_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

fn write_summary(
    worksheet: &mut Worksheet,
    aggregates: &AggregateBundle,
    header: &Format,
) -> Result<()> {
    let rows = [
        ("Total Revenue", SummaryValue::Number(aggregates.total_revenue)),
        ("YTD Revenue", SummaryValue::Number(aggregates.ytd_total)),
        ("Best Month", SummaryValue::Text(&aggregates.best_month.label)),
        ("Best Month Revenue", SummaryValue::Number(aggregates.best_month.revenue)),
        ("Best Product", SummaryValue::Text(&aggregates.best_product.label)),
        ("Best Product Revenue", SummaryValue::Number(aggregates.best_product.revenue)),
        ("Top Salesperson", SummaryValue::Text(&aggregates.top_salesperson.label)),
        (
            "Top Salesperson Revenue",
            SummaryValue::Number(aggregates.top_salesperson.revenue),
        ),
    ];

    worksheet.write_string_with_format(0, 0, "Metric", header)?;
    worksheet.write_string_with_format(0, 1, "Value", header)?;

    for (i, (metric, value)) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, *metric)?;
        match value {
            SummaryValue::Number(n) => worksheet.write_number(row, 1, *n)?,
            SummaryValue::Text(s) => worksheet.write_string(row, 1, *s)?,
        };
    }

    worksheet.set_column_width(0, 26)?;
    worksheet.set_column_width(1, 18)?;
    Ok(())
}

fn write_revenue_table(
    worksheet: &mut Worksheet,
    label_header: &str,
    rows: &[RevenueEntry],
    header: &Format,
) -> Result<()> {
    worksheet.write_string_with_format(0, 0, label_header, header)?;
    worksheet.write_string_with_format(0, 1, "Revenue", header)?;

    for (i, entry) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &entry.label)?;
        worksheet.write_number(row, 1, entry.revenue)?;
    }

    worksheet.set_column_width(0, 24)?;
    Ok(())
}

fn write_cleaned_records(
    worksheet: &mut Worksheet,
    records: &[CleanedRecord],
    header: &Format,
    date_format: &Format,
) -> Result<()> {
    for (col, name) in CLEANED_DATA_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, header)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        let date = &record.date;

        // Excel cannot represent dates before 1900; those are written as text.
        match ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8) {
            Ok(excel_date) if date.year() >= 1900 => {
                worksheet.write_datetime_with_format(row, 0, &excel_date, date_format)?;
            }
            _ => {
                worksheet.write_string(row, 0, date.format("%Y-%m-%d").to_string())?;
            }
        }
        worksheet.write_string(row, 1, &record.product_name)?;
        worksheet.write_number(row, 2, record.quantity)?;
        worksheet.write_number(row, 3, record.unit_price)?;
        worksheet.write_string(row, 4, &record.salesperson_name)?;
        worksheet.write_number(row, 5, record.revenue)?;
    }

    worksheet.set_column_width(0, 12)?;
    worksheet.set_column_width(1, 24)?;
    worksheet.set_column_width(4, 20)?;
    Ok(())
}
