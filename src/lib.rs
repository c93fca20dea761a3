//! # Sales Report Builder
//!
//! A library for turning an uploaded sales transaction file into a summary
//! report: validated and cleaned rows, revenue grouped by product, salesperson
//! and month, headline figures, charts, and a multi-sheet spreadsheet export.
//!
//! ## Core Concepts
//!
//! - **Raw Table**: Headers plus untyped cells exactly as uploaded
//! - **Cleaning**: Rows are coerced field by field; any failed coercion or a
//!   negative quantity/price drops the whole row
//! - **Aggregates**: Grouped revenue tables and highlights, pure in their input
//!   and the supplied calendar year
//! - **Report Cache**: Bundles kept under opaque tokens for a limited time so a
//!   later request can download exactly what was displayed
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_report_builder::*;
//!
//! let table = read_csv(b"Date,Product,Quantity,Unit Price,Salesperson\n05/01/2024,Widget,3,10,Alice\n")?;
//!
//! match process_sales_table(table, 2024)? {
//!     UploadOutcome::Processed(report) => {
//!         let cache = ReportCache::default();
//!         let token = cache.put(ReportBundle::new(report.records, report.aggregates));
//!         let bundle = cache.get(&token)?;
//!         let xlsx = export_workbook(&bundle.cleaned_records, &bundle.aggregates)?;
//!     }
//!     UploadOutcome::NoValidRows { dropped_rows } => {
//!         println!("nothing usable, {} rows dropped", dropped_rows);
//!     }
//! }
//! ```

pub mod aggregator;
pub mod cache;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod presentation;
pub mod schema;
pub mod service;
pub mod utils;
pub mod validation;

pub use aggregator::{aggregate_sales, Aggregator};
pub use cache::{Clock, ManualClock, ReportCache, ReportStore, SystemClock};
pub use cleaner::{clean_table, CleanedDataset};
pub use config::{CacheConfig, ReportConfig};
pub use error::{Result, SalesReportError};
pub use export::{download_file_name, export_workbook, XLSX_CONTENT_TYPE};
pub use ingestion::{allowed_file, check_upload, read_csv};
pub use presentation::{
    build_figures, build_tables, render_table, ChartFragments, ChartRenderer, ChartSpec,
    ReportTables, SvgChartRenderer,
};
pub use schema::*;
pub use service::{ReportDownload, ReportService, ReportView, UploadResponse};
pub use validation::{missing_columns, validate_columns, validate_table};

use log::{debug, info};

/// Cleaned rows and their aggregates for one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedReport {
    pub records: Vec<CleanedRecord>,
    pub aggregates: AggregateBundle,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Processed(ProcessedReport),
    /// Every row was dropped during cleaning.
    NoValidRows { dropped_rows: usize },
}

pub struct SalesReportProcessor;

impl SalesReportProcessor {
    /// Validate, clean and aggregate one table.
    ///
    /// Missing columns are an error; a table with no surviving rows is the
    /// [`UploadOutcome::NoValidRows`] outcome instead.
    pub fn process(table: RawTable, current_year: i32) -> Result<UploadOutcome> {
        let table = validate_table(table)?;

        info!(
            "Processing sales table with {} rows for year {}",
            table.len(),
            current_year
        );

        let cleaned = clean_table(&table);
        if cleaned.is_empty() {
            return Ok(UploadOutcome::NoValidRows {
                dropped_rows: cleaned.dropped_rows,
            });
        }

        debug!(
            "Kept {} rows, dropped {}",
            cleaned.records.len(),
            cleaned.dropped_rows
        );

        let aggregates = Aggregator::new(current_year).aggregate(&cleaned.records);

        Ok(UploadOutcome::Processed(ProcessedReport {
            records: cleaned.records,
            aggregates,
            dropped_rows: cleaned.dropped_rows,
        }))
    }
}

pub fn process_sales_table(table: RawTable, current_year: i32) -> Result<UploadOutcome> {
    SalesReportProcessor::process(table, current_year)
}
