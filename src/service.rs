use crate::cache::{ReportCache, ReportStore};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::export::{download_file_name, export_workbook, XLSX_CONTENT_TYPE};
use crate::ingestion::{check_upload, read_csv};
use crate::presentation::{
    build_figures, build_tables, ChartFragments, ChartRenderer, ReportTables, SvgChartRenderer,
};
use crate::schema::{ReportBundle, ReportSummary};
use crate::{process_sales_table, UploadOutcome};
use chrono::{Datelike, Local};
use log::info;
use serde::Serialize;

/// Everything needed to display a freshly processed report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    /// Opaque token for the later download request.
    pub token: String,
    pub summary: ReportSummary,
    pub tables: ReportTables,
    pub charts: ChartFragments,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub enum UploadResponse {
    Report(ReportView),
    /// The upload was readable but no row survived cleaning.
    NoValidRows { dropped_rows: usize },
}

#[derive(Debug, Clone)]
pub struct ReportDownload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Upload-then-download flow over a shared [`ReportStore`].
///
/// Both entry points sweep expired reports before doing anything else.
pub struct ReportService<S: ReportStore = ReportCache> {
    config: ReportConfig,
    store: S,
    renderer: Box<dyn ChartRenderer>,
}

impl ReportService<ReportCache> {
    pub fn new(config: ReportConfig) -> Self {
        let store = ReportCache::new(&config.cache);
        Self::with_store(config, store)
    }
}

impl<S: ReportStore> ReportService<S> {
    pub fn with_store(config: ReportConfig, store: S) -> Self {
        Self {
            config,
            store,
            renderer: Box::new(SvgChartRenderer),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ChartRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Processes an uploaded file against the local calendar year.
    pub fn upload(&self, filename: &str, content: &[u8]) -> Result<UploadResponse> {
        self.upload_for_year(filename, content, Local::now().year())
    }

    pub fn upload_for_year(
        &self,
        filename: &str,
        content: &[u8],
        current_year: i32,
    ) -> Result<UploadResponse> {
        self.store.sweep();

        check_upload(filename, content, &self.config)?;
        let table = read_csv(content)?;

        let report = match process_sales_table(table, current_year)? {
            UploadOutcome::Processed(report) => report,
            UploadOutcome::NoValidRows { dropped_rows } => {
                info!(
                    "Upload '{}' has no valid rows after cleaning ({} dropped)",
                    filename, dropped_rows
                );
                return Ok(UploadResponse::NoValidRows { dropped_rows });
            }
        };

        let charts = build_figures(&report.aggregates, self.renderer.as_ref())?;
        let tables = build_tables(&report.aggregates);
        let summary = report.aggregates.summary();
        let dropped_rows = report.dropped_rows;

        let token = self
            .store
            .put(ReportBundle::new(report.records, report.aggregates));
        info!("Report for '{}' cached under token {}", filename, token);

        Ok(UploadResponse::Report(ReportView {
            token,
            summary,
            tables,
            charts,
            dropped_rows,
        }))
    }

    /// Builds the spreadsheet for a previously displayed report.
    pub fn download(&self, token: &str) -> Result<ReportDownload> {
        self.store.sweep();

        let bundle = self.store.get(token)?;
        let bytes = export_workbook(&bundle.cleaned_records, &bundle.aggregates)?;

        Ok(ReportDownload {
            file_name: download_file_name(Local::now()),
            content_type: XLSX_CONTENT_TYPE,
            bytes,
        })
    }
}
