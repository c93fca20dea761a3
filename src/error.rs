use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesReportError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Report session expired or unknown (token {token}). Please re-upload your CSV.")]
    ReportNotFound { token: String },

    #[error("Spreadsheet export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

pub type Result<T> = std::result::Result<T, SalesReportError>;
