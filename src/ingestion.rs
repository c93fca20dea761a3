use crate::config::ReportConfig;
use crate::error::{Result, SalesReportError};
use crate::schema::RawTable;
use log::{debug, info, warn};

/// Returns true when `filename` carries one of the configured extensions.
pub fn allowed_file(filename: &str, config: &ReportConfig) -> bool {
    match filename.rsplit_once('.') {
        Some((_, extension)) => config
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension)),
        None => false,
    }
}

/// Upload pre-filter applied before any parsing.
pub fn check_upload(filename: &str, content: &[u8], config: &ReportConfig) -> Result<()> {
    if filename.trim().is_empty() {
        warn!("Rejected upload without a file name");
        return Err(SalesReportError::UploadRejected(
            "Please choose a CSV file.".to_string(),
        ));
    }

    if !allowed_file(filename, config) {
        warn!("Rejected upload '{}': extension not allowed", filename);
        return Err(SalesReportError::UploadRejected(format!(
            "Only {} files are allowed.",
            config
                .allowed_extensions
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    if content.len() > config.max_upload_bytes {
        warn!(
            "Rejected upload '{}': {} bytes exceeds limit of {}",
            filename,
            content.len(),
            config.max_upload_bytes
        );
        return Err(SalesReportError::UploadRejected(format!(
            "File is too large ({} bytes, limit {} bytes).",
            content.len(),
            config.max_upload_bytes
        )));
    }

    Ok(())
}

/// Reads CSV bytes into a [`RawTable`].
///
/// Comma is tried first. When that produces a single header that contains a
/// semicolon the content is re-read with `;` as the delimiter. Fields are
/// decoded lossily so Latin-1 exports do not fail outright; empty fields and
/// missing trailing fields become `None`.
pub fn read_csv(content: &[u8]) -> Result<RawTable> {
    let table = read_with_delimiter(content, b',')?;

    let table = if table.headers.len() == 1 && table.headers[0].contains(';') {
        debug!("Single comma-separated header contains ';', retrying with semicolon delimiter");
        read_with_delimiter(content, b';')?
    } else {
        table
    };

    info!(
        "Read CSV with {} columns and {} rows",
        table.headers.len(),
        table.rows.len()
    );

    Ok(table)
}

fn read_with_delimiter(content: &[u8], delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(field).into_owned())
                }
            })
            .collect();
        row.resize(headers.len().max(row.len()), None);
        rows.push(row);
    }

    Ok(RawTable::new(headers, rows))
}
