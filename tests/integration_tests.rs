use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::NaiveDate;
use sales_report_builder::*;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SCENARIO_CSV: &str = "Date,Product,Quantity,Unit Price,Salesperson\n\
05/01/2024,Widget,3,10.0,Alice\n\
20/01/2024,Widget,-1,10.0,Bob\n\
01/02/2024,Gadget,2,5.0,Alice\n";

fn processed(outcome: UploadOutcome) -> ProcessedReport {
    match outcome {
        UploadOutcome::Processed(report) => report,
        other => panic!("expected a processed report, got {:?}", other),
    }
}

fn view(response: UploadResponse) -> ReportView {
    match response {
        UploadResponse::Report(view) => view,
        other => panic!("expected a report view, got {:?}", other),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_number(cell: &Data) -> f64 {
    match cell {
        Data::Float(n) => *n,
        Data::Int(n) => *n as f64,
        other => panic!("expected a number, got {:?}", other),
    }
}

/// A larger synthetic upload: 12 months, 5 products, 4 salespeople, with some
/// deliberately broken rows mixed in.
fn generated_csv() -> (String, usize) {
    let products = ["Widget", "Gadget", "Gizmo", "Sprocket", "Doohickey"];
    let people = ["Alice", "Bob", "Carol", "Dan"];
    let mut csv = String::from("Region,Date,Product,Quantity,Unit Price,Salesperson\n");
    let mut broken = 0;

    for i in 0..240usize {
        let day = 1 + (i % 28);
        let month = 1 + (i % 12);
        let year = if i % 3 == 0 { 2023 } else { 2024 };
        let quantity = (i % 9) as f64;
        let price = 2.5 + (i % 7) as f64 * 1.75;

        let (date, qty) = match i % 20 {
            7 => {
                broken += 1;
                ("garbage".to_string(), quantity.to_string())
            }
            13 => {
                broken += 1;
                (format!("{:02}/{:02}/{}", day, month, year), "-2".to_string())
            }
            _ => (format!("{:02}/{:02}/{}", day, month, year), quantity.to_string()),
        };

        csv.push_str(&format!(
            "North,{},  {} ,{},{},{}\n",
            date,
            products[i % products.len()],
            qty,
            price,
            people[i % people.len()]
        ));
    }

    (csv, broken)
}

#[test]
fn test_concrete_widget_gadget_scenario() -> anyhow::Result<()> {
    let table = read_csv(SCENARIO_CSV.as_bytes())?;
    let report = processed(process_sales_table(table, 2024)?);

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.dropped_rows, 1);

    let aggregates = &report.aggregates;
    assert_eq!(
        aggregates.per_product,
        vec![RevenueEntry::new("Widget", 30.0), RevenueEntry::new("Gadget", 10.0)]
    );
    assert_eq!(aggregates.per_salesperson, vec![RevenueEntry::new("Alice", 40.0)]);
    assert_eq!(
        aggregates.monthly,
        vec![RevenueEntry::new("2024-01", 30.0), RevenueEntry::new("2024-02", 10.0)]
    );
    assert_eq!(aggregates.total_revenue, 40.0);
    assert_eq!(aggregates.best_month, RevenueEntry::new("2024-01", 30.0));
    Ok(())
}

#[test]
fn test_missing_columns_are_named_exactly() {
    let csv = "Date,Item,Qty,Unit Price\n05/01/2024,Widget,3,10\n";
    let table = read_csv(csv.as_bytes()).unwrap();

    match process_sales_table(table, 2024) {
        Err(SalesReportError::MissingColumns(missing)) => {
            let got: BTreeSet<String> = missing.into_iter().collect();
            let expected: BTreeSet<String> = ["Product", "Quantity", "Salesperson"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            assert_eq!(got, expected);
        }
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_cleaning_invariants_on_generated_upload() -> anyhow::Result<()> {
    let (csv, broken) = generated_csv();
    let table = read_csv(csv.as_bytes())?;
    let total_rows = table.len();
    let report = processed(process_sales_table(table, 2024)?);

    assert_eq!(report.dropped_rows, broken);
    assert_eq!(report.records.len(), total_rows - broken);

    for record in &report.records {
        assert_eq!(record.revenue, record.quantity * record.unit_price);
        assert!(record.quantity >= 0.0 && record.unit_price >= 0.0);
        assert_eq!(record.product_name, record.product_name.trim());
    }

    for pair in report.records.windows(2) {
        assert!(pair[0].date <= pair[1].date, "records must be sorted by date");
    }
    Ok(())
}

#[test]
fn test_groupings_attribute_every_revenue_unit_once() -> anyhow::Result<()> {
    let (csv, _) = generated_csv();
    let report = processed(process_sales_table(read_csv(csv.as_bytes())?, 2024)?);
    let aggregates = &report.aggregates;

    let products: f64 = aggregates.per_product.iter().map(|e| e.revenue).sum();
    let people: f64 = aggregates.per_salesperson.iter().map(|e| e.revenue).sum();
    let months: f64 = aggregates.monthly.iter().map(|e| e.revenue).sum();

    assert!((products - aggregates.total_revenue).abs() < 1e-6);
    assert!((people - aggregates.total_revenue).abs() < 1e-6);
    assert!((months - aggregates.total_revenue).abs() < 1e-6);

    assert_eq!(aggregates.per_product.len(), 5);
    assert_eq!(aggregates.per_salesperson.len(), 4);
    for pair in aggregates.per_product.windows(2) {
        assert!(pair[0].revenue >= pair[1].revenue);
    }
    for pair in aggregates.monthly.windows(2) {
        assert!(pair[0].label < pair[1].label);
    }

    let ytd_expected: f64 = report
        .records
        .iter()
        .filter(|r| r.date >= NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .map(|r| r.revenue)
        .sum();
    assert!((aggregates.ytd_total - ytd_expected).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_aggregation_is_repeatable() -> anyhow::Result<()> {
    let (csv, _) = generated_csv();
    let first = processed(process_sales_table(read_csv(csv.as_bytes())?, 2024)?);
    let second = processed(process_sales_table(read_csv(csv.as_bytes())?, 2024)?);

    assert_eq!(first.aggregates, second.aggregates);
    assert_eq!(
        first.aggregates.total_revenue.to_bits(),
        second.aggregates.total_revenue.to_bits()
    );
    Ok(())
}

#[test]
fn test_zero_surviving_rows_is_soft_outcome() -> anyhow::Result<()> {
    let csv = "Date,Product,Quantity,Unit Price,Salesperson\n\
13/13/2024,Widget,3,10,Alice\n\
05/01/2024,Widget,,10,Alice\n\
05/01/2024,Widget,3,-10,Alice\n";
    let outcome = process_sales_table(read_csv(csv.as_bytes())?, 2024)?;
    assert_eq!(outcome, UploadOutcome::NoValidRows { dropped_rows: 3 });
    Ok(())
}

#[test]
fn test_semicolon_upload_through_service() -> anyhow::Result<()> {
    let service = ReportService::new(ReportConfig::default());
    let csv = SCENARIO_CSV.replace(',', ";");

    let view = view(service.upload_for_year("export.CSV", csv.as_bytes(), 2024)?);
    assert_eq!(view.summary.total_revenue, 40.0);
    assert_eq!(view.summary.best_product, "Widget");
    assert!(view.tables.product.contains("<td>Widget</td><td>30.00</td>"));
    assert!(view.charts.monthly_chart.contains("<svg"));
    Ok(())
}

#[test]
fn test_rejected_uploads() {
    let service = ReportService::new(ReportConfig {
        max_upload_bytes: 64,
        ..ReportConfig::default()
    });

    assert!(matches!(
        service.upload("report.xlsx", b"irrelevant"),
        Err(SalesReportError::UploadRejected(_))
    ));
    assert!(matches!(
        service.upload("", b"irrelevant"),
        Err(SalesReportError::UploadRejected(_))
    ));
    assert!(matches!(
        service.upload("sales.csv", SCENARIO_CSV.as_bytes()),
        Err(SalesReportError::UploadRejected(_))
    ));
}

#[test]
fn test_downloaded_workbook_layout() -> anyhow::Result<()> {
    let service = ReportService::new(ReportConfig::default());
    let view = view(service.upload_for_year("sales.csv", SCENARIO_CSV.as_bytes(), 2024)?);
    let download = service.download(&view.token)?;

    assert_eq!(download.content_type, XLSX_CONTENT_TYPE);
    assert!(download.file_name.ends_with(".xlsx"));

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(download.bytes))?;
    assert_eq!(
        workbook.sheet_names(),
        vec!["Summary", "By_Product", "By_Salesperson", "Monthly", "Cleaned_Data"]
    );

    let summary = workbook.worksheet_range("Summary")?;
    let rows: Vec<&[Data]> = summary.rows().collect();
    assert_eq!(cell_text(&rows[0][0]), "Metric");
    assert_eq!(cell_text(&rows[1][0]), "Total Revenue");
    assert_eq!(cell_number(&rows[1][1]), 40.0);
    assert_eq!(cell_text(&rows[3][0]), "Best Month");
    assert_eq!(cell_text(&rows[3][1]), "2024-01");
    assert_eq!(rows.len(), 9);

    let products = workbook.worksheet_range("By_Product")?;
    let rows: Vec<&[Data]> = products.rows().collect();
    assert_eq!(cell_text(&rows[0][0]), "Product");
    assert_eq!(cell_text(&rows[0][1]), "Revenue");
    assert_eq!(cell_text(&rows[1][0]), "Widget");
    assert_eq!(cell_number(&rows[2][1]), 10.0);

    let monthly = workbook.worksheet_range("Monthly")?;
    let rows: Vec<&[Data]> = monthly.rows().collect();
    assert_eq!(cell_text(&rows[0][0]), "YearMonth");
    assert_eq!(cell_text(&rows[2][0]), "2024-02");

    let cleaned = workbook.worksheet_range("Cleaned_Data")?;
    let rows: Vec<&[Data]> = cleaned.rows().collect();
    let header: Vec<String> = rows[0].iter().map(cell_text).collect();
    assert_eq!(
        header,
        vec!["Date", "Product", "Quantity", "Unit Price", "Salesperson", "Revenue"]
    );
    assert_eq!(rows.len(), 3);
    assert!(matches!(rows[1][0], Data::DateTime(_)));
    assert_eq!(cell_number(&rows[1][5]), 30.0);
    Ok(())
}

#[test]
fn test_download_survives_until_ttl_then_expires() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let config = ReportConfig {
        cache: CacheConfig::with_ttl(Duration::from_secs(30 * 60)),
        ..ReportConfig::default()
    };
    let store = ReportCache::with_clock(&config.cache, clock.clone());
    let service = ReportService::with_store(config, store);

    let token = view(service.upload_for_year("sales.csv", SCENARIO_CSV.as_bytes(), 2024)?).token;

    clock.advance(Duration::from_secs(29 * 60));
    assert!(service.download(&token).is_ok());

    clock.advance(Duration::from_secs(2 * 60));
    assert!(matches!(
        service.download(&token),
        Err(SalesReportError::ReportNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_cached_bundle_matches_displayed_report() -> anyhow::Result<()> {
    let service = ReportService::new(ReportConfig::default());
    let view = view(service.upload_for_year("sales.csv", SCENARIO_CSV.as_bytes(), 2024)?);

    let bundle = service.store().get(&view.token)?;
    assert_eq!(bundle.aggregates.summary(), view.summary);
    assert_eq!(bundle.cleaned_records.len(), 2);
    Ok(())
}

#[test]
fn test_service_is_shareable_across_threads() {
    let service = Arc::new(ReportService::new(ReportConfig::default()));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let response = service
                    .upload_for_year("sales.csv", SCENARIO_CSV.as_bytes(), 2024)
                    .unwrap();
                let token = match response {
                    UploadResponse::Report(view) => view.token,
                    other => panic!("expected a report, got {:?}", other),
                };
                service.download(&token).unwrap();
                token
            })
        })
        .collect();

    let tokens: BTreeSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(tokens.len(), 6);
    assert_eq!(service.store().len(), 6);
}
