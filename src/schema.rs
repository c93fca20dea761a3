use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DATE_COLUMN: &str = "Date";
pub const PRODUCT_COLUMN: &str = "Product";
pub const QUANTITY_COLUMN: &str = "Quantity";
pub const UNIT_PRICE_COLUMN: &str = "Unit Price";
pub const SALESPERSON_COLUMN: &str = "Salesperson";

/// Header names every upload must carry, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    DATE_COLUMN,
    PRODUCT_COLUMN,
    QUANTITY_COLUMN,
    UNIT_PRICE_COLUMN,
    SALESPERSON_COLUMN,
];

/// Label used for highlights when the underlying table has no rows.
pub const NOT_AVAILABLE: &str = "N/A";

/// A parsed but untyped tabular upload.
///
/// A cell is `None` when it was entirely absent (empty CSV field or a short row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Convenience constructor for literal tables; empty strings become `None`.
    pub fn from_strings(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| {
                            if cell.is_empty() {
                                None
                            } else {
                                Some(cell.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CleanedRecord {
    #[schemars(description = "Transaction date, parsed day-first from the upload")]
    pub date: NaiveDate,

    #[schemars(description = "Product name with surrounding whitespace removed")]
    pub product_name: String,

    #[schemars(description = "Units sold; never negative")]
    pub quantity: f64,

    #[schemars(description = "Price per unit; never negative")]
    pub unit_price: f64,

    #[schemars(description = "Salesperson name with surrounding whitespace removed")]
    pub salesperson_name: String,

    #[schemars(description = "quantity * unit_price")]
    pub revenue: f64,
}

impl CleanedRecord {
    pub fn new(
        date: NaiveDate,
        product_name: impl Into<String>,
        quantity: f64,
        unit_price: f64,
        salesperson_name: impl Into<String>,
    ) -> Self {
        Self {
            date,
            product_name: product_name.into(),
            quantity,
            unit_price,
            salesperson_name: salesperson_name.into(),
            revenue: quantity * unit_price,
        }
    }
}

/// One row of a grouped revenue table, also used for the highlight figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevenueEntry {
    #[schemars(description = "Group key: product name, salesperson name, or YYYY-MM month")]
    pub label: String,
    #[schemars(description = "Summed revenue for the group")]
    pub revenue: f64,
}

impl RevenueEntry {
    pub fn new(label: impl Into<String>, revenue: f64) -> Self {
        Self {
            label: label.into(),
            revenue,
        }
    }

    pub fn not_available() -> Self {
        Self::new(NOT_AVAILABLE, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateBundle {
    #[schemars(description = "Revenue per product, highest first; ties ordered by name")]
    pub per_product: Vec<RevenueEntry>,

    #[schemars(description = "Revenue per salesperson, highest first; ties ordered by name")]
    pub per_salesperson: Vec<RevenueEntry>,

    #[schemars(description = "Revenue per calendar month, labelled YYYY-MM, oldest first")]
    pub monthly: Vec<RevenueEntry>,

    pub total_revenue: f64,

    #[schemars(description = "Revenue of rows dated within ytd_year")]
    pub ytd_total: f64,

    #[schemars(description = "Calendar year the ytd_total was computed for")]
    pub ytd_year: i32,

    pub best_month: RevenueEntry,
    pub best_product: RevenueEntry,
    pub top_salesperson: RevenueEntry,
}

impl AggregateBundle {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AggregateBundle)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from(self)
    }
}

/// Scalar figures shown above a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_revenue: f64,
    pub ytd_total: f64,
    pub best_month: String,
    pub best_month_revenue: f64,
    pub best_product: String,
    pub best_product_revenue: f64,
    pub top_salesperson: String,
    pub top_salesperson_revenue: f64,
}

impl From<&AggregateBundle> for ReportSummary {
    fn from(aggregates: &AggregateBundle) -> Self {
        Self {
            total_revenue: aggregates.total_revenue,
            ytd_total: aggregates.ytd_total,
            best_month: aggregates.best_month.label.clone(),
            best_month_revenue: aggregates.best_month.revenue,
            best_product: aggregates.best_product.label.clone(),
            best_product_revenue: aggregates.best_product.revenue,
            top_salesperson: aggregates.top_salesperson.label.clone(),
            top_salesperson_revenue: aggregates.top_salesperson.revenue,
        }
    }
}

/// Snapshot kept between displaying a report and downloading it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    /// Wall-clock time the bundle was built. Informational only: cache expiry
    /// is measured from insertion on the cache's own clock, never from this.
    pub created_at: DateTime<Utc>,
    pub cleaned_records: Vec<CleanedRecord>,
    pub aggregates: AggregateBundle,
}

impl ReportBundle {
    pub fn new(cleaned_records: Vec<CleanedRecord>, aggregates: AggregateBundle) -> Self {
        Self {
            created_at: Utc::now(),
            cleaned_records,
            aggregates,
        }
    }
}
