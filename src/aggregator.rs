use crate::schema::{AggregateBundle, CleanedRecord, RevenueEntry};
use crate::utils::year_month_label;
use chrono::{Datelike, Local};
use log::debug;
use std::collections::BTreeMap;

/// Reduces cleaned records into the report's grouped tables and highlights.
///
/// The year used for `ytd_total` is fixed at construction so aggregation is a
/// pure function of its input. Production callers use [`Aggregator::for_today`],
/// which makes the YTD figure change when the calendar year rolls over.
pub struct Aggregator {
    current_year: i32,
}

impl Aggregator {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn for_today() -> Self {
        Self::new(Local::now().year())
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn aggregate(&self, records: &[CleanedRecord]) -> AggregateBundle {
        let per_product = ranked_by_revenue(records, |r| r.product_name.as_str());
        let per_salesperson = ranked_by_revenue(records, |r| r.salesperson_name.as_str());
        let monthly = monthly_revenue(records);

        let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
        let ytd_total: f64 = records
            .iter()
            .filter(|r| r.date.year() == self.current_year)
            .map(|r| r.revenue)
            .sum();

        let best_month = best_entry(&monthly);
        let best_product = per_product
            .first()
            .cloned()
            .unwrap_or_else(RevenueEntry::not_available);
        let top_salesperson = per_salesperson
            .first()
            .cloned()
            .unwrap_or_else(RevenueEntry::not_available);

        debug!(
            "Aggregated {} records into {} products, {} salespeople, {} months",
            records.len(),
            per_product.len(),
            per_salesperson.len(),
            monthly.len()
        );

        AggregateBundle {
            per_product,
            per_salesperson,
            monthly,
            total_revenue,
            ytd_total,
            ytd_year: self.current_year,
            best_month,
            best_product,
            top_salesperson,
        }
    }
}

pub fn aggregate_sales(records: &[CleanedRecord], current_year: i32) -> AggregateBundle {
    Aggregator::new(current_year).aggregate(records)
}

/// Sums revenue per key, highest revenue first, equal revenue ordered by key.
fn ranked_by_revenue<'a, F>(records: &'a [CleanedRecord], key: F) -> Vec<RevenueEntry>
where
    F: Fn(&'a CleanedRecord) -> &'a str,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *groups.entry(key(record)).or_insert(0.0) += record.revenue;
    }

    let mut entries: Vec<RevenueEntry> = groups
        .into_iter()
        .map(|(label, revenue)| RevenueEntry::new(label, revenue))
        .collect();

    // Stable sort over key-ordered input keeps ties in ascending key order.
    entries.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    entries
}

fn monthly_revenue(records: &[CleanedRecord]) -> Vec<RevenueEntry> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *months.entry(year_month_label(record.date)).or_insert(0.0) += record.revenue;
    }

    months
        .into_iter()
        .map(|(label, revenue)| RevenueEntry::new(label, revenue))
        .collect()
}

/// Highest-revenue entry; the earliest one in table order wins a tie.
fn best_entry(table: &[RevenueEntry]) -> RevenueEntry {
    table
        .iter()
        .fold(None::<&RevenueEntry>, |best, entry| match best {
            Some(current) if current.revenue >= entry.revenue => Some(current),
            _ => Some(entry),
        })
        .cloned()
        .unwrap_or_else(RevenueEntry::not_available)
}
