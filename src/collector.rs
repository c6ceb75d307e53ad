// 🔄 Collector - month-by-month walk over the portal's revenue pages
//
// Outer loop: one query per month, from the configured start to today.
// Inner loop: every day of that month (never past today) that the overview
// page mentions and the database does not already hold.

use crate::calendar::{generate_date_range_at, sequence_year_months_at, YearMonth};
use crate::db::{self, Event};
use crate::portal::{page_mentions_date, parse_detail_grid, PortalSession};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

const EVENT_ACTOR: &str = "portal_collector";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub months_queried: usize,
    pub days_collected: usize,
    /// Already present in `sales_data`
    pub days_cached: usize,
    /// Not mentioned on the month's overview page
    pub days_without_sales: usize,
    pub rows_inserted: usize,
}

impl CollectionStats {
    pub fn summary(&self) -> String {
        format!(
            "{} months queried | {} days collected ({} rows) | {} cached | {} without sales",
            self.months_queried,
            self.days_collected,
            self.rows_inserted,
            self.days_cached,
            self.days_without_sales
        )
    }
}

/// Collect every uncollected day from `start` up to `today`
///
/// Logout is attempted even when collection fails; the collection error is
/// the one reported.
pub fn collect_sales(
    session: &mut dyn PortalSession,
    conn: &Connection,
    start: YearMonth,
    today: NaiveDate,
) -> Result<CollectionStats> {
    info!(session = session.name(), start = %start, today = %today, "starting collection");

    let result = collect_months(session, conn, start, today);
    let logout = session.logout();

    match (result, logout) {
        (Ok(stats), Ok(())) => {
            info!("{}", stats.summary());
            Ok(stats)
        }
        (Ok(_), Err(e)) => Err(e.context("Logout failed after collection")),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(logout_err)) => {
            warn!(error = %logout_err, "logout after failed collection also failed");
            Err(e)
        }
    }
}

fn collect_months(
    session: &mut dyn PortalSession,
    conn: &Connection,
    start: YearMonth,
    today: NaiveDate,
) -> Result<CollectionStats> {
    let mut cached = db::cached_dates(conn)?;
    debug!(cached = cached.len(), "loaded cached dates");

    session
        .open_revenue_page()
        .context("Failed to open revenue page")?;

    let mut stats = CollectionStats::default();

    for month in sequence_year_months_at(start.year(), start.month(), None, None, today)? {
        let (first, last) = month.boundary()?;
        let overview = session
            .query_range(&first, &last)
            .with_context(|| format!("Failed to query {} - {}", first, last))?;
        stats.months_queried += 1;

        for date in generate_date_range_at(&first, &last, today)? {
            if !page_mentions_date(&overview, &date) {
                stats.days_without_sales += 1;
                continue;
            }
            if cached.contains(date.as_str()) {
                stats.days_cached += 1;
                continue;
            }

            let detail = session
                .open_day(&date)
                .with_context(|| format!("Failed to open detail for {}", date))?;
            let records = parse_detail_grid(&detail, &date)?;

            let event = Event::new(
                "day_collected",
                "sales_day",
                date.as_str(),
                serde_json::json!({
                    "rows": records.len(),
                    "session": session.name(),
                }),
                EVENT_ACTOR,
            );
            let inserted = db::insert_day(conn, &records, &event)?;

            session
                .close_day()
                .with_context(|| format!("Failed to close detail for {}", date))?;

            info!("Saved data on {} ({} rows)", date, inserted);
            stats.days_collected += 1;
            stats.rows_inserted += inserted;
            cached.insert(date.as_str().to_string());
        }
    }

    Ok(stats)
}
