// 🌐 Portal - revenue page access and detail grid parsing
//
// The browser automation that drives the vendor portal sits behind the
// `PortalSession` trait. This module owns everything that does not need a
// live browser: reading the detail grid out of a page source, and replaying
// saved page captures from disk.

use crate::calendar::{DateString, YearMonth};
use crate::config::Credentials;
use crate::db::SaleRecord;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

lazy_static! {
    static ref GRID_SELECTOR: Selector = Selector::parse("table#detailGrid").unwrap();
    static ref ROW_SELECTOR: Selector = Selector::parse("tr.jqgrow").unwrap();
    static ref CELL_SELECTOR: Selector = Selector::parse("td").unwrap();
}

/// Time, Equipment, Channel, Amount
const GRID_COLUMNS: usize = 4;

// ============================================================================
// SESSION TRAIT
// ============================================================================

/// PortalSession - one logged-in walk through the revenue pages
///
/// Page-returning methods hand back the full page source after the action
/// settles. Implementations own their own pacing and waits.
pub trait PortalSession {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    fn login(&mut self, _credentials: &Credentials) -> Result<()> {
        Ok(())
    }

    /// Navigate from the landing page to the revenue page
    fn open_revenue_page(&mut self) -> Result<()> {
        Ok(())
    }

    /// Submit the date filter and return the monthly overview page
    fn query_range(&mut self, start: &DateString, end: &DateString) -> Result<String>;

    /// Click a day cell and return the page with its detail grid open
    fn open_day(&mut self, date: &DateString) -> Result<String>;

    /// Close the detail dialog opened by `open_day`
    fn close_day(&mut self) -> Result<()> {
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// PAGE PARSING
// ============================================================================

/// The overview page lists only days with revenue; a day absent from the
/// page has nothing to collect
pub fn page_mentions_date(page: &str, date: &DateString) -> bool {
    page.contains(date.as_str())
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().map(str::trim).collect()
}

/// Read the transaction rows of `table#detailGrid` for one day
///
/// The grid only shows `HH:MM`; the day comes from `date`. Rows that do not
/// have exactly four cells are skipped with a warning.
pub fn parse_detail_grid(page: &str, date: &DateString) -> Result<Vec<SaleRecord>> {
    let document = Html::parse_document(page);

    let grid = document
        .select(&GRID_SELECTOR)
        .next()
        .ok_or_else(|| anyhow!("Detail grid not found on page for {}", date))?;

    let mut records = Vec::new();

    for (row_num, row) in grid.select(&ROW_SELECTOR).enumerate() {
        let cells: Vec<String> = row.select(&CELL_SELECTOR).map(cell_text).collect();

        if cells.len() != GRID_COLUMNS {
            warn!(
                date = %date,
                row = row_num,
                cells = cells.len(),
                "skipping detail row with unexpected cell count"
            );
            continue;
        }

        let stamp = format!("{} {}", date, cells[0]);
        let time = NaiveDateTime::parse_from_str(&stamp, "%Y/%m/%d %H:%M")
            .with_context(|| format!("Invalid time {:?} in detail row {} for {}", cells[0], row_num, date))?;

        let mut cells = cells.into_iter().skip(1);
        records.push(SaleRecord {
            time,
            equipment: cells.next().unwrap_or_default(),
            channel: cells.next().unwrap_or_default(),
            amount: cells.next().unwrap_or_default(),
        });
    }

    Ok(records)
}

// ============================================================================
// SNAPSHOT SESSION
// ============================================================================

/// Replays saved page captures instead of driving a browser
///
/// Layout of the directory:
///   YYYY-MM.html     overview page returned for that month's query
///   YYYY-MM-DD.html  page with that day's detail grid open
pub struct SnapshotSession {
    dir: PathBuf,
}

impl SnapshotSession {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(anyhow!("Snapshot directory not found: {}", dir.display()));
        }
        Ok(SnapshotSession { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, file_name: &str) -> Result<String> {
        let path = self.dir.join(file_name);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))
    }
}

impl PortalSession for SnapshotSession {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn query_range(&mut self, start: &DateString, _end: &DateString) -> Result<String> {
        let file_name = format!("{}.html", YearMonth::from_date(start.date()));
        if !self.dir.join(&file_name).exists() {
            // No capture for the month: behaves like a month with no revenue
            return Ok(String::new());
        }
        self.read(&file_name)
    }

    fn open_day(&mut self, date: &DateString) -> Result<String> {
        self.read(&format!("{}.html", date.date().format("%Y-%m-%d")))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"
        <html><body>
        <table id="detailGrid">
          <tr class="jqgfirstrow"><td></td><td></td><td></td><td></td></tr>
          <tr class="ui-widget-content jqgrow ui-row-ltr" id="AB1_CD2">
            <td title="08:30"> 08:30 </td><td>【12上】洗衣機 中容量</td><td>投幣</td><td>60元</td>
          </tr>
          <tr class="ui-widget-content jqgrow ui-row-ltr">
            <td>09:05</td><td><span>【3下】</span><span>烘衣機</span></td><td>電子支付</td><td>-10點</td>
          </tr>
          <tr class="ui-widget-content jqgrow ui-row-ltr">
            <td>colspan</td><td>小計</td>
          </tr>
        </table>
        </body></html>
    "#;

    fn day(text: &str) -> DateString {
        DateString::parse(text).unwrap()
    }

    #[test]
    fn test_parse_detail_grid() {
        let records = parse_detail_grid(DETAIL_PAGE, &day("2023/11/01")).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].time,
            NaiveDateTime::parse_from_str("2023/11/01 08:30", "%Y/%m/%d %H:%M").unwrap()
        );
        assert_eq!(records[0].equipment, "【12上】洗衣機 中容量");
        assert_eq!(records[0].channel, "投幣");
        assert_eq!(records[0].amount, "60元");
        // Nested text nodes are stripped and joined
        assert_eq!(records[1].equipment, "【3下】烘衣機");
        assert_eq!(records[1].amount, "-10點");
    }

    #[test]
    fn test_parse_detail_grid_missing_table() {
        let err = parse_detail_grid("<html><body></body></html>", &day("2023/11/01")).unwrap_err();
        assert!(err.to_string().contains("Detail grid not found"));
    }

    #[test]
    fn test_parse_detail_grid_bad_time() {
        let page = r#"<table id="detailGrid"><tr class="jqgrow"><td>25:99</td><td>a</td><td>b</td><td>1元</td></tr></table>"#;
        assert!(parse_detail_grid(page, &day("2023/11/01")).is_err());
    }

    #[test]
    fn test_page_mentions_date() {
        let page = r#"<td title="2023/11/01">1</td>"#;
        assert!(page_mentions_date(page, &day("2023/11/01")));
        assert!(!page_mentions_date(page, &day("2023/11/02")));
    }

    #[test]
    fn test_snapshot_session() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2023-11.html"), r#"<td title="2023/11/01">"#).unwrap();
        fs::write(dir.path().join("2023-11-01.html"), DETAIL_PAGE).unwrap();

        let mut session = SnapshotSession::new(dir.path()).unwrap();
        assert_eq!(session.name(), "snapshot");

        let overview = session.query_range(&day("2023/11/01"), &day("2023/11/30")).unwrap();
        assert!(page_mentions_date(&overview, &day("2023/11/01")));

        // Month without a capture reads as empty
        let empty = session.query_range(&day("2023/12/01"), &day("2023/12/31")).unwrap();
        assert!(empty.is_empty());

        let detail = session.open_day(&day("2023/11/01")).unwrap();
        assert_eq!(parse_detail_grid(&detail, &day("2023/11/01")).unwrap().len(), 2);

        assert!(session.open_day(&day("2023/11/02")).is_err());
    }

    #[test]
    fn test_snapshot_session_missing_dir() {
        assert!(SnapshotSession::new("/nonexistent/snapshots/12345").is_err());
    }
}
