// 📤 Export - raw and clean sales tables to CSV / Excel
//
// Column headers match the SQLite table columns. Excel output has a single
// "Sheet1" with the header in row 1 and no index column.

use crate::cleaning::CleanSale;
use crate::db::{sql_time, SaleRecord};
use anyhow::{bail, Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const SHEET_NAME: &str = "Sheet1";

/// Data rows available below the header row
const XLSX_MAX_ROWS: usize = 1_048_575;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

// ============================================================================
// SHEET ROWS
// ============================================================================

pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::Text).unwrap_or(Cell::Empty)
    }
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map(|n| Cell::Number(n as f64)).unwrap_or(Cell::Empty)
    }
}

/// A record that can be laid out as one spreadsheet row
pub trait SheetRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

impl SheetRow for SaleRecord {
    const HEADERS: &'static [&'static str] = &["Time", "Equipment", "Channel", "Amount"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            sql_time::format(&self.time).into(),
            self.equipment.clone().into(),
            self.channel.clone().into(),
            self.amount.clone().into(),
        ]
    }
}

impl SheetRow for CleanSale {
    const HEADERS: &'static [&'static str] = &[
        "Time",
        "Equipment",
        "Channel",
        "Amount",
        "Unit",
        "Date",
        "Year",
        "Month",
        "Weekday",
        "Day",
        "Equipment_ID",
        "Equipment_Location",
        "Equipment_Type",
        "Equipment_Category",
        "Wash_Scale",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            sql_time::format(&self.time).into(),
            self.equipment.clone().into(),
            self.channel.clone().into(),
            self.amount.into(),
            self.unit.clone().into(),
            self.date.clone().into(),
            Cell::Number(f64::from(self.year)),
            Cell::Number(f64::from(self.month)),
            Cell::Number(f64::from(self.weekday)),
            Cell::Number(f64::from(self.day)),
            self.equipment_id.clone().into(),
            self.equipment_location.clone().into(),
            self.equipment_type.clone().into(),
            self.equipment_category.clone().into(),
            self.wash_scale.clone().into(),
        ]
    }
}

// ============================================================================
// WRITERS
// ============================================================================

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Header row from the serde field names, one line per record
pub fn write_csv<R: Serialize>(rows: &[R], path: &Path) -> Result<usize> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(rows = rows.len(), path = %path.display(), "wrote CSV export");
    Ok(rows.len())
}

pub fn write_xlsx<R: SheetRow>(rows: &[R], path: &Path) -> Result<usize> {
    if rows.len() > XLSX_MAX_ROWS {
        bail!(
            "{} rows do not fit in one worksheet (limit {}); export as CSV instead",
            rows.len(),
            XLSX_MAX_ROWS
        );
    }
    ensure_parent(path)?;

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in R::HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let sheet_row = (i + 1) as u32;
        for (col, cell) in row.cells().into_iter().enumerate() {
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(sheet_row, col as u16, text)?;
                }
                Cell::Number(number) => {
                    worksheet.write_number(sheet_row, col as u16, number)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;

    info!(rows = rows.len(), path = %path.display(), "wrote Excel export");
    Ok(rows.len())
}

pub fn export_sales_csv(records: &[SaleRecord], path: &Path) -> Result<usize> {
    write_csv(records, path)
}

pub fn export_clean_csv(rows: &[CleanSale], path: &Path) -> Result<usize> {
    write_csv(rows, path)
}

pub fn export_sales_xlsx(records: &[SaleRecord], path: &Path) -> Result<usize> {
    write_xlsx(records, path)
}

pub fn export_clean_xlsx(rows: &[CleanSale], path: &Path) -> Result<usize> {
    write_xlsx(rows, path)
}

/// Raw workbook first, then the clean one
pub fn export_workbooks(
    records: &[SaleRecord],
    rows: &[CleanSale],
    raw_path: &Path,
    clean_path: &Path,
) -> Result<()> {
    export_sales_xlsx(records, raw_path)?;
    export_clean_xlsx(rows, clean_path)?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
