// 🧹 Cleaning - raw portal rows → analysis-ready rows
//
// Per row:
//   Amount "40元"  → Amount 40, Unit "元"
//   Time          → Date, Year, Month, Weekday, Day
//   Equipment     → Equipment_ID, Equipment_Location, Equipment_Type,
//                   Equipment_Category, Wash_Scale

use crate::calendar::DATE_FORMAT;
use crate::db::{sql_time, SaleRecord};
use crate::equipment::{categorize_equipment, parse_equipment_label, EquipmentCategory, Scale, SideIndicator};
use chrono::{Datelike, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(r"(-?\d+)(\D+)").unwrap();
}

// ============================================================================
// CLEAN ROW
// ============================================================================

/// One row of `clean_sales_data`; serde names match the table columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanSale {
    #[serde(rename = "Time", with = "sql_time")]
    pub time: NaiveDateTime,

    #[serde(rename = "Equipment")]
    pub equipment: String,

    #[serde(rename = "Channel")]
    pub channel: String,

    /// `None` when the raw amount had no "<number><unit>" shape
    #[serde(rename = "Amount")]
    pub amount: Option<i64>,

    #[serde(rename = "Unit")]
    pub unit: Option<String>,

    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Year")]
    pub year: i32,

    #[serde(rename = "Month")]
    pub month: u32,

    /// 0 = Monday
    #[serde(rename = "Weekday")]
    pub weekday: u32,

    #[serde(rename = "Day")]
    pub day: u32,

    #[serde(rename = "Equipment_ID")]
    pub equipment_id: Option<String>,

    #[serde(rename = "Equipment_Location")]
    pub equipment_location: Option<String>,

    #[serde(rename = "Equipment_Type")]
    pub equipment_type: String,

    #[serde(rename = "Equipment_Category")]
    pub equipment_category: String,

    #[serde(rename = "Wash_Scale")]
    pub wash_scale: Option<String>,
}

impl CleanSale {
    pub fn category(&self) -> EquipmentCategory {
        EquipmentCategory::from_str_lossy(&self.equipment_category)
    }

    pub fn side(&self) -> SideIndicator {
        SideIndicator::from_column(self.equipment_location.as_deref())
    }

    pub fn scale(&self) -> Scale {
        Scale::from_column(self.wash_scale.as_deref())
    }
}

// ============================================================================
// CLEANING STEPS
// ============================================================================

/// Split "40元" / "-20點" into number and unit
///
/// Uses the first "<digits><non-digits>" run anywhere in the text; returns
/// `None` when there is none or the number does not fit in an i64.
pub fn split_amount(raw: &str) -> Option<(i64, String)> {
    let caps = AMOUNT_RE.captures(raw)?;
    let amount = caps[1].parse::<i64>().ok()?;
    Some((amount, caps[2].to_string()))
}

pub fn clean_sale(record: &SaleRecord) -> CleanSale {
    let (amount, unit) = match split_amount(&record.amount) {
        Some((amount, unit)) => (Some(amount), Some(unit)),
        None => (None, None),
    };

    let label = parse_equipment_label(&record.equipment);
    let (category, scale) = categorize_equipment(label.type_text());
    let date = record.time.date();

    CleanSale {
        time: record.time,
        equipment: record.equipment.clone(),
        channel: record.channel.clone(),
        amount,
        unit,
        date: date.format(DATE_FORMAT).to_string(),
        year: date.year(),
        month: date.month(),
        weekday: date.weekday().num_days_from_monday(),
        day: date.day(),
        equipment_id: label.id().map(str::to_string),
        equipment_location: label.side().as_column().map(str::to_string),
        equipment_type: label.type_text().to_string(),
        equipment_category: category.as_str().to_string(),
        wash_scale: scale.as_column().map(str::to_string),
    }
}

pub fn clean_sales(records: &[SaleRecord]) -> Vec<CleanSale> {
    records.iter().map(clean_sale).collect()
}

// ============================================================================
// CLEANING SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub total_rows: usize,
    pub unparsed_amounts: usize,
    pub fallback_labels: usize,
    pub by_category: BTreeMap<String, usize>,
}

impl CleaningSummary {
    pub fn from_rows(rows: &[CleanSale]) -> Self {
        let mut summary = CleaningSummary {
            total_rows: rows.len(),
            ..Default::default()
        };

        for row in rows {
            if row.amount.is_none() {
                summary.unparsed_amounts += 1;
            }
            if row.equipment_id.is_none() {
                summary.fallback_labels += 1;
            }
            *summary
                .by_category
                .entry(row.equipment_category.clone())
                .or_insert(0) += 1;
        }

        summary
    }

    pub fn summary(&self) -> String {
        let categories = self
            .by_category
            .iter()
            .map(|(category, count)| format!("{}={}", category, count))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{} rows | {} unparsed amounts | {} unlabelled machines | {}",
            self.total_rows, self.unparsed_amounts, self.fallback_labels, categories
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(time: &str, equipment: &str, amount: &str) -> SaleRecord {
        SaleRecord {
            time: NaiveDateTime::parse_from_str(time, "%Y/%m/%d %H:%M").unwrap(),
            equipment: equipment.to_string(),
            channel: "投幣".to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_split_amount() {
        assert_eq!(split_amount("40元"), Some((40, "元".to_string())));
        assert_eq!(split_amount("-20點"), Some((-20, "點".to_string())));
        assert_eq!(split_amount("共 60 元"), Some((60, " 元".to_string())));
        assert_eq!(split_amount("40"), None);
        assert_eq!(split_amount("元"), None);
        assert_eq!(split_amount(""), None);
    }

    #[test]
    fn test_clean_sale_full_row() {
        // 2024/02/10 is a Saturday
        let clean = clean_sale(&record("2024/02/10 09:15", "【12上】洗衣機 中容量", "60元"));

        assert_eq!(clean.amount, Some(60));
        assert_eq!(clean.unit.as_deref(), Some("元"));
        assert_eq!(clean.date, "2024/02/10");
        assert_eq!((clean.year, clean.month, clean.day), (2024, 2, 10));
        assert_eq!(clean.weekday, 5);
        assert_eq!(clean.equipment_id.as_deref(), Some("12"));
        assert_eq!(clean.equipment_location.as_deref(), Some("Up"));
        assert_eq!(clean.equipment_type, "洗衣機 中容量");
        assert_eq!(clean.equipment_category, "wash");
        assert_eq!(clean.wash_scale.as_deref(), Some("medium"));
        assert_eq!(clean.category(), EquipmentCategory::Wash);
        assert_eq!(clean.side(), SideIndicator::Up);
        assert_eq!(clean.scale(), Scale::Medium);
    }

    #[test]
    fn test_clean_sale_fallback_row() {
        let clean = clean_sale(&record("2024/02/12 23:59", "飲料販賣機", "免費"));

        assert_eq!(clean.amount, None);
        assert_eq!(clean.unit, None);
        assert_eq!(clean.weekday, 0);
        assert_eq!(clean.equipment_id, None);
        assert_eq!(clean.equipment_location, None);
        assert_eq!(clean.equipment_type, "飲料販賣機");
        assert_eq!(clean.equipment_category, "vending machine");
        assert_eq!(clean.wash_scale, None);
        assert_eq!(clean.time.date(), NaiveDate::from_ymd_opt(2024, 2, 12).unwrap());
    }

    #[test]
    fn test_cleaning_summary() {
        let rows = clean_sales(&[
            record("2024/02/10 09:15", "【12上】洗衣機 中容量", "60元"),
            record("2024/02/10 10:00", "【3下】烘衣機", "10點"),
            record("2024/02/10 11:00", "飲料販賣機", "免費"),
        ]);

        let summary = CleaningSummary::from_rows(&rows);
        println!("Summary: {}", summary.summary());

        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.unparsed_amounts, 1);
        assert_eq!(summary.fallback_labels, 1);
        assert_eq!(summary.by_category.get("wash"), Some(&1));
        assert_eq!(summary.by_category.get("dry"), Some(&1));
        assert_eq!(summary.by_category.get("vending machine"), Some(&1));
    }
}
