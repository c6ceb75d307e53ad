// 📈 Analysis - earnings trends over the clean sales table
//
// Earnings = cash (元) + points (點). Rows whose amount could not be split
// into number and unit carry no money and are left out of every figure.

use crate::cleaning::CleanSale;
use crate::equipment::EquipmentCategory;
use serde::Serialize;
use std::collections::BTreeMap;

pub const CASH_UNIT: &str = "元";
pub const POINTS_UNIT: &str = "點";

pub const WEEKLY_WINDOW: usize = 7;
pub const BIWEEKLY_WINDOW: usize = 14;
pub const MONTHLY_WINDOW: usize = 30;
pub const SEASONAL_WINDOW: usize = 3;

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

// ============================================================================
// CORE TYPES
// ============================================================================

/// Amount sums per unit for one group of rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitTotals {
    pub cash: i64,
    pub points: i64,
    /// Any unit other than 元 / 點; reported, never part of earnings
    pub other: i64,
}

impl UnitTotals {
    pub fn add(&mut self, amount: i64, unit: &str) {
        match unit.trim() {
            CASH_UNIT => self.cash += amount,
            POINTS_UNIT => self.points += amount,
            _ => self.other += amount,
        }
    }

    pub fn earnings(&self) -> i64 {
        self.cash + self.points
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEarnings {
    /// YYYY/MM/DD
    pub date: String,
    #[serde(flatten)]
    pub totals: UnitTotals,
    pub earnings: i64,
    pub weekly_avg: Option<f64>,
    pub biweekly_avg: Option<f64>,
    pub monthly_avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEarnings {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub totals: UnitTotals,
    pub earnings: i64,
    pub seasonal_avg: Option<f64>,
}

/// Earnings and row count for one bucket of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEarnings {
    pub label: String,
    pub rows: usize,
    pub earnings: i64,
}

// ============================================================================
// ROLLING MEAN
// ============================================================================

/// Trailing mean over `window` entries
///
/// Entry i averages values[i + 1 - window ..= i]; the first `window - 1`
/// entries are `None`. A zero window yields all `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut means = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            means.push(Some(sum / window as f64));
        } else {
            means.push(None);
        }
    }

    means
}

fn priced(row: &CleanSale) -> Option<(i64, &str)> {
    match (row.amount, row.unit.as_deref()) {
        (Some(amount), Some(unit)) => Some((amount, unit)),
        _ => None,
    }
}

// ============================================================================
// TRENDS
// ============================================================================

/// Per-day earnings, ascending by date, with 7/14/30-day moving averages
///
/// Averages run over the days that have rows, not over calendar days.
pub fn daily_earnings(rows: &[CleanSale]) -> Vec<DailyEarnings> {
    let mut by_date: BTreeMap<&str, UnitTotals> = BTreeMap::new();
    for row in rows {
        if let Some((amount, unit)) = priced(row) {
            by_date.entry(row.date.as_str()).or_default().add(amount, unit);
        }
    }

    let earnings: Vec<f64> = by_date.values().map(|t| t.earnings() as f64).collect();
    let weekly = rolling_mean(&earnings, WEEKLY_WINDOW);
    let biweekly = rolling_mean(&earnings, BIWEEKLY_WINDOW);
    let monthly = rolling_mean(&earnings, MONTHLY_WINDOW);

    by_date
        .into_iter()
        .enumerate()
        .map(|(i, (date, totals))| DailyEarnings {
            date: date.to_string(),
            totals,
            earnings: totals.earnings(),
            weekly_avg: weekly[i],
            biweekly_avg: biweekly[i],
            monthly_avg: monthly[i],
        })
        .collect()
}

/// Per-month earnings with a 3-month seasonal average
pub fn monthly_earnings(rows: &[CleanSale]) -> Vec<MonthlyEarnings> {
    let mut by_month: BTreeMap<(i32, u32), UnitTotals> = BTreeMap::new();
    for row in rows {
        if let Some((amount, unit)) = priced(row) {
            by_month
                .entry((row.year, row.month))
                .or_default()
                .add(amount, unit);
        }
    }

    let earnings: Vec<f64> = by_month.values().map(|t| t.earnings() as f64).collect();
    let seasonal = rolling_mean(&earnings, SEASONAL_WINDOW);

    by_month
        .into_iter()
        .zip(seasonal)
        .map(|(((year, month), totals), seasonal_avg)| MonthlyEarnings {
            year,
            month,
            totals,
            earnings: totals.earnings(),
            seasonal_avg,
        })
        .collect()
}

// ============================================================================
// BREAKDOWNS
// ============================================================================

fn accumulate(bucket: &mut (usize, UnitTotals), amount: i64, unit: &str) {
    bucket.0 += 1;
    bucket.1.add(amount, unit);
}

/// Monday first; weekdays without rows are left out
pub fn earnings_by_weekday(rows: &[CleanSale]) -> Vec<GroupEarnings> {
    let mut buckets = [(0usize, UnitTotals::default()); 7];
    for row in rows {
        if let Some((amount, unit)) = priced(row) {
            if let Some(bucket) = buckets.get_mut(row.weekday as usize) {
                accumulate(bucket, amount, unit);
            }
        }
    }

    buckets
        .iter()
        .zip(WEEKDAY_NAMES)
        .filter(|((rows, _), _)| *rows > 0)
        .map(|((rows, totals), name)| GroupEarnings {
            label: name.to_string(),
            rows: *rows,
            earnings: totals.earnings(),
        })
        .collect()
}

/// Categorizer order (wash, dry, money changer, vending machine, others)
pub fn earnings_by_category(rows: &[CleanSale]) -> Vec<GroupEarnings> {
    let mut buckets: BTreeMap<EquipmentCategory, (usize, UnitTotals)> = BTreeMap::new();
    for row in rows {
        if let Some((amount, unit)) = priced(row) {
            accumulate(buckets.entry(row.category()).or_default(), amount, unit);
        }
    }

    buckets
        .into_iter()
        .map(|(category, (rows, totals))| GroupEarnings {
            label: category.as_str().to_string(),
            rows,
            earnings: totals.earnings(),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::clean_sale;
    use crate::db::SaleRecord;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn sale(time: &str, equipment: &str, amount: &str) -> CleanSale {
        clean_sale(&SaleRecord {
            time: NaiveDateTime::parse_from_str(time, "%Y/%m/%d %H:%M").unwrap(),
            equipment: equipment.to_string(),
            channel: "投幣".to_string(),
            amount: amount.to_string(),
        })
    }

    #[test]
    fn test_rolling_mean() {
        let means = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(means, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);

        assert_eq!(rolling_mean(&[1.0, 2.0], 3), vec![None, None]);
        assert_eq!(rolling_mean(&[4.0, 8.0], 1), vec![Some(4.0), Some(8.0)]);
        assert_eq!(rolling_mean(&[4.0, 8.0], 0), vec![None, None]);
        assert!(rolling_mean(&[], 7).is_empty());
    }

    #[test]
    fn test_unit_totals() {
        let mut totals = UnitTotals::default();
        totals.add(60, "元");
        totals.add(-10, "點");
        totals.add(20, " 元");
        totals.add(5, "枚");

        assert_eq!(totals.cash, 80);
        assert_eq!(totals.points, -10);
        assert_eq!(totals.other, 5);
        assert_eq!(totals.earnings(), 70);
    }

    #[test]
    fn test_daily_earnings_sums_units_and_orders_dates() {
        let rows = vec![
            sale("2024/01/02 09:00", "【1上】洗衣機 中容量", "60元"),
            sale("2024/01/01 09:00", "【1上】洗衣機 中容量", "40元"),
            sale("2024/01/01 10:00", "【2下】烘衣機", "30點"),
            sale("2024/01/01 11:00", "飲料販賣機", "免費"),
        ];

        let daily = daily_earnings(&rows);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, "2024/01/01");
        assert_eq!(daily[0].totals.cash, 40);
        assert_eq!(daily[0].totals.points, 30);
        assert_eq!(daily[0].earnings, 70);
        assert_eq!(daily[1].earnings, 60);
        assert!(daily.iter().all(|d| d.weekly_avg.is_none()));
    }

    #[test]
    fn test_daily_earnings_weekly_average_fills_on_seventh_day() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let rows: Vec<CleanSale> = (0..8)
            .map(|i| {
                let day = start + Duration::days(i);
                sale(
                    &format!("{} 12:00", day.format("%Y/%m/%d")),
                    "【1上】洗衣機 大容量",
                    &format!("{}元", (i + 1) * 10),
                )
            })
            .collect();

        let daily = daily_earnings(&rows);

        assert_eq!(daily[5].weekly_avg, None);
        assert_eq!(daily[6].weekly_avg, Some(40.0));
        assert_eq!(daily[7].weekly_avg, Some(50.0));
        assert_eq!(daily[7].biweekly_avg, None);
        assert_eq!(daily[7].monthly_avg, None);
    }

    #[test]
    fn test_monthly_earnings_seasonal_average() {
        let rows = vec![
            sale("2023/11/05 09:00", "【1上】洗衣機", "100元"),
            sale("2023/12/05 09:00", "【1上】洗衣機", "200元"),
            sale("2024/01/05 09:00", "【1上】洗衣機", "250元"),
            sale("2024/01/06 09:00", "【2下】烘衣機", "50點"),
            sale("2024/02/05 09:00", "【1上】洗衣機", "400元"),
        ];

        let monthly = monthly_earnings(&rows);
        let keys: Vec<(i32, u32)> = monthly.iter().map(|m| (m.year, m.month)).collect();
        assert_eq!(keys, vec![(2023, 11), (2023, 12), (2024, 1), (2024, 2)]);

        assert_eq!(monthly[2].earnings, 300);
        assert_eq!(monthly[1].seasonal_avg, None);
        assert_eq!(monthly[2].seasonal_avg, Some(200.0));
        assert_eq!(monthly[3].seasonal_avg, Some(300.0));
    }

    #[test]
    fn test_breakdowns() {
        // 2024/02/10 Saturday, 2024/02/12 Monday
        let rows = vec![
            sale("2024/02/10 09:00", "【12上】洗衣機 中容量", "60元"),
            sale("2024/02/10 10:00", "【3下】烘衣機", "40點"),
            sale("2024/02/12 11:00", "儲值 / 兌幣機", "100元"),
            sale("2024/02/12 12:00", "飲料販賣機", "免費"),
        ];

        let weekdays = earnings_by_weekday(&rows);
        assert_eq!(weekdays.len(), 2);
        assert_eq!(weekdays[0].label, "Mon");
        assert_eq!(weekdays[0].rows, 1);
        assert_eq!(weekdays[0].earnings, 100);
        assert_eq!(weekdays[1].label, "Sat");
        assert_eq!(weekdays[1].earnings, 100);

        let categories = earnings_by_category(&rows);
        let labels: Vec<&str> = categories.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["wash", "dry", "money changer"]);
        println!("✅ Breakdown test PASSED: {:?}", categories);
    }
}
