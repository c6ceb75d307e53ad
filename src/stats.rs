// 🧪 Stats - normality checks and the Chinese New Year sales test
//
// NormalityAnalyzer: Shapiro-Wilk, D'Agostino-Pearson K², skewness, kurtosis
// CNY analysis: one-sided Mann-Whitney U on daily totals, pre-CNY vs regular

use crate::cleaning::CleanSale;
use anyhow::{anyhow, bail, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::{debug, warn};

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// |skewness| below this reads as symmetric
pub const SKEW_THRESHOLD: f64 = 0.5;
/// |excess kurtosis| below this reads as normal tails
pub const KURTOSIS_THRESHOLD: f64 = 0.5;

const SHAPIRO_MIN_N: usize = 3;
const SHAPIRO_MAX_N: usize = 5000;
const DAGOSTINO_MIN_N: usize = 8;

/// Both samples above this size (or any tie) switches Mann-Whitney to the
/// normal approximation
const MWU_EXACT_MAX_N: usize = 8;

/// Chinese New Year (first day of the lunar year)
pub const CNY_DATES: [(i32, u32, u32); 7] = [
    (2020, 1, 25),
    (2021, 2, 12),
    (2022, 2, 1),
    (2023, 1, 22),
    (2024, 2, 10),
    (2025, 1, 29),
    (2026, 2, 17),
];

pub fn cny_dates() -> Vec<NaiveDate> {
    CNY_DATES
        .iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect()
}

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    pub fn rejects_normality(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapeStatistics {
    /// Biased sample skewness
    pub skewness: f64,
    /// Excess (Fisher) kurtosis, biased
    pub kurtosis: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityTests {
    pub shapiro: TestResult,
    /// `None` below 8 values
    pub dagostino: Option<TestResult>,
}

// ============================================================================
// DESCRIPTIVE HELPERS
// ============================================================================

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1); `None` below two values
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Skewness and excess kurtosis from central moments (population form)
pub fn shape_statistics(values: &[f64]) -> Result<ShapeStatistics> {
    if values.is_empty() {
        bail!("Cannot compute shape statistics of an empty sample");
    }

    let n = values.len() as f64;
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        m2 += d * d;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    if m2 == 0.0 {
        bail!("Sample has zero variance");
    }

    Ok(ShapeStatistics {
        skewness: m3 / m2.powf(1.5),
        kurtosis: m4 / (m2 * m2) - 3.0,
    })
}

// ============================================================================
// SHAPIRO-WILK (Royston approximation)
// ============================================================================

const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// Reported when W is too far from 1 for the small-sample approximation
const SW_TINY_P: f64 = 1e-99;

/// c[0] + c[1]·x + c[2]·x² + ...
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Coefficients a_1..a_{n/2} for the pairs (x_(n+1-i) - x_(i))
fn shapiro_coefficients(n: usize, normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let an = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let a1 = poly(&SW_C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let (first_scaled, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&SW_C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };

    for i in first_scaled..half {
        a[i] = -m[i] / fac;
    }
    a
}

fn shapiro_p_value(w: f64, n: usize, normal: &Normal) -> f64 {
    if n == 3 {
        let pi6 = 6.0 / std::f64::consts::PI;
        let stqr = std::f64::consts::FRAC_PI_3;
        return (pi6 * (w.max(0.75).sqrt().asin() - stqr)).max(0.0);
    }

    let an = n as f64;
    let mut y = (1.0 - w).ln();

    let (m, s) = if n <= 11 {
        let gamma = poly(&SW_G, an);
        if y >= gamma {
            return SW_TINY_P;
        }
        y = -(gamma - y).ln();
        (poly(&SW_C3, an), poly(&SW_C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&SW_C5, xx), poly(&SW_C6, xx).exp())
    };

    normal.sf((y - m) / s)
}

/// Shapiro-Wilk W and p-value; needs at least 3 values that are not all equal
pub fn shapiro_wilk(values: &[f64]) -> Result<TestResult> {
    let n = values.len();
    if n < SHAPIRO_MIN_N {
        bail!("Shapiro-Wilk needs at least {} values, got {}", SHAPIRO_MIN_N, n);
    }
    if n > SHAPIRO_MAX_N {
        warn!(n, "Shapiro-Wilk p-value may be inaccurate above {} values", SHAPIRO_MAX_N);
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] == 0.0 {
        bail!("Shapiro-Wilk is undefined when all values are identical");
    }

    let normal = Normal::new(0.0, 1.0)?;
    let a = shapiro_coefficients(n, &normal);

    let m = mean(&x);
    let ss: f64 = x.iter().map(|v| (v - m).powi(2)).sum();
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (numerator * numerator / ss).min(1.0);

    Ok(TestResult {
        statistic: w,
        p_value: shapiro_p_value(w, n, &normal),
    })
}

// ============================================================================
// D'AGOSTINO-PEARSON K²
// ============================================================================

fn skew_z(skewness: f64, n: f64) -> f64 {
    let y = skewness * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let ya = y / alpha;
    delta * (ya + (ya * ya + 1.0).sqrt()).ln()
}

fn kurtosis_z(excess_kurtosis: f64, n: f64) -> Result<f64> {
    let b2 = excess_kurtosis + 3.0;
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / var_b2.sqrt();

    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());

    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        bail!("Kurtosis test is undefined for this sample");
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();

    Ok((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// K² = Z(skew)² + Z(kurtosis)², p from chi-squared with 2 df
pub fn dagostino_k2(values: &[f64]) -> Result<TestResult> {
    let n = values.len();
    if n < DAGOSTINO_MIN_N {
        bail!("D'Agostino-Pearson needs at least {} values, got {}", DAGOSTINO_MIN_N, n);
    }

    let shape = shape_statistics(values)?;
    let nf = n as f64;
    let zs = skew_z(shape.skewness, nf);
    let zk = kurtosis_z(shape.kurtosis, nf)?;
    let k2 = zs * zs + zk * zk;

    let chi2 = ChiSquared::new(2.0)?;
    Ok(TestResult {
        statistic: k2,
        p_value: chi2.sf(k2),
    })
}

// ============================================================================
// NORMALITY ANALYZER
// ============================================================================

pub fn interpret_test(result: &TestResult) -> &'static str {
    if result.rejects_normality() {
        "Not normal"
    } else {
        "Cannot reject normality"
    }
}

pub fn interpret_skewness(skewness: f64) -> &'static str {
    if skewness.abs() < SKEW_THRESHOLD {
        "Symmetric"
    } else if skewness > 0.0 {
        "Right-skewed"
    } else {
        "Left-skewed"
    }
}

pub fn interpret_kurtosis(kurtosis: f64) -> &'static str {
    if kurtosis.abs() < KURTOSIS_THRESHOLD {
        "Normal tails"
    } else if kurtosis > 0.0 {
        "Heavy tails"
    } else {
        "Light tails"
    }
}

/// Checks whether one numeric column looks normally distributed
pub struct NormalityAnalyzer {
    data: Vec<f64>,
    column_name: String,
}

impl NormalityAnalyzer {
    pub fn new(data: impl Into<Vec<f64>>, column_name: impl Into<String>) -> Self {
        NormalityAnalyzer {
            data: data.into(),
            column_name: column_name.into(),
        }
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape_statistics(&self) -> Result<ShapeStatistics> {
        shape_statistics(&self.data)
    }

    pub fn run_statistical_tests(&self) -> Result<NormalityTests> {
        let shapiro = shapiro_wilk(&self.data)?;
        let dagostino = if self.data.len() >= DAGOSTINO_MIN_N {
            Some(dagostino_k2(&self.data)?)
        } else {
            debug!(n = self.data.len(), "skipping D'Agostino-Pearson on a small sample");
            None
        };

        Ok(NormalityTests { shapiro, dagostino })
    }

    /// Printable summary: tests, then shape statistics, each interpreted
    pub fn report(&self) -> Result<String> {
        let tests = self.run_statistical_tests()?;
        let shape = self.shape_statistics()?;

        let mut out = String::new();
        writeln!(out, "Normality Analysis Results for {}", self.column_name)?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "n = {}", self.data.len())?;

        writeln!(out, "\n1. Statistical Tests:")?;
        writeln!(out, "{}", "-".repeat(20))?;
        writeln!(out, "\nShapiro-Wilk test:")?;
        write_test(&mut out, &tests.shapiro)?;

        writeln!(out, "\nD'Agostino-Pearson test:")?;
        match &tests.dagostino {
            Some(result) => write_test(&mut out, result)?,
            None => writeln!(out, "Not enough data (needs at least {} values)", DAGOSTINO_MIN_N)?,
        }

        writeln!(out, "\n2. Shape Statistics:")?;
        writeln!(out, "{}", "-".repeat(20))?;
        writeln!(out, "Skewness: {:.4}", shape.skewness)?;
        writeln!(out, "  - Interpretation: {}", interpret_skewness(shape.skewness))?;
        writeln!(out, "Kurtosis: {:.4}", shape.kurtosis)?;
        writeln!(out, "  - Interpretation: {}", interpret_kurtosis(shape.kurtosis))?;

        Ok(out)
    }
}

fn write_test(out: &mut String, result: &TestResult) -> std::fmt::Result {
    writeln!(out, "Statistic: {:.4}", result.statistic)?;
    writeln!(out, "P-value: {:.4}", result.p_value)?;
    writeln!(out, "Interpretation: {}", interpret_test(result))
}

// ============================================================================
// MANN-WHITNEY U
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MannWhitneyMethod {
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MannWhitneyResult {
    /// U of the first sample: R₁ - n₁(n₁+1)/2
    pub statistic: f64,
    pub p_value: f64,
    pub method: MannWhitneyMethod,
}

/// Average ranks (1-based) and the size of every tie group
fn rank_with_ties(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut groups = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        groups.push(end - start + 1);
        start = end + 1;
    }

    (ranks, groups)
}

/// Frequencies of U for samples of size `m` and `n` (index = U)
fn u_distribution(m: usize, n: usize) -> Vec<f64> {
    // counts[i] holds the distribution for i values of the first sample
    // against the j values of the second processed so far
    let mut counts: Vec<Vec<f64>> = vec![vec![1.0]; m + 1];
    for j in 1..=n {
        for i in 1..=m {
            let mut next = std::mem::take(&mut counts[i]);
            next.resize(i * j + 1, 0.0);
            for (u, c) in counts[i - 1].iter().enumerate() {
                next[u + j] += c;
            }
            counts[i] = next;
        }
    }
    counts.swap_remove(m)
}

/// One-sided Mann-Whitney U: is `x` stochastically greater than `y`?
pub fn mann_whitney_u_greater(x: &[f64], y: &[f64]) -> Result<MannWhitneyResult> {
    let (n1, n2) = (x.len(), y.len());
    if n1 == 0 || n2 == 0 {
        bail!("Mann-Whitney U needs two non-empty samples (got {} and {})", n1, n2);
    }

    let combined: Vec<f64> = x.iter().chain(y).copied().collect();
    let (ranks, ties) = rank_with_ties(&combined);
    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;
    let has_ties = ties.iter().any(|&t| t > 1);

    if !has_ties && (n1 <= MWU_EXACT_MAX_N || n2 <= MWU_EXACT_MAX_N) {
        let freq = u_distribution(n1.min(n2), n1.max(n2));
        let total: f64 = freq.iter().sum();
        let tail: f64 = freq.iter().skip(u1.round() as usize).sum();
        return Ok(MannWhitneyResult {
            statistic: u1,
            p_value: (tail / total).min(1.0),
            method: MannWhitneyMethod::Exact,
        });
    }

    let (f1, f2) = (n1 as f64, n2 as f64);
    let n = f1 + f2;
    let tie_term: f64 = ties
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let sigma = (f1 * f2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if sigma == 0.0 {
        bail!("Mann-Whitney U is undefined when every value is identical");
    }

    let z = (u1 - f1 * f2 / 2.0 - 0.5) / sigma;
    let normal = Normal::new(0.0, 1.0)?;

    Ok(MannWhitneyResult {
        statistic: u1,
        p_value: normal.sf(z),
        method: MannWhitneyMethod::Asymptotic,
    })
}

// ============================================================================
// CHINESE NEW YEAR ANALYSIS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Sum of Amount per calendar day, ascending; rows without an amount add 0
pub fn daily_totals(rows: &[CleanSale]) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *by_date.entry(row.time.date()).or_insert(0.0) += row.amount.unwrap_or(0) as f64;
    }

    by_date
        .into_iter()
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    PreCny,
    Holiday,
    Regular,
}

fn classify(date: NaiveDate, cny: &[NaiveDate], days_before: u32, holiday_days: u32) -> Period {
    let before = Duration::days(i64::from(days_before));
    let holiday = Duration::days(i64::from(holiday_days));

    if cny.iter().any(|&c| date >= c - before && date < c) {
        Period::PreCny
    } else if cny.iter().any(|&c| date >= c && date < c + holiday) {
        Period::Holiday
    } else {
        Period::Regular
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CnyAnalysis {
    pub days_before: u32,
    pub cny_holiday_days: u32,
    pub pre_cny_daily_mean: f64,
    pub regular_daily_mean: f64,
    pub pre_cny_daily_median: f64,
    pub regular_daily_median: f64,
    pub pre_cny_daily_std: Option<f64>,
    pub regular_daily_std: Option<f64>,
    pub pre_cny_days: usize,
    pub regular_days: usize,
    /// `None` when the regular mean is zero
    pub percent_difference: Option<f64>,
    pub p_value: f64,
    pub statistic: f64,
    pub method: MannWhitneyMethod,
}

impl CnyAnalysis {
    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }

    pub fn report(&self) -> String {
        let fmt_std = |std: Option<f64>| match std {
            Some(value) => format!("{:.2}", value),
            None => "n/a".to_string(),
        };
        let percent = match self.percent_difference {
            Some(value) => format!("{:.2}%", value),
            None => "n/a".to_string(),
        };

        let mut lines = vec![
            "Chinese New Year Sales Analysis Results (Daily Aggregated)".to_string(),
            "=".repeat(47),
            format!(
                "Pre-CNY window: {} days before CNY, {} holiday days excluded",
                self.days_before, self.cny_holiday_days
            ),
            String::new(),
            "Pre-CNY Period Statistics:".to_string(),
            format!("- Mean daily sales: {:.2}", self.pre_cny_daily_mean),
            format!("- Median daily sales: {:.2}", self.pre_cny_daily_median),
            format!("- Daily standard deviation: {}", fmt_std(self.pre_cny_daily_std)),
            format!("- Number of days: {}", self.pre_cny_days),
            String::new(),
            "Regular Period Statistics:".to_string(),
            format!("- Mean daily sales: {:.2}", self.regular_daily_mean),
            format!("- Median daily sales: {:.2}", self.regular_daily_median),
            format!("- Daily standard deviation: {}", fmt_std(self.regular_daily_std)),
            format!("- Number of days: {}", self.regular_days),
            String::new(),
            "Comparison:".to_string(),
            format!("- Percentage difference in daily means: {}", percent),
            format!("- U statistic: {:.1} ({:?})", self.statistic, self.method),
            format!("- P-value: {:.4}", self.p_value),
        ];
        lines.push(format!(
            "- Statistical significance: {} at α={}",
            if self.is_significant() { "Significant" } else { "Not significant" },
            SIGNIFICANCE_LEVEL
        ));

        lines.join("\n")
    }
}

/// Are daily sales higher in the `days_before` days leading up to CNY?
///
/// The pre-CNY window ends the day before CNY; the `cny_holiday_days` days
/// starting on CNY belong to neither sample.
pub fn analyze_cny_sales(
    daily: &[DailyTotal],
    days_before: u32,
    cny_holiday_days: u32,
) -> Result<CnyAnalysis> {
    let cny = cny_dates();
    let mut pre = Vec::new();
    let mut regular = Vec::new();

    for day in daily {
        match classify(day.date, &cny, days_before, cny_holiday_days) {
            Period::PreCny => pre.push(day.amount),
            Period::Regular => regular.push(day.amount),
            Period::Holiday => {}
        }
    }

    if pre.is_empty() {
        return Err(anyhow!(
            "No pre-CNY days in the data ({} days before, {} daily totals)",
            days_before,
            daily.len()
        ));
    }
    if regular.is_empty() {
        bail!("No regular days in the data");
    }

    let test = mann_whitney_u_greater(&pre, &regular)?;
    let pre_mean = mean(&pre);
    let regular_mean = mean(&regular);

    Ok(CnyAnalysis {
        days_before,
        cny_holiday_days,
        pre_cny_daily_mean: pre_mean,
        regular_daily_mean: regular_mean,
        pre_cny_daily_median: median(&pre),
        regular_daily_median: median(&regular),
        pre_cny_daily_std: sample_std(&pre),
        regular_daily_std: sample_std(&regular),
        pre_cny_days: pre.len(),
        regular_days: regular.len(),
        percent_difference: (regular_mean != 0.0)
            .then(|| (pre_mean - regular_mean) / regular_mean * 100.0),
        p_value: test.p_value,
        statistic: test.statistic,
        method: test.method,
    })
}

// ============================================================================
// TESTS
// ============================================================================
