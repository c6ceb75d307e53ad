use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use laundromat_sales::{
    analysis, cleaning, collector, db, export, stats,
    calendar::{self, YearMonth},
    config::Config,
    portal::{PortalSession, SnapshotSession},
    ExportFormat, NormalityAnalyzer,
};

#[derive(Parser)]
#[command(name = "laundromat-sales", version, about = "Laundromat sales collection and analysis")]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect uncollected days into sales_data from saved portal pages
    Collect {
        /// Directory with YYYY-MM.html overview and YYYY-MM-DD.html detail captures
        #[arg(long)]
        snapshots: PathBuf,
    },
    /// Append rows from a Time,Equipment,Channel,Amount CSV to sales_data
    Import {
        csv: PathBuf,
    },
    /// Rebuild clean_sales_data from sales_data
    Clean {
        /// Skip writing the clean Excel export
        #[arg(long)]
        no_export: bool,
    },
    /// Export the raw (or clean) table
    Export {
        #[arg(short, long, value_enum, default_value = "xlsx")]
        format: FormatArg,
        /// Export clean_sales_data instead of sales_data
        #[arg(long)]
        clean: bool,
        /// Output file (default: configured export path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Daily earnings with 7/14/30-day moving averages
    Trend {
        /// Only show the last N days
        #[arg(short = 'n', long)]
        last: Option<usize>,
    },
    /// Monthly earnings with a 3-month seasonal average
    Monthly,
    /// Earnings by weekday and by equipment category
    Breakdown,
    /// Normality checks on daily sales totals
    Normality,
    /// Are daily sales higher right before Chinese New Year?
    Cny {
        #[arg(long, default_value = "2")]
        days_before: u32,
        #[arg(long, default_value = "0")]
        holiday_days: u32,
    },
    /// List every date from START to END (clamped to today)
    Dates {
        start: String,
        end: String,
    },
    /// List year-months from YEAR/MONTH to END_YEAR/END_MONTH (default: this month)
    Months {
        year: i32,
        month: u32,
        end_year: Option<i32>,
        end_month: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dates { start, end } => run_dates(&start, &end, cli.json),
        Commands::Months { year, month, end_year, end_month } => {
            run_months(year, month, end_year, end_month, cli.json)
        }
        command => {
            let config = Config::from_env()?;
            debug!(db = %config.db_path.display(), "configuration loaded");
            run_pipeline(command, &config, cli.json)
        }
    }
}

fn run_pipeline(command: Commands, config: &Config, json: bool) -> Result<()> {
    match command {
        Commands::Collect { snapshots } => run_collect(config, &snapshots, json),
        Commands::Import { csv } => run_import(config, &csv),
        Commands::Clean { no_export } => run_clean(config, no_export, json),
        Commands::Export { format, clean, output } => {
            run_export(config, format.into(), clean, output)
        }
        Commands::Trend { last } => run_trend(config, last, json),
        Commands::Monthly => run_monthly(config, json),
        Commands::Breakdown => run_breakdown(config, json),
        Commands::Normality => run_normality(config, json),
        Commands::Cny { days_before, holiday_days } => {
            run_cny(config, days_before, holiday_days, json)
        }
        Commands::Dates { start, end } => run_dates(&start, &end, json),
        Commands::Months { year, month, end_year, end_month } => {
            run_months(year, month, end_year, end_month, json)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open(config: &Config) -> Result<Connection> {
    db::open_database(&config.db_path)
}

fn load_clean(conn: &Connection) -> Result<Vec<cleaning::CleanSale>> {
    let rows = db::get_clean_sales(conn)?;
    if rows.is_empty() {
        bail!("clean_sales_data is empty; run `laundromat-sales clean` first");
    }
    Ok(rows)
}

fn fmt_avg(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string())
}

// ============================================================================
// CALENDAR COMMANDS (no configuration needed)
// ============================================================================

fn run_dates(start: &str, end: &str, json: bool) -> Result<()> {
    let dates = calendar::generate_date_range(start, end)?;
    if json {
        return print_json(&dates);
    }
    for date in &dates {
        println!("{}", date);
    }
    Ok(())
}

fn run_months(
    year: i32,
    month: u32,
    end_year: Option<i32>,
    end_month: Option<u32>,
    json: bool,
) -> Result<()> {
    let months = calendar::sequence_year_months(year, month, end_year, end_month)?;
    if json {
        return print_json(&months);
    }
    for ym in &months {
        println!("{}", ym);
    }
    Ok(())
}

// ============================================================================
// PIPELINE COMMANDS
// ============================================================================

fn run_collect(config: &Config, snapshots: &Path, json: bool) -> Result<()> {
    let conn = open(config)?;
    let mut session = SnapshotSession::new(snapshots)?;

    match config.credentials() {
        Ok(credentials) => session.login(&credentials)?,
        Err(e) => debug!("no portal login: {}", e),
    }

    let start = YearMonth::new(config.start_year, config.start_month)?;
    println!("🧺 Collecting from {} (session: {})", start, session.name());

    let stats = collector::collect_sales(&mut session, &conn, start, calendar::today())?;
    if json {
        return print_json(&stats);
    }

    println!("✓ {}", stats.summary());
    println!("✓ sales_data now holds {} rows", db::verify_count(&conn)?);
    Ok(())
}

fn run_import(config: &Config, csv_path: &Path) -> Result<()> {
    println!("📂 Loading {}...", csv_path.display());
    let records = db::load_sales_csv(csv_path)?;
    println!("✓ Loaded {} rows from CSV", records.len());

    let conn = open(config)?;
    let inserted = db::insert_sales(&conn, &records)?;
    db::insert_event(
        &conn,
        &db::Event::new(
            "csv_imported",
            "sales_import",
            &csv_path.display().to_string(),
            serde_json::json!({ "rows": inserted }),
            "cli",
        ),
    )?;

    println!("✓ Inserted {} rows; sales_data holds {}", inserted, db::verify_count(&conn)?);
    Ok(())
}

fn run_clean(config: &Config, no_export: bool, json: bool) -> Result<()> {
    let conn = open(config)?;
    let records = db::get_all_sales(&conn)?;
    if records.is_empty() {
        bail!("sales_data is empty; run `collect` or `import` first");
    }

    let rows = cleaning::clean_sales(&records);
    db::replace_clean_sales(&conn, &rows)?;
    let summary = cleaning::CleaningSummary::from_rows(&rows);

    if !no_export {
        export::export_workbooks(
            &records,
            &rows,
            &config.raw_export_path,
            &config.clean_export_path,
        )?;
    }

    if json {
        return print_json(&summary);
    }

    println!("🧹 {}", summary.summary());
    if !no_export {
        println!("✓ Exported to {}", config.raw_export_path.display());
        println!("✓ Exported to {}", config.clean_export_path.display());
    }
    Ok(())
}

fn run_export(
    config: &Config,
    format: ExportFormat,
    clean: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let conn = open(config)?;
    let path = output.unwrap_or_else(|| {
        let base = if clean {
            &config.clean_export_path
        } else {
            &config.raw_export_path
        };
        base.with_extension(format.extension())
    });

    let written = match (clean, format) {
        (false, ExportFormat::Xlsx) => export::export_sales_xlsx(&db::get_all_sales(&conn)?, &path)?,
        (false, ExportFormat::Csv) => export::export_sales_csv(&db::get_all_sales(&conn)?, &path)?,
        (true, ExportFormat::Xlsx) => export::export_clean_xlsx(&db::get_clean_sales(&conn)?, &path)?,
        (true, ExportFormat::Csv) => export::export_clean_csv(&db::get_clean_sales(&conn)?, &path)?,
    };

    println!("📤 Wrote {} rows to {}", written, path.display());
    Ok(())
}

// ============================================================================
// ANALYSIS COMMANDS
// ============================================================================

fn run_trend(config: &Config, last: Option<usize>, json: bool) -> Result<()> {
    let conn = open(config)?;
    let daily = analysis::daily_earnings(&load_clean(&conn)?);
    let skip = last.map(|n| daily.len().saturating_sub(n)).unwrap_or(0);
    let shown = &daily[skip..];

    if json {
        return print_json(shown);
    }

    println!(
        "{:<12} {:>8} {:>8} {:>9} {:>9} {:>9} {:>9}",
        "Date", "元", "點", "Earnings", "Weekly", "Biweekly", "Monthly"
    );
    for day in shown {
        println!(
            "{:<12} {:>8} {:>8} {:>9} {:>9} {:>9} {:>9}",
            day.date,
            day.totals.cash,
            day.totals.points,
            day.earnings,
            fmt_avg(day.weekly_avg),
            fmt_avg(day.biweekly_avg),
            fmt_avg(day.monthly_avg),
        );
    }
    Ok(())
}

fn run_monthly(config: &Config, json: bool) -> Result<()> {
    let conn = open(config)?;
    let monthly = analysis::monthly_earnings(&load_clean(&conn)?);

    if json {
        return print_json(&monthly);
    }

    println!("{:<8} {:>10} {:>10} {:>10} {:>10}", "Month", "元", "點", "Earnings", "Seasonal");
    for month in &monthly {
        println!(
            "{:04}-{:02} {:>10} {:>10} {:>10} {:>10}",
            month.year,
            month.month,
            month.totals.cash,
            month.totals.points,
            month.earnings,
            fmt_avg(month.seasonal_avg),
        );
    }
    Ok(())
}

fn run_breakdown(config: &Config, json: bool) -> Result<()> {
    let conn = open(config)?;
    let rows = load_clean(&conn)?;
    let weekdays = analysis::earnings_by_weekday(&rows);
    let categories = analysis::earnings_by_category(&rows);

    if json {
        return print_json(&serde_json::json!({
            "weekday": weekdays,
            "category": categories,
        }));
    }

    for (title, groups) in [("By weekday", &weekdays), ("By category", &categories)] {
        println!("\n{}", title);
        println!("{}", "-".repeat(40));
        for group in groups {
            println!("{:<18} {:>8} rows {:>10}", group.label, group.rows, group.earnings);
        }
    }
    Ok(())
}

fn run_normality(config: &Config, json: bool) -> Result<()> {
    let conn = open(config)?;
    let totals = stats::daily_totals(&load_clean(&conn)?);
    let amounts: Vec<f64> = totals.iter().map(|t| t.amount).collect();
    let analyzer = NormalityAnalyzer::new(amounts, "Daily Sales");

    if json {
        return print_json(&serde_json::json!({
            "column": analyzer.column_name(),
            "n": analyzer.len(),
            "tests": analyzer.run_statistical_tests()?,
            "shape": analyzer.shape_statistics()?,
        }));
    }

    println!("{}", analyzer.report()?);
    Ok(())
}

fn run_cny(config: &Config, days_before: u32, holiday_days: u32, json: bool) -> Result<()> {
    let conn = open(config)?;
    let totals = stats::daily_totals(&load_clean(&conn)?);
    let result = stats::analyze_cny_sales(&totals, days_before, holiday_days)?;

    if json {
        return print_json(&result);
    }

    println!("{}", result.report());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_commands_run_without_configuration() {
        // A malformed setting only breaks the commands that read it
        std::env::set_var("COLLECT_START_MONTH", "nov");

        let cli = Cli::try_parse_from(["laundromat-sales", "months", "2023", "11", "2024", "2"]).unwrap();
        assert!(matches!(cli.command, Commands::Months { year: 2023, month: 11, .. }));

        assert!(run_months(2023, 11, Some(2024), Some(2), false).is_ok());
        assert!(run_dates("2023/11/01", "2023/11/03", true).is_ok());
        assert!(Config::from_env().is_err());

        std::env::remove_var("COLLECT_START_MONTH");
    }

    #[test]
    fn test_clean_accepts_no_export_flag() {
        let cli = Cli::try_parse_from(["laundromat-sales", "--json", "clean", "--no-export"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Clean { no_export: true }));
    }
}
