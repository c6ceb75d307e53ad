// Laundromat Sales Pipeline - Core Library
// Exposes all modules for use in the CLI and tests

pub mod calendar;   // Date ranges, month boundaries, year-month sequences
pub mod equipment;  // Equipment label parser + categorizer
pub mod error;
pub mod config;
pub mod db;
pub mod portal;     // Revenue page sessions + detail grid parsing
pub mod collector;
pub mod cleaning;
pub mod analysis;
pub mod stats;
pub mod export;

// Re-export commonly used types
pub use calendar::{
    DateBound, DateString, YearMonth, DATE_FORMAT,
    generate_date_range, generate_date_range_at, parse_date,
    resolve_month_boundary, sequence_year_months, sequence_year_months_at, today,
};
pub use equipment::{
    EquipmentCategory, ParsedLabel, Scale, SideIndicator,
    categorize_equipment, parse_equipment_label,
};
pub use error::{CalendarError, CalendarResult};
pub use config::{Config, Credentials};
pub use db::{
    Event, SaleRecord,
    open_database, setup_database, load_sales_csv, insert_day, insert_sales, get_all_sales,
    cached_dates, verify_count, replace_clean_sales, get_clean_sales,
    insert_event, get_events_for_entity,
};
pub use portal::{PortalSession, SnapshotSession, parse_detail_grid};
pub use collector::{CollectionStats, collect_sales};
pub use cleaning::{CleanSale, CleaningSummary, clean_sale, clean_sales, split_amount};
pub use analysis::{
    DailyEarnings, GroupEarnings, MonthlyEarnings, UnitTotals,
    daily_earnings, earnings_by_category, earnings_by_weekday, monthly_earnings, rolling_mean,
};
pub use stats::{
    CnyAnalysis, DailyTotal, MannWhitneyResult, NormalityAnalyzer, NormalityTests,
    ShapeStatistics, TestResult,
    analyze_cny_sales, daily_totals, mann_whitney_u_greater,
};
pub use export::{
    ExportFormat, SheetRow,
    export_clean_csv, export_clean_xlsx, export_sales_csv, export_sales_xlsx, export_workbooks,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
