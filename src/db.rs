use crate::cleaning::CleanSale;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

pub const SALES_TABLE: &str = "sales_data";
pub const CLEAN_SALES_TABLE: &str = "clean_sales_data";

/// One transaction as shown in the portal's daily detail grid
/// Column names follow the `sales_data` table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SaleRecord {
    #[serde(rename = "Time", with = "sql_time")]
    pub time: NaiveDateTime,

    #[serde(rename = "Equipment")]
    pub equipment: String,

    #[serde(rename = "Channel")]
    pub channel: String,

    /// Raw amount text, e.g. "40元" or "-20點"
    #[serde(rename = "Amount")]
    pub amount: String,
}

/// Timestamp text layout used in SQLite and in CSV files
pub mod sql_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn format(time: &NaiveDateTime) -> String {
        time.format(FORMAT).to_string()
    }

    pub fn parse(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(text, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
    }

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Event for audit trail: one entry per collected day
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Open (creating parent directories) and initialise the database file
pub fn open_database(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Raw rows exactly as scraped
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sales_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            Time TEXT NOT NULL,
            Equipment TEXT NOT NULL,
            Channel TEXT NOT NULL,
            Amount TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Cleaned rows (rebuilt wholesale by `replace_clean_sales`)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS clean_sales_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            Time TEXT NOT NULL,
            Equipment TEXT NOT NULL,
            Channel TEXT NOT NULL,
            Amount INTEGER,
            Unit TEXT,
            Date TEXT NOT NULL,
            Year INTEGER NOT NULL,
            Month INTEGER NOT NULL,
            Weekday INTEGER NOT NULL,
            Day INTEGER NOT NULL,
            Equipment_ID TEXT,
            Equipment_Location TEXT,
            Equipment_Type TEXT NOT NULL,
            Equipment_Category TEXT NOT NULL,
            Wash_Scale TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sales_time ON sales_data(Time)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_clean_sales_date ON clean_sales_data(Date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

pub fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table_name],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

/// Load raw rows from a CSV export with `Time,Equipment,Channel,Amount` headers
pub fn load_sales_csv(csv_path: &Path) -> Result<Vec<SaleRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut records = Vec::new();

    for (line_num, result) in rdr.deserialize().enumerate() {
        let record: SaleRecord = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, csv_path.display())
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Append raw rows in a single transaction
pub fn insert_sales(conn: &Connection, records: &[SaleRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    insert_sale_rows(&tx, records)?;
    tx.commit()?;
    debug!(rows = records.len(), "inserted sales rows");

    Ok(records.len())
}

/// Append one collected day and its audit event; both land or neither does
pub fn insert_day(conn: &Connection, records: &[SaleRecord], event: &Event) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    insert_sale_rows(&tx, records)?;
    insert_event(&tx, event)
        .with_context(|| format!("Failed to record {} event for {}", event.event_type, event.entity_id))?;
    tx.commit()?;
    debug!(rows = records.len(), day = %event.entity_id, "inserted collected day");

    Ok(records.len())
}

fn insert_sale_rows(conn: &Connection, records: &[SaleRecord]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO sales_data (Time, Equipment, Channel, Amount) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for record in records {
        stmt.execute(params![
            sql_time::format(&record.time),
            record.equipment,
            record.channel,
            record.amount,
        ])?;
    }

    Ok(())
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let text: String = row.get(idx)?;
    sql_time::parse(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn get_all_sales(conn: &Connection) -> Result<Vec<SaleRecord>> {
    let mut stmt = conn.prepare(
        "SELECT Time, Equipment, Channel, Amount
         FROM sales_data
         ORDER BY Time ASC, id ASC",
    )?;

    let records = stmt
        .query_map([], |row| {
            Ok(SaleRecord {
                time: time_column(row, 0)?,
                equipment: row.get(1)?,
                channel: row.get(2)?,
                amount: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Days already present in `sales_data`, rendered as `YYYY/MM/DD`
///
/// The collector skips these so a rerun only fetches new days.
pub fn cached_dates(conn: &Connection) -> Result<HashSet<String>> {
    if !table_exists(conn, SALES_TABLE)? {
        info!("Table '{}' does not exist, nothing cached", SALES_TABLE);
        return Ok(HashSet::new());
    }

    let mut stmt = conn.prepare("SELECT DISTINCT substr(Time, 1, 10) FROM sales_data")?;

    let dates = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|day| day.replace('-', "/"))
        .collect();

    Ok(dates)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM sales_data", [], |row| row.get(0))?;

    Ok(count)
}

/// Rebuild `clean_sales_data` from scratch
pub fn replace_clean_sales(conn: &Connection, rows: &[CleanSale]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM clean_sales_data", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO clean_sales_data (
                Time, Equipment, Channel, Amount, Unit, Date, Year, Month, Weekday, Day,
                Equipment_ID, Equipment_Location, Equipment_Type, Equipment_Category, Wash_Scale
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )?;

        for row in rows {
            stmt.execute(params![
                sql_time::format(&row.time),
                row.equipment,
                row.channel,
                row.amount,
                row.unit,
                row.date,
                row.year,
                row.month,
                row.weekday,
                row.day,
                row.equipment_id,
                row.equipment_location,
                row.equipment_type,
                row.equipment_category,
                row.wash_scale,
            ])?;
        }
    }

    tx.commit()?;
    Ok(rows.len())
}

pub fn get_clean_sales(conn: &Connection) -> Result<Vec<CleanSale>> {
    let mut stmt = conn.prepare(
        "SELECT Time, Equipment, Channel, Amount, Unit, Date, Year, Month, Weekday, Day,
                Equipment_ID, Equipment_Location, Equipment_Type, Equipment_Category, Wash_Scale
         FROM clean_sales_data
         ORDER BY Time ASC, id ASC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(CleanSale {
                time: time_column(row, 0)?,
                equipment: row.get(1)?,
                channel: row.get(2)?,
                amount: row.get(3)?,
                unit: row.get(4)?,
                date: row.get(5)?,
                year: row.get(6)?,
                month: row.get(7)?,
                weekday: row.get(8)?,
                day: row.get(9)?,
                equipment_id: row.get(10)?,
                equipment_location: row.get(11)?,
                equipment_type: row.get(12)?,
                equipment_category: row.get(13)?,
                wash_scale: row.get(14)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::clean_sales;
    use std::io::Write;

    /// Helper function to create a raw row
    fn create_test_sale(time: &str, equipment: &str, amount: &str) -> SaleRecord {
        SaleRecord {
            time: NaiveDateTime::parse_from_str(time, "%Y/%m/%d %H:%M").unwrap(),
            equipment: equipment.to_string(),
            channel: "投幣".to_string(),
            amount: amount.to_string(),
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_read_back_sales() {
        let conn = setup();

        let records = vec![
            create_test_sale("2023/11/02 10:05", "【1上】洗衣機 大容量", "60元"),
            create_test_sale("2023/11/01 08:30", "【2】烘衣機", "10點"),
        ];

        let inserted = insert_sales(&conn, &records).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(verify_count(&conn).unwrap(), 2);

        let stored = get_all_sales(&conn).unwrap();
        assert_eq!(stored.len(), 2);
        // Ascending by time
        assert_eq!(stored[0], records[1]);
        assert_eq!(stored[1], records[0]);
    }

    #[test]
    fn test_reinsert_appends() {
        // No dedupe on the raw table: the collector avoids refetching by date
        let conn = setup();
        let records = vec![create_test_sale("2023/11/01 08:30", "【2】烘衣機", "10點")];

        insert_sales(&conn, &records).unwrap();
        insert_sales(&conn, &records).unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_cached_dates() {
        let conn = setup();
        assert!(cached_dates(&conn).unwrap().is_empty());

        insert_sales(
            &conn,
            &[
                create_test_sale("2023/11/01 08:30", "【2】烘衣機", "10點"),
                create_test_sale("2023/11/01 21:00", "【2】烘衣機", "10點"),
                create_test_sale("2023/12/31 23:59", "【2】烘衣機", "10點"),
            ],
        )
        .unwrap();

        let cached = cached_dates(&conn).unwrap();
        assert_eq!(cached.len(), 2);
        assert!(cached.contains("2023/11/01"));
        assert!(cached.contains("2023/12/31"));
    }

    #[test]
    fn test_cached_dates_without_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, SALES_TABLE).unwrap());
        assert!(cached_dates(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_replace_clean_sales() {
        let conn = setup();
        let raw = vec![
            create_test_sale("2024/02/10 09:15", "【12上】洗衣機 中容量", "60元"),
            create_test_sale("2024/02/10 11:00", "飲料販賣機", "免費"),
        ];
        let clean = clean_sales(&raw);

        assert_eq!(replace_clean_sales(&conn, &clean).unwrap(), 2);
        // Second run replaces rather than appends
        assert_eq!(replace_clean_sales(&conn, &clean).unwrap(), 2);

        let stored = get_clean_sales(&conn).unwrap();
        assert_eq!(stored, clean);
    }

    #[test]
    fn test_load_sales_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Time,Equipment,Channel,Amount").unwrap();
        writeln!(file, "2023-11-01 08:30:00,【2】烘衣機,投幣,10元").unwrap();
        writeln!(file, "2023-11-01 09:00:00,飲料販賣機,電子支付,25元").unwrap();
        file.flush().unwrap();

        let records = load_sales_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].equipment, "飲料販賣機");
        assert_eq!(sql_time::format(&records[0].time), "2023-11-01 08:30:00");
    }

    #[test]
    fn test_load_sales_csv_bad_time() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Time,Equipment,Channel,Amount").unwrap();
        writeln!(file, "not a time,【2】烘衣機,投幣,10元").unwrap();
        file.flush().unwrap();

        assert!(load_sales_csv(file.path()).is_err());
    }

    #[test]
    fn test_event_log() {
        let conn = setup();

        let event = Event::new(
            "day_collected",
            "sales_day",
            "2023/11/01",
            serde_json::json!({"rows": 12}),
            "test_actor",
        );

        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "sales_day", "2023/11/01").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "day_collected");
        assert_eq!(events[0].actor, "test_actor");
        assert_eq!(events[0].data["rows"], 12);
    }

    #[test]
    fn test_insert_day_stores_rows_and_event_together() {
        let conn = setup();
        let records = vec![create_test_sale("2023/11/01 08:30", "【2】烘衣機", "10點")];
        let event = Event::new("day_collected", "sales_day", "2023/11/01", serde_json::json!({"rows": 1}), "test_actor");

        assert_eq!(insert_day(&conn, &records, &event).unwrap(), 1);
        assert_eq!(verify_count(&conn).unwrap(), 1);
        assert_eq!(get_events_for_entity(&conn, "sales_day", "2023/11/01").unwrap().len(), 1);
    }

    #[test]
    fn test_insert_day_rolls_back_rows_when_event_fails() {
        let conn = setup();
        let event = Event::new("day_collected", "sales_day", "2023/11/01", serde_json::json!({"rows": 2}), "test_actor");
        insert_event(&conn, &event).unwrap();

        // Same event_id again violates the UNIQUE constraint
        let records = vec![
            create_test_sale("2023/11/01 08:30", "【1上】洗衣機 大容量", "60元"),
            create_test_sale("2023/11/01 09:00", "【2】烘衣機", "10點"),
        ];
        assert!(insert_day(&conn, &records, &event).is_err());

        assert_eq!(verify_count(&conn).unwrap(), 0);
        assert!(cached_dates(&conn).unwrap().is_empty());
        println!("✅ Rolled back day without audit entry");
    }
}
