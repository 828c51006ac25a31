//! Transmission Store - SQLite-backed raw history and latest view
//!
//! Every ingested transmission is written twice, inside one transaction:
//! - appended to `transmission_history` (immutable, identity assigned here)
//! - upserted into `latest_transmissions` (one row per device, replaced)
//!
//! Reads return [`TransmissionRecord`]s annotated with their age at read
//! time. The decoding reads pipe each row through a [`TransmissionDecoder`]
//! and apply the configured [`FailurePolicy`] to rows that fail.
//!
//! # Ordering
//!
//! - `read_latest`: insertion order of each device's most recent upsert
//! - `read_history`: ascending `sequence_id`

use chrono::{DateTime, Utc};
use fieldwatch_core::clock::age_seconds;
use fieldwatch_core::{
    Clock, FailurePolicy, NormalizedReading, Source, StorageConfig, SystemClock,
    TransmissionRecord,
};
use fieldwatch_parser::TransmissionDecoder;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::error::{Result, StoreError};

/// Observability counters for the store
#[derive(Debug, Default)]
pub struct StoreMetrics {
    appended_total: AtomicU64,
    decode_drops_total: AtomicU64,
}

impl StoreMetrics {
    /// Transmissions appended since the store was opened
    pub fn appended_total(&self) -> u64 {
        self.appended_total.load(Ordering::Relaxed)
    }

    /// Rows dropped from batch reads because they failed to decode
    pub fn decode_drops_total(&self) -> u64 {
        self.decode_drops_total.load(Ordering::Relaxed)
    }
}

/// Raw columns of a stored row, before timestamp conversion
type RawRow = (Option<i64>, String, i64, String, String);

/// Persistent transmission store
pub struct TransmissionStore {
    /// SQLite connection; one operation holds it at a time
    conn: Mutex<Connection>,
    decoder: TransmissionDecoder,
    clock: Arc<dyn Clock>,
    failure_policy: FailurePolicy,
    metrics: StoreMetrics,
}

impl TransmissionStore {
    /// Create or open a store at the path named in `config`
    pub fn open(config: &StorageConfig, decoder: TransmissionDecoder) -> Result<Self> {
        let path = config.path.as_path();

        info!(path = %path.display(), "Opening transmission store");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(config.busy_timeout())?;

        Self::from_connection(conn, decoder, config.failure_policy)
    }

    /// Open a private in-memory store
    pub fn open_in_memory(decoder: TransmissionDecoder) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, decoder, FailurePolicy::default())
    }

    fn from_connection(
        conn: Connection,
        decoder: TransmissionDecoder,
        failure_policy: FailurePolicy,
    ) -> Result<Self> {
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            decoder,
            clock: Arc::new(SystemClock),
            failure_policy,
            metrics: StoreMetrics::default(),
        })
    }

    /// Replace the clock used to compute row age
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the batch decode failure policy
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Initialize database schema.
    ///
    /// `feeds` and `streams` are kept for forward compatibility; nothing in
    /// this crate reads or writes them.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS transmission_history (
                sequence_id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                time_ms INTEGER NOT NULL,
                payload TEXT NOT NULL,
                source TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS latest_transmissions (
                device_id TEXT PRIMARY KEY,
                time_ms INTEGER NOT NULL,
                payload TEXT NOT NULL,
                source TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS feeds (
                id TEXT PRIMARY KEY,
                name TEXT
            );

            CREATE TABLE IF NOT EXISTS streams (
                id TEXT PRIMARY KEY,
                feed_id INTEGER NOT NULL,
                transmission_id INTEGER NOT NULL,
                data TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_history_device ON transmission_history(device_id);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Record a transmission.
    ///
    /// Trailing whitespace is trimmed from `payload`. The latest-view upsert
    /// and the history insert commit together or not at all.
    ///
    /// # Returns
    /// * `Ok(u64)` - The history `sequence_id` assigned to this transmission
    pub fn append(
        &self,
        device_id: &str,
        time: DateTime<Utc>,
        payload: &str,
        source: Source,
    ) -> Result<u64> {
        let payload = payload.trim_end();
        let time_ms = time.timestamp_millis();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT OR REPLACE INTO latest_transmissions (device_id, time_ms, payload, source)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![device_id, time_ms, payload, source.as_str()],
        )?;

        tx.execute(
            r#"
            INSERT INTO transmission_history (device_id, time_ms, payload, source)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![device_id, time_ms, payload, source.as_str()],
        )?;

        let sequence_id = tx.last_insert_rowid() as u64;

        tx.commit()?;

        self.metrics.appended_total.fetch_add(1, Ordering::Relaxed);

        debug!(
            device_id = %device_id,
            sequence_id = sequence_id,
            source = %source,
            "Transmission appended"
        );

        Ok(sequence_id)
    }

    /// Latest transmission for every known device
    pub fn read_latest(&self) -> Result<Vec<TransmissionRecord>> {
        self.query_records(
            r#"
            SELECT NULL, device_id, time_ms, payload, source
            FROM latest_transmissions
            ORDER BY rowid ASC
            "#,
            [],
        )
    }

    /// Every transmission ever appended, oldest first.
    ///
    /// Unbounded; use [`iterate_history`](Self::iterate_history) to page.
    pub fn read_history(&self) -> Result<Vec<TransmissionRecord>> {
        self.query_records(
            r#"
            SELECT sequence_id, device_id, time_ms, payload, source
            FROM transmission_history
            ORDER BY sequence_id ASC
            "#,
            [],
        )
    }

    /// History rows starting from a sequence number
    ///
    /// # Arguments
    /// * `from_sequence_id` - Starting sequence number (inclusive)
    /// * `limit` - Maximum number of rows to return
    pub fn iterate_history(
        &self,
        from_sequence_id: u64,
        limit: usize,
    ) -> Result<Vec<TransmissionRecord>> {
        // SQLite rowids never exceed i64::MAX
        let Ok(from) = i64::try_from(from_sequence_id) else {
            return Ok(Vec::new());
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.query_records(
            r#"
            SELECT sequence_id, device_id, time_ms, payload, source
            FROM transmission_history
            WHERE sequence_id >= ?1
            ORDER BY sequence_id ASC
            LIMIT ?2
            "#,
            params![from, limit],
        )
    }

    /// Decoded readings for the latest view
    pub fn read_and_decode_latest(&self) -> Result<Vec<NormalizedReading>> {
        let rows = self.read_latest()?;
        self.decode_batch(rows)
    }

    /// Decoded readings for the full history
    pub fn read_and_decode_history(&self) -> Result<Vec<NormalizedReading>> {
        let rows = self.read_history()?;
        self.decode_batch(rows)
    }

    fn query_records<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<TransmissionRecord>> {
        let raw_rows: Vec<RawRow> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params, raw_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let now = self.clock.now();
        raw_rows
            .into_iter()
            .map(|(sequence_id, device_id, time_ms, payload, source)| -> Result<TransmissionRecord> {
                let time = DateTime::from_timestamp_millis(time_ms)
                    .ok_or(StoreError::InvalidTimestamp(time_ms))?;
                Ok(TransmissionRecord {
                    sequence_id: sequence_id.map(|id| id as u64),
                    device_id,
                    time,
                    payload,
                    source,
                    age_seconds: age_seconds(time, now),
                })
            })
            .collect()
    }

    /// Decode a batch of rows under the configured failure policy.
    ///
    /// Rows with no reading are skipped. Every dropped row is logged with
    /// its device id and failure kind.
    pub fn decode_batch(&self, rows: Vec<TransmissionRecord>) -> Result<Vec<NormalizedReading>> {
        let mut readings = Vec::with_capacity(rows.len());

        for row in rows {
            match self.decoder.decode(&row) {
                Ok(Some(reading)) => readings.push(reading),
                Ok(None) => {
                    debug!(
                        device_id = %row.device_id,
                        sequence_id = ?row.sequence_id,
                        "Transmission carries no reading"
                    );
                }
                Err(err) => match self.failure_policy {
                    FailurePolicy::Drop => {
                        self.metrics.decode_drops_total.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            device_id = %row.device_id,
                            sequence_id = ?row.sequence_id,
                            kind = err.kind(),
                            error = %err,
                            "Dropping undecodable transmission"
                        );
                    }
                    FailurePolicy::Abort => {
                        error!(
                            device_id = %row.device_id,
                            sequence_id = ?row.sequence_id,
                            kind = err.kind(),
                            error = %err,
                            "Aborting batch on undecodable transmission"
                        );
                        return Err(StoreError::Decode {
                            device_id: row.device_id,
                            source: err,
                        });
                    }
                },
            }
        }

        Ok(readings)
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Execute raw SQL for testing purposes only
    ///
    /// **WARNING**: bypasses the append path. Only for tests that need rows
    /// the public API cannot produce.
    #[doc(hidden)]
    pub fn __test_execute_raw_sql(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<usize> {
        Ok(self.lock()?.execute(sql, params)?)
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

/// Open a store from a file path with default settings
pub fn open_path(path: impl AsRef<Path>, decoder: TransmissionDecoder) -> Result<TransmissionStore> {
    let config = StorageConfig {
        path: path.as_ref().to_path_buf(),
        ..StorageConfig::default()
    };
    TransmissionStore::open(&config, decoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use fieldwatch_core::{DeviceRegistry, FixedClock};
    use fieldwatch_parser::ParseError;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn test_store() -> TransmissionStore {
        TransmissionStore::open_in_memory(TransmissionDecoder::new(DeviceRegistry::default()))
            .unwrap()
            .with_clock(Arc::new(FixedClock(now())))
    }

    #[test]
    fn test_store_creation_on_disk() {
        let db_path = std::env::temp_dir()
            .join(format!("fieldwatch_{}", uuid::Uuid::new_v4()))
            .join("monitor.db");

        {
            let store = open_path(&db_path, TransmissionDecoder::default()).unwrap();
            store
                .append("dev-1", now(), "1,A2,0,0,0,0", Source::RockBlock)
                .unwrap();
        }

        // Reopen and check the row survived
        let store = open_path(&db_path, TransmissionDecoder::default()).unwrap();
        assert_eq!(store.read_history().unwrap().len(), 1);

        if let Some(parent) = db_path.parent() {
            std::fs::remove_dir_all(parent).ok();
        }
    }

    #[test]
    fn test_append_then_read_latest() {
        let store = test_store();

        store
            .append("dev-1", now(), "3.9,80,1,2  \n", Source::Particle)
            .unwrap();

        let latest = store.read_latest().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].device_id, "dev-1");
        assert_eq!(latest[0].payload, "3.9,80,1,2");
        assert_eq!(latest[0].source, "particle");
        assert_eq!(latest[0].sequence_id, None);
        assert_eq!(latest[0].time, now());
    }

    #[test]
    fn test_append_replaces_latest_and_grows_history() {
        let store = test_store();

        let first = store
            .append("dev-1", now() - Duration::minutes(10), "1,2,3,4", Source::Particle)
            .unwrap();
        let second = store
            .append("dev-1", now(), "5,6,7,8", Source::Particle)
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let latest = store.read_latest().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].payload, "5,6,7,8");

        let history = store.read_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].payload, "1,2,3,4");
        assert_eq!(history[0].sequence_id, Some(1));
        assert_eq!(history[1].sequence_id, Some(2));
        assert_eq!(store.metrics().appended_total(), 2);
    }

    #[test]
    fn test_age_computed_at_read_time() {
        let store = test_store();
        store
            .append("dev-1", now() - Duration::seconds(90), "1,2,3,4", Source::Particle)
            .unwrap();

        assert_eq!(store.read_latest().unwrap()[0].age_seconds, 90.0);

        let store = store.with_clock(Arc::new(FixedClock(now() + Duration::seconds(30))));
        assert_eq!(store.read_latest().unwrap()[0].age_seconds, 120.0);
    }

    #[test]
    fn test_latest_order_follows_most_recent_upsert() {
        let store = test_store();
        store.append("a", now(), "1,2,3,4", Source::Particle).unwrap();
        store.append("b", now(), "1,2,3,4", Source::Particle).unwrap();
        store.append("a", now(), "5,6,7,8", Source::Particle).unwrap();

        let ids: Vec<_> = store
            .read_latest()
            .unwrap()
            .into_iter()
            .map(|r| r.device_id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_iterate_history() {
        let store = test_store();
        for i in 1..=5 {
            store
                .append(&format!("dev-{}", i), now(), "1,2,3,4", Source::Particle)
                .unwrap();
        }

        let rows = store.iterate_history(2, 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].sequence_id, Some(2));
        assert_eq!(rows[2].sequence_id, Some(4));
    }

    #[test]
    fn test_iterate_history_cursor_past_end() {
        let store = test_store();
        for i in 1..=3 {
            store
                .append(&format!("dev-{}", i), now(), "1,2,3,4", Source::Particle)
                .unwrap();
        }

        assert!(store.iterate_history(u64::MAX, 10).unwrap().is_empty());
        assert!(store.iterate_history(i64::MAX as u64 + 1, 10).unwrap().is_empty());
        assert!(store.iterate_history(4, 10).unwrap().is_empty());
    }

    #[test]
    fn test_iterate_history_unbounded_limit() {
        let store = test_store();
        for i in 1..=3 {
            store
                .append(&format!("dev-{}", i), now(), "1,2,3,4", Source::Particle)
                .unwrap();
        }

        let rows = store.iterate_history(2, usize::MAX).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sequence_id, Some(2));
        assert_eq!(rows[1].sequence_id, Some(3));
    }

    #[test]
    fn test_failed_append_writes_nothing() {
        let store = test_store();
        store
            .__test_execute_raw_sql("DROP TABLE transmission_history", &[])
            .unwrap();

        let result = store.append("dev-1", now(), "1,2,3,4", Source::Particle);
        assert!(matches!(result, Err(StoreError::DatabaseError(_))));

        // The latest upsert ran first and must have been rolled back
        assert!(store.read_latest().unwrap().is_empty());
    }

    #[test]
    fn test_decode_drops_failed_rows() {
        let store = test_store();
        store
            .append("+15550001111", now(), "unregistered", Source::Twilio)
            .unwrap();
        store
            .append("300234010753370", now(), "7", Source::RockBlock)
            .unwrap();
        store
            .append("200051000e51353432393339", now(), "3.9,80,1,2", Source::Particle)
            .unwrap();

        let readings = store.read_and_decode_latest().unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].display_name, "Jacob");
        assert_eq!(store.metrics().decode_drops_total(), 1);
    }

    #[test]
    fn test_decode_unknown_source_row_is_dropped() {
        let store = test_store();
        store
            .__test_execute_raw_sql(
                "INSERT INTO latest_transmissions (device_id, time_ms, payload, source) VALUES (?1, ?2, ?3, ?4)",
                &[&"dev-x", &now().timestamp_millis(), &"1,2", &"iridium"],
            )
            .unwrap();
        store.append("dev-1", now(), "1,2,3,4", Source::Particle).unwrap();

        let latest = store.read_latest().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].source, "iridium");

        let readings = store.read_and_decode_latest().unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].id, "dev-1");
    }

    #[test]
    fn test_abort_policy_surfaces_first_failure() {
        let store = test_store().with_failure_policy(FailurePolicy::Abort);
        store.append("dev-1", now(), "1,2,3,4", Source::Particle).unwrap();
        store
            .append("+15550001111", now(), "hello", Source::Twilio)
            .unwrap();

        match store.read_and_decode_history() {
            Err(StoreError::Decode { device_id, source }) => {
                assert_eq!(device_id, "+15550001111");
                assert_eq!(source, ParseError::UnknownDevice("+15550001111".to_string()));
            }
            other => panic!("expected decode failure, got {:?}", other),
        }
    }
}
