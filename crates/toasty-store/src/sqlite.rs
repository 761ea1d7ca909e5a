//! SQLite-based store implementation

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use toasty_util::{BedNum, CustomerId, FobNum, SessionId};
use tracing::{debug, warn};

use crate::{
    AuditEvent, AuditEventType, AuditStore, Bed, BedStore, Customer, CustomerStore, Keyfob,
    KeyfobStore, NewCustomer, NewSession, Session, SessionReportRow, SessionStore, Store,
    StoreError, StoreResult,
};

/// Parking slot for the bed being relabeled during a swap
const SWAP_SLOT: i64 = -1;

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS customer (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                status INTEGER NOT NULL,
                level INTEGER NOT NULL,
                fob_num INTEGER NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS keyfob (
                fob_num INTEGER NOT NULL PRIMARY KEY,
                admin INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bed (
                bed_num INTEGER NOT NULL PRIMARY KEY,
                level INTEGER NOT NULL,
                max_time INTEGER NOT NULL,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY,
                customer_id INTEGER NOT NULL,
                bed_num INTEGER NOT NULL,
                time_stamp INTEGER NOT NULL,
                session_time INTEGER NOT NULL,
                cancelled INTEGER NOT NULL DEFAULT 0
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_session_customer
                ON session(customer_id, cancelled, time_stamp);
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: CustomerId::new(row.get(0)?),
        name: row.get(1)?,
        phone: row.get(2)?,
        status: row.get(3)?,
        level: row.get(4)?,
        fob_num: FobNum::new(row.get::<_, i64>(5)? as u64),
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: SessionId::new(row.get(0)?),
        customer_id: CustomerId::new(row.get(1)?),
        bed_num: BedNum::new(row.get(2)?),
        time_stamp: row.get(3)?,
        session_time: row.get(4)?,
        cancelled: row.get(5)?,
    })
}

fn bed_from_row(row: &Row<'_>) -> rusqlite::Result<Bed> {
    Ok(Bed {
        bed_num: BedNum::new(row.get(0)?),
        level: row.get(1)?,
        max_time: row.get(2)?,
        name: row.get(3)?,
    })
}

impl CustomerStore for SqliteStore {
    fn create_customer(&self, customer: &NewCustomer) -> StoreResult<CustomerId> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO customer (name, phone, status, level, fob_num) VALUES (?, ?, ?, ?, ?)",
            params![
                customer.name,
                customer.phone,
                customer.status,
                customer.level,
                customer.fob_num.get() as i64
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict(format!("fob {} already assigned", customer.fob_num))
            } else {
                e.into()
            }
        })?;

        let id = CustomerId::new(conn.last_insert_rowid());
        debug!(customer_id = %id, fob_num = %customer.fob_num, "Customer created");
        Ok(id)
    }

    fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let conn = self.lock()?;

        let customer = conn
            .query_row(
                "SELECT id, name, phone, status, level, fob_num FROM customer WHERE id = ?",
                [id.get()],
                customer_from_row,
            )
            .optional()?;

        Ok(customer)
    }

    fn find_customer_by_fob(&self, fob_num: FobNum) -> StoreResult<Option<Customer>> {
        let conn = self.lock()?;

        let customer = conn
            .query_row(
                "SELECT id, name, phone, status, level, fob_num FROM customer WHERE fob_num = ?",
                [fob_num.get() as i64],
                customer_from_row,
            )
            .optional()?;

        Ok(customer)
    }

    fn set_customer_status(&self, id: CustomerId, status: bool) -> StoreResult<()> {
        let conn = self.lock()?;

        let updated = conn.execute(
            "UPDATE customer SET status = ? WHERE id = ?",
            params![status, id.get()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("customer {}", id)));
        }

        debug!(customer_id = %id, status, "Customer status set");
        Ok(())
    }
}

impl KeyfobStore for SqliteStore {
    fn register_keyfob(&self, keyfob: Keyfob) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO keyfob (fob_num, admin) VALUES (?, ?)",
            params![keyfob.fob_num.get() as i64, keyfob.admin],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict(format!("fob {} already registered", keyfob.fob_num))
            } else {
                e.into()
            }
        })?;

        debug!(fob_num = %keyfob.fob_num, admin = keyfob.admin, "Keyfob registered");
        Ok(())
    }

    fn available_customer_keyfobs(&self) -> StoreResult<Vec<FobNum>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT keyfob.fob_num
            FROM keyfob
            LEFT OUTER JOIN customer ON keyfob.fob_num = customer.fob_num
            WHERE customer.id IS NULL AND keyfob.admin = 0
            ORDER BY keyfob.fob_num
            "#,
        )?;

        let fobs = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .map(|r| r.map(|n| FobNum::new(n as u64)))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(fobs)
    }
}

impl SessionStore for SqliteStore {
    fn create_session(&self, session: &NewSession) -> StoreResult<SessionId> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO session (customer_id, bed_num, time_stamp, session_time, cancelled)
            VALUES (?, ?, ?, ?, 0)
            "#,
            params![
                session.customer_id.get(),
                session.bed_num.get(),
                session.time_stamp,
                session.session_time
            ],
        )?;

        let id = SessionId::new(conn.last_insert_rowid());
        debug!(session_id = %id, customer_id = %session.customer_id, "Session row written");
        Ok(id)
    }

    fn find_most_recent_session(&self, customer_id: CustomerId) -> StoreResult<Option<Session>> {
        let conn = self.lock()?;

        let session = conn
            .query_row(
                r#"
                SELECT id, customer_id, bed_num, time_stamp, session_time, cancelled
                FROM session
                WHERE customer_id = ? AND cancelled = 0
                ORDER BY time_stamp DESC, id DESC
                LIMIT 1
                "#,
                [customer_id.get()],
                session_from_row,
            )
            .optional()?;

        Ok(session)
    }

    fn last_cancelled_session_time(&self, customer_id: CustomerId) -> StoreResult<Option<i64>> {
        let conn = self.lock()?;

        let time_stamp = conn
            .query_row(
                r#"
                SELECT time_stamp
                FROM session
                WHERE customer_id = ? AND cancelled = 1
                ORDER BY time_stamp DESC
                LIMIT 1
                "#,
                [customer_id.get()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(time_stamp)
    }

    fn mark_session_cancelled(&self, id: SessionId) -> StoreResult<()> {
        let conn = self.lock()?;

        let updated = conn.execute("UPDATE session SET cancelled = 1 WHERE id = ?", [id.get()])?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("session {}", id)));
        }

        debug!(session_id = %id, "Session marked cancelled");
        Ok(())
    }

    fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<SessionReportRow>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT session.id, session.customer_id, session.bed_num, session.time_stamp,
                   session.session_time, session.cancelled, customer.name
            FROM session
            INNER JOIN customer ON session.customer_id = customer.id
            ORDER BY session.id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(SessionReportRow {
                    session: session_from_row(row)?,
                    customer_name: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

impl BedStore for SqliteStore {
    fn create_bed(&self, bed: &Bed) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO bed (bed_num, level, max_time, name) VALUES (?, ?, ?, ?)",
            params![bed.bed_num.get(), bed.level, bed.max_time, bed.name],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Conflict(format!("bed {} already exists", bed.bed_num))
            } else {
                e.into()
            }
        })?;

        Ok(())
    }

    fn upsert_bed(&self, bed: &Bed) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO bed (bed_num, level, max_time, name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(bed_num)
            DO UPDATE SET level = excluded.level,
                          max_time = excluded.max_time,
                          name = excluded.name
            "#,
            params![bed.bed_num.get(), bed.level, bed.max_time, bed.name],
        )?;

        debug!(bed_num = %bed.bed_num, "Bed upserted");
        Ok(())
    }

    fn get_bed(&self, bed_num: BedNum) -> StoreResult<Option<Bed>> {
        let conn = self.lock()?;

        let bed = conn
            .query_row(
                "SELECT bed_num, level, max_time, name FROM bed WHERE bed_num = ?",
                [bed_num.get()],
                bed_from_row,
            )
            .optional()?;

        Ok(bed)
    }

    fn list_beds(&self) -> StoreResult<Vec<Bed>> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT bed_num, level, max_time, name FROM bed ORDER BY bed_num")?;
        let beds = stmt
            .query_map([], bed_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(beds)
    }

    fn beds_accessible_at_level(&self, level: i64) -> StoreResult<Vec<Bed>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT bed_num, level, max_time, name FROM bed WHERE level <= ? ORDER BY bed_num",
        )?;
        let beds = stmt
            .query_map([level], bed_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(beds)
    }

    fn swap_bed_nums(&self, a: BedNum, b: BedNum) -> StoreResult<()> {
        if a == b {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let moved = tx.execute(
            "UPDATE bed SET bed_num = ? WHERE bed_num = ?",
            params![SWAP_SLOT, a.get()],
        )?;
        if moved == 0 {
            return Err(StoreError::NotFound(format!("bed {}", a)));
        }

        let moved = tx.execute(
            "UPDATE bed SET bed_num = ? WHERE bed_num = ?",
            params![a.get(), b.get()],
        )?;
        if moved == 0 {
            return Err(StoreError::NotFound(format!("bed {}", b)));
        }

        tx.execute(
            "UPDATE bed SET bed_num = ? WHERE bed_num = ?",
            params![b.get(), SWAP_SLOT],
        )?;

        tx.commit()?;
        debug!(a = %a, b = %b, "Bed numbers swapped");
        Ok(())
    }
}

impl AuditStore for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.lock()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| toasty_util::now());
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }
}

impl Store for SqliteStore {
    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
