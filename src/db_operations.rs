use rusqlite::{params, Connection, OptionalExtension};
use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::constants::SQLITE_BUSY_TIMEOUT_SECS;
use crate::data_types::RegistrationEntry;

/// Which restaurant each chat is looking at.
#[derive(Debug, Clone)]
pub struct RegistrationDb {
    db_path: Arc<PathBuf>,
}

impl RegistrationDb {
    pub fn open(db_path: impl Into<PathBuf>) -> rusqlite::Result<Self> {
        let db = RegistrationDb {
            db_path: Arc::new(db_path.into()),
        };
        db.check_or_create_db_tables()?;
        Ok(db)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(self.db_path.as_path())?;
        conn.busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))?;
        Ok(conn)
    }

    fn check_or_create_db_tables(&self) -> rusqlite::Result<()> {
        let conn = self.connect()?;

        conn.prepare(
            "create table if not exists registrations (
            chat_id integer not null unique primary key,
            restaurant_id text not null
            )",
        )?
        .execute([])?;

        Ok(())
    }

    pub fn set_restaurant(&self, chat_id: i64, restaurant_id: &str) -> rusqlite::Result<()> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare_cached(
            "replace into registrations (chat_id, restaurant_id)
                values (?1, ?2)",
        )?;

        stmt.execute(params![chat_id, restaurant_id])?;

        Ok(())
    }

    pub fn get_registration(&self, chat_id: i64) -> rusqlite::Result<Option<RegistrationEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare_cached("select chat_id, restaurant_id from registrations where chat_id = ?1")?;

        stmt.query_row(params![chat_id], |row| {
            Ok(RegistrationEntry {
                chat_id: row.get(0)?,
                restaurant_id: row.get(1)?,
            })
        })
        .optional()
    }

    pub fn count_registrations(&self) -> rusqlite::Result<i64> {
        let conn = self.connect()?;
        conn.query_row("select count(*) from registrations", [], |row| row.get(0))
    }
}
