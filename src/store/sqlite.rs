use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{EddyError, Result};
use crate::store::BlobStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| EddyError::Other(format!("Storage connection poisoned: {}", e)))
    }
}

impl BlobStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;

        let data = conn
            .query_row(
                "SELECT data FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;

        Ok(data)
    }

    fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        let conn = self.lock()?;

        // Single statement, so the old row stays visible until the new one commits.
        conn.execute(
            "INSERT INTO blobs (key, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![key, data, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}
