use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Result;
use crate::api::models::Contact;
use crate::config::Settings;

// Last directory seen from the server, shown while the first fetch of a session is in flight.
pub struct Storage {
    conn: Connection,
}

pub fn db_path() -> Option<PathBuf> {
    Some(Settings::data_dir()?.join("cache.sqlite"))
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let storage = Self { conn: Connection::open(path)? };
        storage.init()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let storage = Self { conn: Connection::open_in_memory()? };
        storage.init()?;
        Ok(storage)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                raw_json TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Replaces the snapshot with `contacts`, keeping server order.
    pub fn replace_contacts(&mut self, contacts: &[Contact]) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM contacts", [])?;
        for (idx, c) in contacts.iter().enumerate() {
            let raw = serde_json::to_string(c)?;
            tx.execute(
                "INSERT INTO contacts (id, position, name, updated_at, raw_json) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![c.id, idx as i64, c.display_name(), now, raw],
            )?;
        }
        tx.commit()?;
        log::debug!("stored directory snapshot of {} contacts", contacts.len());
        Ok(())
    }

    pub fn get_contacts(&self, limit: Option<usize>) -> Result<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT raw_json FROM contacts ORDER BY position ASC LIMIT ?1")?;
        let lim = limit.unwrap_or(500) as i64;
        let rows = stmt.query_map(params![lim], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            match serde_json::from_str::<Contact>(&raw?) {
                Ok(contact) => out.push(contact),
                Err(e) => log::warn!("skipping unreadable cached contact: {}", e),
            }
        }
        Ok(out)
    }
}
