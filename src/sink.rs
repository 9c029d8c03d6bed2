use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::parser::record::OptionRecord;

/// Durable store for option records. The crawler only needs these two
/// operations; tests substitute their own implementation.
pub trait Sink: Send + Sync {
    /// Create the storage schema if missing. Safe to call repeatedly.
    fn ensure_schema(&self) -> Result<()>;

    /// Persist one batch in a single call. A second record with the same
    /// (contract_name, last_trade) pair surfaces as a constraint error.
    fn insert(&self, batch: &[OptionRecord]) -> Result<()>;
}

/// SQLite-backed sink. One connection is shared by every chain worker;
/// the mutex serializes the short synchronous insert calls.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(db::connect(path)?),
        })
    }
}

impl Sink for SqliteSink {
    fn ensure_schema(&self) -> Result<()> {
        db::init_schema(&self.conn.lock().unwrap())
    }

    fn insert(&self, batch: &[OptionRecord]) -> Result<()> {
        db::insert_options(&self.conn.lock().unwrap(), batch)
    }
}
