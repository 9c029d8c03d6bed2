use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::parser::record::OptionRecord;

pub const DEFAULT_DB_PATH: &str = "data/options.sqlite";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS options (
            id            INTEGER PRIMARY KEY,
            contract_name TEXT NOT NULL,
            last_trade    TEXT NOT NULL DEFAULT '',
            strike        REAL NOT NULL DEFAULT 0,
            last_price    REAL NOT NULL DEFAULT 0,
            bid           REAL NOT NULL DEFAULT 0,
            ask           REAL NOT NULL DEFAULT 0,
            volume        INTEGER NOT NULL DEFAULT 0,
            open_interest INTEGER NOT NULL DEFAULT 0,
            implied_vol   TEXT,
            symbol        TEXT NOT NULL DEFAULT '',
            expiration    TEXT,
            option_type   TEXT NOT NULL CHECK(option_type IN ('C','P')),
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_options_contract_trade
            ON options(contract_name, last_trade);
        ",
    )?;
    Ok(())
}

/// Insert one batch inside a single transaction. A duplicate
/// (contract_name, last_trade) pair fails the whole batch; callers log
/// and drop it. An unparseable last_trade is stored as '' rather than
/// NULL so duplicate sentinel rows still collide under the unique index.
pub fn insert_options(conn: &Connection, batch: &[OptionRecord]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO options
             (contract_name, last_trade, strike, last_price, bid, ask,
              volume, open_interest, implied_vol, symbol, expiration, option_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for r in batch {
            stmt.execute(rusqlite::params![
                r.contract_name,
                r.last_trade
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                r.strike,
                r.last_price,
                r.bid,
                r.ask,
                r.volume,
                r.open_interest,
                r.implied_vol,
                r.symbol,
                r.expiration.map(|d| d.format("%Y-%m-%d").to_string()),
                r.option_type.as_str(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub contracts: usize,
    pub symbols: usize,
    pub expirations: usize,
    pub calls: usize,
    pub puts: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let contracts: usize = conn.query_row("SELECT COUNT(*) FROM options", [], |r| r.get(0))?;
    let symbols: usize = conn.query_row(
        "SELECT COUNT(DISTINCT symbol) FROM options WHERE symbol != ''",
        [],
        |r| r.get(0),
    )?;
    let expirations: usize = conn.query_row(
        "SELECT COUNT(DISTINCT expiration) FROM options WHERE expiration IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let calls: usize = conn.query_row(
        "SELECT COUNT(*) FROM options WHERE option_type = 'C'",
        [],
        |r| r.get(0),
    )?;
    let puts: usize = conn.query_row(
        "SELECT COUNT(*) FROM options WHERE option_type = 'P'",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        contracts,
        symbols,
        expirations,
        calls,
        puts,
    })
}

// ── Tests ──
