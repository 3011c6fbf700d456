use anyhow::Result;
use log::info;
use rusqlite::{params, Connection};
use crate::capture::record::{FlowRecord, Ports, NONE};

pub const RAW:     &str = "new_data";
pub const BLOCKED: &str = "blocked_frames";
pub const PASSED:  &str = "passed_frames";
pub const PORTS:   &str = "known_ports";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS new_data (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    domain               TEXT,
    source_ip            TEXT,
    source_port          TEXT,
    destination_ip       TEXT,
    destination_port     TEXT,
    transport_protocol   TEXT,
    application_protocol TEXT,
    verdict              TEXT
);
CREATE TABLE IF NOT EXISTS blocked_frames (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    domain               TEXT,
    source_ip            TEXT,
    source_port          TEXT,
    destination_ip       TEXT,
    destination_port     TEXT,
    transport_protocol   TEXT,
    application_protocol TEXT,
    verdict              TEXT
);
CREATE TABLE IF NOT EXISTS passed_frames (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    domain               TEXT,
    source_ip            TEXT,
    source_port          TEXT,
    destination_ip       TEXT,
    destination_port     TEXT,
    transport_protocol   TEXT,
    application_protocol TEXT,
    verdict              TEXT
);
CREATE TABLE IF NOT EXISTS known_ports (
    port     TEXT PRIMARY KEY,
    protocol TEXT NOT NULL
);
";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn insert_batch(&mut self, table: &str, records: &[&FlowRecord]) -> Result<()> {
        let sql = format!("INSERT INTO {} (domain, source_ip, source_port, \
                           destination_ip, destination_port, transport_protocol, \
                           application_protocol, verdict) \
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", table);

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                stmt.execute(params![
                    column(&record.domain),
                    column(&record.source_ip),
                    column(&record.source_port),
                    column(&record.destination_ip),
                    column(&record.destination_port),
                    column(&record.transport_protocol),
                    column(&record.application_protocol),
                    record.verdict.map(|v| v.as_str()),
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    pub fn truncate_except(&mut self, keep: &[String]) -> Result<()> {
        let tables  = self.tables()?;
        let cleared = tables.iter().filter(|t| !keep.contains(t));

        let mut n = 0;
        for table in cleared {
            self.conn.execute(&format!("DELETE FROM {}", table), [])?;
            n += 1;
        }

        info!("cleared {} of {} tables", n, tables.len());

        Ok(())
    }

    pub fn ports_empty(&self) -> Result<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM known_ports", [], |row| row.get(0),
        )?;
        Ok(n == 0)
    }

    pub fn seed_ports(&mut self, ports: &Ports) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO known_ports (port, protocol) VALUES (?1, ?2)",
            )?;
            for (port, protocol) in ports {
                stmt.execute(params![port, protocol])?;
            }
        }
        tx.commit()?;

        info!("{} known ports seeded", ports.len());

        Ok(())
    }

    pub fn known_ports(&self) -> Result<Ports> {
        let mut stmt = self.conn.prepare("SELECT port, protocol FROM known_ports")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut ports = Ports::new();
        for row in rows {
            let (port, protocol): (String, String) = row?;
            ports.insert(port, protocol);
        }

        Ok(ports)
    }

    fn tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%'",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }

    #[cfg(test)]
    pub fn scalar(&self, sql: &str) -> Result<i64> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    #[cfg(test)]
    pub fn verdicts(&self, table: &str) -> Result<Vec<Option<String>>> {
        let sql = format!("SELECT verdict FROM {} ORDER BY id", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    #[cfg(test)]
    pub fn source_ports(&self, table: &str) -> Result<Vec<Option<String>>> {
        let sql = format!("SELECT source_port FROM {} ORDER BY id", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// "none" marks an absent layer; it is stored as NULL
fn column(value: &str) -> Option<&str> {
    match value {
        NONE  => None,
        value => Some(value),
    }
}
