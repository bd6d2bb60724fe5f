//! SQLite sink.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection};

use super::images::reencode;
use super::{Sink, WriteReport};
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::{ContentKind, Extraction, Table};

/// How long a write waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Table name and schema for each content kind.
fn schema(kind: ContentKind) -> (&'static str, &'static str) {
    match kind {
        ContentKind::Text => (
            "extracted_text",
            "CREATE TABLE IF NOT EXISTS extracted_text (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_type TEXT NOT NULL,
                content TEXT
            )",
        ),
        ContentKind::Links => (
            "extracted_links",
            "CREATE TABLE IF NOT EXISTS extracted_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_type TEXT NOT NULL,
                link TEXT
            )",
        ),
        ContentKind::Images => (
            "extracted_images",
            "CREATE TABLE IF NOT EXISTS extracted_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_type TEXT NOT NULL,
                image_blob BLOB
            )",
        ),
        ContentKind::Tables => (
            "extracted_tables",
            "CREATE TABLE IF NOT EXISTS extracted_tables (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_type TEXT NOT NULL,
                table_data TEXT
            )",
        ),
        ContentKind::Metadata => (
            "extracted_metadata",
            "CREATE TABLE IF NOT EXISTS extracted_metadata (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_type TEXT NOT NULL,
                key TEXT,
                value TEXT
            )",
        ),
    }
}

/// Serialize a table to one text blob: rows separated by newlines, cells by
/// commas, no escaping.
///
/// Cells that themselves contain `,` or `\n` do not survive
/// [`deserialize_table`], and neither does a table whose only row is a single
/// empty cell.
pub fn serialize_table(table: &Table) -> String {
    table
        .rows
        .iter()
        .map(|row| row.join(","))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inverse of [`serialize_table`] for tables without delimiter characters in
/// their cells. An empty blob is a table with no rows.
pub fn deserialize_table(blob: &str) -> Table {
    if blob.is_empty() {
        return Table::new();
    }
    Table::from_rows(blob.split('\n').map(|line| line.split(',')))
}

/// Writes extraction results into five SQLite tables, each row tagged with the
/// source format.
///
/// The connection is held for the life of the sink. [`SqliteSink::close`]
/// releases it and reports errors; dropping the sink also closes it but
/// discards them.
#[derive(Debug)]
pub struct SqliteSink {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteSink {
    /// Open (or create) a database file and make sure all five tables exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        log::debug!("opened database {}", path.display());
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    /// Use an existing connection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let path = conn.path().filter(|p| !p.is_empty()).map(PathBuf::from);
        Self::init(conn, path)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        let mut sink = Self { conn, path };
        for kind in ContentKind::ALL {
            sink.ensure_target(kind)?;
        }
        Ok(sink)
    }

    /// Change how long writes wait on a locked database.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Database file, or `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of rows stored for `kind` from documents of `format`.
    pub fn row_count(&self, kind: ContentKind, format: Format) -> Result<usize> {
        let (table, _) = schema(kind);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE file_type = ?1", table);
        let count: i64 = self.conn.query_row(&sql, params![format.tag()], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Stored links for `format`, in insertion order.
    pub fn load_links(&self, format: Format) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT link FROM extracted_links WHERE file_type = ?1 ORDER BY id")?;
        let links = stmt
            .query_map(params![format.tag()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(links)
    }

    /// Stored tables for `format`, deserialized, in insertion order.
    pub fn load_tables(&self, format: Format) -> Result<Vec<Table>> {
        let mut stmt = self
            .conn
            .prepare("SELECT table_data FROM extracted_tables WHERE file_type = ?1 ORDER BY id")?;
        let blobs = stmt
            .query_map(params![format.tag()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(blobs.iter().map(|blob| deserialize_table(blob)).collect())
    }

    /// Stored metadata rows for `format`, in insertion order.
    pub fn load_metadata(&self, format: Format) -> Result<Vec<(String, Option<String>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM extracted_metadata WHERE file_type = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![format.tag()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Close the connection, reporting any error.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::from(e))
    }
}

impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn ensure_target(&mut self, kind: ContentKind) -> Result<()> {
        let (_, ddl) = schema(kind);
        self.conn.execute_batch(ddl)?;
        Ok(())
    }

    fn write(&mut self, format: Format, extraction: &Extraction) -> Result<WriteReport> {
        let tag = format.tag();
        let mut report = WriteReport::new(extraction.kind());
        let tx = self.conn.transaction()?;

        match extraction {
            Extraction::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    tx.execute(
                        "INSERT INTO extracted_text (file_type, content) VALUES (?1, ?2)",
                        params![tag, text],
                    )?;
                    report.written = 1;
                }
            }
            Extraction::Links(links) => {
                for link in links {
                    tx.execute(
                        "INSERT INTO extracted_links (file_type, link) VALUES (?1, ?2)",
                        params![tag, link],
                    )?;
                }
                report.written = links.len();
            }
            Extraction::Images(images) => {
                for (idx, blob) in images.iter().enumerate() {
                    match reencode(blob) {
                        Ok(encoded) => {
                            tx.execute(
                                "INSERT INTO extracted_images (file_type, image_blob) VALUES (?1, ?2)",
                                params![tag, encoded.data],
                            )?;
                            report.written += 1;
                        }
                        Err(e) => {
                            log::warn!("skipping {} image {}: {}", format, idx + 1, e);
                            report.skip(idx + 1, e);
                        }
                    }
                }
            }
            Extraction::Tables(tables) => {
                for table in tables {
                    tx.execute(
                        "INSERT INTO extracted_tables (file_type, table_data) VALUES (?1, ?2)",
                        params![tag, serialize_table(table)],
                    )?;
                }
                report.written = tables.len();
            }
            Extraction::Metadata(metadata) => {
                for (key, value) in metadata.iter() {
                    tx.execute(
                        "INSERT INTO extracted_metadata (file_type, key, value) VALUES (?1, ?2, ?3)",
                        params![tag, key, value],
                    )?;
                }
                report.written = metadata.len();
            }
        }

        tx.commit()?;
        Ok(report)
    }

    fn clear(&mut self, format: Format) -> Result<()> {
        let tx = self.conn.transaction()?;
        for kind in ContentKind::ALL {
            let (table, _) = schema(kind);
            tx.execute(
                &format!("DELETE FROM {} WHERE file_type = ?1", table),
                params![format.tag()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
