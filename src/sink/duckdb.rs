//! DuckDB sink
//!
//! Stores every record as a JSON document in
//! `{dataset}.{table}(_load_id, _batch, _position, data)`.

use super::{Sink, SinkReport};
use crate::config::is_identifier;
use crate::error::{Error, Result};
use crate::types::{Batch, WriteDisposition};
use async_trait::async_trait;
use duckdb::{params, Connection};
use tracing::{debug, info};

/// Loads records into a DuckDB table
pub struct DuckDbSink {
    /// DuckDB connection
    conn: Connection,
    /// Database file or `:memory:` (for logging)
    path: String,
    dataset: String,
    table: String,
    /// Batches written during this load
    batches: i64,
    written: usize,
}

impl DuckDbSink {
    /// Open the database and prepare the table
    ///
    /// `Replace` drops the table first; `Append` keeps earlier loads.
    pub fn open(
        path: &str,
        dataset: &str,
        table: &str,
        disposition: WriteDisposition,
    ) -> Result<Self> {
        for (field, name) in [("dataset", dataset), ("table", table)] {
            if !is_identifier(name) {
                return Err(Error::invalid_value(
                    field,
                    format!("'{name}' is not a valid identifier"),
                ));
            }
        }

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };

        let sink = Self {
            conn,
            path: path.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
            batches: 0,
            written: 0,
        };
        sink.prepare_table(disposition)?;
        Ok(sink)
    }

    fn qualified_name(&self) -> String {
        format!("{}.{}", self.dataset, self.table)
    }

    fn prepare_table(&self, disposition: WriteDisposition) -> Result<()> {
        let name = self.qualified_name();
        let mut sql = format!("CREATE SCHEMA IF NOT EXISTS {};", self.dataset);
        if disposition == WriteDisposition::Replace {
            sql.push_str(&format!("DROP TABLE IF EXISTS {name};"));
        }
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {name} (\
                _load_id VARCHAR NOT NULL, \
                _batch BIGINT NOT NULL, \
                _position BIGINT NOT NULL, \
                data VARCHAR NOT NULL);"
        ));

        self.conn.execute_batch(&sql)?;
        debug!(table = %name, %disposition, db = %self.path, "Prepared DuckDB table");
        Ok(())
    }

    /// Number of rows currently in the table, across all loads
    pub fn row_count(&self) -> Result<i64> {
        let count = self.conn.query_row(
            &format!("SELECT count(*) FROM {}", self.qualified_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Stored JSON documents in load order
    pub fn documents(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT data FROM {} ORDER BY _load_id, _batch, _position",
            self.qualified_name()
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl std::fmt::Debug for DuckDbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSink")
            .field("path", &self.path)
            .field("table", &self.qualified_name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Sink for DuckDbSink {
    fn describe(&self) -> String {
        format!("duckdb {} ({})", self.qualified_name(), self.path)
    }

    async fn write_batch(&mut self, load_id: &str, batch: &Batch) -> Result<()> {
        let insert = format!("INSERT INTO {} VALUES (?, ?, ?, ?)", self.qualified_name());
        let batch_number = self.batches;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for (position, record) in batch.records.iter().enumerate() {
                let data = serde_json::to_string(record)?;
                stmt.execute(params![load_id, batch_number, position as i64, data])?;
            }
        }
        tx.commit()?;

        self.batches += 1;
        self.written += batch.len();
        Ok(())
    }

    async fn finish(&mut self, _load_id: &str) -> Result<SinkReport> {
        let location = format!("{}:{}", self.path, self.qualified_name());
        info!(location = %location, records = self.written, "Loaded into DuckDB");
        Ok(SinkReport {
            records_written: self.written,
            location,
        })
    }
}
