//! Process-local row cache: table name → row uuid → wire row.
//!
//! The cache is populated by an external monitoring component through the
//! write surface below; the conditional API only reads it. Reads snapshot the
//! target table before any user code runs, so concurrent monitor updates
//! never interleave with a scan.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use ovsdb_proto::{DatabaseSchema, Row};

use crate::error::{Error, Result};

/// The rows of one table at one point in time.
#[derive(Debug, Clone, Default)]
pub struct RowCache {
    rows: HashMap<String, Row>,
}

impl RowCache {
    pub fn uuids(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn row(&self, uuid: &str) -> Option<&Row> {
        self.rows.get(uuid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.rows.iter().map(|(uuid, row)| (uuid.as_str(), row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The whole cache, bound to the schema it mirrors.
pub struct TableCache {
    schema: Arc<DatabaseSchema>,
    tables: RwLock<HashMap<String, RowCache>>,
}

impl TableCache {
    pub fn new(schema: Arc<DatabaseSchema>) -> TableCache {
        TableCache {
            schema,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    /// Point-in-time copy of a table's rows. `None` when the table is not
    /// part of the schema; a known table with no cached rows snapshots empty.
    pub fn snapshot(&self, table: &str) -> Option<RowCache> {
        self.schema.table(table)?;
        Some(self.tables.read().get(table).cloned().unwrap_or_default())
    }

    pub fn row(&self, table: &str, uuid: &str) -> Option<Row> {
        self.tables.read().get(table)?.row(uuid).cloned()
    }

    /// Upsert a row on behalf of the monitoring component.
    pub fn insert_row(&self, table: &str, uuid: impl Into<String>, row: Row) -> Result<()> {
        if self.schema.table(table).is_none() {
            return Err(Error::UnknownTable(table.to_string()));
        }
        let uuid = uuid.into();
        debug!(table, uuid = uuid.as_str(), "cache row upserted");
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .rows
            .insert(uuid, row);
        Ok(())
    }

    /// Remove a row on behalf of the monitoring component.
    pub fn remove_row(&self, table: &str, uuid: &str) -> Option<Row> {
        let removed = self.tables.write().get_mut(table)?.rows.remove(uuid);
        if removed.is_some() {
            debug!(table, uuid, "cache row removed");
        }
        removed
    }

    /// Drop every cached row (e.g. on reconnect, before a fresh monitor).
    pub fn clear(&self) {
        debug!("cache cleared");
        self.tables.write().clear();
    }
}
