//! Memory Backend
//!
//! Keeps every table in a [`MemTable`] for the life of the backend.
//!
//! ## Layouts
//! - **Dynamic** ([`MemoryBackend::create`]): databases and tables are
//!   created and dropped freely; reverse ordering and collision detection
//!   are supported.
//! - **Partitioned** ([`MemoryBackend::partitioned`]): the databases and
//!   tables are fixed when the backend is built. Creating or dropping either
//!   fails with `CapabilityUnsupported`, and columns always sort ascending.
//!
//! ## Session
//! The catalog is shared by every handle derived from one backend, so a
//! database or table that is closed and opened again sees the same rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{Backend, BackendEngine};
use crate::config::Config;
use crate::database::{Database, DatabaseEngine};
use crate::encoding::Base36;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::model::{ColumnId, Columns, RowKey, TableProfile};
use crate::table::{Selection, Table, TableEngine};

/// Kind name under which the registry knows this backend
pub const KIND: &str = "memory";

type Catalog = Arc<Mutex<BTreeMap<Base36, DatabaseData>>>;

#[derive(Default)]
struct DatabaseData {
    tables: BTreeMap<Base36, Arc<TableData>>,
}

struct TableData {
    rows: MemTable,
    reverse: bool,
    detect_collisions: bool,
}

/// Constructors for in-memory backends
pub struct MemoryBackend;

impl MemoryBackend {
    /// A backend whose databases and tables can be created and dropped
    pub fn create(instance: &str, config: &Config) -> Result<Backend> {
        config.validate()?;
        let engine = MemoryBackendEngine {
            catalog: Catalog::default(),
            fixed: false,
            key_page_size: config.key_page_size,
        };
        Ok(Backend::new(instance, Box::new(engine)))
    }

    /// A backend with a fixed set of databases, each with a fixed set of
    /// tables. Every table uses the default profile.
    pub fn partitioned(
        instance: &str,
        config: &Config,
        layout: &[(&str, &[&str])],
    ) -> Result<Backend> {
        config.validate()?;

        let mut databases = BTreeMap::new();
        for (database, tables) in layout {
            let mut data = DatabaseData::default();
            for table in *tables {
                data.tables.insert(
                    Base36::new(table)?,
                    Arc::new(TableData {
                        rows: MemTable::new(),
                        reverse: false,
                        detect_collisions: false,
                    }),
                );
            }
            databases.insert(Base36::new(database)?, data);
        }

        let engine = MemoryBackendEngine {
            catalog: Arc::new(Mutex::new(databases)),
            fixed: true,
            key_page_size: config.key_page_size,
        };
        Ok(Backend::new(instance, Box::new(engine)))
    }
}

// =============================================================================
// Backend Engine
// =============================================================================

struct MemoryBackendEngine {
    catalog: Catalog,
    fixed: bool,
    key_page_size: usize,
}

impl MemoryBackendEngine {
    fn database(&self, name: &Base36) -> Database {
        let engine = MemoryDatabaseEngine {
            catalog: Arc::clone(&self.catalog),
            database: name.clone(),
            fixed: self.fixed,
            key_page_size: self.key_page_size,
        };
        Database::new(name.clone(), Box::new(engine))
    }
}

impl BackendEngine for MemoryBackendEngine {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn database_names(&mut self) -> Result<Vec<Base36>> {
        Ok(self.catalog.lock().keys().cloned().collect())
    }

    fn load_database(&mut self, name: &Base36) -> Result<Option<Database>> {
        if !self.catalog.lock().contains_key(name) {
            return Ok(None);
        }
        Ok(Some(self.database(name)))
    }

    fn create_database(&mut self, name: &Base36) -> Result<Database> {
        self.catalog.lock().entry(name.clone()).or_default();
        Ok(self.database(name))
    }

    fn drop_database(&mut self, name: &Base36) -> Result<()> {
        self.catalog.lock().remove(name);
        Ok(())
    }

    fn dynamic_databases(&self) -> bool {
        !self.fixed
    }
}

// =============================================================================
// Database Engine
// =============================================================================

struct MemoryDatabaseEngine {
    catalog: Catalog,
    database: Base36,
    fixed: bool,
    key_page_size: usize,
}

impl MemoryDatabaseEngine {
    fn table(&self, name: &Base36, data: Arc<TableData>) -> Table {
        let (reverse, detect_collisions) = (data.reverse, data.detect_collisions);
        let engine = MemoryTableEngine {
            data,
            fixed: self.fixed,
        };
        Table::new(name.clone(), Box::new(engine), reverse, detect_collisions)
            .with_key_page_size(self.key_page_size)
    }
}

impl DatabaseEngine for MemoryDatabaseEngine {
    fn table_names(&mut self) -> Result<Vec<Base36>> {
        let catalog = self.catalog.lock();
        Ok(catalog
            .get(&self.database)
            .map(|db| db.tables.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn load_table(&mut self, name: &Base36) -> Result<Option<Table>> {
        let data = self
            .catalog
            .lock()
            .get(&self.database)
            .and_then(|db| db.tables.get(name).cloned());
        Ok(data.map(|data| self.table(name, data)))
    }

    fn create_table(&mut self, name: &Base36, profile: &TableProfile) -> Result<Table> {
        tracing::debug!(
            database = %self.database,
            table = %name,
            access_pattern = ?profile.access_pattern,
            expected_rows = profile.expected_rows,
            "creating in-memory table"
        );

        let data = Arc::new(TableData {
            rows: MemTable::new(),
            reverse: profile.reverse_columns_order && !self.fixed,
            detect_collisions: profile.try_detect_collisions,
        });
        self.catalog
            .lock()
            .entry(self.database.clone())
            .or_default()
            .tables
            .insert(name.clone(), Arc::clone(&data));

        Ok(self.table(name, data))
    }

    fn drop_table(&mut self, name: &Base36) -> Result<()> {
        if let Some(db) = self.catalog.lock().get_mut(&self.database) {
            db.tables.remove(name);
        }
        Ok(())
    }

    fn dynamic_tables(&self) -> bool {
        !self.fixed
    }
}

// =============================================================================
// Table Engine
// =============================================================================

struct MemoryTableEngine {
    data: Arc<TableData>,
    fixed: bool,
}

impl TableEngine for MemoryTableEngine {
    fn columns_count(&mut self, key: RowKey) -> Result<u64> {
        Ok(self.data.rows.columns_count(key))
    }

    fn column_ids(&mut self, key: RowKey) -> Result<Vec<ColumnId>> {
        Ok(self.data.rows.column_ids(key))
    }

    fn get(&mut self, key: RowKey, selection: &Selection, out: &mut Columns) -> Result<()> {
        self.data.rows.read(key, selection, out);
        Ok(())
    }

    fn get_first(
        &mut self,
        key: RowKey,
        count: usize,
        reverse: bool,
        out: &mut Columns,
    ) -> Result<()> {
        self.data.rows.read_first(key, count, reverse, out);
        Ok(())
    }

    fn remove(&mut self, key: RowKey, selection: &Selection) -> Result<()> {
        let rows = &self.data.rows;
        rows.remove(key, selection, rows.next_timestamp());
        Ok(())
    }

    fn set(&mut self, key: RowKey, upsert: &Columns, remove: &Selection) -> Result<()> {
        let rows = &self.data.rows;
        rows.set_columns(key, upsert, remove, rows.next_timestamp());
        Ok(())
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.data.rows.row_count() as u64)
    }

    fn keys(&mut self, offset: u64, limit: usize) -> Result<Vec<RowKey>> {
        Ok(self.data.rows.keys(offset, limit))
    }

    fn row_timestamp(&mut self, key: RowKey) -> Result<Option<i64>> {
        Ok(self.data.rows.row_timestamp(key))
    }

    fn reverse_supported(&self) -> bool {
        !self.fixed
    }
}
