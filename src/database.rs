//! Database Module
//!
//! A named set of tables inside one backend.
//!
//! ## Responsibilities
//! - Lazily scan the engine's existing tables into a cache on first use
//! - Create, look up and drop tables by case-normalized name
//! - Close every cached table once when the database closes

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::encoding::Base36;
use crate::error::{ColKvError, Result};
use crate::lifecycle::Lifecycle;
use crate::model::TableProfile;
use crate::table::Table;

/// Storage hooks every backend implements for its databases
pub trait DatabaseEngine: Send {
    /// Acquire resources; called once, lazily
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Names of every table that already exists in storage
    fn table_names(&mut self) -> Result<Vec<Base36>>;

    /// Build a handle for an existing table, `None` if it does not exist
    fn load_table(&mut self, name: &Base36) -> Result<Option<Table>>;

    /// Create a new table; the name is known not to exist
    fn create_table(&mut self, name: &Base36, profile: &TableProfile) -> Result<Table>;

    /// Purge a table's data; the table is already closed
    fn drop_table(&mut self, name: &Base36) -> Result<()>;

    /// Whether tables can be created and dropped at all
    fn dynamic_tables(&self) -> bool {
        true
    }

    /// Release resources; called once, only after a successful `open`
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A named container of tables
///
/// Not thread-safe: every operation takes `&mut self`.
pub struct Database {
    name: Base36,
    lifecycle: Lifecycle,
    tables: BTreeMap<Base36, Table>,
    engine: Box<dyn DatabaseEngine>,
}

impl Database {
    pub fn new(name: Base36, engine: Box<dyn DatabaseEngine>) -> Self {
        Self {
            lifecycle: Lifecycle::new("database", name.as_str()),
            name,
            tables: BTreeMap::new(),
            engine,
        }
    }

    pub fn name(&self) -> &Base36 {
        &self.name
    }

    pub fn dynamic_tables(&self) -> bool {
        self.engine.dynamic_tables()
    }

    /// Create a table; fails with `AlreadyExists` if the name is taken
    ///
    /// `profile` only tunes creation; `None` means default hints.
    pub fn create(&mut self, name: &str, profile: Option<&TableProfile>) -> Result<&mut Table> {
        let name = Base36::new(name)?;
        self.ensure_open()?;

        if !self.engine.dynamic_tables() {
            return Err(ColKvError::CapabilityUnsupported(format!(
                "database '{}' has a fixed set of tables; cannot create '{}'",
                self.name, name
            )));
        }
        if self.tables.contains_key(&name) {
            return Err(ColKvError::already_exists("table", name.as_str()));
        }

        let default_profile = TableProfile::default();
        let table = self
            .engine
            .create_table(&name, profile.unwrap_or(&default_profile))?;
        tracing::debug!(database = %self.name, table = %name, "created table");

        Ok(self.tables.entry(name).or_insert(table))
    }

    /// Look up a table, opening the database first if needed
    pub fn get(&mut self, name: &str) -> Result<Option<&mut Table>> {
        let name = Base36::new(name)?;
        self.ensure_open()?;

        // A handle the caller closed is replaced by a fresh one
        if self.tables.get(&name).is_some_and(Table::is_closed) {
            self.tables.remove(&name);
            if let Some(table) = self.engine.load_table(&name)? {
                self.tables.insert(name.clone(), table);
            }
        }

        Ok(self.tables.get_mut(&name))
    }

    /// Drop a table, returning whether it existed
    pub fn drop_table(&mut self, name: &str) -> Result<bool> {
        let name = Base36::new(name)?;
        self.ensure_open()?;

        if !self.engine.dynamic_tables() {
            return Err(ColKvError::CapabilityUnsupported(format!(
                "database '{}' has a fixed set of tables; cannot drop '{}'",
                self.name, name
            )));
        }

        let Some(mut table) = self.tables.remove(&name) else {
            return Ok(false);
        };
        if let Err(e) = table.close() {
            tracing::warn!(table = %name, error = %e, "failed to close table before drop");
        }
        self.engine.drop_table(&name)?;
        tracing::debug!(database = %self.name, table = %name, "dropped table");
        Ok(true)
    }

    /// Names of every table
    pub fn tables(&mut self) -> Result<BTreeSet<Base36>> {
        self.ensure_open()?;
        Ok(self.tables.keys().cloned().collect())
    }

    /// Close every cached table, then the database; later calls do nothing
    pub fn close(&mut self) -> Result<()> {
        let Some(opened) = self.lifecycle.begin_close() else {
            return Ok(());
        };

        for (name, table) in self.tables.iter_mut() {
            if let Err(e) = table.close() {
                tracing::warn!(
                    database = %self.name,
                    table = %name,
                    error = %e,
                    "failed to close table"
                );
            }
        }
        self.tables.clear();

        if opened {
            self.engine.close()?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    fn ensure_open(&mut self) -> Result<()> {
        let engine = &mut self.engine;
        let tables = &mut self.tables;
        self.lifecycle.ensure_open(|| {
            engine.open()?;
            for name in engine.table_names()? {
                if let Some(table) = engine.load_table(&name)? {
                    tables.insert(name, table);
                }
            }
            Ok(())
        })
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .field("opened", &self.lifecycle.is_opened())
            .field("closed", &self.lifecycle.is_closed())
            .finish()
    }
}
