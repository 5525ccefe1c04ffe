//! Backend Module
//!
//! One connection or session to a storage engine.
//!
//! ## Responsibilities
//! - Open the engine on first database access
//! - Cache databases by case-normalized name
//! - Refuse schema changes on engines with a fixed database set
//! - Shut down every cached database exactly once

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::encoding::Base36;
use crate::error::{ColKvError, Result};
use crate::lifecycle::Lifecycle;
use crate::database::Database;

/// Storage hooks every backend plugin implements at the top level
pub trait BackendEngine: Send {
    /// Short name of the engine family, e.g. `"memory"`
    fn kind(&self) -> &'static str;

    /// Connect; called once, lazily
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Names of every database that already exists
    fn database_names(&mut self) -> Result<Vec<Base36>>;

    /// Build a handle for an existing database, `None` if it does not exist
    fn load_database(&mut self, name: &Base36) -> Result<Option<Database>>;

    /// Create a new database; the name is known not to exist
    fn create_database(&mut self, name: &Base36) -> Result<Database>;

    /// Purge a database; it is already closed
    fn drop_database(&mut self, name: &Base36) -> Result<()>;

    /// Whether databases can be created and dropped at all
    fn dynamic_databases(&self) -> bool {
        true
    }

    /// Release backend-level resources; called once, only after `open`
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A storage engine session owning a set of databases
///
/// Not thread-safe: every operation takes `&mut self`. Wrap it in a mutex to
/// share it between threads.
pub struct Backend {
    lifecycle: Lifecycle,
    databases: BTreeMap<Base36, Database>,
    engine: Box<dyn BackendEngine>,
}

impl Backend {
    /// Wrap an engine; nothing is opened until the first database access
    pub fn new(instance: impl Into<String>, engine: Box<dyn BackendEngine>) -> Self {
        Self {
            lifecycle: Lifecycle::new("backend", instance),
            databases: BTreeMap::new(),
            engine,
        }
    }

    /// Instance name given at construction
    pub fn name(&self) -> &str {
        self.lifecycle.name()
    }

    pub fn kind(&self) -> &'static str {
        self.engine.kind()
    }

    pub fn dynamic_databases(&self) -> bool {
        self.engine.dynamic_databases()
    }

    /// Create a database; fails with `AlreadyExists` if the name is taken
    pub fn create_database(&mut self, name: &str) -> Result<&mut Database> {
        let name = Base36::new(name)?;
        self.ensure_open()?;

        if !self.engine.dynamic_databases() {
            return Err(ColKvError::CapabilityUnsupported(format!(
                "{} backend '{}' has a fixed set of databases; cannot create '{}'",
                self.engine.kind(),
                self.lifecycle.name(),
                name
            )));
        }
        if self.databases.contains_key(&name) {
            return Err(ColKvError::already_exists("database", name.as_str()));
        }

        let database = self.engine.create_database(&name)?;
        tracing::debug!(backend = %self.lifecycle.name(), database = %name, "created database");

        Ok(self.databases.entry(name).or_insert(database))
    }

    /// Look up a database, opening the backend first if needed
    pub fn open_database(&mut self, name: &str) -> Result<Option<&mut Database>> {
        let name = Base36::new(name)?;
        self.ensure_open()?;

        // A handle the caller closed is replaced by a fresh one
        if self.databases.get(&name).is_some_and(Database::is_closed) {
            self.databases.remove(&name);
            if let Some(database) = self.engine.load_database(&name)? {
                self.databases.insert(name.clone(), database);
            }
        }

        Ok(self.databases.get_mut(&name))
    }

    /// Names of every database
    pub fn databases(&mut self) -> Result<BTreeSet<String>> {
        self.ensure_open()?;
        Ok(self
            .databases
            .keys()
            .map(|name| name.as_str().to_string())
            .collect())
    }

    /// Drop a database, returning whether it existed
    pub fn drop_database(&mut self, name: &str) -> Result<bool> {
        let name = Base36::new(name)?;
        self.ensure_open()?;

        if !self.engine.dynamic_databases() {
            return Err(ColKvError::CapabilityUnsupported(format!(
                "{} backend '{}' has a fixed set of databases; cannot drop '{}'",
                self.engine.kind(),
                self.lifecycle.name(),
                name
            )));
        }

        let Some(mut database) = self.databases.remove(&name) else {
            return Ok(false);
        };
        if let Err(e) = database.close() {
            tracing::warn!(database = %name, error = %e, "failed to close database before drop");
        }
        self.engine.drop_database(&name)?;
        tracing::debug!(backend = %self.lifecycle.name(), database = %name, "dropped database");
        Ok(true)
    }

    /// Close every cached database once, then release the engine; later
    /// calls do nothing
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(opened) = self.lifecycle.begin_close() else {
            return Ok(());
        };

        for (name, database) in self.databases.iter_mut() {
            if let Err(e) = database.close() {
                tracing::warn!(
                    database = %name,
                    error = %e,
                    "failed to close database during shutdown"
                );
            }
        }
        self.databases.clear();

        if opened {
            self.engine.shutdown()?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    fn ensure_open(&mut self) -> Result<()> {
        let engine = &mut self.engine;
        let databases = &mut self.databases;
        self.lifecycle.ensure_open(|| {
            engine.open()?;
            for name in engine.database_names()? {
                if let Some(database) = engine.load_database(&name)? {
                    databases.insert(name, database);
                }
            }
            Ok(())
        })
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.lifecycle.name())
            .field("kind", &self.engine.kind())
            .field("databases", &self.databases.keys().collect::<Vec<_>>())
            .field("closed", &self.lifecycle.is_closed())
            .finish()
    }
}
