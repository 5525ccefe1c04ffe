//! Log Backend
//!
//! Durable backend keeping each table as a write-ahead log on disk.
//!
//! ## Layout
//! ```text
//! {data_dir}/{instance}/
//!   └── {database}/              one directory per database
//!         ├── {table}.meta       bincode TableMeta, written once
//!         └── {table}.log        CRC-framed row mutations
//! ```
//!
//! Opening a table replays its log into memory; see [`engine`] for the
//! write path.

mod engine;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, BackendEngine};
use crate::config::Config;
use crate::database::{Database, DatabaseEngine};
use crate::encoding::Base36;
use crate::error::Result;
use crate::model::TableProfile;
use crate::table::Table;

use engine::LogTableEngine;

/// Kind name under which the registry knows this backend
pub const KIND: &str = "log";

const META_EXTENSION: &str = "meta";
const LOG_EXTENSION: &str = "log";

/// Settings fixed when a table is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub reverse: bool,
    pub detect_collisions: bool,
    /// Hints the table was created with
    pub profile: TableProfile,
}

/// Constructors for log backends
pub struct LogBackend;

impl LogBackend {
    /// A backend rooted at `{config.data_dir}/{instance}`
    ///
    /// Nothing touches the disk until the first database access.
    pub fn create(instance: &str, config: &Config) -> Result<Backend> {
        config.validate()?;
        let engine = LogBackendEngine {
            root: config.data_dir.join(instance),
            config: config.clone(),
        };
        Ok(Backend::new(instance, Box::new(engine)))
    }
}

// =============================================================================
// Backend Engine
// =============================================================================

struct LogBackendEngine {
    root: PathBuf,
    config: Config,
}

impl LogBackendEngine {
    fn database(&self, name: &Base36) -> Database {
        let engine = LogDatabaseEngine {
            dir: self.root.join(name.as_str()),
            config: self.config.clone(),
        };
        Database::new(name.clone(), Box::new(engine))
    }
}

impl BackendEngine for LogBackendEngine {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn open(&mut self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        tracing::debug!(root = %self.root.display(), "opened log backend");
        Ok(())
    }

    fn database_names(&mut self) -> Result<Vec<Base36>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = parse_name(&entry.path(), None) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_database(&mut self, name: &Base36) -> Result<Option<Database>> {
        if !self.root.join(name.as_str()).is_dir() {
            return Ok(None);
        }
        Ok(Some(self.database(name)))
    }

    fn create_database(&mut self, name: &Base36) -> Result<Database> {
        fs::create_dir_all(self.root.join(name.as_str()))?;
        Ok(self.database(name))
    }

    fn drop_database(&mut self, name: &Base36) -> Result<()> {
        ignore_missing(fs::remove_dir_all(self.root.join(name.as_str())))
    }
}

// =============================================================================
// Database Engine
// =============================================================================

struct LogDatabaseEngine {
    dir: PathBuf,
    config: Config,
}

impl LogDatabaseEngine {
    fn meta_path(&self, name: &Base36) -> PathBuf {
        self.dir.join(format!("{}.{}", name, META_EXTENSION))
    }

    fn log_path(&self, name: &Base36) -> PathBuf {
        self.dir.join(format!("{}.{}", name, LOG_EXTENSION))
    }

    fn table(&self, name: &Base36, meta: &TableMeta) -> Table {
        let engine = LogTableEngine::new(self.log_path(name), self.config.clone());
        Table::new(
            name.clone(),
            Box::new(engine),
            meta.reverse,
            meta.detect_collisions,
        )
        .with_key_page_size(self.config.key_page_size)
    }
}

impl DatabaseEngine for LogDatabaseEngine {
    fn open(&mut self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn table_names(&mut self) -> Result<Vec<Base36>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = parse_name(&entry.path(), Some(META_EXTENSION)) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_table(&mut self, name: &Base36) -> Result<Option<Table>> {
        let bytes = match fs::read(self.meta_path(name)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: TableMeta = bincode::deserialize(&bytes)?;
        Ok(Some(self.table(name, &meta)))
    }

    fn create_table(&mut self, name: &Base36, profile: &TableProfile) -> Result<Table> {
        let meta = TableMeta {
            reverse: profile.reverse_columns_order,
            detect_collisions: profile.try_detect_collisions,
            profile: profile.clone(),
        };

        // Write the log first: a table only exists once its meta file does
        fs::File::create(self.log_path(name))?;
        let meta_path = self.meta_path(name);
        let tmp = meta_path.with_extension("meta.tmp");
        fs::write(&tmp, bincode::serialize(&meta)?)?;
        fs::rename(&tmp, &meta_path)?;

        tracing::debug!(dir = %self.dir.display(), table = %name, "created log table");
        Ok(self.table(name, &meta))
    }

    fn drop_table(&mut self, name: &Base36) -> Result<()> {
        ignore_missing(fs::remove_file(self.meta_path(name)))?;
        ignore_missing(fs::remove_file(self.log_path(name)))
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Base-36 name from a path's file stem, requiring `extension` if given.
/// Names not in canonical lower case are skipped.
fn parse_name(path: &Path, extension: Option<&str>) -> Option<Base36> {
    if path.extension().and_then(|e| e.to_str()) != extension {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let name = Base36::new(stem).ok()?;
    (name.as_str() == stem).then_some(name)
}

fn ignore_missing(result: io::Result<()>) -> Result<()> {
    match result {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}
