use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{
    storage::bplus_tree::Table,
    types::{error::Result, row::Row},
};

/// A database file inside its own temporary directory. The directory and
/// everything in it are removed on drop.
pub struct TempDatabase {
    pub path: PathBuf,
    dir: TempDir,
}

impl TempDatabase {
    pub fn new() -> std::io::Result<Self> {
        Self::with_prefix("lumbung_test")
    }

    pub fn with_prefix(prefix: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().join("test.db");
        Ok(Self { path, dir })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn open_table(&self) -> Result<Table> {
        Table::open(&self.path)
    }
}

/// `insert <id> user<id> person<id>@example.com`
pub fn sample_row(id: u32) -> Row {
    Row::new(id, format!("user{id}"), format!("person{id}@example.com"))
}
