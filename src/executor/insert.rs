use tracing::debug;

use crate::{
    storage::bplus_tree::Table,
    types::{error::DatabaseError, row::Row},
};

/// Trait for inserting rows into the table
pub trait Inserter {
    /// Insert a single row into the table
    fn insert(&mut self, row: Row) -> Result<(), DatabaseError>;

    /// Insert rows in order, stopping at the first failure
    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<(), BatchInsertError>;

    /// Rows inserted successfully through this inserter
    fn inserted(&self) -> usize;
}

/// A batch insert stopped at `index`; every row before it was stored.
#[derive(Debug, thiserror::Error)]
#[error("Failed to insert row at index {index}: {source}")]
pub struct BatchInsertError {
    pub index: usize,
    #[source]
    pub source: DatabaseError,
}

pub struct TableInserter<'t> {
    table: &'t mut Table,
    inserted: usize,
}

impl<'t> TableInserter<'t> {
    pub fn new(table: &'t mut Table) -> Self {
        Self { table, inserted: 0 }
    }
}

impl Inserter for TableInserter<'_> {
    fn insert(&mut self, row: Row) -> Result<(), DatabaseError> {
        self.table.insert(&row)?;
        self.inserted += 1;
        Ok(())
    }

    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<(), BatchInsertError> {
        let total = rows.len();
        for (index, row) in rows.into_iter().enumerate() {
            self.insert(row)
                .map_err(|source| BatchInsertError { index, source })?;
        }
        debug!(rows = total, "inserted batch");
        Ok(())
    }

    fn inserted(&self) -> usize {
        self.inserted
    }
}
