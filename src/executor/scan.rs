use crate::{
    storage::{bplus_tree::Table, cursor::Cursor},
    types::{error::DatabaseError, row::Row},
};

pub trait Scanner {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError>;
    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError>;
    fn reset(&mut self) -> Result<(), DatabaseError>;
}

/// Walks the leaf chain from the smallest key upward, decoding one row per
/// call. The cursor is created lazily on the first scan.
pub struct TableScanner<'t> {
    table: &'t mut Table,
    cursor: Option<Cursor>,
}

impl<'t> TableScanner<'t> {
    pub fn new(table: &'t mut Table) -> Self {
        Self {
            table,
            cursor: None,
        }
    }
}

impl Scanner for TableScanner<'_> {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        let mut cursor = match self.cursor {
            Some(cursor) => cursor,
            None => Cursor::start(self.table)?,
        };
        if cursor.end_of_table() {
            self.cursor = Some(cursor);
            return Ok(None);
        }
        let row = Row::deserialize(cursor.value(self.table)?);
        cursor.advance(self.table)?;
        self.cursor = Some(cursor);
        Ok(Some(row))
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    fn reset(&mut self) -> Result<(), DatabaseError> {
        self.cursor = None;
        Ok(())
    }
}

pub struct ScanIterator<S: Scanner> {
    scanner: S,
}

impl<S: Scanner> ScanIterator<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }
}

impl<S: Scanner> Iterator for ScanIterator<S> {
    type Item = Result<Row, DatabaseError>;
    fn next(&mut self) -> Option<Self::Item> {
        match self.scanner.scan() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
