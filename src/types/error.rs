use thiserror::Error;

use crate::types::PageId;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ID must be positive.")]
    IdMustBePositive,

    #[error("String is too long.")]
    StringTooLong,

    #[error("Error: Duplicate key.")]
    DuplicateKey,

    #[error("Error: Table full.")]
    TableFull,

    #[error("Tried to fetch page number out of bounds. {page_num} > {max}")]
    PageOutOfBounds { page_num: PageId, max: usize },

    #[error("Page {page_num} is past the end of the table ({num_pages} pages).")]
    PageNotAllocated { page_num: PageId, num_pages: usize },

    #[error("Db file is not a whole number of pages. Corrupt file (length {length}).")]
    CorruptFile { length: u64 },

    #[error("Db file holds {pages} pages, more than the maximum of {max}.")]
    TooManyPages { pages: u64, max: usize },

    #[error("Invalid node type: {0}")]
    InvalidNodeType(u8),

    #[error("Corrupted node: page_id={page_id}, reason={reason}")]
    CorruptNode { page_id: PageId, reason: String },

    #[error("Error reading input")]
    InputClosed,
}

impl DatabaseError {
    pub fn corrupt_node(page_id: PageId, reason: impl Into<String>) -> Self {
        DatabaseError::CorruptNode {
            page_id,
            reason: reason.into(),
        }
    }

    /// Fatal errors mean the in-memory pages or the file can no longer be
    /// trusted; the process reports them and stops without flushing.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DatabaseError::IdMustBePositive
                | DatabaseError::StringTooLong
                | DatabaseError::DuplicateKey
                | DatabaseError::TableFull
        )
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
