use crate::types::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Syntax error. Could not parse statement.")]
    Syntax,
    #[error("Unrecognized keyword at start of '{0}'.")]
    UnrecognizedKeyword(String),
    #[error(transparent)]
    InvalidRow(#[from] DatabaseError),
}
