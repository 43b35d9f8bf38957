use crate::{
    planner::error::PlannerError,
    types::{Key, error::DatabaseError, row::Row},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

/// Turns one input line into a validated statement. Nothing here touches
/// the table.
pub struct StatementParser;

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, input: &str) -> Result<Statement, PlannerError> {
        let mut tokens = input.split_whitespace();
        match tokens.next() {
            Some("insert") => self.parse_insert(tokens.collect()),
            Some("select") if tokens.next().is_none() => Ok(Statement::Select),
            Some("select") => Err(PlannerError::Syntax),
            _ => Err(PlannerError::UnrecognizedKeyword(input.to_string())),
        }
    }

    fn parse_insert(&self, args: Vec<&str>) -> Result<Statement, PlannerError> {
        let &[id, username, email] = args.as_slice() else {
            return Err(PlannerError::Syntax);
        };
        let id: i64 = id.parse().map_err(|_| PlannerError::Syntax)?;
        if id <= 0 {
            return Err(DatabaseError::IdMustBePositive.into());
        }
        let id = Key::try_from(id).map_err(|_| PlannerError::Syntax)?;
        let row = Row::new(id, username, email);
        row.validate()?;
        Ok(Statement::Insert(row))
    }
}
