use std::io::{BufRead, Write};

use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::{debug, warn};

use crate::{
    executor::{
        insert::{Inserter, TableInserter},
        scan::{ScanIterator, TableScanner},
    },
    planner::parser::{Statement, StatementParser},
    storage::bplus_tree::Table,
    types::{
        COMMON_NODE_HEADER_SIZE, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS,
        LEAF_NODE_SPACE_FOR_CELLS, ROW_SIZE,
        error::{DatabaseError, Result},
    },
};

pub const PROMPT: &str = "db > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    BTree,
    Constants,
}

impl MetaCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            ".exit" => Some(MetaCommand::Exit),
            ".btree" => Some(MetaCommand::BTree),
            ".constants" => Some(MetaCommand::Constants),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Exit,
}

/// Drives one open table from a stream of command lines.
///
/// Recoverable errors are written to the output and the session goes on.
/// Fatal ones are returned; the caller must stop without flushing.
pub struct Repl {
    table: Table,
    parser: StatementParser,
}

impl Repl {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            parser: StatementParser::new(),
        }
    }

    pub fn table(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<LineOutcome> {
        if line.starts_with('.') {
            return self.execute_meta_command(line, out);
        }
        match self.parser.parse(line) {
            Ok(statement) => self.execute_statement(statement, out)?,
            Err(e) => writeln!(out, "{e}")?,
        }
        Ok(LineOutcome::Continue)
    }

    fn execute_meta_command<W: Write>(&mut self, line: &str, out: &mut W) -> Result<LineOutcome> {
        match MetaCommand::parse(line) {
            Some(MetaCommand::Exit) => return Ok(LineOutcome::Exit),
            Some(MetaCommand::BTree) => {
                writeln!(out, "Tree:")?;
                self.table.print_tree(out)?;
            }
            Some(MetaCommand::Constants) => {
                writeln!(out, "Constants:")?;
                print_constants(out)?;
            }
            None => writeln!(out, "Unrecognized command '{line}'")?,
        }
        Ok(LineOutcome::Continue)
    }

    fn execute_statement<W: Write>(&mut self, statement: Statement, out: &mut W) -> Result<()> {
        match statement {
            Statement::Insert(row) => {
                let mut inserter = TableInserter::new(&mut self.table);
                match inserter.insert(row) {
                    Ok(()) => writeln!(out, "Executed.")?,
                    Err(e) if !e.is_fatal() => {
                        debug!(error = %e, "insert rejected");
                        writeln!(out, "{e}")?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Statement::Select => {
                for row in ScanIterator::new(TableScanner::new(&mut self.table)) {
                    writeln!(out, "{}", row?)?;
                }
                writeln!(out, "Executed.")?;
            }
        }
        Ok(())
    }

    /// Flushes every page and releases the database file.
    pub fn shutdown(self) -> Result<()> {
        self.table.close()
    }

    /// Reads commands from `input`, echoing the prompt to `out` before each
    /// line. Used for piped stdin.
    pub fn run_script<R: BufRead, W: Write>(mut self, input: R, out: &mut W) -> Result<()> {
        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            let step = match lines.next() {
                Some(Ok(line)) => self.execute_line(line.trim_end(), out),
                Some(Err(e)) => Err(e.into()),
                None => Err(DatabaseError::InputClosed),
            };
            match step {
                Ok(LineOutcome::Continue) => {}
                Ok(LineOutcome::Exit) => return self.shutdown(),
                Err(e) => return Self::abort(e, out),
            }
        }
    }

    /// Reads commands from a line editor, for terminals.
    pub fn run_interactive<W: Write>(mut self, editor: &mut DefaultEditor, out: &mut W) -> Result<()> {
        loop {
            let step = match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(e) = editor.add_history_entry(line.as_str()) {
                            warn!(error = %e, "could not record history entry");
                        }
                    }
                    self.execute_line(line.trim_end(), out)
                }
                Err(ReadlineError::Io(e)) => Err(e.into()),
                Err(_) => Err(DatabaseError::InputClosed),
            };
            match step {
                Ok(LineOutcome::Continue) => out.flush()?,
                Ok(LineOutcome::Exit) => return self.shutdown(),
                Err(e) => return Self::abort(e, out),
            }
        }
    }

    fn abort<W: Write>(error: DatabaseError, out: &mut W) -> Result<()> {
        writeln!(out, "{error}")?;
        out.flush()?;
        Err(error)
    }
}

pub fn print_constants<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "ROW_SIZE: {ROW_SIZE}")?;
    writeln!(out, "COMMON_NODE_HEADER_SIZE: {COMMON_NODE_HEADER_SIZE}")?;
    writeln!(out, "LEAF_NODE_HEADER_SIZE: {LEAF_NODE_HEADER_SIZE}")?;
    writeln!(out, "LEAF_NODE_CELL_SIZE: {LEAF_NODE_CELL_SIZE}")?;
    writeln!(out, "LEAF_NODE_SPACE_FOR_CELLS: {LEAF_NODE_SPACE_FOR_CELLS}")?;
    writeln!(out, "LEAF_NODE_MAX_CELLS: {LEAF_NODE_MAX_CELLS}")?;
    Ok(())
}
