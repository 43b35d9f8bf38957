use crate::{
    storage::bplus_tree::Table,
    types::{
        Key, PageId,
        error::{DatabaseError, Result},
        page::{NodeType, Page},
    },
};

/// A position in the tree: a leaf page and a cell inside it.
///
/// The cursor holds no borrow of the table, so every operation takes the
/// table explicitly. Inserting while a cursor is live invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    page_num: PageId,
    cell_num: usize,
    end_of_table: bool,
}

impl Cursor {
    pub(crate) fn new(page_num: PageId, cell_num: usize, end_of_table: bool) -> Self {
        Self {
            page_num,
            cell_num,
            end_of_table,
        }
    }

    /// Positions at the first cell of the leftmost leaf.
    pub fn start(table: &mut Table) -> Result<Self> {
        let page_num = table.descend_to_leaf(|_| 0)?;
        let num_cells = table.checked_page(page_num)?.leaf_num_cells();
        Ok(Self::new(page_num, 0, num_cells == 0))
    }

    pub fn page_num(&self) -> PageId {
        self.page_num
    }

    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    pub fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    pub fn key(&self, table: &mut Table) -> Result<Key> {
        Ok(self.occupied_leaf(table)?.leaf_key(self.cell_num))
    }

    /// Serialized row under the cursor; decode it with `Row::deserialize`.
    pub fn value<'t>(&self, table: &'t mut Table) -> Result<&'t [u8]> {
        Ok(self.occupied_leaf(table)?.leaf_value(self.cell_num))
    }

    pub fn advance(&mut self, table: &mut Table) -> Result<()> {
        let page = self.leaf(table)?;
        self.cell_num += 1;
        if self.cell_num < page.leaf_num_cells() {
            return Ok(());
        }
        match page.leaf_next_leaf() {
            Some(next_leaf) if next_leaf == self.page_num => {
                return Err(DatabaseError::corrupt_node(
                    self.page_num,
                    "leaf links to itself",
                ));
            }
            Some(next_leaf) => {
                self.page_num = next_leaf;
                self.cell_num = 0;
                self.leaf(table)?;
            }
            None => self.end_of_table = true,
        }
        Ok(())
    }

    /// The leaf under the cursor, checked to really be a leaf.
    fn leaf<'t>(&self, table: &'t mut Table) -> Result<&'t mut Page> {
        let page = table.checked_page(self.page_num)?;
        if page.node_type()? != NodeType::Leaf {
            return Err(DatabaseError::corrupt_node(
                self.page_num,
                "leaf chain leads to an internal node",
            ));
        }
        Ok(page)
    }

    fn occupied_leaf<'t>(&self, table: &'t mut Table) -> Result<&'t mut Page> {
        let page = self.leaf(table)?;
        if self.cell_num >= page.leaf_num_cells() {
            return Err(DatabaseError::corrupt_node(
                self.page_num,
                format!("cursor points at empty cell {}", self.cell_num),
            ));
        }
        Ok(page)
    }
}
