use std::{io::Write, path::Path};

use tracing::debug;

use crate::{
    storage::{cursor::Cursor, pager::Pager},
    types::{
        INTERNAL_NODE_MAX_KEYS, Key, LEAF_NODE_CELL_SIZE, LEAF_NODE_KEY_SIZE, LEAF_NODE_MAX_CELLS,
        PageId, TABLE_MAX_PAGES,
        error::{DatabaseError, Result},
        page::{NodeType, Page},
        row::Row,
    },
};

/// Outcome of a search: the cursor points at the matching cell, or at the
/// slot where the key would be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Found(Cursor),
    Vacant(Cursor),
}

impl SearchResult {
    pub fn cursor(&self) -> Cursor {
        match self {
            SearchResult::Found(cursor) | SearchResult::Vacant(cursor) => *cursor,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchResult::Found(_))
    }
}

/// One step of split propagation. `Split` carries the node that was split
/// (`left`, same page as before), its new sibling and the separator to add
/// to their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Propagation {
    Done,
    Split {
        left: PageId,
        separator: Key,
        right: PageId,
    },
}

pub struct Table {
    root_page_num: PageId,
    pager: Pager,
}

impl Table {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut pager = Pager::open(path)?;
        let root_page_num = 0;
        let is_new = pager.num_pages() == 0;
        let root = pager.get_page(root_page_num)?;
        if is_new {
            root.initialize_leaf();
            root.set_root(true);
        } else {
            root.check_counts(root_page_num)?;
            if !root.is_root() {
                return Err(DatabaseError::corrupt_node(
                    root_page_num,
                    "first page is not flagged as the root",
                ));
            }
        }
        Ok(Self {
            root_page_num,
            pager,
        })
    }

    pub fn close(self) -> Result<()> {
        self.pager.close()
    }

    pub fn root_page_num(&self) -> PageId {
        self.root_page_num
    }

    pub fn page_count(&self) -> usize {
        self.pager.num_pages()
    }

    /// Page `page_num` once it is known to exist and to carry a sane node
    /// header. Cell accessors on the returned page stay in bounds.
    pub(crate) fn checked_page(&mut self, page_num: PageId) -> Result<&mut Page> {
        let num_pages = self.pager.num_pages();
        if page_num as usize >= num_pages {
            return Err(DatabaseError::corrupt_node(
                page_num,
                format!("page is past the end of the table ({num_pages} pages)"),
            ));
        }
        let page = self.pager.get_page(page_num)?;
        page.check_counts(page_num)?;
        Ok(page)
    }

    /// Walks from the root to a leaf, taking child `choose(node)` at each
    /// internal node. A walk longer than the page limit means a cycle.
    pub(crate) fn descend_to_leaf<F>(&mut self, mut choose: F) -> Result<PageId>
    where
        F: FnMut(&Page) -> usize,
    {
        let mut page_num = self.root_page_num;
        for _ in 0..TABLE_MAX_PAGES {
            let page = self.checked_page(page_num)?;
            if page.node_type()? == NodeType::Leaf {
                return Ok(page_num);
            }
            let child_index = choose(&*page);
            let child = page
                .internal_child(child_index)
                .ok_or_else(|| missing_child(page_num, child_index))?;
            if child == page_num {
                return Err(DatabaseError::corrupt_node(
                    page_num,
                    "internal node points to itself",
                ));
            }
            page_num = child;
        }
        Err(DatabaseError::corrupt_node(
            self.root_page_num,
            format!("no leaf within {TABLE_MAX_PAGES} levels of the root"),
        ))
    }

    pub fn start_of_table(&mut self) -> Result<Cursor> {
        Cursor::start(self)
    }

    pub fn find(&mut self, key: Key) -> Result<SearchResult> {
        let page_num = self.descend_to_leaf(|page| page.internal_find_child(key))?;
        let (cell_num, found) = self.pager.get_page(page_num)?.leaf_find(key);
        let cursor = Cursor::new(page_num, cell_num, false);
        Ok(if found {
            SearchResult::Found(cursor)
        } else {
            SearchResult::Vacant(cursor)
        })
    }

    pub fn insert(&mut self, row: &Row) -> Result<()> {
        row.validate()?;
        let cursor = match self.find(row.id)? {
            SearchResult::Found(_) => return Err(DatabaseError::DuplicateKey),
            SearchResult::Vacant(cursor) => cursor,
        };
        let page = self.pager.get_page(cursor.page_num())?;
        if page.leaf_num_cells() < LEAF_NODE_MAX_CELLS {
            let num_cells = page.leaf_num_cells();
            page.leaf_shift_cells_right(cursor.cell_num());
            page.set_leaf_key(cursor.cell_num(), row.id);
            row.serialize_into(page.leaf_value_mut(cursor.cell_num()));
            page.set_leaf_num_cells(num_cells + 1);
            return Ok(());
        }
        let step = self.leaf_split_and_insert(cursor, row)?;
        self.propagate(step)
    }

    /// Pages a split of `leaf_page_num` will allocate: the new leaf, one per
    /// full ancestor, and one more if the split climbs to the root.
    fn pages_needed_for_split(&mut self, leaf_page_num: PageId) -> Result<usize> {
        let mut needed = 1;
        let mut page_num = leaf_page_num;
        for _ in 0..TABLE_MAX_PAGES {
            let page = self.checked_page(page_num)?;
            if page.is_root() {
                return Ok(needed + 1);
            }
            let parent_num = page.parent();
            if self.checked_page(parent_num)?.internal_num_keys() < INTERNAL_NODE_MAX_KEYS {
                return Ok(needed);
            }
            needed += 1;
            page_num = parent_num;
        }
        Err(DatabaseError::corrupt_node(
            leaf_page_num,
            "parent chain never reaches the root",
        ))
    }

    fn leaf_split_and_insert(&mut self, cursor: Cursor, row: &Row) -> Result<Propagation> {
        let old_page_num = cursor.page_num();
        let needed = self.pages_needed_for_split(old_page_num)?;
        self.pager.ensure_capacity(needed)?;

        let old_page = self.pager.get_page(old_page_num)?;
        let mut cells: Vec<Vec<u8>> = (0..old_page.leaf_num_cells())
            .map(|cell_num| old_page.leaf_cell(cell_num).to_vec())
            .collect();
        let mut new_cell = vec![0u8; LEAF_NODE_CELL_SIZE];
        new_cell[..LEAF_NODE_KEY_SIZE].copy_from_slice(&row.id.to_le_bytes());
        row.serialize_into(&mut new_cell[LEAF_NODE_KEY_SIZE..]);
        cells.insert(cursor.cell_num(), new_cell);

        let parent = old_page.parent();
        let old_next_leaf = old_page.leaf_next_leaf();
        let new_page_num = self.pager.allocate_new_page()?;

        let split_at = cells.len() / 2;
        let old_page = self.pager.get_page(old_page_num)?;
        write_leaf_cells(old_page, &cells[..split_at]);
        old_page.set_leaf_next_leaf(Some(new_page_num));
        let separator = old_page.leaf_key(split_at - 1);

        let new_page = self.pager.get_page(new_page_num)?;
        new_page.initialize_leaf();
        new_page.set_parent(parent);
        new_page.set_leaf_next_leaf(old_next_leaf);
        write_leaf_cells(new_page, &cells[split_at..]);

        debug!(
            left = old_page_num,
            right = new_page_num,
            separator,
            "split leaf node"
        );
        Ok(Propagation::Split {
            left: old_page_num,
            separator,
            right: new_page_num,
        })
    }

    fn propagate(&mut self, mut step: Propagation) -> Result<()> {
        loop {
            match step {
                Propagation::Done => return Ok(()),
                Propagation::Split {
                    left,
                    separator,
                    right,
                } => {
                    if self.pager.get_page(left)?.is_root() {
                        return self.create_new_root(separator, right);
                    }
                    step = self.insert_into_parent(left, separator, right)?;
                }
            }
        }
    }

    /// Moves the current root into a fresh page and turns the root page into
    /// an internal node over that page and `right_child_page_num`.
    fn create_new_root(&mut self, separator: Key, right_child_page_num: PageId) -> Result<()> {
        let root_page_num = self.root_page_num;
        let left_child_page_num = self.pager.allocate_new_page()?;

        let old_root = self.pager.get_page(root_page_num)?.clone();
        let moved_children = match old_root.node_type()? {
            NodeType::Internal => read_internal(&old_root, root_page_num)?.0,
            NodeType::Leaf => Vec::new(),
        };

        let left_child = self.pager.get_page(left_child_page_num)?;
        *left_child = old_root;
        left_child.set_root(false);
        left_child.set_parent(root_page_num);
        for child in moved_children {
            self.pager.get_page(child)?.set_parent(left_child_page_num);
        }
        self.pager
            .get_page(right_child_page_num)?
            .set_parent(root_page_num);

        let root = self.pager.get_page(root_page_num)?;
        root.initialize_internal();
        root.set_root(true);
        write_internal(
            root,
            &[left_child_page_num, right_child_page_num],
            &[separator],
        );
        debug!(
            left = left_child_page_num,
            right = right_child_page_num,
            separator,
            "created new root"
        );
        Ok(())
    }

    /// Adds `right` next to `left` in their parent, routing keys up to
    /// `separator` to `left`. Splits the parent when it overflows.
    fn insert_into_parent(
        &mut self,
        left: PageId,
        separator: Key,
        right: PageId,
    ) -> Result<Propagation> {
        let parent_page_num = self.pager.get_page(left)?.parent();
        let parent = self.checked_page(parent_page_num)?;
        let (mut children, mut keys) = read_internal(parent, parent_page_num)?;
        let position = children
            .iter()
            .position(|&child| child == left)
            .ok_or_else(|| {
                DatabaseError::corrupt_node(
                    parent_page_num,
                    format!("page {left} is not a child of its parent"),
                )
            })?;
        self.pager.get_page(right)?.set_parent(parent_page_num);
        let parent = self.pager.get_page(parent_page_num)?;
        children.insert(position + 1, right);
        keys.insert(position, separator);

        if keys.len() <= INTERNAL_NODE_MAX_KEYS {
            write_internal(parent, &children, &keys);
            return Ok(Propagation::Done);
        }

        let grandparent = parent.parent();
        let new_page_num = self.pager.allocate_new_page()?;
        let split_at = children.len() / 2;
        let pushed_up = keys[split_at - 1];

        let parent = self.pager.get_page(parent_page_num)?;
        write_internal(parent, &children[..split_at], &keys[..split_at - 1]);

        let new_page = self.pager.get_page(new_page_num)?;
        new_page.initialize_internal();
        new_page.set_parent(grandparent);
        write_internal(new_page, &children[split_at..], &keys[split_at..]);
        for &child in &children[split_at..] {
            self.pager.get_page(child)?.set_parent(new_page_num);
        }

        debug!(
            left = parent_page_num,
            right = new_page_num,
            separator = pushed_up,
            "split internal node"
        );
        Ok(Propagation::Split {
            left: parent_page_num,
            separator: pushed_up,
            right: new_page_num,
        })
    }

    pub fn print_tree<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.print_node(self.root_page_num, 0, out)
    }

    fn print_node<W: Write>(&mut self, page_num: PageId, level: usize, out: &mut W) -> Result<()> {
        if level >= TABLE_MAX_PAGES {
            return Err(DatabaseError::corrupt_node(
                page_num,
                format!("tree is deeper than {TABLE_MAX_PAGES} levels"),
            ));
        }
        let page = self.checked_page(page_num)?;
        match page.node_type()? {
            NodeType::Leaf => {
                let num_cells = page.leaf_num_cells();
                writeln!(out, "{}- leaf (size {})", indent(level), num_cells)?;
                for cell_num in 0..num_cells {
                    writeln!(out, "{}- {}", indent(level + 1), page.leaf_key(cell_num))?;
                }
            }
            NodeType::Internal => {
                let (children, keys) = read_internal(page, page_num)?;
                writeln!(out, "{}- internal (size {})", indent(level), keys.len())?;
                for (child, key) in children.iter().zip(&keys) {
                    self.print_node(*child, level + 1, out)?;
                    writeln!(out, "{}- key {}", indent(level + 1), key)?;
                }
                if let Some(&right_child) = children.last() {
                    self.print_node(right_child, level + 1, out)?;
                }
            }
        }
        Ok(())
    }
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn missing_child(page_id: PageId, child_index: usize) -> DatabaseError {
    DatabaseError::corrupt_node(page_id, format!("internal node has no child {child_index}"))
}

fn write_leaf_cells(page: &mut Page, cells: &[Vec<u8>]) {
    for (cell_num, cell) in cells.iter().enumerate() {
        page.leaf_cell_mut(cell_num).copy_from_slice(cell);
    }
    page.set_leaf_num_cells(cells.len());
}

/// Children of an internal node in key order, the right child last, and
/// the keys between them.
fn read_internal(page: &Page, page_num: PageId) -> Result<(Vec<PageId>, Vec<Key>)> {
    if page.check_counts(page_num)? != NodeType::Internal {
        return Err(DatabaseError::corrupt_node(page_num, "expected an internal node"));
    }
    let num_keys = page.internal_num_keys();
    let mut children: Vec<PageId> = (0..num_keys)
        .map(|cell_num| page.internal_cell_child(cell_num))
        .collect();
    let keys = (0..num_keys)
        .map(|cell_num| page.internal_key(cell_num))
        .collect();
    let right_child = page
        .internal_right_child()
        .ok_or_else(|| missing_child(page_num, num_keys))?;
    children.push(right_child);
    Ok((children, keys))
}

/// `children` must hold exactly one more entry than `keys`.
fn write_internal(page: &mut Page, children: &[PageId], keys: &[Key]) {
    for (cell_num, (&child, &key)) in children.iter().zip(keys).enumerate() {
        page.set_internal_cell_child(cell_num, child);
        page.set_internal_key(cell_num, key);
    }
    page.set_internal_num_keys(keys.len());
    page.set_internal_right_child(children.last().copied());
}
