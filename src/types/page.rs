use crate::types::{
    INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_CHILD_SIZE, INTERNAL_NODE_HEADER_SIZE,
    INTERNAL_NODE_MAX_KEYS, INTERNAL_NODE_NUM_KEYS_OFFSET, INTERNAL_NODE_RIGHT_CHILD_OFFSET,
    INVALID_PAGE_ID, IS_ROOT_OFFSET, Key, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE,
    LEAF_NODE_KEY_SIZE, LEAF_NODE_MAX_CELLS, LEAF_NODE_NEXT_LEAF_OFFSET,
    LEAF_NODE_NUM_CELLS_OFFSET, LEAF_NODE_VALUE_SIZE, NODE_TYPE_OFFSET, PAGE_SIZE,
    PARENT_POINTER_OFFSET, PageId,
    error::{DatabaseError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(NodeType::Internal),
            1 => Ok(NodeType::Leaf),
            _ => Err(DatabaseError::InvalidNodeType(value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            NodeType::Internal => 0,
            NodeType::Leaf => 1,
        }
    }
}

/*
 * Node Layout on Disk
 * ┌─────────────────────────────────────────────────────────────────┐
 * │              COMMON NODE HEADER (6 bytes)                       │
 * │  node_type(1) | is_root(1) | parent_page(4)                     │
 * ├─────────────────────────────────────────────────────────────────┤
 * │ LEAF:     num_cells(4) | next_leaf(4)                           │
 * │           [key(4) | row(293)] * num_cells       (max 13)        │
 * ├─────────────────────────────────────────────────────────────────┤
 * │ INTERNAL: num_keys(4) | right_child(4)                          │
 * │           [child(4) | key(4)] * num_keys        (max 3)         │
 * └─────────────────────────────────────────────────────────────────┘
 * All integers are little-endian. INVALID_PAGE_ID marks a missing
 * next leaf or right child.
 */

/// One page-sized buffer. Every node accessor reads and writes the bytes in
/// place, so the buffer is always exactly what lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    data: Box<[u8; PAGE_SIZE]>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; PAGE_SIZE]),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    fn read_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn read_page_id(&self, offset: usize) -> Option<PageId> {
        match self.read_u32(offset) {
            INVALID_PAGE_ID => None,
            page_id => Some(page_id),
        }
    }

    // Common header

    pub fn node_type(&self) -> Result<NodeType> {
        NodeType::from_u8(self.data[NODE_TYPE_OFFSET])
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.data[NODE_TYPE_OFFSET] = node_type.as_u8();
    }

    pub fn is_root(&self) -> bool {
        self.data[IS_ROOT_OFFSET] != 0
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.data[IS_ROOT_OFFSET] = u8::from(is_root);
    }

    /// Meaningless for the root.
    pub fn parent(&self) -> PageId {
        self.read_u32(PARENT_POINTER_OFFSET)
    }

    pub fn set_parent(&mut self, parent: PageId) {
        self.write_u32(PARENT_POINTER_OFFSET, parent);
    }

    /// Errors with `CorruptNode` unless the node type is known and its
    /// stored cell or key count fits in a page. Every cell accessor below
    /// assumes this holds.
    pub fn check_counts(&self, page_id: PageId) -> Result<NodeType> {
        let node_type = self.node_type()?;
        let (count, max) = match node_type {
            NodeType::Leaf => (self.leaf_num_cells(), LEAF_NODE_MAX_CELLS),
            NodeType::Internal => (self.internal_num_keys(), INTERNAL_NODE_MAX_KEYS),
        };
        if count > max {
            return Err(DatabaseError::corrupt_node(
                page_id,
                format!("{node_type:?} node claims {count} entries, at most {max} fit"),
            ));
        }
        Ok(node_type)
    }

    // Leaf nodes

    pub fn initialize_leaf(&mut self) {
        self.set_node_type(NodeType::Leaf);
        self.set_root(false);
        self.set_leaf_num_cells(0);
        self.set_leaf_next_leaf(None);
    }

    pub fn leaf_num_cells(&self) -> usize {
        self.read_u32(LEAF_NODE_NUM_CELLS_OFFSET) as usize
    }

    pub fn set_leaf_num_cells(&mut self, num_cells: usize) {
        self.write_u32(LEAF_NODE_NUM_CELLS_OFFSET, num_cells as u32);
    }

    pub fn leaf_next_leaf(&self) -> Option<PageId> {
        self.read_page_id(LEAF_NODE_NEXT_LEAF_OFFSET)
    }

    pub fn set_leaf_next_leaf(&mut self, next_leaf: Option<PageId>) {
        self.write_u32(
            LEAF_NODE_NEXT_LEAF_OFFSET,
            next_leaf.unwrap_or(INVALID_PAGE_ID),
        );
    }

    fn leaf_cell_offset(cell_num: usize) -> usize {
        LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
    }

    pub fn leaf_cell(&self, cell_num: usize) -> &[u8] {
        let start = Self::leaf_cell_offset(cell_num);
        &self.data[start..start + LEAF_NODE_CELL_SIZE]
    }

    pub fn leaf_cell_mut(&mut self, cell_num: usize) -> &mut [u8] {
        let start = Self::leaf_cell_offset(cell_num);
        &mut self.data[start..start + LEAF_NODE_CELL_SIZE]
    }

    pub fn leaf_key(&self, cell_num: usize) -> Key {
        self.read_u32(Self::leaf_cell_offset(cell_num))
    }

    pub fn set_leaf_key(&mut self, cell_num: usize, key: Key) {
        self.write_u32(Self::leaf_cell_offset(cell_num), key);
    }

    pub fn leaf_value(&self, cell_num: usize) -> &[u8] {
        let start = Self::leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
        &self.data[start..start + LEAF_NODE_VALUE_SIZE]
    }

    pub fn leaf_value_mut(&mut self, cell_num: usize) -> &mut [u8] {
        let start = Self::leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
        &mut self.data[start..start + LEAF_NODE_VALUE_SIZE]
    }

    /// Moves cells `from..num_cells` one slot to the right, opening a gap
    /// at `from`. The cell count is left to the caller.
    pub fn leaf_shift_cells_right(&mut self, from: usize) {
        let num_cells = self.leaf_num_cells();
        if from >= num_cells {
            return;
        }
        let start = Self::leaf_cell_offset(from);
        let end = Self::leaf_cell_offset(num_cells);
        self.data.copy_within(start..end, start + LEAF_NODE_CELL_SIZE);
    }

    /// Binary search for `key`. Returns the matching cell, or the slot where
    /// the key would be inserted.
    pub fn leaf_find(&self, key: Key) -> (usize, bool) {
        let mut min_index = 0;
        let mut one_past_max_index = self.leaf_num_cells();
        while one_past_max_index != min_index {
            let index = (min_index + one_past_max_index) / 2;
            let key_at_index = self.leaf_key(index);
            if key == key_at_index {
                return (index, true);
            }
            if key < key_at_index {
                one_past_max_index = index;
            } else {
                min_index = index + 1;
            }
        }
        (min_index, false)
    }

    // Internal nodes

    pub fn initialize_internal(&mut self) {
        self.set_node_type(NodeType::Internal);
        self.set_root(false);
        self.set_internal_num_keys(0);
        self.set_internal_right_child(None);
    }

    pub fn internal_num_keys(&self) -> usize {
        self.read_u32(INTERNAL_NODE_NUM_KEYS_OFFSET) as usize
    }

    pub fn set_internal_num_keys(&mut self, num_keys: usize) {
        self.write_u32(INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys as u32);
    }

    pub fn internal_right_child(&self) -> Option<PageId> {
        self.read_page_id(INTERNAL_NODE_RIGHT_CHILD_OFFSET)
    }

    pub fn set_internal_right_child(&mut self, right_child: Option<PageId>) {
        self.write_u32(
            INTERNAL_NODE_RIGHT_CHILD_OFFSET,
            right_child.unwrap_or(INVALID_PAGE_ID),
        );
    }

    fn internal_cell_offset(cell_num: usize) -> usize {
        INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
    }

    /// Child pointer stored in keyed cell `cell_num`; the right child lives
    /// in the header and is read with `internal_right_child`.
    pub fn internal_cell_child(&self, cell_num: usize) -> PageId {
        self.read_u32(Self::internal_cell_offset(cell_num))
    }

    pub fn set_internal_cell_child(&mut self, cell_num: usize, child: PageId) {
        self.write_u32(Self::internal_cell_offset(cell_num), child);
    }

    pub fn internal_key(&self, cell_num: usize) -> Key {
        self.read_u32(Self::internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE)
    }

    pub fn set_internal_key(&mut self, cell_num: usize, key: Key) {
        self.write_u32(
            Self::internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE,
            key,
        );
    }

    /// Child `child_num` counting the right child as index `num_keys`.
    pub fn internal_child(&self, child_num: usize) -> Option<PageId> {
        let num_keys = self.internal_num_keys();
        if child_num < num_keys {
            Some(self.internal_cell_child(child_num))
        } else if child_num == num_keys {
            self.internal_right_child()
        } else {
            None
        }
    }

    /// Index of the child whose subtree may hold `key`: the first key that is
    /// `>= key`, or `num_keys` for the right child. A key equal to a
    /// separator routes left.
    pub fn internal_find_child(&self, key: Key) -> usize {
        let mut min_index = 0;
        let mut max_index = self.internal_num_keys();
        while min_index != max_index {
            let index = (min_index + max_index) / 2;
            if self.internal_key(index) >= key {
                max_index = index;
            } else {
                min_index = index + 1;
            }
        }
        min_index
    }
}
