pub mod bplus_tree;
pub mod cursor;
pub mod pager;
