use lumbung::{
    storage::cursor::Cursor,
    types::row::Row,
    utils::mock::{TempDatabase, sample_row},
};

#[test]
fn test_start_on_empty_table_is_end() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    let cursor = Cursor::start(&mut table).unwrap();
    assert!(cursor.end_of_table());
    assert_eq!(cursor.page_num(), 0);
    assert_eq!(cursor.cell_num(), 0);
}

#[test]
fn test_walk_single_leaf() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    for key in [5, 1, 3] {
        table.insert(&sample_row(key)).unwrap();
    }

    let mut cursor = Cursor::start(&mut table).unwrap();
    let mut rows = Vec::new();
    while !cursor.end_of_table() {
        rows.push(Row::deserialize(cursor.value(&mut table).unwrap()));
        cursor.advance(&mut table).unwrap();
    }
    assert_eq!(rows, vec![sample_row(1), sample_row(3), sample_row(5)]);
}

#[test]
fn test_start_descends_to_leftmost_leaf() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    for key in (1..=30).rev() {
        table.insert(&sample_row(key)).unwrap();
    }
    let cursor = Cursor::start(&mut table).unwrap();
    assert_ne!(cursor.page_num(), table.root_page_num());
    assert_eq!(cursor.key(&mut table).unwrap(), 1);
}

#[test]
fn test_advance_crosses_leaves() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    for key in 1..=14 {
        table.insert(&sample_row(key)).unwrap();
    }

    let mut cursor = table.find(7).unwrap().cursor();
    let first_leaf = cursor.page_num();
    cursor.advance(&mut table).unwrap();
    assert!(!cursor.end_of_table());
    assert_ne!(cursor.page_num(), first_leaf);
    assert_eq!(cursor.cell_num(), 0);
    assert_eq!(cursor.key(&mut table).unwrap(), 8);
}

#[test]
fn test_advance_past_last_cell_ends_table() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    for key in 1..=20 {
        table.insert(&sample_row(key)).unwrap();
    }
    let mut cursor = table.find(20).unwrap().cursor();
    cursor.advance(&mut table).unwrap();
    assert!(cursor.end_of_table());
}
