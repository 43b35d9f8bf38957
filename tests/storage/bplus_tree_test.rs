use lumbung::{
    storage::bplus_tree::Table,
    types::{TABLE_MAX_PAGES, error::DatabaseError, row::Row},
    utils::mock::{TempDatabase, sample_row},
};

fn insert_all(table: &mut Table, keys: &[u32]) {
    for &key in keys {
        table.insert(&sample_row(key)).unwrap();
    }
}

fn tree_dump(table: &mut Table) -> String {
    let mut out = Vec::new();
    table.print_tree(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn collect_keys(table: &mut Table) -> Vec<u32> {
    let mut keys = Vec::new();
    let mut cursor = table.start_of_table().unwrap();
    while !cursor.end_of_table() {
        keys.push(cursor.key(table).unwrap());
        cursor.advance(table).unwrap();
    }
    keys
}

fn lines(expected: &[&str]) -> String {
    expected.iter().map(|line| format!("{line}\n")).collect()
}

#[test]
fn test_open_empty_file_creates_root_leaf() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    assert_eq!(table.root_page_num(), 0);
    assert_eq!(table.page_count(), 1);
    assert_eq!(tree_dump(&mut table), "- leaf (size 0)\n");
    assert!(table.start_of_table().unwrap().end_of_table());
}

#[test]
fn test_single_leaf_keeps_keys_sorted() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    insert_all(&mut table, &[3, 1, 2]);
    assert_eq!(
        tree_dump(&mut table),
        lines(&["- leaf (size 3)", "  - 1", "  - 2", "  - 3"])
    );
}

#[test]
fn test_duplicate_key_rejected() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    insert_all(&mut table, &[1]);
    let err = table.insert(&Row::new(1, "other", "other@example.com")).unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateKey));
    assert!(!err.is_fatal());
    assert_eq!(collect_keys(&mut table), vec![1]);
}

#[test]
fn test_insert_validates_row() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    assert!(matches!(
        table.insert(&Row::new(0, "a", "b")),
        Err(DatabaseError::IdMustBePositive)
    ));
    assert!(matches!(
        table.insert(&Row::new(1, "a".repeat(33), "b")),
        Err(DatabaseError::StringTooLong)
    ));
    assert!(collect_keys(&mut table).is_empty());
}

#[test]
fn test_find_reports_slot() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    insert_all(&mut table, &[10, 20, 30]);

    let found = table.find(20).unwrap();
    assert!(found.is_found());
    assert_eq!(found.cursor().cell_num(), 1);

    let vacant = table.find(25).unwrap();
    assert!(!vacant.is_found());
    assert_eq!(vacant.cursor().cell_num(), 2);
}

#[test]
fn test_leaf_split_creates_internal_root() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    let keys: Vec<u32> = (1..=14).collect();
    insert_all(&mut table, &keys);

    assert_eq!(
        tree_dump(&mut table),
        lines(&[
            "- internal (size 1)",
            "  - leaf (size 7)",
            "    - 1",
            "    - 2",
            "    - 3",
            "    - 4",
            "    - 5",
            "    - 6",
            "    - 7",
            "  - key 7",
            "  - leaf (size 7)",
            "    - 8",
            "    - 9",
            "    - 10",
            "    - 11",
            "    - 12",
            "    - 13",
            "    - 14",
        ])
    );
    assert_eq!(table.root_page_num(), 0);
    assert_eq!(table.page_count(), 3);
    assert_eq!(collect_keys(&mut table), keys);
}

#[test]
fn test_separator_key_routes_left() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    insert_all(&mut table, &(1..=14).collect::<Vec<_>>());

    let left_leaf = table.find(1).unwrap().cursor().page_num();
    let found = table.find(7).unwrap();
    assert!(found.is_found());
    assert_eq!(found.cursor().page_num(), left_leaf);
    assert_ne!(table.find(8).unwrap().cursor().page_num(), left_leaf);
}

#[test]
fn test_four_leaf_tree_shape() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    insert_all(
        &mut table,
        &[
            18, 7, 10, 29, 23, 4, 14, 30, 15, 26, 22, 19, 2, 1, 21, 11, 6, 20, 5, 8, 9, 3, 12, 27,
            17, 16, 13, 24, 25, 28,
        ],
    );

    assert_eq!(
        tree_dump(&mut table),
        lines(&[
            "- internal (size 3)",
            "  - leaf (size 7)",
            "    - 1",
            "    - 2",
            "    - 3",
            "    - 4",
            "    - 5",
            "    - 6",
            "    - 7",
            "  - key 7",
            "  - leaf (size 8)",
            "    - 8",
            "    - 9",
            "    - 10",
            "    - 11",
            "    - 12",
            "    - 13",
            "    - 14",
            "    - 15",
            "  - key 15",
            "  - leaf (size 7)",
            "    - 16",
            "    - 17",
            "    - 18",
            "    - 19",
            "    - 20",
            "    - 21",
            "    - 22",
            "  - key 22",
            "  - leaf (size 8)",
            "    - 23",
            "    - 24",
            "    - 25",
            "    - 26",
            "    - 27",
            "    - 28",
            "    - 29",
            "    - 30",
        ])
    );
}

#[test]
fn test_internal_split_builds_three_levels() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    let keys = [
        58, 56, 8, 54, 77, 7, 25, 71, 13, 22, 53, 51, 59, 32, 36, 79, 10, 33, 20, 4, 35, 76, 49,
        24, 70, 48, 39, 15, 47, 30, 86, 31, 68, 37, 66, 63, 40, 78, 19, 46, 14, 81, 72, 6, 50, 85,
        67, 2, 55, 69, 5, 65, 52, 1, 29, 9, 43, 75, 21, 82, 12, 18, 60, 44,
    ];
    insert_all(&mut table, &keys);

    let expected = lines(&[
        "- internal (size 1)",
        "  - internal (size 2)",
        "    - leaf (size 7)",
        "      - 1",
        "      - 2",
        "      - 4",
        "      - 5",
        "      - 6",
        "      - 7",
        "      - 8",
        "    - key 8",
        "    - leaf (size 11)",
        "      - 9",
        "      - 10",
        "      - 12",
        "      - 13",
        "      - 14",
        "      - 15",
        "      - 18",
        "      - 19",
        "      - 20",
        "      - 21",
        "      - 22",
        "    - key 22",
        "    - leaf (size 8)",
        "      - 24",
        "      - 25",
        "      - 29",
        "      - 30",
        "      - 31",
        "      - 32",
        "      - 33",
        "      - 35",
        "  - key 35",
        "  - internal (size 3)",
        "    - leaf (size 12)",
        "      - 36",
        "      - 37",
        "      - 39",
        "      - 40",
        "      - 43",
        "      - 44",
        "      - 46",
        "      - 47",
        "      - 48",
        "      - 49",
        "      - 50",
        "      - 51",
        "    - key 51",
        "    - leaf (size 11)",
        "      - 52",
        "      - 53",
        "      - 54",
        "      - 55",
        "      - 56",
        "      - 58",
        "      - 59",
        "      - 60",
        "      - 63",
        "      - 65",
        "      - 66",
        "    - key 66",
        "    - leaf (size 7)",
        "      - 67",
        "      - 68",
        "      - 69",
        "      - 70",
        "      - 71",
        "      - 72",
        "      - 75",
        "    - key 75",
        "    - leaf (size 8)",
        "      - 76",
        "      - 77",
        "      - 78",
        "      - 79",
        "      - 81",
        "      - 82",
        "      - 85",
        "      - 86",
    ]);
    assert_eq!(tree_dump(&mut table), expected);

    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    assert_eq!(collect_keys(&mut table), sorted);
    for key in keys {
        assert!(table.find(key).unwrap().is_found(), "key {key} not found");
    }
}

#[test]
fn test_scrambled_inserts_scan_in_order() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    // 211 is prime, so multiplying by 73 permutes 1..=210
    let keys: Vec<u32> = (1..=210).map(|i| (i * 73) % 211).collect();
    insert_all(&mut table, &keys);

    assert_eq!(collect_keys(&mut table), (1..=210).collect::<Vec<_>>());
    for key in [1, 105, 210] {
        let cursor = table.find(key).unwrap().cursor();
        let row = Row::deserialize(cursor.value(&mut table).unwrap());
        assert_eq!(row, sample_row(key));
    }
    assert!(!table.find(211).unwrap().is_found());
}

#[test]
fn test_table_full_leaves_tree_intact() {
    let db = TempDatabase::new().unwrap();
    let mut table = db.open_table().unwrap();
    let mut inserted = Vec::new();
    let mut full = false;
    for key in (2..).step_by(2).take(5000) {
        match table.insert(&sample_row(key)) {
            Ok(()) => inserted.push(key),
            Err(DatabaseError::TableFull) => {
                full = true;
                break;
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert!(full, "table never filled up");
    assert!(table.page_count() <= TABLE_MAX_PAGES);

    let pages = table.page_count();
    let next = inserted.last().unwrap() + 2;
    assert!(matches!(
        table.insert(&sample_row(next)),
        Err(DatabaseError::TableFull)
    ));
    assert_eq!(table.page_count(), pages);
    assert_eq!(collect_keys(&mut table), inserted);

    // the first leaf still has room, so no page is needed
    table.insert(&sample_row(3)).unwrap();
    assert_eq!(table.page_count(), pages);
}

#[test]
fn test_rows_persist_after_close() {
    let db = TempDatabase::new().unwrap();
    let keys: Vec<u32> = (1..=50).rev().collect();
    let before = {
        let mut table = db.open_table().unwrap();
        insert_all(&mut table, &keys);
        let dump = tree_dump(&mut table);
        table.close().unwrap();
        dump
    };

    let mut table = db.open_table().unwrap();
    assert_eq!(tree_dump(&mut table), before);
    assert_eq!(collect_keys(&mut table), (1..=50).collect::<Vec<_>>());
    let cursor = table.find(42).unwrap().cursor();
    assert_eq!(
        Row::deserialize(cursor.value(&mut table).unwrap()),
        sample_row(42)
    );

    table.insert(&sample_row(51)).unwrap();
    assert!(table.find(51).unwrap().is_found());
}
