//! End-to-end dataset build: CSV in, three split files out.

use dataset::io::{TEST_FILE, TRAIN_FILE, VALID_FILE};
use dataset::{prepare_dataset, ColumnSpec, PartitionReport};
use std::fs;
use tempfile::tempdir;

fn read_rows(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|s| s.to_string())
        .collect()
}

#[test]
fn test_prepare_dataset_writes_three_splits() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("interactions.csv");
    fs::write(
        &input,
        "user_id,item_id,timestamp\n\
         u2,b,20\n\
         u1,a,50\n\
         u1,b,10\n\
         u1,c,30\n\
         u2,a,10\n\
         u1,d,40\n\
         u1,e,20\n\
         u3,z,5\n\
         ,x,1\n",
    )
    .unwrap();
    let out = dir.path().join("out/shop");

    let report = prepare_dataset(&input, &out, &ColumnSpec::default()).unwrap();
    assert_eq!(
        report,
        PartitionReport {
            users: 3,
            train: 5,
            valid: 1,
            test: 2,
            dropped: 1,
        }
    );

    assert_eq!(
        read_rows(&out.join(TRAIN_FILE)),
        vec![
            "user_id,item_id,timestamp",
            "u1,b,10",
            "u1,e,20",
            "u1,c,30",
            "u2,a,10",
            "u3,z,5",
        ]
    );
    assert_eq!(read_rows(&out.join(VALID_FILE)), vec!["user_id,item_id,timestamp", "u1,d,40"]);
    assert_eq!(
        read_rows(&out.join(TEST_FILE)),
        vec!["user_id,item_id,timestamp", "u1,a,50", "u2,b,20"]
    );
}

#[test]
fn test_empty_log_writes_headers_only() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("interactions.csv");
    fs::write(&input, "user_id,item_id,timestamp\n").unwrap();

    let report = prepare_dataset(&input, dir.path(), &ColumnSpec::default()).unwrap();
    assert_eq!(report, PartitionReport::default());
    for file in [TRAIN_FILE, VALID_FILE, TEST_FILE] {
        assert_eq!(read_rows(&dir.path().join(file)), vec!["user_id,item_id,timestamp"]);
    }
}
