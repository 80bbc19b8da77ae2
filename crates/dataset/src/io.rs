//! Reading the interaction CSV and writing the train/valid/test files.
//!
//! Input is a headed CSV; columns are found by name. Output is three CSVs
//! (`train.csv`, `valid.csv`, `test.csv`) with header `user_id,item_id,timestamp`.
//! Records are read as raw bytes so one badly encoded row is dropped on its
//! own instead of failing the run.

use crate::error::{DatasetError, Result};
use crate::partition::{partition, PartitionedLog};
use catalog::Interaction;
use csv::{ByteRecord, ReaderBuilder, Trim, Writer};
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const TRAIN_FILE: &str = "train.csv";
pub const VALID_FILE: &str = "valid.csv";
pub const TEST_FILE: &str = "test.csv";

const OUTPUT_HEADER: [&str; 3] = ["user_id", "item_id", "timestamp"];

/// Names of the input columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub user: String,
    pub item: String,
    /// Optional in the input; the row ordinal stands in when it is absent
    pub timestamp: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            user: "user_id".to_string(),
            item: "item_id".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

/// Parsed log plus what was thrown away on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedLog {
    pub interactions: Vec<Interaction>,
    /// Rows with an empty user or item id
    pub missing_ids: usize,
    /// Rows with a timestamp that is not a number
    pub bad_timestamps: usize,
    /// Rows whose user, item or timestamp field is not valid UTF-8
    pub bad_encoding: usize,
    /// Input had no timestamp column
    pub ordinal_timestamps: bool,
}

impl LoadedLog {
    pub fn dropped(&self) -> usize {
        self.missing_ids + self.bad_timestamps + self.bad_encoding
    }
}

/// Summary of one dataset build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionReport {
    pub users: usize,
    pub train: usize,
    pub valid: usize,
    pub test: usize,
    pub dropped: usize,
}

/// Integer or float seconds; fractional parts are truncated
fn parse_timestamp(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
    })
}

fn find_column(header: &ByteRecord, name: &str) -> Option<usize> {
    header.iter().position(|h| h == name.as_bytes())
}

fn require_column(header: &ByteRecord, name: &str, file: &str) -> Result<usize> {
    find_column(header, name).ok_or_else(|| DatasetError::MissingColumn {
        column: name.to_string(),
        file: file.to_string(),
    })
}

/// Field `idx` as text; a missing field reads as empty
fn field(record: &ByteRecord, idx: usize) -> std::result::Result<&str, std::str::Utf8Error> {
    std::str::from_utf8(record.get(idx).unwrap_or_default())
}

/// Read an interaction log.
///
/// Bad rows are dropped and counted; only a missing file, an empty file, a
/// missing user/item column or an unreadable stream is an error.
#[instrument(skip(columns))]
pub fn read_interactions(path: &Path, columns: &ColumnSpec) -> Result<LoadedLog> {
    let file_name = path.display().to_string();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DatasetError::FileNotFound {
            path: file_name.clone(),
        },
        _ => DatasetError::IoError(e),
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let header = reader.byte_headers()?.clone();
    if header.is_empty() {
        return Err(DatasetError::EmptyInput { file: file_name });
    }
    let user_col = require_column(&header, &columns.user, &file_name)?;
    let item_col = require_column(&header, &columns.item, &file_name)?;
    let time_col = find_column(&header, &columns.timestamp);

    let mut log = LoadedLog {
        ordinal_timestamps: time_col.is_none(),
        ..Default::default()
    };
    if log.ordinal_timestamps {
        warn!(
            "No '{}' column in {}, using row order as time",
            columns.timestamp, file_name
        );
    }

    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        let (Ok(user_id), Ok(item_id)) = (field(&record, user_col), field(&record, item_col)) else {
            log.bad_encoding += 1;
            continue;
        };
        if user_id.is_empty() || item_id.is_empty() {
            log.missing_ids += 1;
            continue;
        }

        let timestamp = match time_col {
            Some(idx) => match field(&record, idx) {
                Ok(raw) => match parse_timestamp(raw) {
                    Some(ts) => ts,
                    None => {
                        log.bad_timestamps += 1;
                        continue;
                    }
                },
                Err(_) => {
                    log.bad_encoding += 1;
                    continue;
                }
            },
            None => log.interactions.len() as i64,
        };
        log.interactions.push(Interaction::new(user_id, item_id, timestamp));
    }

    debug!(
        "Read {} interactions from {} ({} dropped)",
        log.interactions.len(),
        file_name,
        log.dropped()
    );
    Ok(log)
}

fn write_rows<'a>(path: &Path, rows: impl Iterator<Item = &'a Interaction>) -> Result<usize> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(OUTPUT_HEADER)?;

    let mut written = 0;
    for row in rows {
        let timestamp = row.timestamp.to_string();
        writer.write_record([row.user_id.as_str(), row.item_id.as_str(), timestamp.as_str()])?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Write the three split files into `out_dir`, creating it if needed
pub fn write_splits(log: &PartitionedLog, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    write_rows(&out_dir.join(TRAIN_FILE), log.train())?;
    write_rows(&out_dir.join(VALID_FILE), log.valid())?;
    write_rows(&out_dir.join(TEST_FILE), log.test())?;
    Ok(())
}

/// Read, partition and write: the whole dataset build
pub fn prepare_dataset(input: &Path, out_dir: &Path, columns: &ColumnSpec) -> Result<PartitionReport> {
    let loaded = read_interactions(input, columns)?;
    let dropped = loaded.dropped();
    if dropped > 0 {
        warn!(
            "Dropped {} rows ({} missing ids, {} bad timestamps, {} badly encoded)",
            dropped, loaded.missing_ids, loaded.bad_timestamps, loaded.bad_encoding
        );
    }

    let split = partition(loaded.interactions);
    write_splits(&split, out_dir)?;

    let (train, valid, test) = split.counts();
    let report = PartitionReport {
        users: split.users.len(),
        train,
        valid,
        test,
        dropped,
    };
    info!(
        "Wrote {} train, {} valid, {} test rows for {} users to {}",
        report.train,
        report.valid,
        report.test,
        report.users,
        out_dir.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::split_user;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn write_log(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_read_reorders_columns_by_name() {
        let file = write_log(b"timestamp,item_id,user_id\n100,i1,u1\n200.7,i2,u1\n");
        let log = read_interactions(file.path(), &ColumnSpec::default()).unwrap();

        assert_eq!(
            log.interactions,
            vec![Interaction::new("u1", "i1", 100), Interaction::new("u1", "i2", 200)]
        );
        assert_eq!(log.dropped(), 0);
    }

    #[test]
    fn test_read_handles_quoted_fields() {
        let file = write_log(b"user_id,item_id,timestamp\n\"u,1\",\"say \"\"hi\"\"\",4\n");
        let log = read_interactions(file.path(), &ColumnSpec::default()).unwrap();

        assert_eq!(log.interactions, vec![Interaction::new("u,1", "say \"hi\"", 4)]);
    }

    #[test]
    fn test_read_drops_bad_rows() {
        let file = write_log(b"user_id,item_id,timestamp\nu1,i1,5\n,i2,6\nu2,,7\nu3,i3,soon\n\nu4,i4,8\n");
        let log = read_interactions(file.path(), &ColumnSpec::default()).unwrap();

        assert_eq!(log.interactions.len(), 2);
        assert_eq!(log.missing_ids, 2);
        assert_eq!(log.bad_timestamps, 1);
    }

    #[test]
    fn test_badly_encoded_row_is_dropped_alone() {
        let file = write_log(b"user_id,item_id,timestamp\nu1,a,1\nu1,\xff\xfe,2\nu1,c,3\n");
        let log = read_interactions(file.path(), &ColumnSpec::default()).unwrap();

        assert_eq!(
            log.interactions,
            vec![Interaction::new("u1", "a", 1), Interaction::new("u1", "c", 3)]
        );
        assert_eq!(log.bad_encoding, 1);
        assert_eq!(log.dropped(), 1);
    }

    #[test]
    fn test_missing_timestamp_column_uses_row_order() {
        let file = write_log(b"user_id,item_id\nu1,a\n,b\nu1,c\n");
        let log = read_interactions(file.path(), &ColumnSpec::default()).unwrap();

        assert!(log.ordinal_timestamps);
        assert_eq!(
            log.interactions,
            vec![Interaction::new("u1", "a", 0), Interaction::new("u1", "c", 1)]
        );
    }

    #[test]
    fn test_missing_user_column_is_an_error() {
        let file = write_log(b"visitor,item_id\nv,a\n");
        let err = read_interactions(file.path(), &ColumnSpec::default()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { column, .. } if column == "user_id"));
    }

    #[test]
    fn test_empty_file_and_missing_file() {
        let file = write_log(b"");
        assert!(matches!(
            read_interactions(file.path(), &ColumnSpec::default()),
            Err(DatasetError::EmptyInput { .. })
        ));
        assert!(matches!(
            read_interactions(Path::new("/no/such/log.csv"), &ColumnSpec::default()),
            Err(DatasetError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_custom_column_names() {
        let file = write_log(b"visitorid,itemid,ts\nv1,10,3\n");
        let columns = ColumnSpec {
            user: "visitorid".to_string(),
            item: "itemid".to_string(),
            timestamp: "ts".to_string(),
        };
        let log = read_interactions(file.path(), &columns).unwrap();
        assert_eq!(log.interactions, vec![Interaction::new("v1", "10", 3)]);
    }

    #[test]
    fn test_written_splits_read_back_unchanged() {
        let rows = vec![
            Interaction::new("u1", "line\nbreak", 1),
            Interaction::new("u1", "a,b", 2),
            Interaction::new("u1", "quote\"d", 3),
        ];
        let split = PartitionedLog {
            users: vec![split_user("u1", rows.clone())],
        };
        let dir = tempdir().unwrap();
        write_splits(&split, dir.path()).unwrap();

        let mut read_back = Vec::new();
        for file in [TRAIN_FILE, VALID_FILE, TEST_FILE] {
            let log = read_interactions(&dir.path().join(file), &ColumnSpec::default()).unwrap();
            assert_eq!(log.dropped(), 0);
            read_back.extend(log.interactions);
        }
        assert_eq!(read_back, rows);
    }
}
