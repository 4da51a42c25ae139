//! CSV dataset writing.

use std::fs;
use std::path::Path;

use polars::prelude::{AnyValue, DataFrame};

use crate::error::{IngestError, Result};
use crate::polars_utils::any_to_string;

/// Writes a frame as CSV with a header row and no index column.
///
/// Nulls are written as empty fields. Parent directories are created.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| IngestError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let csv_err = |e: csv::Error| IngestError::CsvWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

    let columns = df.get_columns();
    writer
        .write_record(columns.iter().map(|col| col.name().as_str()))
        .map_err(csv_err)?;

    let mut record: Vec<String> = Vec::with_capacity(columns.len());
    for idx in 0..df.height() {
        record.clear();
        for col in columns {
            record.push(any_to_string(col.get(idx).unwrap_or(AnyValue::Null)));
        }
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "wrote csv"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    #[test]
    fn test_write_csv_quotes_multiline_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("final.csv");
        let df = df! {
            "srcip" => &["10.0.0.1", "0"],
            "extra" => &["ttl = 64\nservice = dns", ""],
        }
        .unwrap();
        write_csv(&df, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "srcip,extra\n10.0.0.1,\"ttl = 64\nservice = dns\"\n0,\n"
        );
    }
}
