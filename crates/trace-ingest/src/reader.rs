//! CSV dataset reading.

use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};

use crate::error::{IngestError, Result};

/// Maximum file size for dataset loading (2 GB default).
pub const MAX_DATASET_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Rows sampled for dtype inference.
const INFER_SCHEMA_ROWS: usize = 100;

/// Check file size before loading.
pub fn check_file_size(path: &Path) -> Result<()> {
    check_file_size_with_limit(path, MAX_DATASET_FILE_SIZE)
}

/// Check file size against a custom limit.
pub fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::read(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    Ok(())
}

/// Reads a CSV dataset with dtype inference.
///
/// Column dtypes drive schema validation, so numeric-looking columns come
/// back as integers or floats and everything else as strings.
pub fn read_csv_table(path: &Path) -> Result<DataFrame> {
    read_csv(path, Some(INFER_SCHEMA_ROWS))
}

/// Reads a CSV dataset with every column as text.
///
/// Used for generated tables, where 128-bit address integers and sentinel
/// strings must reach the decoder exactly as written.
pub fn read_csv_text(path: &Path) -> Result<DataFrame> {
    read_csv(path, Some(0))
}

fn read_csv(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame> {
    check_file_size(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    validate_header(&df, path)?;
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read csv"
    );
    Ok(df)
}

/// Rejects frames without columns or with blank column names.
pub fn validate_header(df: &DataFrame, path: &Path) -> Result<()> {
    if df.width() == 0 {
        return Err(IngestError::InvalidHeader {
            path: path.to_path_buf(),
            reason: "no columns".to_string(),
        });
    }
    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::InvalidHeader {
                path: path.to_path_buf(),
                reason: "empty column name".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_csv_table_infers_types() {
        let file = create_temp_csv("srcip,dstport,bytes\n10.0.0.1,80,1.5\n10.0.0.2,443,2.0\n");
        let df = read_csv_table(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("srcip").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("dstport").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("bytes").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_read_csv_text_keeps_strings() {
        let file = create_temp_csv("srcip,dstport\n3232235521,80\n0,443\n");
        let df = read_csv_text(file.path()).unwrap();
        assert_eq!(df.column("srcip").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("dstport").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_missing_file() {
        let result = read_csv_table(Path::new("/nonexistent/trace.csv"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_file_size_limit() {
        let file = create_temp_csv("a\n1\n");
        let result = check_file_size_with_limit(file.path(), 1);
        assert!(matches!(result, Err(IngestError::FileTooLarge { .. })));
    }
}
