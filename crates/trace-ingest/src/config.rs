//! Config file loading and JSON output.

use std::fs;
use std::path::Path;

use serde_json::Value;
use trace_model::CodecConfig;

use crate::error::{IngestError, Result};

/// Loads and validates a codec config file.
pub fn load_config(path: &Path) -> Result<CodecConfig> {
    let text = fs::read_to_string(path).map_err(|e| IngestError::read(path, e))?;
    let config = CodecConfig::from_json_str(&text).map_err(|source| IngestError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        fields = config.fields().len(),
        "loaded config"
    );
    Ok(config)
}

/// Writes a JSON document with pretty formatting, creating parent directories.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| IngestError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let text = serde_json::to_string_pretty(value).map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    fs::write(path, text).map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        write_json(
            &path,
            &json!({"fields": {"metadata": [{"name": "proto", "format": "string"}]}}),
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.fields().len(), 1);
    }

    #[test]
    fn test_invalid_config_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"fields\": 3}").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, IngestError::Config { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
