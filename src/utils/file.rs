//! JSON data file reading and writing.

use std::fs;
use std::path::Path;

use crate::error::DataFileError;
use crate::models::Document;

/// Read a JSON array of documents from a file.
pub fn read_documents(path: &Path) -> Result<Vec<Document>, DataFileError> {
    let content = fs::read_to_string(path)?;
    let documents = serde_json::from_str(&content)?;
    Ok(documents)
}

/// Write documents to a file as a pretty-printed JSON array, creating
/// parent directories as needed.
pub fn write_documents(path: &Path, documents: &[Document]) -> Result<(), DataFileError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(documents)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_documents() -> Vec<Document> {
        serde_json::from_value(serde_json::json!([
            {"HotelId": "1", "Description": "Seaside resort"},
            {"HotelId": "2", "Description": "Downtown suites", "Rating": 4.2},
        ]))
        .unwrap()
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("hotels.json");

        let documents = sample_documents();
        write_documents(&path, &documents).unwrap();

        let loaded = read_documents(&path).unwrap();
        assert_eq!(loaded, documents);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_documents(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DataFileError::IoError(_)));
    }

    #[test]
    fn test_read_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{\"HotelId\": ").unwrap();

        let err = read_documents(&path).unwrap_err();
        assert!(matches!(err, DataFileError::JsonParseError(_)));
    }

    #[test]
    fn test_read_rejects_non_array_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("object.json");
        fs::write(&path, "{\"HotelId\": \"1\"}").unwrap();

        let err = read_documents(&path).unwrap_err();
        assert!(matches!(err, DataFileError::JsonParseError(_)));
    }
}
