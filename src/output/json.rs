//! JSON serialization for run results and store files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::PersistError;
use crate::solver::RunResult;

/// Serialize a run to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RunResult).
pub fn to_json(run: &RunResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(run)
}

/// Serialize a run to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RunResult).
pub fn to_json_pretty(run: &RunResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(run)
}

/// Overwrite `path` with `value`, indented by four spaces.
pub(crate) fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let file = File::create(path).map_err(|e| PersistError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|e| PersistError::json(path, e))?;
    writer.flush().map_err(|e| PersistError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_pretty_uses_four_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_pretty(&path, &json!({"a": 1})).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n    \"a\": 1\n}");
    }

    #[test]
    fn test_write_pretty_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = write_pretty(&path, &json!({})).unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
    }
}
