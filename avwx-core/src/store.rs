//! Small helpers shared by the JSON files kept on disk (airport
//! directory, search cache, config).

use std::{fs, path::Path};

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Read and parse a JSON file; `Ok(None)` if the file does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(value))
}

/// Replace a file's contents atomically: write a sibling temp file, then
/// rename over the target. A crash mid-write leaves the old file intact.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("failed to create {}", parent.display()), e))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)
        .map_err(|e| Error::io(format!("failed to write {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| Error::io(format!("failed to replace {}", path.display()), e))?;
    Ok(())
}
