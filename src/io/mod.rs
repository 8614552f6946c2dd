pub mod readers;
pub mod writers;

pub use readers::{read_records, SUPPORTED_EXTENSIONS};
pub use writers::{create_writer, render_to_string, OutputFormat, OutputWriter};

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::{Error, Result};

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| Error::file_system_io("Failed to write", path, e))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| Error::file_system_io("Failed to create directory", path, e))?;
    }
    Ok(())
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_file(path, &json)
}
