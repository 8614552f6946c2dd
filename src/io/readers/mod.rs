//! Input readers producing a [`RawRecordSet`].

mod csv;
mod json;
mod xlsx;
mod xml;

pub use self::csv::parse_csv;
pub use self::json::parse_json;
pub use self::xlsx::parse_xlsx;
pub use self::xml::parse_testng_xml;

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::core::{Error, RawRecordSet, Result};

/// Formats accepted as input.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["csv", "json", "xlsx", "xml"];

/// Read a test execution file, choosing the parser by extension.
pub fn read_records(path: &Path) -> Result<RawRecordSet> {
    if !path.is_file() {
        return Err(Error::file_system("Input file not found", path));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let set = match extension.as_str() {
        "csv" => {
            let file = fs::File::open(path)
                .map_err(|e| Error::file_system_io("Failed to open input", path, e))?;
            parse_csv(file, path)?
        }
        "json" => {
            let text = fs::read_to_string(path)
                .map_err(|e| Error::file_system_io("Failed to read input", path, e))?;
            parse_json(&text, path)?
        }
        "xlsx" => {
            let bytes =
                fs::read(path).map_err(|e| Error::file_system_io("Failed to read input", path, e))?;
            parse_xlsx(bytes, path)?
        }
        "xml" => {
            let text = fs::read_to_string(path)
                .map_err(|e| Error::file_system_io("Failed to read input", path, e))?;
            parse_testng_xml(&text, path)?
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{} (supported: {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )))
        }
    };

    debug!(
        "Read {} rows with {} columns from {}",
        set.len(),
        set.columns().len(),
        path.display()
    );
    Ok(set)
}
