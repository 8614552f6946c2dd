use std::io::Read;
use std::path::Path;

use crate::core::{Error, RawRecordSet, RawRow, RawValue, Result};

/// Parse CSV with a header row. Rows may be shorter or longer than the
/// header; missing cells are absent and surplus cells are dropped. Every
/// cell stays text and is interpreted by the canonicalizer.
pub fn parse_csv<R: Read>(reader: R, source: &Path) -> Result<RawRecordSet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::input_parse(source, format!("CSV header error: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut set = RawRecordSet::new(headers.clone());
    for (idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| Error::input_parse(source, format!("CSV parse error at row {}: {e}", idx + 1)))?;

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(label, cell)| {
                let value = if cell.trim().is_empty() {
                    RawValue::Empty
                } else {
                    RawValue::Text(cell.to_string())
                };
                (label.clone(), value)
            })
            .collect();
        set.push_row(row);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(text: &str) -> RawRecordSet {
        parse_csv(text.as_bytes(), Path::new("inline.csv")).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let set = parse(indoc! {"
            Module,Test Case ID,Status,Bug ID
            Login,TC1,Passed,
            Login,TC2,Failed,BUG-1
        "});
        assert_eq!(set.columns(), ["Module", "Test Case ID", "Status", "Bug ID"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.rows()[1].get("Bug ID"), Some(&RawValue::Text("BUG-1".into())));
        assert_eq!(set.rows()[0].get("Bug ID"), Some(&RawValue::Empty));
    }

    #[test]
    fn test_ragged_rows_are_tolerated() {
        let set = parse(indoc! {"
            Module,TestCaseID,Result
            Login,TC1
            Cart,TC2,Pass,extra
        "});
        assert_eq!(set.rows()[0].get("Result"), None);
        assert_eq!(set.rows()[1].len(), 3);
    }

    #[test]
    fn test_header_only_keeps_columns() {
        let set = parse("Module,Result\n");
        assert!(set.is_empty());
        assert_eq!(set.columns().len(), 2);
    }

    #[test]
    fn test_numeric_cells_stay_text() {
        let set = parse("Run,Duration\n2,1.50\n");
        assert_eq!(set.rows()[0].get("Run"), Some(&RawValue::Text("2".into())));
    }
}
