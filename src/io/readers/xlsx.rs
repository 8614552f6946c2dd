use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;
use std::path::Path;

use crate::core::{Error, RawRecordSet, RawRow, RawValue, Result};

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Int(n) => RawValue::Number(*n as f64),
        Data::Float(n) => RawValue::Number(*n),
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Bool(b) => RawValue::Bool(*b),
        Data::Empty => RawValue::Empty,
        Data::Error(_) => RawValue::Empty,
        other => RawValue::Text(other.to_string()),
    }
}

/// Parse the first worksheet of an `.xlsx` workbook. The first row holds
/// the column labels; fully blank rows are skipped.
pub fn parse_xlsx(bytes: Vec<u8>, source: &Path) -> Result<RawRecordSet> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| Error::input_parse(source, format!("not a readable workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::input_parse(source, "workbook has no worksheets"))?
        .map_err(|e| Error::input_parse(source, e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(RawRecordSet::default());
    };
    let labels: Vec<String> = header.iter().map(|c| cell_value(c).as_text()).collect();

    let mut set = RawRecordSet::new(labels.iter().filter(|l| !l.is_empty()).cloned().collect());
    for cells in rows {
        let row: RawRow = labels
            .iter()
            .zip(cells)
            .filter(|(label, _)| !label.is_empty())
            .map(|(label, cell)| (label.clone(), cell_value(cell)))
            .collect();
        if row.iter().all(|(_, value)| value.is_blank()) {
            continue;
        }
        set.push_row(row);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Int(3)), RawValue::Number(3.0));
        assert_eq!(cell_value(&Data::Float(2.5)), RawValue::Number(2.5));
        assert_eq!(cell_value(&Data::String("Pass".into())), RawValue::from("Pass"));
        assert_eq!(cell_value(&Data::Bool(true)), RawValue::Bool(true));
        assert_eq!(cell_value(&Data::Empty), RawValue::Empty);
        assert_eq!(cell_value(&Data::Int(2)).as_text(), "2");
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let result = parse_xlsx(vec![0, 1, 2], Path::new("runs.xlsx"));
        assert!(matches!(result, Err(Error::InputParse { .. })));
    }
}
