// Workbook uploads (xlsx, xlsm, xls, xlsb, ods) via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use fieldcheck_engine::RawTable;

use crate::error::IoError;

/// Read the first sheet of a workbook. Returns the table and the sheet name.
pub fn import(path: &Path) -> Result<(RawTable, String), IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::parse(path, e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::parse(path, "workbook contains no sheets"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::parse(path, format!("cannot read sheet '{sheet_name}': {e}")))?;

    // Data may not begin at A1; leading empty columns would shift headers
    let (_, start_col) = range.start().unwrap_or((0, 0));
    let lead = start_col as usize;

    let mut rows = range.rows().map(|row| {
        let mut cells: Vec<String> = vec![String::new(); lead];
        cells.extend(row.iter().map(cell_text));
        cells
    });

    let table = match rows.next() {
        Some(headers) => RawTable {
            headers,
            rows: rows.collect(),
        },
        None => RawTable::default(),
    };

    log::debug!(
        "{}: sheet '{}', {} data rows",
        path.display(),
        sheet_name,
        table.rows.len()
    );
    Ok((table, sheet_name))
}

/// Render a cell the way a reviewer would read it in the sheet.
pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Integral floats without decimals so numeric ids match CSV uploads
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => ndt.format("%Y-%m-%d").to_string(),
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("{}", dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
