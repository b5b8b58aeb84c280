// Reviewed-sheet export via rust_xlsxwriter
//
// One worksheet: the selected upload columns, then Quality and Comments.
// Correct rows are filled green, Incorrect rows red.

use std::path::{Path, PathBuf};

use fieldcheck_engine::export::fill_color;
use fieldcheck_engine::{ExportPlan, FillScope, Verdict};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};
use serde::Serialize;

use crate::error::IoError;

pub const DEFAULT_SHEET_NAME: &str = "Approval Data";

/// Widest column the exporter will size to, in characters.
const MAX_COLUMN_WIDTH: usize = 60;
const MIN_COLUMN_WIDTH: usize = 8;

#[derive(Debug, Clone)]
pub struct XlsxOptions {
    pub sheet_name: String,
    pub fill: FillScope,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            fill: FillScope::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    pub rows_written: usize,
    pub green_rows: usize,
    pub red_rows: usize,
    /// Set when written to disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Write the plan to `path`.
pub fn export(plan: &ExportPlan, path: &Path, options: &XlsxOptions) -> Result<ExportResult, IoError> {
    let mut workbook = Workbook::new();
    let mut result = write_sheet(&mut workbook, plan, options)?;
    workbook.save(path).map_err(|e| IoError::write(path, e))?;
    result.path = Some(path.to_path_buf());
    log::info!(
        "exported {} rows to {} ({} green, {} red)",
        result.rows_written,
        path.display(),
        result.green_rows,
        result.red_rows
    );
    Ok(result)
}

/// Same as [`export`] but returns the file bytes.
pub fn export_to_buffer(plan: &ExportPlan, options: &XlsxOptions) -> Result<(Vec<u8>, ExportResult), IoError> {
    let mut workbook = Workbook::new();
    let result = write_sheet(&mut workbook, plan, options)?;
    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| IoError::Export(e.to_string()))?;
    Ok((bytes, result))
}

fn write_sheet(
    workbook: &mut Workbook,
    plan: &ExportPlan,
    options: &XlsxOptions,
) -> Result<ExportResult, IoError> {
    let worksheet = workbook
        .add_worksheet()
        .set_name(&options.sheet_name)
        .map_err(|e| IoError::Export(format!("invalid sheet name '{}': {e}", options.sheet_name)))?;

    let header_format = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    for (col, header) in plan.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(export_err)?;
    }

    let green = fill_format(Verdict::Correct);
    let red = fill_format(Verdict::Incorrect);
    let quality_col = plan.quality_column();
    let mut result = ExportResult::default();

    for (i, row) in plan.rows.iter().enumerate() {
        let xl_row = (i + 1) as u32;
        let fill = match row.verdict {
            Verdict::Correct => {
                result.green_rows += 1;
                green.as_ref()
            }
            Verdict::Incorrect => {
                result.red_rows += 1;
                red.as_ref()
            }
            _ => None,
        };

        for (col, value) in row.cells.iter().enumerate() {
            let format = match options.fill {
                FillScope::Row => fill,
                FillScope::Verdict if col == quality_col => fill,
                FillScope::Verdict => None,
            };
            write_cell(worksheet, xl_row, col as u16, value, format)?;
        }
        result.rows_written += 1;
    }

    size_columns(worksheet, plan)?;
    worksheet.set_freeze_panes(1, 0).map_err(export_err)?;
    if !plan.headers.is_empty() {
        worksheet
            .autofilter(0, 0, plan.rows.len() as u32, (plan.headers.len() - 1) as u16)
            .map_err(export_err)?;
    }

    Ok(result)
}

fn fill_format(verdict: Verdict) -> Option<Format> {
    fill_color(verdict).map(|rgb| Format::new().set_background_color(Color::RGB(rgb)))
}

// Empty cells still carry the fill so the whole row reads as one band
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &str,
    format: Option<&Format>,
) -> Result<(), IoError> {
    match (value.is_empty(), format) {
        (true, Some(format)) => worksheet.write_blank(row, col, format).map(|_| ()),
        (true, None) => Ok(()),
        (false, Some(format)) => worksheet.write_string_with_format(row, col, value, format).map(|_| ()),
        (false, None) => worksheet.write_string(row, col, value).map(|_| ()),
    }
    .map_err(export_err)
}

fn size_columns(worksheet: &mut Worksheet, plan: &ExportPlan) -> Result<(), IoError> {
    for (col, header) in plan.headers.iter().enumerate() {
        let widest = plan
            .rows
            .iter()
            .filter_map(|r| r.cells.get(col))
            .map(|v| v.lines().map(|l| l.chars().count()).max().unwrap_or(0))
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(0);
        let width = (widest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet
            .set_column_width(col as u16, width as f64)
            .map_err(export_err)?;
    }
    Ok(())
}

fn export_err(e: rust_xlsxwriter::XlsxError) -> IoError {
    IoError::Export(e.to_string())
}
