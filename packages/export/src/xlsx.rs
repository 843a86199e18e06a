use rust_xlsxwriter::Workbook;

use crate::{ExportError, Table};

/// Renders `table` as a single-sheet `.xlsx` workbook in memory.
///
/// # Errors
///
/// * If the sheet name is rejected or a cell fails to write.
pub fn to_xlsx_bytes(table: &Table, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, u16::try_from(col).unwrap_or(u16::MAX), name)?;
    }
    for (row, cells) in table.rows.iter().enumerate() {
        let row = u32::try_from(row).unwrap_or(u32::MAX - 1) + 1;
        for (col, cell) in cells.iter().enumerate() {
            worksheet.write_string(row, u16::try_from(col).unwrap_or(u16::MAX), cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
