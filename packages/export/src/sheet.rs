use std::io::Write;

use crate::{ExportError, Table};

/// Delimiter used by the post-processed "flat" artifact.
pub const FLAT_DELIMITER: u8 = b';';

/// Writes `table` as delimited text, header row first.
///
/// # Errors
///
/// * If a record fails to serialize or the underlying writer fails.
pub fn write_csv<W: Write>(table: &Table, delimiter: u8, out: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Renders `table` as comma-delimited text in memory.
///
/// # Errors
///
/// * If serialization fails.
pub fn to_csv_string(table: &Table) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(table, b',', &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
