//! `.xlsx` serialization through `rust_xlsxwriter`.

use std::collections::HashMap;

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, XlsxError};
use xlrobot_formatting::date_value_to_serial;

use crate::cell::CellValue;
use crate::error::{ExcelError, Result};
use crate::numfmt::builtin_id;
use crate::path::FileFormat;
use crate::workbook::Workbook;

fn write_error(e: XlsxError) -> ExcelError {
    ExcelError::Write(e.to_string())
}

/// Built-in codes go out as their index so they are not repeated as custom numFmts.
fn number_format(code: &str) -> Format {
    match builtin_id(code) {
        Some(0) => Format::new(),
        Some(id) => Format::new().set_num_format_index(id),
        None => Format::new().set_num_format(code),
    }
}

/// Serialize every sheet into an in-memory `.xlsx` package.
pub(crate) fn to_bytes(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut out = XlsxWorkbook::new();
    let mut formats: HashMap<&str, Format> = HashMap::new();

    for sheet in workbook.sheets() {
        let worksheet = out.add_worksheet();
        worksheet.set_name(sheet.name()).map_err(write_error)?;

        for (col, row, cell) in sheet.cells() {
            FileFormat::Xlsx.check_cell(col, row)?;
            // Below the 16384 column limit after the check
            let col_num = col as u16;
            let code = cell.num_format.as_deref().unwrap_or("General");
            let format = formats.entry(code).or_insert_with(|| number_format(code));

            match &cell.value {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet
                        .write_string_with_format(row, col_num, s, format)
                        .map_err(write_error)?;
                }
                CellValue::Number(n) => {
                    worksheet
                        .write_number_with_format(row, col_num, *n, format)
                        .map_err(write_error)?;
                }
                CellValue::Bool(b) => {
                    worksheet
                        .write_boolean_with_format(row, col_num, *b, format)
                        .map_err(write_error)?;
                }
                CellValue::Date(_) | CellValue::Time(_) | CellValue::DateTime(_) => {
                    let serial = cell
                        .value
                        .as_date_value()
                        .map(|date| date_value_to_serial(&date))
                        .unwrap_or_default();
                    worksheet
                        .write_number_with_format(row, col_num, serial, format)
                        .map_err(write_error)?;
                }
                CellValue::Error(label) => {
                    tracing::warn!(
                        "Error cell {} in sheet '{}' is written as text",
                        label,
                        sheet.name()
                    );
                    worksheet
                        .write_string_with_format(row, col_num, label, format)
                        .map_err(write_error)?;
                }
            }
        }
    }

    out.save_to_buffer().map_err(write_error)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::workbook::Cell;

    fn styles_xml(bytes: Vec<u8>) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("xl/styles.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[test]
    fn test_builtin_codes_are_not_custom_formats() {
        let mut workbook = Workbook::with_default_sheet();
        let sheet = workbook.get_sheet_mut("Sheet").unwrap();
        sheet.set(0, 0, Cell::new(CellValue::Text("x".to_string()), Some("@".to_string())));
        sheet.set(0, 1, Cell::new(CellValue::Bool(true), Some("General".to_string())));
        sheet.set(0, 2, Cell::new(CellValue::Number(0.5), Some("0.00%".to_string())));
        sheet.set(0, 3, Cell::new(CellValue::Number(2.0), Some("0.000".to_string())));

        let xml = styles_xml(to_bytes(&workbook).unwrap());
        assert!(!xml.contains(r#"formatCode="@""#));
        assert!(!xml.contains(r#"formatCode="General""#));
        assert!(!xml.contains(r#"formatCode="0.00%""#));
        assert!(xml.contains(r#"numFmtId="49""#));
        assert!(xml.contains(r#"numFmtId="10""#));
        assert!(xml.contains(r#"formatCode="0.000""#));
    }
}
