use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use calamine::{open_workbook, Data, Range, Reader, Sheets, Xls, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use xlrobot_formatting::{serial_to_datetime, CellCategory, DataType, DateValue, Formats};
use xlrobot_primitives::{coord_to_excel_name, excel_name_to_coord, natural_cmp};

use crate::cell::CellValue;
use crate::error::{ExcelError, Result};
use crate::numfmt::{self, SheetFormats};
use crate::path::{resolve_path, FileFormat};
use crate::workbook::{Cell, Sheet, Workbook};

/// `(address, value)` pairs as returned by the listing queries
pub type CellPairs = Vec<(String, CellValue)>;

/// Read-only view over a workbook file.
///
/// The whole file is decoded on open; the file handle does not outlive
/// [`ExcelReader::open`].
#[derive(Debug, Clone)]
pub struct ExcelReader {
    path: PathBuf,
    format: FileFormat,
    formats: Arc<Formats>,
    workbook: Workbook,
}

impl ExcelReader {
    /// Open an `.xls` or `.xlsx` file for reading
    pub fn open<P: AsRef<Path>>(path: P, formats: Arc<Formats>) -> Result<Self> {
        let (path, format) = resolve_path(path.as_ref())?;
        if !path.is_file() {
            return Err(ExcelError::FileNotFound { path });
        }
        tracing::info!("Opening file at {}", path.display());
        let workbook = load_workbook(&path, format)?;
        Ok(Self {
            path,
            format,
            formats,
            workbook,
        })
    }

    pub(crate) fn from_workbook(
        path: PathBuf,
        format: FileFormat,
        formats: Arc<Formats>,
        workbook: Workbook,
    ) -> Self {
        Self {
            path,
            format,
            formats,
            workbook,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn formats(&self) -> &Formats {
        &self.formats
    }

    /// The snapshot taken at open
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.workbook.get_sheet(name)
    }

    // ===== Structure =====

    /// Returns the names of all the worksheets in the workbook.
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook
            .sheet_names()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.workbook.sheet_count()
    }

    pub fn column_count(&self, sheet_name: &str) -> Result<u32> {
        Ok(self.sheet(sheet_name)?.col_count())
    }

    pub fn row_count(&self, sheet_name: &str) -> Result<u32> {
        Ok(self.sheet(sheet_name)?.row_count())
    }

    // ===== Listing =====

    /// Values of one column, one entry per row of the used range.
    pub fn column_values(
        &self,
        sheet_name: &str,
        column: u32,
        include_empty: bool,
    ) -> Result<CellPairs> {
        let sheet = self.sheet(sheet_name)?;
        let pairs = (0..sheet.row_count()).map(|row| pair(sheet, column, row));
        Ok(collect_pairs(pairs, include_empty))
    }

    /// Values of one row, one entry per column of the used range.
    pub fn row_values(&self, sheet_name: &str, row: u32, include_empty: bool) -> Result<CellPairs> {
        let sheet = self.sheet(sheet_name)?;
        let pairs = (0..sheet.col_count()).map(|col| pair(sheet, col, row));
        Ok(collect_pairs(pairs, include_empty))
    }

    /// Every cell of the used range.
    pub fn sheet_values(&self, sheet_name: &str, include_empty: bool) -> Result<CellPairs> {
        let sheet = self.sheet(sheet_name)?;
        Ok(sheet_pairs(sheet, include_empty))
    }

    /// [`Self::sheet_values`] for every sheet, tagged with the sheet name.
    pub fn workbook_values(&self, include_empty: bool) -> Vec<(String, CellPairs)> {
        self.workbook
            .sheets()
            .map(|sheet| (sheet.name().to_string(), sheet_pairs(sheet, include_empty)))
            .collect()
    }

    // ===== Cells =====

    /// Physical category of a cell; cells outside the used range are empty.
    pub fn cell_category(&self, sheet_name: &str, column: u32, row: u32) -> Result<CellCategory> {
        Ok(self.sheet(sheet_name)?.value(column, row).category())
    }

    /// Read a cell, checking it against `requested`.
    ///
    /// With `use_format` the value comes back as [`CellValue::Text`] rendered
    /// with the configured formats; otherwise the raw typed value is returned,
    /// date cells shaped by `requested` when it names a date type. Empty and
    /// error cells are returned as they are.
    pub fn read_cell(
        &self,
        sheet_name: &str,
        column: u32,
        row: u32,
        requested: Option<DataType>,
        use_format: bool,
    ) -> Result<CellValue> {
        let value = self.sheet(sheet_name)?.value(column, row);
        let category = value.category();
        tracing::debug!("Cell Type: {}", category);
        tracing::debug!("Cell Value: {:?}", value);
        category.check_requested(requested)?;

        if let Some(date) = value.as_date_value() {
            let date = date.coerce(requested);
            if !use_format {
                return Ok(date.into());
            }
            let text = self.formats.date.format(requested, &date)?;
            tracing::debug!(
                "Data Format: {}",
                self.formats.date.native_pattern(requested, Some(&date))
            );
            return Ok(CellValue::Text(text));
        }

        Ok(match value {
            CellValue::Number(n) if use_format => {
                CellValue::Text(self.formats.number.format(requested, n))
            }
            CellValue::Bool(b) if use_format => {
                CellValue::Text(self.formats.boolean.format(b).to_string())
            }
            other => other,
        })
    }

    /// [`Self::read_cell`] addressed by a cell name such as `B3`.
    pub fn read_cell_by_name(
        &self,
        sheet_name: &str,
        cell_name: &str,
        requested: Option<DataType>,
        use_format: bool,
    ) -> Result<CellValue> {
        let (column, row) = excel_name_to_coord(cell_name)?;
        self.read_cell(sheet_name, column, row, requested, use_format)
    }

    /// True when the cell's physical category is the one `data_type` is stored as.
    pub fn check_cell_type(
        &self,
        sheet_name: &str,
        column: u32,
        row: u32,
        data_type: DataType,
    ) -> Result<bool> {
        Ok(self.cell_category(sheet_name, column, row)? == data_type.category())
    }
}

fn pair(sheet: &Sheet, col: u32, row: u32) -> (String, CellValue) {
    (coord_to_excel_name(col, row), sheet.value(col, row))
}

fn sheet_pairs(sheet: &Sheet, include_empty: bool) -> CellPairs {
    let pairs = (0..sheet.row_count())
        .flat_map(|row| (0..sheet.col_count()).map(move |col| pair(sheet, col, row)));
    collect_pairs(pairs, include_empty)
}

/// Drop falsy values when asked to, then sort by natural address order.
fn collect_pairs(
    pairs: impl Iterator<Item = (String, CellValue)>,
    include_empty: bool,
) -> CellPairs {
    let mut pairs: CellPairs = pairs
        .filter(|(_, value)| include_empty || !value.is_falsy())
        .collect();
    pairs.sort_by(|(a, _), (b, _)| natural_cmp(a, b));
    pairs
}

// ===== Loading =====

fn read_error(path: &Path, err: impl std::fmt::Display) -> ExcelError {
    ExcelError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Decode every sheet into memory. The calamine handle is dropped on return.
fn load_workbook(path: &Path, format: FileFormat) -> Result<Workbook> {
    let mut source: Sheets<BufReader<File>> = match format {
        FileFormat::Xls => {
            Sheets::Xls(open_workbook::<Xls<_>, _>(path).map_err(|e| read_error(path, e))?)
        }
        FileFormat::Xlsx => {
            Sheets::Xlsx(open_workbook::<Xlsx<_>, _>(path).map_err(|e| read_error(path, e))?)
        }
    };

    // values still load when the style tables cannot be read
    let number_formats = numfmt::load(path, format).unwrap_or_else(|e| {
        tracing::warn!("Keeping default number formats for {}: {}", path.display(), e);
        HashMap::new()
    });

    let mut workbook = Workbook::new();
    for name in source.sheet_names() {
        let range = source
            .worksheet_range(&name)
            .map_err(|e| read_error(path, e))?;
        let sheet = load_sheet(&name, &range, number_formats.get(&name));
        tracing::debug!(
            "Loaded sheet '{}' ({} rows, {} cols)",
            name,
            sheet.row_count(),
            sheet.col_count()
        );
        workbook.insert_sheet(sheet)?;
    }
    Ok(workbook)
}

fn load_sheet(name: &str, range: &Range<Data>, formats: Option<&SheetFormats>) -> Sheet {
    let mut sheet = Sheet::new(name);
    if let Some((last_row, last_col)) = range.end() {
        sheet.extend_to(last_row + 1, last_col + 1);
    }
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    for (row, col, data) in range.used_cells() {
        let value = data_to_cell_value(data);
        if value.is_empty() {
            continue;
        }
        // used_cells() positions are relative to the range start
        let row = start_row + row as u32;
        let col = start_col + col as u32;
        let num_format = formats.and_then(|formats| formats.get(&(col, row))).cloned();
        sheet.set(col, row, Cell::new(value, num_format));
    }
    sheet
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match dt.as_datetime().or_else(|| serial_to_datetime(serial)) {
                Some(value) => DateValue::classify(value, serial, None).into(),
                None => CellValue::Number(serial),
            }
        }
        Data::DateTimeIso(s) => parse_iso(s).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

fn parse_iso(s: &str) -> Option<CellValue> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(CellValue::DateTime(dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(CellValue::Date(d));
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .ok()
        .map(CellValue::Time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    fn reader_with(sheet: Sheet) -> ExcelReader {
        let mut workbook = Workbook::new();
        workbook.insert_sheet(sheet).unwrap();
        ExcelReader::from_workbook(
            PathBuf::from("/tmp/in-memory.xlsx"),
            FileFormat::Xlsx,
            Arc::new(Formats::default()),
            workbook,
        )
    }

    fn number(n: f64) -> Cell {
        Cell::new(CellValue::Number(n), None)
    }

    #[test]
    fn test_data_conversion() {
        assert_eq!(data_to_cell_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(
            data_to_cell_value(&Data::Error(CellErrorType::Div0)),
            CellValue::Error("#DIV/0!".to_string())
        );
        assert_eq!(
            data_to_cell_value(&Data::DateTimeIso("2018-01-01".to_string())),
            CellValue::Date(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_natural_order_and_empty_filtering() {
        let mut sheet = Sheet::new("Data");
        for row in [0, 1, 9, 10] {
            sheet.set(0, row, number(f64::from(row) + 1.0));
        }
        sheet.set(0, 2, Cell::new(CellValue::Text(String::new()), None));
        let reader = reader_with(sheet);

        let all = reader.column_values("Data", 0, true).unwrap();
        assert_eq!(all.len(), 11);
        assert_eq!(all[2].0, "A3");
        assert_eq!(all[10].0, "A11");

        let names: Vec<String> = reader
            .column_values("Data", 0, false)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["A1", "A2", "A10", "A11"]);
    }

    #[test]
    fn test_read_cell_formatting() {
        let mut sheet = Sheet::new("Data");
        sheet.set(0, 0, number(5178.0));
        sheet.set(1, 0, Cell::new(CellValue::Bool(true), None));
        let reader = reader_with(sheet);

        assert_eq!(
            reader.read_cell("Data", 0, 0, Some(DataType::Number), true).unwrap(),
            CellValue::Text("5,178.00".to_string())
        );
        assert_eq!(
            reader.read_cell("Data", 0, 0, None, false).unwrap(),
            CellValue::Number(5178.0)
        );
        assert_eq!(
            reader.read_cell_by_name("Data", "B1", Some(DataType::Text), true).unwrap(),
            CellValue::Text("Yes".to_string())
        );
        assert!(matches!(
            reader.read_cell("Data", 0, 0, Some(DataType::Bool), true),
            Err(ExcelError::Format(_))
        ));
        assert_eq!(
            reader.read_cell("Data", 5, 5, Some(DataType::Date), true).unwrap(),
            CellValue::Empty
        );
    }

    #[test]
    fn test_unknown_sheet_lists_available() {
        let reader = reader_with(Sheet::new("Data"));
        let err = reader.row_count("Nope").unwrap_err();
        assert_eq!(err.to_string(), "Sheet not found: Nope (available: Data)");
    }
}
