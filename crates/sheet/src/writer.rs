use std::fs;
use std::io::Write as _;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use xlrobot_formatting::{
    date_value_to_serial, serial_to_datetime, CellCategory, DataType, DateValue, FormatError,
    Formats,
};
use xlrobot_primitives::excel_name_to_coord;

use crate::cell::{CellValue, WriteValue};
use crate::error::{ExcelError, Result};
use crate::path::{resolve_path, FileFormat};
use crate::reader::ExcelReader;
use crate::workbook::{Cell, Workbook};
use crate::{xls, xlsx};

/// Number format given to text cells
const TEXT_FORMAT: &str = "@";
/// Number format given to boolean cells
const GENERAL_FORMAT: &str = "General";

/// Where a save goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SaveMode {
    /// Replace the source through a temporary file
    InPlace,
    /// Write a new file next to an untouched source
    CopyTo(PathBuf),
    /// The source did not exist; write straight to the target
    Fresh(PathBuf),
}

/// Lifecycle of a writer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Source exists, nothing changed yet
    Attached,
    /// Source absent, nothing changed yet
    Fresh,
    /// Shadow workbook holds pending changes
    Dirty,
    /// Saved; no further changes accepted
    Saved,
}

/// Copy-on-write editor over a workbook.
///
/// Reads go to the snapshot taken at open (through [`Deref`] to
/// [`ExcelReader`]). The first change clones that snapshot into a private
/// shadow workbook; [`ExcelWriter::save_excel`] serializes the shadow and
/// closes the session.
#[derive(Debug)]
pub struct ExcelWriter {
    reader: ExcelReader,
    mode: SaveMode,
    state: WriterState,
    shadow: Option<Workbook>,
}

impl Deref for ExcelWriter {
    type Target = ExcelReader;

    fn deref(&self) -> &ExcelReader {
        &self.reader
    }
}

impl ExcelWriter {
    /// Open `source` for editing.
    ///
    /// Without a destination, or with one naming the same file as `source`,
    /// the source is updated in place. An existing destination is refused unless
    /// `override_existing` is set, in which case it is deleted right away. A
    /// missing source starts an empty workbook with a single sheet.
    pub fn open<P: AsRef<Path>>(
        source: P,
        destination: Option<&Path>,
        override_existing: bool,
        formats: Arc<Formats>,
    ) -> Result<Self> {
        let (source, source_format) = resolve_path(source.as_ref())?;
        let destination = destination
            .map(resolve_path)
            .transpose()?
            .map(|(path, _)| path);
        let destination = match destination {
            Some(dest) if same_file(&dest, &source)? => None,
            other => other,
        };

        if let Some(dest) = &destination {
            if dest.exists() {
                if !override_existing {
                    return Err(ExcelError::FileExists { path: dest.clone() });
                }
                tracing::info!("Removing existing destination {}", dest.display());
                fs::remove_file(dest)?;
            }
        }

        if source.is_file() {
            let reader = ExcelReader::open(&source, formats)?;
            let mode = match destination {
                Some(dest) => SaveMode::CopyTo(dest),
                None => SaveMode::InPlace,
            };
            Ok(Self {
                reader,
                mode,
                state: WriterState::Attached,
                shadow: None,
            })
        } else {
            tracing::info!("Creating new workbook for {}", source.display());
            let target = destination.unwrap_or_else(|| source.clone());
            let reader = ExcelReader::from_workbook(
                source,
                source_format,
                formats,
                Workbook::with_default_sheet(),
            );
            Ok(Self {
                reader,
                mode: SaveMode::Fresh(target),
                state: WriterState::Fresh,
                shadow: None,
            })
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn reader(&self) -> &ExcelReader {
        &self.reader
    }

    /// The file the next save writes to
    pub fn target_path(&self) -> &Path {
        match &self.mode {
            SaveMode::InPlace => self.reader.path(),
            SaveMode::CopyTo(path) | SaveMode::Fresh(path) => path,
        }
    }

    fn target_format(&self) -> Result<FileFormat> {
        FileFormat::from_path(self.target_path())
    }

    fn shadow_mut(&mut self) -> Result<&mut Workbook> {
        if self.state == WriterState::Saved {
            return Err(ExcelError::SessionClosed);
        }
        if self.shadow.is_none() {
            tracing::debug!("Copying workbook {} for writing", self.reader.path().display());
            self.shadow = Some(shadow_copy(&self.reader));
            self.state = WriterState::Dirty;
        }
        match self.shadow.as_mut() {
            Some(shadow) => Ok(shadow),
            None => Err(ExcelError::InvalidOperation(
                "shadow workbook is missing".to_string(),
            )),
        }
    }

    // ===== Sheets =====

    /// Append an empty sheet.
    pub fn create_sheet(&mut self, sheet_name: &str) -> Result<()> {
        self.shadow_mut()?.add_sheet(sheet_name)?;
        tracing::info!("Created sheet '{}'", sheet_name);
        Ok(())
    }

    /// Remove a sheet. The last remaining sheet cannot be removed.
    pub fn remove_sheet(&mut self, sheet_name: &str) -> Result<()> {
        self.shadow_mut()?.remove_sheet(sheet_name)?;
        tracing::info!("Removed sheet '{}'", sheet_name);
        Ok(())
    }

    // ===== Cells =====

    /// Write a value, typed by `requested` or else by the value's own variant.
    ///
    /// The stored cell carries a display format matching its type, so a
    /// later formatted read renders it the same way. `BLANK` and `EMPTY`
    /// clear the cell; `ERROR` cannot be written.
    pub fn write_cell(
        &mut self,
        sheet_name: &str,
        column: u32,
        row: u32,
        value: impl Into<WriteValue>,
        requested: Option<DataType>,
    ) -> Result<()> {
        let value = value.into();
        if self.state == WriterState::Saved {
            return Err(ExcelError::SessionClosed);
        }
        self.target_format()?.check_cell(column, row)?;

        let data_type = requested.unwrap_or_else(|| value.data_type());
        let cell = build_cell(self.reader.formats(), &value, data_type)?;
        tracing::debug!(
            "Writing {:?} as {} to '{}' ({}, {})",
            value,
            data_type,
            sheet_name,
            column,
            row
        );

        let sheet = self.shadow_mut()?.get_sheet_mut(sheet_name)?;
        match cell {
            Some(cell) => sheet.set(column, row, cell),
            None => sheet.clear(column, row),
        }
        Ok(())
    }

    /// [`Self::write_cell`] addressed by a cell name such as `B3`.
    pub fn write_cell_by_name(
        &mut self,
        sheet_name: &str,
        cell_name: &str,
        value: impl Into<WriteValue>,
        requested: Option<DataType>,
    ) -> Result<()> {
        let (column, row) = excel_name_to_coord(cell_name)?;
        self.write_cell(sheet_name, column, row, value, requested)
    }

    // ===== Save =====

    /// Serialize the workbook and close the session.
    ///
    /// In-place saves go through a temporary file in the target directory
    /// that is renamed over the original, so a failed save leaves the
    /// original untouched. Returns the path written.
    pub fn save_excel(&mut self) -> Result<PathBuf> {
        if self.state == WriterState::Saved {
            return Err(ExcelError::SessionClosed);
        }
        let target = self.target_path().to_path_buf();
        let format = self.target_format()?;
        let unchanged;
        let workbook = match &self.shadow {
            Some(shadow) => shadow,
            None => {
                unchanged = shadow_copy(&self.reader);
                &unchanged
            }
        };

        let bytes = match format {
            FileFormat::Xlsx => xlsx::to_bytes(workbook)?,
            FileFormat::Xls => xls::to_bytes(workbook)?,
        };
        match self.mode {
            SaveMode::InPlace => replace_file(&target, format, &bytes)?,
            SaveMode::CopyTo(_) | SaveMode::Fresh(_) => fs::write(&target, &bytes)?,
        }
        tracing::info!("Saved {} sheet(s) to {}", workbook.sheet_count(), target.display());

        self.shadow = None;
        self.state = WriterState::Saved;
        Ok(target)
    }
}

/// True when `dest` names the source file itself, however it is spelled.
///
/// Paths that do not exist yet can only match by their text.
fn same_file(dest: &Path, source: &Path) -> Result<bool> {
    if dest == source {
        return Ok(true);
    }
    if !dest.exists() || !source.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(dest)? == fs::canonicalize(source)?)
}

/// Clone the snapshot for editing.
///
/// Cells keep the number format they were loaded with; only a date cell
/// without one gets the configured display pattern.
fn shadow_copy(reader: &ExcelReader) -> Workbook {
    let mut shadow = reader.workbook().clone();
    let formats = reader.formats();
    for sheet in shadow.sheets_mut() {
        for (_, _, cell) in sheet.cells_mut() {
            if cell.num_format.is_some() {
                continue;
            }
            if let Some(date) = cell.value.as_date_value() {
                cell.num_format = Some(formats.date.excel_pattern(None, Some(&date)));
            }
        }
    }
    shadow
}

/// Convert a write request into the cell to store. `None` clears the cell.
fn build_cell(formats: &Formats, value: &WriteValue, data_type: DataType) -> Result<Option<Cell>> {
    let cell = match data_type.category() {
        CellCategory::Bool => {
            let flag = match value {
                WriteValue::Bool(b) => *b,
                other => formats.boolean.parse_str(&other.to_string()),
            };
            Cell::new(CellValue::Bool(flag), Some(GENERAL_FORMAT.to_string()))
        }
        CellCategory::Date => {
            let date = parse_date(formats, value, data_type)?;
            let pattern = formats.date.excel_pattern(Some(data_type), Some(&date));
            Cell::new(date.into(), Some(pattern))
        }
        CellCategory::Number => {
            let number = match value {
                WriteValue::Number(n) => *n,
                WriteValue::Bool(b) => f64::from(u8::from(*b)),
                WriteValue::Text(s) => formats.number.parse_str(Some(data_type), s)?,
                other => other
                    .as_date_value()
                    .map(|date| date_value_to_serial(&date))
                    .unwrap_or_default(),
            };
            Cell::new(
                CellValue::Number(number),
                Some(formats.number.excel_pattern(Some(data_type))),
            )
        }
        CellCategory::Text => Cell::new(
            CellValue::Text(value.to_string()),
            Some(TEXT_FORMAT.to_string()),
        ),
        CellCategory::Empty => return Ok(None),
        CellCategory::Error => {
            return Err(FormatError::TypeMismatch {
                category: value.data_type().category(),
                requested: data_type,
            }
            .into())
        }
    };
    Ok(Some(cell))
}

fn parse_date(formats: &Formats, value: &WriteValue, data_type: DataType) -> Result<DateValue> {
    if let Some(date) = value.as_date_value() {
        return Ok(date.coerce(Some(data_type)));
    }
    match value {
        WriteValue::Text(s) => Ok(formats.date.parse_str(Some(data_type), s)?),
        WriteValue::Number(n) => serial_to_datetime(*n)
            .map(|dt| DateValue::classify(dt, *n, Some(data_type)))
            .ok_or_else(|| invalid_value(value, data_type)),
        _ => Err(invalid_value(value, data_type)),
    }
}

fn invalid_value(value: &WriteValue, data_type: DataType) -> ExcelError {
    FormatError::InvalidValue {
        value: value.to_string(),
        expected: data_type,
    }
    .into()
}

/// Write `bytes` to a temporary file beside `target`, then rename it over `target`.
fn replace_file(target: &Path, format: FileFormat, bytes: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let suffix = format!(".{}", format.extension());
    let mut temp = tempfile::Builder::new()
        .prefix(".xlrobot-")
        .suffix(&suffix)
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    tracing::debug!("Replacing {} with {}", target.display(), temp.path().display());
    temp.persist(target).map_err(|e| ExcelError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_build_cell_dispatch() {
        let formats = Formats::default();

        let cell = build_cell(&formats, &WriteValue::from("yes"), DataType::Bool)
            .unwrap()
            .unwrap();
        assert_eq!(cell.value, CellValue::Bool(true));

        let cell = build_cell(&formats, &WriteValue::from("08:00:00 AM"), DataType::Time)
            .unwrap()
            .unwrap();
        assert_eq!(cell.value, CellValue::Time(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert_eq!(cell.num_format.as_deref(), Some("hh:mm:ss am/pm"));

        let cell = build_cell(&formats, &WriteValue::from("5,178.00"), DataType::Currency)
            .unwrap()
            .unwrap();
        assert_eq!(cell.value, CellValue::Number(5178.0));
        assert_eq!(cell.num_format.as_deref(), Some("#,##0.00"));

        let cell = build_cell(&formats, &WriteValue::from(25.5), DataType::Text)
            .unwrap()
            .unwrap();
        assert_eq!(cell.value, CellValue::Text("25.5".to_string()));
        assert_eq!(cell.num_format.as_deref(), Some("@"));
    }

    #[test]
    fn test_build_cell_clear_and_error() {
        let formats = Formats::default();
        assert!(build_cell(&formats, &WriteValue::from("x"), DataType::Blank)
            .unwrap()
            .is_none());
        assert!(matches!(
            build_cell(&formats, &WriteValue::from("#N/A"), DataType::Error),
            Err(ExcelError::Format(FormatError::TypeMismatch { .. }))
        ));
        assert!(matches!(
            build_cell(&formats, &WriteValue::from("not a date"), DataType::Date),
            Err(ExcelError::Format(FormatError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_shadow_copy_keeps_loaded_formats() {
        let date = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let mut workbook = Workbook::with_default_sheet();
        let sheet = workbook.get_sheet_mut("Sheet").unwrap();
        sheet.set(0, 0, Cell::new(CellValue::Date(date), Some("dd mmm yyyy".to_string())));
        sheet.set(0, 1, Cell::new(CellValue::Date(date), None));
        sheet.set(0, 2, Cell::new(CellValue::Number(0.5), Some("0.00%".to_string())));
        let reader = ExcelReader::from_workbook(
            PathBuf::from("/tmp/in-memory.xlsx"),
            FileFormat::Xlsx,
            Arc::new(Formats::default()),
            workbook,
        );

        let shadow = shadow_copy(&reader);
        let sheet = shadow.get_sheet("Sheet").unwrap();
        let code = |row| sheet.get(0, row).and_then(|cell| cell.num_format.as_deref());
        assert_eq!(code(0), Some("dd mmm yyyy"));
        assert_eq!(code(1), Some("yyyy-mm-dd"));
        assert_eq!(code(2), Some("0.00%"));
    }

    #[test]
    fn test_same_file_sees_through_aliases() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let source = dir.path().join("book.xlsx");
        fs::write(&source, b"data").unwrap();

        let alias = dir.path().join("sub").join("..").join("book.xlsx");
        assert!(same_file(&alias, &source).unwrap());
        assert!(!same_file(&dir.path().join("other.xlsx"), &source).unwrap());
        // neither exists yet: only the text can match
        let missing = dir.path().join("missing.xlsx");
        assert!(same_file(&missing, &missing).unwrap());
        assert!(!same_file(&dir.path().join("sub/../missing.xlsx"), &missing).unwrap());
    }

    #[test]
    fn test_date_values_are_coerced_to_requested_type() {
        let formats = Formats::default();
        let dt = NaiveDate::from_ymd_opt(2018, 1, 2)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let cell = build_cell(&formats, &WriteValue::from(dt), DataType::Date)
            .unwrap()
            .unwrap();
        assert_eq!(cell.value, CellValue::Date(dt.date()));
        assert_eq!(cell.num_format.as_deref(), Some("yyyy-mm-dd"));
    }
}
