use std::path::{Path, PathBuf};
use std::sync::Arc;

use xlrobot_formatting::{DataType, FormatConfig, Formats};
use xlrobot_sheet::{CellPairs, CellValue, ExcelReader, ExcelWriter, WriteValue};

use crate::error::{KeywordError, Result};
use crate::session::Session;

/// Spreadsheet keywords over one active session.
///
/// Each `open_*` call replaces the current session. Type names are taken as
/// strings (`"NUMBER"`, `"date_time"`, `"DATETIME"`) and parsed
/// case-insensitively; an empty or missing name means "use the cell's own
/// type".
#[derive(Debug)]
pub struct ExcelLibrary {
    formats: Arc<Formats>,
    session: Option<Session>,
}

impl Default for ExcelLibrary {
    fn default() -> Self {
        Self {
            formats: Arc::new(Formats::default()),
            session: None,
        }
    }
}

impl ExcelLibrary {
    /// Compile the format settings once for every session this library opens.
    pub fn new(config: &FormatConfig) -> Result<Self> {
        let formats = Formats::new(config)?;
        Ok(Self {
            formats: Arc::new(formats),
            session: None,
        })
    }

    pub fn formats(&self) -> &Formats {
        &self.formats
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn reader(&self) -> Result<&ExcelReader> {
        self.session
            .as_ref()
            .map(Session::reader)
            .ok_or(KeywordError::NoActiveSession)
    }

    fn writer(&mut self) -> Result<&mut ExcelWriter> {
        self.session
            .as_mut()
            .ok_or(KeywordError::NoActiveSession)?
            .writer_mut()
    }

    // ===== Opening =====

    /// Open Excel by file path.
    pub fn open_excel<P: AsRef<Path>>(&mut self, file_path: P) -> Result<()> {
        let reader = ExcelReader::open(file_path, Arc::clone(&self.formats))?;
        tracing::info!("Opened {} for reading", reader.path().display());
        self.session = Some(Session::Reader(reader));
        Ok(())
    }

    /// Open Excel for writing.
    ///
    /// With `new_path` the changes go to that file and `file_path` is left
    /// alone; `override_existing` allows replacing an existing `new_path`.
    /// A missing `file_path` starts an empty workbook.
    pub fn open_excel_to_write<P: AsRef<Path>>(
        &mut self,
        file_path: P,
        new_path: Option<&Path>,
        override_existing: bool,
    ) -> Result<()> {
        let writer = ExcelWriter::open(
            file_path,
            new_path,
            override_existing,
            Arc::clone(&self.formats),
        )?;
        tracing::info!(
            "Opened {} for writing to {}",
            writer.path().display(),
            writer.target_path().display()
        );
        self.session = Some(Session::Writer(writer));
        Ok(())
    }

    // ===== Structure =====

    pub fn get_sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.reader()?.sheet_names())
    }

    pub fn get_number_of_sheets(&self) -> Result<usize> {
        Ok(self.reader()?.sheet_count())
    }

    pub fn get_column_count(&self, sheet_name: &str) -> Result<u32> {
        Ok(self.reader()?.column_count(sheet_name)?)
    }

    pub fn get_row_count(&self, sheet_name: &str) -> Result<u32> {
        Ok(self.reader()?.row_count(sheet_name)?)
    }

    // ===== Values =====

    pub fn get_column_values(
        &self,
        sheet_name: &str,
        column: u32,
        include_empty: bool,
    ) -> Result<CellPairs> {
        Ok(self
            .reader()?
            .column_values(sheet_name, column, include_empty)?)
    }

    pub fn get_row_values(
        &self,
        sheet_name: &str,
        row: u32,
        include_empty: bool,
    ) -> Result<CellPairs> {
        Ok(self.reader()?.row_values(sheet_name, row, include_empty)?)
    }

    pub fn get_sheet_values(&self, sheet_name: &str, include_empty: bool) -> Result<CellPairs> {
        Ok(self.reader()?.sheet_values(sheet_name, include_empty)?)
    }

    pub fn get_workbook_values(&self, include_empty: bool) -> Result<Vec<(String, CellPairs)>> {
        Ok(self.reader()?.workbook_values(include_empty))
    }

    pub fn read_cell_data_by_name(
        &self,
        sheet_name: &str,
        cell_name: &str,
        data_type: Option<&str>,
        use_format: bool,
    ) -> Result<CellValue> {
        let requested = DataType::parse_optional(data_type)?;
        Ok(self
            .reader()?
            .read_cell_by_name(sheet_name, cell_name, requested, use_format)?)
    }

    pub fn read_cell_data(
        &self,
        sheet_name: &str,
        column: u32,
        row: u32,
        data_type: Option<&str>,
        use_format: bool,
    ) -> Result<CellValue> {
        let requested = DataType::parse_optional(data_type)?;
        Ok(self
            .reader()?
            .read_cell(sheet_name, column, row, requested, use_format)?)
    }

    pub fn check_cell_type(
        &self,
        sheet_name: &str,
        column: u32,
        row: u32,
        data_type: &str,
    ) -> Result<bool> {
        let data_type: DataType = data_type.parse()?;
        Ok(self
            .reader()?
            .check_cell_type(sheet_name, column, row, data_type)?)
    }

    // ===== Writing =====

    pub fn write_to_cell_by_name(
        &mut self,
        sheet_name: &str,
        cell_name: &str,
        value: impl Into<WriteValue>,
        data_type: Option<&str>,
    ) -> Result<()> {
        let requested = DataType::parse_optional(data_type)?;
        self.writer()?
            .write_cell_by_name(sheet_name, cell_name, value, requested)?;
        Ok(())
    }

    pub fn write_to_cell(
        &mut self,
        sheet_name: &str,
        column: u32,
        row: u32,
        value: impl Into<WriteValue>,
        data_type: Option<&str>,
    ) -> Result<()> {
        let requested = DataType::parse_optional(data_type)?;
        self.writer()?
            .write_cell(sheet_name, column, row, value, requested)?;
        Ok(())
    }

    /// Save the pending changes. Returns the path written.
    pub fn save_excel(&mut self) -> Result<PathBuf> {
        Ok(self.writer()?.save_excel()?)
    }

    pub fn create_sheet(&mut self, sheet_name: &str) -> Result<()> {
        self.writer()?.create_sheet(sheet_name)?;
        Ok(())
    }

    pub fn remove_sheet(&mut self, sheet_name: &str) -> Result<()> {
        self.writer()?.remove_sheet(sheet_name)?;
        Ok(())
    }
}
