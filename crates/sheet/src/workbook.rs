use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::cell::CellValue;
use crate::error::{ExcelError, Result};

/// Name of the only sheet in a freshly created workbook.
pub const DEFAULT_SHEET_NAME: &str = "Sheet";

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A stored cell: its value plus the number-format code it is displayed with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub num_format: Option<String>,
}

impl Cell {
    pub fn new(value: CellValue, num_format: Option<String>) -> Self {
        Self { value, num_format }
    }
}

/// A named grid of cells. Row and column counts are measured from `A1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    // Keyed by (row, col) so iteration is row-major
    cells: BTreeMap<(u32, u32), Cell>,
    rows: u32,
    cols: u32,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> u32 {
        self.rows
    }

    pub fn col_count(&self) -> u32 {
        self.cols
    }

    /// Grow the used range without storing a cell.
    pub fn extend_to(&mut self, rows: u32, cols: u32) {
        self.rows = self.rows.max(rows);
        self.cols = self.cols.max(cols);
    }

    pub fn get(&self, col: u32, row: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Value at `(col, row)`; anything outside the stored cells is empty.
    pub fn value(&self, col: u32, row: u32) -> CellValue {
        self.get(col, row)
            .map(|cell| cell.value.clone())
            .unwrap_or_default()
    }

    /// Store a cell. Empty values clear it instead.
    pub fn set(&mut self, col: u32, row: u32, cell: Cell) {
        if cell.value.is_empty() {
            self.cells.remove(&(row, col));
            return;
        }
        self.cells.insert((row, col), cell);
        self.extend_to(row.saturating_add(1), col.saturating_add(1));
    }

    pub fn clear(&mut self, col: u32, row: u32) {
        self.cells.remove(&(row, col));
    }

    /// Stored cells in row-major order as `(col, row, cell)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.cells.iter().map(|(&(row, col), cell)| (col, row, cell))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut Cell)> {
        self.cells
            .iter_mut()
            .map(|(&(row, col), cell)| (col, row, cell))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// An ordered set of uniquely named sheets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: IndexMap<String, Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A workbook holding one empty sheet named [`DEFAULT_SHEET_NAME`].
    pub fn with_default_sheet() -> Self {
        let mut workbook = Self::new();
        workbook
            .sheets
            .insert(DEFAULT_SHEET_NAME.to_string(), Sheet::new(DEFAULT_SHEET_NAME));
        workbook
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get all sheet names in order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .get(name)
            .ok_or_else(|| self.sheet_not_found(name))
    }

    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        match self.sheets.get_index_of(name) {
            Some(index) => Ok(&mut self.sheets[index]),
            None => Err(self.sheet_not_found(name)),
        }
    }

    /// Get a sheet by index (0-based)
    pub fn get_sheet_by_index(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get_index(index).map(|(_, sheet)| sheet)
    }

    /// Append a sheet, or put back one loaded from a file.
    pub fn insert_sheet(&mut self, sheet: Sheet) -> Result<&mut Sheet> {
        validate_sheet_name(sheet.name())?;
        if self.sheets.contains_key(sheet.name()) {
            return Err(ExcelError::SheetExists {
                name: sheet.name().to_string(),
            });
        }
        let entry = self.sheets.entry(sheet.name().to_string());
        Ok(entry.or_insert(sheet))
    }

    /// Append an empty sheet
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Sheet> {
        self.insert_sheet(Sheet::new(name))
    }

    /// Remove a sheet, keeping the order of the rest. The last sheet cannot go.
    pub fn remove_sheet(&mut self, name: &str) -> Result<Sheet> {
        if !self.sheets.contains_key(name) {
            return Err(self.sheet_not_found(name));
        }
        if self.sheets.len() == 1 {
            return Err(ExcelError::InvalidOperation(format!(
                "cannot remove '{name}', a workbook needs at least one sheet"
            )));
        }
        self.sheets
            .shift_remove(name)
            .ok_or_else(|| self.sheet_not_found(name))
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.values()
    }

    pub fn sheets_mut(&mut self) -> impl Iterator<Item = &mut Sheet> {
        self.sheets.values_mut()
    }

    fn sheet_not_found(&self, name: &str) -> ExcelError {
        ExcelError::SheetNotFound {
            name: name.to_string(),
            available: self.sheets.keys().cloned().collect(),
        }
    }
}

/// Sheet names must be 1 to 31 characters and avoid `[]:*?/\`.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(ExcelError::InvalidOperation(format!(
            "sheet name '{name}' must be 1 to {MAX_SHEET_NAME_LEN} characters long"
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_NAME_CHARS.contains(c)) {
        return Err(ExcelError::InvalidOperation(format!(
            "sheet name '{name}' contains forbidden character '{c}'"
        )));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(ExcelError::InvalidOperation(format!(
            "sheet name '{name}' cannot start or end with an apostrophe"
        )));
    }
    Ok(())
}
