//! `.xls` serialization: a BIFF8 workbook stream wrapped in an OLE compound file.
//!
//! The whole stream is rebuilt from the in-memory workbook on every save.
//! Only what is needed to carry values and number formats is emitted: one
//! font, the 16 mandatory style XFs, one cell XF per distinct number format,
//! a shared string table and NUMBER/LABELSST/BOOLERR cell records.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use xlrobot_formatting::date_value_to_serial;
use xlrobot_primitives::coord_to_excel_name;

use crate::cell::CellValue;
use crate::error::{ExcelError, Result};
use crate::numfmt::builtin_id;
use crate::path::FileFormat;
use crate::workbook::{Sheet, Workbook};

const RECORD_BOF: u16 = 0x0809;
const RECORD_EOF: u16 = 0x000A;
const RECORD_CODEPAGE: u16 = 0x0042;
const RECORD_DATEMODE: u16 = 0x0022;
const RECORD_WINDOW1: u16 = 0x003D;
const RECORD_FONT: u16 = 0x0031;
const RECORD_FORMAT: u16 = 0x041E;
const RECORD_XF: u16 = 0x00E0;
const RECORD_BOUNDSHEET: u16 = 0x0085;
const RECORD_SST: u16 = 0x00FC;
const RECORD_CONTINUE: u16 = 0x003C;
const RECORD_DIMENSIONS: u16 = 0x0200;
const RECORD_WINDOW2: u16 = 0x023E;
const RECORD_NUMBER: u16 = 0x0203;
const RECORD_LABELSST: u16 = 0x00FD;
const RECORD_BOOLERR: u16 = 0x0205;

const BOF_VERSION_BIFF8: u16 = 0x0600;
const BOF_DT_WORKBOOK_GLOBALS: u16 = 0x0005;
const BOF_DT_WORKSHEET: u16 = 0x0010;

/// UTF-16LE
const CODEPAGE_UNICODE: u16 = 1200;
const XF_FLAG_LOCKED: u16 = 0x0001;
const XF_FLAG_STYLE: u16 = 0x0004;
const COLOR_AUTOMATIC: u16 = 0x7FFF;

/// Largest record payload; longer data spills into CONTINUE records.
const MAX_RECORD_DATA: usize = 8224;
const STYLE_XF_COUNT: u16 = 16;
const FIRST_CUSTOM_FORMAT_ID: u16 = 164;
const MAX_CELL_TEXT_LEN: usize = 32_767;

const ERROR_CODES: [(&str, u8); 7] = [
    ("#NULL!", 0x00),
    ("#DIV/0!", 0x07),
    ("#VALUE!", 0x0F),
    ("#REF!", 0x17),
    ("#NAME?", 0x1D),
    ("#NUM!", 0x24),
    ("#N/A", 0x2A),
];

/// Serialize the workbook into `.xls` bytes.
pub(crate) fn to_bytes(workbook: &Workbook) -> Result<Vec<u8>> {
    let stream = build_workbook_stream(workbook)?;
    let mut ole =
        cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))?;
    {
        let mut workbook_stream = ole.create_stream("Workbook")?;
        workbook_stream.write_all(&stream)?;
        workbook_stream.flush()?;
    }
    ole.flush()?;
    Ok(ole.into_inner().into_inner())
}

fn build_workbook_stream(workbook: &Workbook) -> Result<Vec<u8>> {
    let styles = StyleTable::collect(workbook);
    let strings = SharedStrings::collect(workbook);

    let mut globals = Vec::<u8>::new();
    push_record(&mut globals, RECORD_BOF, &bof(BOF_DT_WORKBOOK_GLOBALS));
    push_record(&mut globals, RECORD_CODEPAGE, &CODEPAGE_UNICODE.to_le_bytes());
    push_record(&mut globals, RECORD_WINDOW1, &window1());
    push_record(&mut globals, RECORD_DATEMODE, &0u16.to_le_bytes());
    push_record(&mut globals, RECORD_FONT, &font("Arial")?);

    for (code, id) in &styles.custom_formats {
        push_record(&mut globals, RECORD_FORMAT, &format_record(*id, code)?);
    }
    for _ in 0..STYLE_XF_COUNT {
        push_record(&mut globals, RECORD_XF, &xf_record(0, true));
    }
    for fmt_id in &styles.cell_xfs {
        push_record(&mut globals, RECORD_XF, &xf_record(*fmt_id, false));
    }

    // lbPlyPos is patched once the sheet substream offsets are known
    let mut boundsheet_offset_positions = Vec::with_capacity(workbook.sheet_count());
    for sheet in workbook.sheets() {
        let boundsheet_start = globals.len();
        let mut boundsheet = Vec::<u8>::new();
        boundsheet.extend_from_slice(&0u32.to_le_bytes());
        boundsheet.extend_from_slice(&0u16.to_le_bytes()); // visible worksheet
        write_short_unicode_string(&mut boundsheet, sheet.name())?;
        push_record(&mut globals, RECORD_BOUNDSHEET, &boundsheet);
        boundsheet_offset_positions.push(boundsheet_start + 4);
    }

    push_sst(&mut globals, &strings);
    push_record(&mut globals, RECORD_EOF, &[]);

    for (sheet, offset_pos) in workbook.sheets().zip(boundsheet_offset_positions) {
        let sheet_offset = u32::try_from(globals.len())
            .map_err(|_| ExcelError::Write("workbook stream exceeds 4 GiB".to_string()))?;
        globals[offset_pos..offset_pos + 4].copy_from_slice(&sheet_offset.to_le_bytes());
        let sheet_stream = build_sheet_stream(sheet, &styles, &strings)?;
        globals.extend_from_slice(&sheet_stream);
    }

    Ok(globals)
}

fn build_sheet_stream(
    sheet: &Sheet,
    styles: &StyleTable<'_>,
    strings: &SharedStrings<'_>,
) -> Result<Vec<u8>> {
    let mut out = Vec::<u8>::new();
    push_record(&mut out, RECORD_BOF, &bof(BOF_DT_WORKSHEET));
    push_record(&mut out, RECORD_DIMENSIONS, &dimensions(sheet));
    push_record(&mut out, RECORD_WINDOW2, &window2());

    for (col, row, cell) in sheet.cells() {
        FileFormat::Xls.check_cell(col, row)?;
        // Both fit in u16 after the grid check
        let (row16, col16) = (row as u16, col as u16);
        let xf = styles.xf_for(cell.num_format.as_deref());

        match &cell.value {
            CellValue::Empty => {}
            CellValue::Number(n) => {
                push_record(&mut out, RECORD_NUMBER, &number_cell(row16, col16, xf, *n));
            }
            CellValue::Date(_) | CellValue::Time(_) | CellValue::DateTime(_) => {
                let serial = cell
                    .value
                    .as_date_value()
                    .map(|date| date_value_to_serial(&date))
                    .unwrap_or_default();
                push_record(&mut out, RECORD_NUMBER, &number_cell(row16, col16, xf, serial));
            }
            CellValue::Bool(b) => {
                let data = boolerr_cell(row16, col16, xf, u8::from(*b), false);
                push_record(&mut out, RECORD_BOOLERR, &data);
            }
            CellValue::Error(label) => match error_code(label) {
                Some(code) => {
                    let data = boolerr_cell(row16, col16, xf, code, true);
                    push_record(&mut out, RECORD_BOOLERR, &data);
                }
                None => {
                    tracing::warn!(
                        "Unknown error value {} at {} in sheet '{}' is written as text",
                        label,
                        coord_to_excel_name(col, row),
                        sheet.name()
                    );
                    let index = strings.index_of(label)?;
                    let data = label_sst_cell(row16, col16, xf, index);
                    push_record(&mut out, RECORD_LABELSST, &data);
                }
            },
            CellValue::Text(s) => {
                if s.encode_utf16().count() > MAX_CELL_TEXT_LEN {
                    return Err(ExcelError::Write(format!(
                        "text at {} in sheet '{}' is longer than {} characters",
                        coord_to_excel_name(col, row),
                        sheet.name(),
                        MAX_CELL_TEXT_LEN
                    )));
                }
                let index = strings.index_of(s)?;
                push_record(&mut out, RECORD_LABELSST, &label_sst_cell(row16, col16, xf, index));
            }
        }
    }

    push_record(&mut out, RECORD_EOF, &[]);
    Ok(out)
}

// ===== Style and string tables =====

/// Number formats in use, each mapped to one cell XF.
struct StyleTable<'a> {
    custom_formats: Vec<(&'a str, u16)>,
    cell_xfs: Vec<u16>,
    xf_by_code: HashMap<&'a str, u16>,
}

impl<'a> StyleTable<'a> {
    fn collect(workbook: &'a Workbook) -> Self {
        let mut table = Self {
            custom_formats: Vec::new(),
            cell_xfs: Vec::new(),
            xf_by_code: HashMap::new(),
        };
        table.register("General");
        for sheet in workbook.sheets() {
            for (_, _, cell) in sheet.cells() {
                table.register(cell.num_format.as_deref().unwrap_or("General"));
            }
        }
        table
    }

    fn register(&mut self, code: &'a str) {
        if self.xf_by_code.contains_key(code) {
            return;
        }
        let fmt_id = match builtin_id(code) {
            Some(id) => u16::from(id),
            None => {
                let id = FIRST_CUSTOM_FORMAT_ID + self.custom_formats.len() as u16;
                self.custom_formats.push((code, id));
                id
            }
        };
        let xf = STYLE_XF_COUNT + self.cell_xfs.len() as u16;
        self.cell_xfs.push(fmt_id);
        self.xf_by_code.insert(code, xf);
    }

    fn xf_for(&self, code: Option<&str>) -> u16 {
        self.xf_by_code
            .get(code.unwrap_or("General"))
            .copied()
            .unwrap_or(STYLE_XF_COUNT)
    }
}

/// Unique strings in first-seen order, plus the total number of uses.
struct SharedStrings<'a> {
    strings: Vec<&'a str>,
    index: HashMap<&'a str, u32>,
    total: u32,
}

impl<'a> SharedStrings<'a> {
    fn collect(workbook: &'a Workbook) -> Self {
        let mut table = Self {
            strings: Vec::new(),
            index: HashMap::new(),
            total: 0,
        };
        for sheet in workbook.sheets() {
            for (_, _, cell) in sheet.cells() {
                match &cell.value {
                    CellValue::Text(s) => table.add(s),
                    CellValue::Error(label) if error_code(label).is_none() => table.add(label),
                    _ => {}
                }
            }
        }
        table
    }

    fn add(&mut self, s: &'a str) {
        self.total += 1;
        if !self.index.contains_key(s) {
            self.index.insert(s, self.strings.len() as u32);
            self.strings.push(s);
        }
    }

    fn index_of(&self, s: &str) -> Result<u32> {
        self.index
            .get(s)
            .copied()
            .ok_or_else(|| {
                ExcelError::Write(format!("string '{s}' missing from shared string table"))
            })
    }
}

fn error_code(label: &str) -> Option<u8> {
    ERROR_CODES
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, code)| *code)
}

// ===== Records =====

fn push_record(out: &mut Vec<u8>, id: u16, data: &[u8]) {
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
}

/// SST followed by as many CONTINUE records as needed.
///
/// A string header never straddles two records. When the characters of a
/// string do, the continuation starts with a fresh option byte.
fn push_sst(out: &mut Vec<u8>, strings: &SharedStrings<'_>) {
    let mut records: Vec<Vec<u8>> = Vec::new();
    let mut current = Vec::<u8>::with_capacity(MAX_RECORD_DATA);
    current.extend_from_slice(&strings.total.to_le_bytes());
    current.extend_from_slice(&(strings.strings.len() as u32).to_le_bytes());

    for s in &strings.strings {
        let units: Vec<u16> = s.encode_utf16().collect();
        let wide = units.iter().any(|&unit| unit > 0x00FF);
        let unit_len = if wide { 2 } else { 1 };

        if current.len() + 3 + unit_len > MAX_RECORD_DATA {
            records.push(std::mem::take(&mut current));
        }
        current.extend_from_slice(&(units.len() as u16).to_le_bytes());
        current.push(u8::from(wide));

        let mut rest = units.as_slice();
        while !rest.is_empty() {
            let room = (MAX_RECORD_DATA - current.len()) / unit_len;
            if room == 0 {
                records.push(std::mem::take(&mut current));
                current.push(u8::from(wide));
                continue;
            }
            let (now, later) = rest.split_at(room.min(rest.len()));
            push_units(&mut current, now, wide);
            rest = later;
        }
    }
    records.push(current);

    for (i, data) in records.iter().enumerate() {
        let id = if i == 0 { RECORD_SST } else { RECORD_CONTINUE };
        push_record(out, id, data);
    }
}

fn push_units(out: &mut Vec<u8>, units: &[u16], wide: bool) {
    if wide {
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    } else {
        out.extend(units.iter().map(|&unit| unit as u8));
    }
}

fn bof(dt: u16) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..2].copy_from_slice(&BOF_VERSION_BIFF8.to_le_bytes());
    out[2..4].copy_from_slice(&dt.to_le_bytes());
    out[4..6].copy_from_slice(&0x0DBBu16.to_le_bytes()); // build
    out[6..8].copy_from_slice(&0x07CCu16.to_le_bytes()); // year
    out
}

fn window1() -> [u8; 18] {
    let mut out = [0u8; 18];
    out[14..16].copy_from_slice(&1u16.to_le_bytes()); // cTabSel
    out[16..18].copy_from_slice(&600u16.to_le_bytes()); // wTabRatio
    out
}

fn window2() -> [u8; 18] {
    let mut out = [0u8; 18];
    out[0..2].copy_from_slice(&0x02B6u16.to_le_bytes());
    out
}

fn font(name: &str) -> Result<Vec<u8>> {
    let mut out = Vec::<u8>::new();
    out.extend_from_slice(&200u16.to_le_bytes()); // 10pt
    out.extend_from_slice(&0u16.to_le_bytes()); // option flags
    out.extend_from_slice(&COLOR_AUTOMATIC.to_le_bytes());
    out.extend_from_slice(&400u16.to_le_bytes()); // weight
    out.extend_from_slice(&0u16.to_le_bytes()); // escapement
    out.extend_from_slice(&[0, 0, 0, 0]); // underline, family, charset, reserved
    write_short_unicode_string(&mut out, name)?;
    Ok(out)
}

fn format_record(id: u16, code: &str) -> Result<Vec<u8>> {
    let mut out = Vec::<u8>::new();
    out.extend_from_slice(&id.to_le_bytes());
    write_unicode_string(&mut out, code)?;
    Ok(out)
}

fn xf_record(fmt_id: u16, is_style_xf: bool) -> [u8; 20] {
    let mut out = [0u8; 20];
    out[0..2].copy_from_slice(&0u16.to_le_bytes()); // font
    out[2..4].copy_from_slice(&fmt_id.to_le_bytes());
    let flags = XF_FLAG_LOCKED | if is_style_xf { XF_FLAG_STYLE } else { 0 };
    out[4..6].copy_from_slice(&flags.to_le_bytes());
    out[6] = 0x20; // general, bottom aligned
    out[9] = 0x3F; // apply all attribute groups
    out
}

fn dimensions(sheet: &Sheet) -> [u8; 14] {
    let rows = sheet.row_count().min(FileFormat::Xls.max_rows());
    let cols = sheet.col_count().min(FileFormat::Xls.max_cols()) as u16;
    let mut out = [0u8; 14];
    out[4..8].copy_from_slice(&rows.to_le_bytes()); // last row + 1
    out[10..12].copy_from_slice(&cols.to_le_bytes()); // last col + 1
    out
}

fn number_cell(row: u16, col: u16, xf: u16, v: f64) -> [u8; 14] {
    let mut out = [0u8; 14];
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&xf.to_le_bytes());
    out[6..14].copy_from_slice(&v.to_le_bytes());
    out
}

fn label_sst_cell(row: u16, col: u16, xf: u16, index: u32) -> [u8; 10] {
    let mut out = [0u8; 10];
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&xf.to_le_bytes());
    out[6..10].copy_from_slice(&index.to_le_bytes());
    out
}

fn boolerr_cell(row: u16, col: u16, xf: u16, value: u8, is_error: bool) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&xf.to_le_bytes());
    out[6] = value;
    out[7] = u8::from(is_error);
    out
}

/// ShortXLUnicodeString: `[cch: u8][flags: u8][chars]`
fn write_short_unicode_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let len = u8::try_from(units.len())
        .map_err(|_| ExcelError::Write(format!("'{s}' is too long for a short string")))?;
    out.push(len);
    push_flagged_units(out, &units);
    Ok(())
}

/// XLUnicodeString: `[cch: u16][flags: u8][chars]`
fn write_unicode_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let len = u16::try_from(units.len())
        .map_err(|_| ExcelError::Write(format!("'{s}' is too long for a string record")))?;
    out.extend_from_slice(&len.to_le_bytes());
    push_flagged_units(out, &units);
    Ok(())
}

fn push_flagged_units(out: &mut Vec<u8>, units: &[u16]) {
    let wide = units.iter().any(|&unit| unit > 0x00FF);
    out.push(u8::from(wide));
    push_units(out, units, wide);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::Cell;

    fn records(stream: &[u8]) -> Vec<(u16, Vec<u8>)> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos + 4 <= stream.len() {
            let id = u16::from_le_bytes([stream[pos], stream[pos + 1]]);
            let len = u16::from_le_bytes([stream[pos + 2], stream[pos + 3]]) as usize;
            out.push((id, stream[pos + 4..pos + 4 + len].to_vec()));
            pos += 4 + len;
        }
        out
    }

    #[test]
    fn test_boundsheet_offsets_point_at_sheet_bof() {
        let mut workbook = Workbook::with_default_sheet();
        workbook.add_sheet("Second").unwrap();
        let stream = build_workbook_stream(&workbook).unwrap();

        let offsets: Vec<usize> = records(&stream)
            .into_iter()
            .filter(|(id, _)| *id == RECORD_BOUNDSHEET)
            .map(|(_, data)| u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize)
            .collect();
        assert_eq!(offsets.len(), 2);
        for offset in offsets {
            assert_eq!(&stream[offset..offset + 2], &RECORD_BOF.to_le_bytes());
            assert_eq!(&stream[offset + 6..offset + 8], &BOF_DT_WORKSHEET.to_le_bytes());
        }
    }

    #[test]
    fn test_custom_formats_start_at_164() {
        let mut workbook = Workbook::with_default_sheet();
        let sheet = workbook.get_sheet_mut("Sheet").unwrap();
        sheet.set(0, 0, Cell::new(CellValue::Number(1.0), Some("#,##0.00".to_string())));
        sheet.set(1, 0, Cell::new(CellValue::Number(2.0), Some("yyyy-mm-dd".to_string())));
        sheet.set(2, 0, Cell::new(CellValue::Number(3.0), Some("hh:mm".to_string())));

        let styles = StyleTable::collect(&workbook);
        assert_eq!(styles.custom_formats, vec![("yyyy-mm-dd", 164), ("hh:mm", 165)]);
        assert_eq!(styles.xf_for(None), 16);
        assert_eq!(styles.xf_for(Some("#,##0.00")), 17);
        assert_eq!(styles.cell_xfs, vec![0, 4, 164, 165]);
    }

    #[test]
    fn test_long_sst_is_split_into_continue_records() {
        let mut workbook = Workbook::with_default_sheet();
        let sheet = workbook.get_sheet_mut("Sheet").unwrap();
        let long = "x".repeat(MAX_RECORD_DATA * 2);
        sheet.set(0, 0, Cell::new(CellValue::Text(long.clone()), None));
        sheet.set(0, 1, Cell::new(CellValue::Text("tail".to_string()), None));

        let strings = SharedStrings::collect(&workbook);
        let mut out = Vec::new();
        push_sst(&mut out, &strings);
        let parsed = records(&out);

        assert_eq!(parsed[0].0, RECORD_SST);
        assert!(parsed[1..].iter().all(|(id, _)| *id == RECORD_CONTINUE));
        assert!(parsed.iter().all(|(_, data)| data.len() <= MAX_RECORD_DATA));
        // every continuation of the long string starts with its option byte
        assert_eq!(parsed[1].1[0], 0);

        let payload: usize = parsed.iter().map(|(_, data)| data.len()).sum();
        let expected = 8 + (3 + long.len()) + (3 + 4) + (parsed.len() - 1);
        assert_eq!(payload, expected);
    }

    fn read_back(workbook: &Workbook) -> crate::reader::ExcelReader {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xls");
        std::fs::write(&path, to_bytes(workbook).unwrap()).unwrap();
        let reader = crate::reader::ExcelReader::open(
            &path,
            std::sync::Arc::new(xlrobot_formatting::Formats::default()),
        )
        .unwrap();
        // the reader holds no file handle, so the directory can go
        drop(dir);
        reader
    }

    #[test]
    fn test_error_cells_read_back_as_errors() {
        let mut workbook = Workbook::with_default_sheet();
        let sheet = workbook.get_sheet_mut("Sheet").unwrap();
        sheet.set(0, 0, Cell::new(CellValue::Error("#DIV/0!".to_string()), None));
        sheet.set(1, 0, Cell::new(CellValue::Error("#N/A".to_string()), None));
        sheet.set(2, 0, Cell::new(CellValue::Error("#SPILL!".to_string()), None));

        let reader = read_back(&workbook);
        let book = reader.workbook();
        let sheet = book.get_sheet("Sheet").unwrap();
        assert_eq!(sheet.value(0, 0), CellValue::Error("#DIV/0!".to_string()));
        assert_eq!(sheet.value(1, 0), CellValue::Error("#N/A".to_string()));
        // no BIFF8 code for it, so it comes back as text
        assert_eq!(sheet.value(2, 0), CellValue::Text("#SPILL!".to_string()));
    }

    #[test]
    fn test_long_and_wide_strings_survive_continue_records() {
        let mut workbook = Workbook::with_default_sheet();
        let sheet = workbook.get_sheet_mut("Sheet").unwrap();
        let long = "abcdefghij".repeat(2000);
        let wide = "Ünïcödé ☃ ".repeat(900);
        sheet.set(0, 0, Cell::new(CellValue::Text(long.clone()), None));
        sheet.set(0, 1, Cell::new(CellValue::Text(wide.clone()), None));
        for row in 2..500 {
            sheet.set(0, row, Cell::new(CellValue::Text(format!("row {row}")), None));
        }

        let reader = read_back(&workbook);
        let sheet = reader.workbook().get_sheet("Sheet").unwrap();
        assert_eq!(sheet.value(0, 0), CellValue::Text(long));
        assert_eq!(sheet.value(0, 1), CellValue::Text(wide));
        assert_eq!(sheet.value(0, 499), CellValue::Text("row 499".to_string()));
        assert_eq!(sheet.row_count(), 500);
    }

    #[test]
    fn test_rows_beyond_xls_grid_are_rejected() {
        let mut workbook = Workbook::with_default_sheet();
        let sheet = workbook.get_sheet_mut("Sheet").unwrap();
        sheet.set(0, 70_000, Cell::new(CellValue::Number(1.0), None));
        assert!(matches!(
            to_bytes(&workbook),
            Err(ExcelError::CellOutOfRange { .. })
        ));
    }

    #[test]
    fn test_compound_file_has_workbook_stream() {
        let bytes = to_bytes(&Workbook::with_default_sheet()).unwrap();
        let mut ole = cfb::CompoundFile::open(Cursor::new(bytes)).unwrap();
        assert!(ole.is_stream("/Workbook"));
        let mut stream = Vec::new();
        let mut workbook_stream = ole.open_stream("/Workbook").unwrap();
        std::io::Read::read_to_end(&mut workbook_stream, &mut stream).unwrap();
        assert_eq!(&stream[0..2], &RECORD_BOF.to_le_bytes());
    }
}
