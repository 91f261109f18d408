//! Per-cell number format codes read straight from a workbook file.
//!
//! calamine decodes cell values but does not expose the format code each
//! cell is displayed with. The style tables are read here instead:
//! `xl/styles.xml` and the `s` attribute of every `<c>` for `.xlsx`, the
//! FORMAT and XF records and the XF index of every cell record for `.xls`.
//! General cells are left out of the result.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use xlrobot_primitives::excel_name_to_coord;
use zip::ZipArchive;

use crate::error::{ExcelError, Result};
use crate::path::FileFormat;

/// Format code per `(col, row)` of one sheet
pub(crate) type SheetFormats = HashMap<(u32, u32), String>;

const GENERAL: &str = "General";

/// Built-in number formats every reader knows without a FORMAT/numFmt entry.
const BUILTIN_FORMATS: [(u8, &str); 28] = [
    (0, GENERAL),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

/// Built-in index of a format code, if it has one.
pub(crate) fn builtin_id(code: &str) -> Option<u8> {
    BUILTIN_FORMATS
        .iter()
        .find(|(_, builtin)| *builtin == code)
        .map(|(id, _)| *id)
}

fn builtin_code(id: u32) -> Option<&'static str> {
    BUILTIN_FORMATS
        .iter()
        .find(|(builtin, _)| u32::from(*builtin) == id)
        .map(|(_, code)| *code)
}

/// Code for a format id; `None` for General and for unknown ids.
fn resolve_code(id: u32, custom: &HashMap<u32, String>) -> Option<String> {
    let code = custom
        .get(&id)
        .map(String::as_str)
        .or_else(|| builtin_code(id))?;
    (!code.eq_ignore_ascii_case(GENERAL)).then(|| code.to_string())
}

/// Number formats of every cell that has one, keyed by sheet name.
pub(crate) fn load(path: &Path, format: FileFormat) -> Result<HashMap<String, SheetFormats>> {
    let by_sheet = match format {
        FileFormat::Xlsx => xlsx_formats(path)?,
        FileFormat::Xls => xls_formats(path)?,
    };
    tracing::debug!(
        "Read number formats of {} cell(s) from {}",
        by_sheet.values().map(HashMap::len).sum::<usize>(),
        path.display()
    );
    Ok(by_sheet)
}

fn read_error(path: &Path, err: impl std::fmt::Display) -> ExcelError {
    ExcelError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

// ===== .xlsx =====

fn xlsx_formats(path: &Path) -> Result<HashMap<String, SheetFormats>> {
    let file = BufReader::new(File::open(path)?);
    let mut archive = ZipArchive::new(file).map_err(|e| read_error(path, e))?;

    let Some(styles) = read_part(&mut archive, path, "xl/styles.xml")? else {
        return Ok(HashMap::new());
    };
    let xf_codes = parse_styles(&styles).map_err(|e| read_error(path, e))?;
    if xf_codes.iter().all(Option::is_none) {
        return Ok(HashMap::new());
    }

    let workbook = read_part(&mut archive, path, "xl/workbook.xml")?
        .ok_or_else(|| read_error(path, "xl/workbook.xml is missing"))?;
    let rels = read_part(&mut archive, path, "xl/_rels/workbook.xml.rels")?
        .unwrap_or_default();
    let targets = parse_relationships(&rels).map_err(|e| read_error(path, e))?;

    let mut by_sheet = HashMap::new();
    for (name, rel_id) in parse_sheet_list(&workbook).map_err(|e| read_error(path, e))? {
        let Some(target) = targets.get(&rel_id) else {
            tracing::warn!("Sheet '{}' has no part in {}", name, path.display());
            continue;
        };
        let Some(xml) = read_part(&mut archive, path, &part_path(target))? else {
            continue;
        };
        let formats = parse_sheet_cells(&xml, &xf_codes).map_err(|e| read_error(path, e))?;
        by_sheet.insert(name, formats);
    }
    Ok(by_sheet)
}

/// A part of the package as text; `None` when the package has no such part.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
    name: &str,
) -> Result<Option<String>> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(read_error(path, e)),
    };
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Relationship targets are relative to `xl/` unless they start with `/`.
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn attribute(reader: &XmlReader<&[u8]>, element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.decode_and_unescape_value(reader.decoder()).ok())
        .map(|value| value.into_owned())
}

/// Format code of each entry of `cellXfs`, in order.
fn parse_styles(xml: &str) -> quick_xml::Result<Vec<Option<String>>> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attribute(&reader, &e, b"numFmtId")
                        .and_then(|id| id.parse().ok());
                    let code = attribute(&reader, &e, b"formatCode");
                    if let (Some(id), Some(code)) = (id, code) {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let id = attribute(&reader, &e, b"numFmtId")
                        .and_then(|id| id.parse().ok())
                        .unwrap_or(0);
                    xf_ids.push(id);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(xf_ids
        .into_iter()
        .map(|id| resolve_code(id, &custom))
        .collect())
}

/// `(relationship id, target)` pairs of the workbook part.
fn parse_relationships(xml: &str) -> quick_xml::Result<HashMap<String, String>> {
    let mut reader = XmlReader::from_str(xml);
    let mut targets = HashMap::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute(&reader, &e, b"Id");
                let target = attribute(&reader, &e, b"Target");
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// `(sheet name, relationship id)` in workbook order.
fn parse_sheet_list(xml: &str) -> quick_xml::Result<Vec<(String, String)>> {
    let mut reader = XmlReader::from_str(xml);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                // r:id, matched on its local name
                let name = attribute(&reader, &e, b"name");
                let rel_id = attribute(&reader, &e, b"id");
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

fn parse_sheet_cells(xml: &str, xf_codes: &[Option<String>]) -> quick_xml::Result<SheetFormats> {
    let mut reader = XmlReader::from_str(xml);
    let mut formats = SheetFormats::new();
    // positions for rows and cells written without an `r` attribute
    let (mut row, mut next_row, mut next_col) = (0u32, 0u32, 0u32);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = attribute(&reader, &e, b"r")
                        .and_then(|r| r.parse::<u32>().ok())
                        .map_or(next_row, |r| r.saturating_sub(1));
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let (col, cell_row) = attribute(&reader, &e, b"r")
                        .and_then(|r| excel_name_to_coord(&r).ok())
                        .unwrap_or((next_col, row));
                    next_col = col + 1;
                    let xf = attribute(&reader, &e, b"s")
                        .and_then(|s| s.parse::<usize>().ok())
                        .unwrap_or(0);
                    if let Some(Some(code)) = xf_codes.get(xf) {
                        formats.insert((col, cell_row), code.clone());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(formats)
}

// ===== .xls =====

const RECORD_BOF: u16 = 0x0809;
const RECORD_EOF: u16 = 0x000A;
const RECORD_FORMAT: u16 = 0x041E;
const RECORD_XF: u16 = 0x00E0;
const RECORD_BOUNDSHEET: u16 = 0x0085;
const RECORD_FORMULA: u16 = 0x0006;
const RECORD_MULRK: u16 = 0x00BD;
const RECORD_RSTRING: u16 = 0x00D6;
const RECORD_LABELSST: u16 = 0x00FD;
const RECORD_NUMBER: u16 = 0x0203;
const RECORD_LABEL: u16 = 0x0204;
const RECORD_BOOLERR: u16 = 0x0205;
const RECORD_RK: u16 = 0x027E;

const BOF_VERSION_BIFF8: u16 = 0x0600;

fn xls_formats(path: &Path) -> Result<HashMap<String, SheetFormats>> {
    let mut ole = cfb::open(path)?;
    let Some(name) = ["/Workbook", "/Book"]
        .into_iter()
        .find(|name| ole.is_stream(name))
    else {
        return Ok(HashMap::new());
    };
    let mut stream = Vec::new();
    ole.open_stream(name)?.read_to_end(&mut stream)?;
    Ok(parse_biff_formats(&stream))
}

/// `(id, payload)` of each record from the start of a stream.
///
/// Stops at the end of the stream or at a truncated record.
struct BiffRecords<'a> {
    stream: &'a [u8],
    pos: usize,
}

impl<'a> BiffRecords<'a> {
    fn new(stream: &'a [u8]) -> Self {
        Self { stream, pos: 0 }
    }
}

impl<'a> Iterator for BiffRecords<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.stream.get(self.pos..self.pos + 4)?;
        let id = u16::from_le_bytes([header[0], header[1]]);
        let len = usize::from(u16::from_le_bytes([header[2], header[3]]));
        let start = self.pos + 4;
        let data = self.stream.get(start..start + len)?;
        self.pos = start + len;
        Some((id, data))
    }
}

fn parse_biff_formats(stream: &[u8]) -> HashMap<String, SheetFormats> {
    let mut custom = HashMap::new();
    let mut xf_ids = Vec::new();
    let mut sheets = Vec::new();
    let mut biff8 = false;

    for (id, data) in BiffRecords::new(stream) {
        match id {
            RECORD_BOF => biff8 = read_u16(data, 0) == Some(BOF_VERSION_BIFF8),
            RECORD_FORMAT => {
                let code = data.get(2..).and_then(read_unicode_string);
                if let (Some(ifmt), Some(code)) = (read_u16(data, 0), code) {
                    custom.insert(u32::from(ifmt), code);
                }
            }
            RECORD_XF => {
                if let Some(ifmt) = read_u16(data, 2) {
                    xf_ids.push(u32::from(ifmt));
                }
            }
            RECORD_BOUNDSHEET => {
                let name = data.get(6..).and_then(read_short_unicode_string);
                if let (Some(offset), Some(name)) = (read_u32(data, 0), name) {
                    sheets.push((name, offset as usize));
                }
            }
            RECORD_EOF => break,
            _ => {}
        }
    }

    if !biff8 {
        tracing::debug!("Workbook stream is not BIFF8; number formats are not read");
        return HashMap::new();
    }
    let xf_codes: Vec<Option<String>> = xf_ids
        .into_iter()
        .map(|id| resolve_code(id, &custom))
        .collect();

    sheets
        .into_iter()
        .map(|(name, offset)| {
            let substream = stream.get(offset..).unwrap_or_default();
            (name, sheet_cell_formats(substream, &xf_codes))
        })
        .collect()
}

/// Formats of the cells of one sheet substream, up to its closing EOF.
fn sheet_cell_formats(substream: &[u8], xf_codes: &[Option<String>]) -> SheetFormats {
    let mut formats = SheetFormats::new();
    let mut note = |row: u16, col: u16, xf: u16| {
        if let Some(Some(code)) = xf_codes.get(usize::from(xf)) {
            formats.insert((u32::from(col), u32::from(row)), code.clone());
        }
    };

    // embedded chart substreams nest their own BOF/EOF pairs
    let mut depth = 0usize;
    for (id, data) in BiffRecords::new(substream) {
        match id {
            RECORD_BOF => depth += 1,
            RECORD_EOF => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            _ if depth != 1 => {}
            RECORD_MULRK => {
                // [row][first col] then (xf, rk) pairs, then [last col]
                let (Some(row), Some(first)) = (read_u16(data, 0), read_u16(data, 2)) else {
                    continue;
                };
                let pairs = data.get(4..data.len().saturating_sub(2)).unwrap_or_default();
                for (i, pair) in pairs.chunks_exact(6).enumerate() {
                    let Some(col) = u16::try_from(i).ok().and_then(|i| first.checked_add(i)) else {
                        break;
                    };
                    note(row, col, u16::from_le_bytes([pair[0], pair[1]]));
                }
            }
            RECORD_NUMBER | RECORD_RK | RECORD_LABELSST | RECORD_LABEL | RECORD_RSTRING
            | RECORD_BOOLERR | RECORD_FORMULA => {
                if let (Some(row), Some(col), Some(xf)) =
                    (read_u16(data, 0), read_u16(data, 2), read_u16(data, 4))
                {
                    note(row, col, xf);
                }
            }
            _ => {}
        }
    }
    formats
}

fn read_u16(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2)
        .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// XLUnicodeString: `[cch: u16][flags: u8][chars]`
fn read_unicode_string(data: &[u8]) -> Option<String> {
    let len = usize::from(read_u16(data, 0)?);
    decode_chars(data.get(2..)?, len)
}

/// ShortXLUnicodeString: `[cch: u8][flags: u8][chars]`
fn read_short_unicode_string(data: &[u8]) -> Option<String> {
    let len = usize::from(*data.first()?);
    decode_chars(data.get(1..)?, len)
}

/// `[flags: u8][chars]`; bit 0 of the flags selects UTF-16 over Latin-1.
fn decode_chars(data: &[u8], len: usize) -> Option<String> {
    let wide = data.first()? & 0x01 != 0;
    let chars = data.get(1..)?;
    if wide {
        let units: Vec<u16> = chars
            .get(..len * 2)?
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else {
        Some(chars.get(..len)?.iter().map(|&b| char::from(b)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0.00"/></numFmts>
  <cellStyleXfs count="1"><xf numFmtId="10"/></cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0"/>
    <xf numFmtId="10" applyNumberFormat="1"/>
    <xf numFmtId="164" applyNumberFormat="1"/>
    <xf numFmtId="14" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn test_styles_map_cell_xfs_to_codes() {
        let codes = parse_styles(STYLES).unwrap();
        assert_eq!(
            codes,
            vec![
                None,
                Some("0.00%".to_string()),
                Some("\"$\"#,##0.00".to_string()),
                Some("mm-dd-yy".to_string()),
            ]
        );
    }

    #[test]
    fn test_sheet_cells_pick_up_their_style() {
        let codes = parse_styles(STYLES).unwrap();
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" s="1"><v>0.125</v></c><c r="B1"><v>1</v></c></row>
            <row r="3"><c r="C3" s="2"><v>1234.5</v></c><c s="3"><v>43101</v></c></row>
        </sheetData></worksheet>"#;
        let formats = parse_sheet_cells(sheet, &codes).unwrap();

        assert_eq!(formats.len(), 3);
        assert_eq!(formats[&(0, 0)], "0.00%");
        assert_eq!(formats[&(2, 2)], "\"$\"#,##0.00");
        // no `r`: the cell after C3
        assert_eq!(formats[&(3, 2)], "mm-dd-yy");
    }

    #[test]
    fn test_sheet_list_follows_relationships() {
        let workbook = r#"<workbook xmlns:r="urn:relationships">
            <sheets><sheet name="Data" sheetId="1" r:id="rId2"/></sheets></workbook>"#;
        let rels = r#"<Relationships>
            <Relationship Id="rId2" Target="worksheets/sheet1.xml" Type="worksheet"/>
            <Relationship Id="rId3" Target="/xl/styles.xml" Type="styles"/>
        </Relationships>"#;

        let sheets = parse_sheet_list(workbook).unwrap();
        assert_eq!(sheets, vec![("Data".to_string(), "rId2".to_string())]);
        let targets = parse_relationships(rels).unwrap();
        assert_eq!(part_path(&targets["rId2"]), "xl/worksheets/sheet1.xml");
        assert_eq!(part_path(&targets["rId3"]), "xl/styles.xml");
    }

    fn record(id: u16, data: &[u8]) -> Vec<u8> {
        let mut out = id.to_le_bytes().to_vec();
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    fn bof() -> Vec<u8> {
        let mut data = vec![0u8; 16];
        data[0..2].copy_from_slice(&BOF_VERSION_BIFF8.to_le_bytes());
        record(RECORD_BOF, &data)
    }

    fn xf(ifmt: u16) -> Vec<u8> {
        let mut data = vec![0u8; 20];
        data[2..4].copy_from_slice(&ifmt.to_le_bytes());
        record(RECORD_XF, &data)
    }

    #[test]
    fn test_biff_records_carry_xf_indexes() {
        let mut globals = bof();
        let code = b"dd mmm yyyy";
        let mut format = 164u16.to_le_bytes().to_vec();
        format.extend_from_slice(&(code.len() as u16).to_le_bytes());
        format.push(0);
        format.extend_from_slice(code);
        globals.extend(record(RECORD_FORMAT, &format));
        globals.extend(xf(0));
        globals.extend(xf(10));
        globals.extend(xf(164));

        let boundsheet_at = globals.len() + 4;
        let mut boundsheet = vec![0u8; 6];
        boundsheet.extend_from_slice(&[4, 0]);
        boundsheet.extend_from_slice(b"Data");
        globals.extend(record(RECORD_BOUNDSHEET, &boundsheet));
        globals.extend(record(RECORD_EOF, &[]));

        let offset = globals.len() as u32;
        globals[boundsheet_at..boundsheet_at + 4].copy_from_slice(&offset.to_le_bytes());

        let mut stream = globals;
        stream.extend(bof());
        // NUMBER at A1 with XF 1
        let mut number = vec![0u8; 14];
        number[4..6].copy_from_slice(&1u16.to_le_bytes());
        stream.extend(record(RECORD_NUMBER, &number));
        // MULRK on row 2 from column B: XF 2, then XF 0
        let mut mulrk = Vec::new();
        mulrk.extend_from_slice(&1u16.to_le_bytes());
        mulrk.extend_from_slice(&1u16.to_le_bytes());
        for ixfe in [2u16, 0] {
            mulrk.extend_from_slice(&ixfe.to_le_bytes());
            mulrk.extend_from_slice(&0u32.to_le_bytes());
        }
        mulrk.extend_from_slice(&2u16.to_le_bytes());
        stream.extend(record(RECORD_MULRK, &mulrk));
        stream.extend(record(RECORD_EOF, &[]));

        let by_sheet = parse_biff_formats(&stream);
        let formats = &by_sheet["Data"];
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[&(0, 0)], "0.00%");
        assert_eq!(formats[&(1, 1)], "dd mmm yyyy");
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(builtin_id("@"), Some(49));
        assert_eq!(builtin_id("0.00%"), Some(10));
        assert_eq!(builtin_id("yyyy-mm-dd"), None);
        assert_eq!(resolve_code(0, &HashMap::new()), None);
        assert_eq!(resolve_code(200, &HashMap::new()), None);
    }
}
