use std::path::Path;

use xlrobot_sheet::{ExcelReader, ExcelWriter};

use crate::error::{KeywordError, Result};

/// The workbook a library is currently working on.
#[derive(Debug)]
pub enum Session {
    Reader(ExcelReader),
    Writer(ExcelWriter),
}

impl Session {
    /// Read access; a writer answers from the snapshot it opened.
    pub fn reader(&self) -> &ExcelReader {
        match self {
            Session::Reader(reader) => reader,
            Session::Writer(writer) => writer.reader(),
        }
    }

    pub fn writer_mut(&mut self) -> Result<&mut ExcelWriter> {
        match self {
            Session::Writer(writer) => Ok(writer),
            Session::Reader(reader) => Err(KeywordError::ReadOnlySession {
                path: reader.path().to_path_buf(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        self.reader().path()
    }
}
