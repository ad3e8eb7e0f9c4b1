use crate::core::errors::{LoadError, Result};
use csv::{ByteRecord, ReaderBuilder, Terminator};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Ordered column names from the first line of a data set file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// One data line, split on tabs. Fields are decoded on access.
#[derive(Debug, Clone)]
pub struct Row {
    line: u64,
    record: ByteRecord,
}

impl Row {
    /// 1-based line number in the source file.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, index: usize) -> Option<Cow<'_, str>> {
        self.record.get(index).map(decode_field)
    }

    pub fn into_fields(self) -> Vec<String> {
        self.record
            .iter()
            .map(|f| decode_field(f).into_owned())
            .collect()
    }
}

/// Streams a tab-delimited file: a header line followed by one record per line.
///
/// Values are never unquoted or trimmed. Rows whose field count differs from the
/// header are skipped with a warning and counted in [`RecordSource::malformed_rows`].
/// The file handle is released when the source is dropped.
pub struct RecordSource<R = File> {
    path: PathBuf,
    reader: csv::Reader<R>,
    header: Header,
    malformed: u64,
}

impl RecordSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io(e),
        })?;
        Self::from_reader(path, file)
    }
}

impl<R: Read> RecordSource<R> {
    /// `path` only labels log lines and errors.
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .terminator(Terminator::Any(b'\n'))
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let columns = strip_carriage_return(reader.byte_headers()?.clone())
            .iter()
            .map(|f| decode_field(f).into_owned())
            .collect();

        Ok(Self {
            path: path.into(),
            reader,
            header: Header { columns },
            malformed: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Index of a column the caller cannot work without.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.header
            .index_of(column)
            .ok_or_else(|| LoadError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })
    }

    pub fn malformed_rows(&self) -> u64 {
        self.malformed
    }

    /// Next well-formed row, or `None` at end of file.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            let mut record = ByteRecord::new();
            if !self.reader.read_byte_record(&mut record)? {
                return Ok(None);
            }
            // Records end at `\n`; a trailing `\r` is dropped after the position is taken.
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let record = strip_carriage_return(record);
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }

            if record.len() != self.header.len() {
                let err = LoadError::MalformedRow {
                    path: self.path.clone(),
                    line,
                    expected: self.header.len(),
                    found: record.len(),
                };
                log::warn!("Skipping row: {}", err);
                self.malformed += 1;
                continue;
            }

            return Ok(Some(Row { line, record }));
        }
    }
}

impl<R: Read> Iterator for RecordSource<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

fn strip_carriage_return(record: ByteRecord) -> ByteRecord {
    let last = record.len().saturating_sub(1);
    match record.get(last) {
        Some(field) if field.ends_with(b"\r") => record
            .iter()
            .enumerate()
            .map(|(i, f)| if i == last { &f[..f.len() - 1] } else { f })
            .collect(),
        _ => record,
    }
}

/// UTF-8 when valid, otherwise Windows-1252 (older extracts carry Latin-1 names).
fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => encoding_rs::WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0,
    }
}
