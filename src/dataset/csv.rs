//! CSV reading and writing for the dataset tables.
//!
//! The tables are flat single-line records; fields containing commas,
//! quotes, or line breaks are quoted with doubled inner quotes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::DatasetError;

/// Column every input table must carry: the clip location per row.
pub const PATH_COLUMN: &str = "file_path";

/// A parsed metadata table with its clip-path column resolved.
#[derive(Debug, Clone)]
pub struct MetadataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    path_column: usize,
}

impl MetadataTable {
    pub fn read(path: &Path) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path).map_err(|source| DatasetError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, origin: &Path) -> Result<Self, DatasetError> {
        let mut lines = text.lines().filter(|line| !line.is_empty());
        let header = lines.next().ok_or_else(|| DatasetError::EmptyTable {
            path: origin.to_path_buf(),
        })?;
        let columns = parse_record(header);
        let path_column = columns
            .iter()
            .position(|column| column == PATH_COLUMN)
            .ok_or_else(|| DatasetError::MissingColumn {
                path: origin.to_path_buf(),
                column: PATH_COLUMN.to_string(),
            })?;
        let rows = lines.map(parse_record).collect();
        Ok(Self {
            columns,
            rows,
            path_column,
        })
    }

    /// The clip path of one row, `None` when the cell is absent or empty.
    pub fn path_cell<'a>(&self, row: &'a [String]) -> Option<&'a str> {
        row.get(self.path_column)
            .map(String::as_str)
            .filter(|cell| !cell.is_empty())
    }
}

/// Writes a header plus rows, streaming the row iterator.
pub fn write_csv<R>(path: &Path, columns: &[String], rows: R) -> Result<(), DatasetError>
where
    R: IntoIterator<Item = Vec<String>>,
{
    let write_err = |source| DatasetError::WriteFile {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    write_record(&mut writer, columns.iter().map(String::as_str)).map_err(write_err)?;
    for row in rows {
        write_record(&mut writer, row.iter().map(String::as_str)).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;
    Ok(())
}

/// Formats a feature value for a CSV cell; NaN becomes an empty cell.
pub fn format_f32(value: f32) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

pub fn format_f64(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn write_record<'a, W, I>(writer: &mut W, fields: I) -> std::io::Result<()>
where
    W: Write,
    I: Iterator<Item = &'a str>,
{
    for (i, field) in fields.enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        write_field(writer, field)?;
    }
    writer.write_all(b"\n")
}

fn write_field<W: Write>(writer: &mut W, field: &str) -> std::io::Result<()> {
    if field.contains(['"', ',', '\n', '\r']) {
        writer.write_all(b"\"")?;
        writer.write_all(field.replace('"', "\"\"").as_bytes())?;
        writer.write_all(b"\"")
    } else {
        writer.write_all(field.as_bytes())
    }
}

/// Splits one CSV line into fields, honouring quotes and doubled quotes.
fn parse_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }
    fields.push(field);
    fields
}
