//! Header-Labeled CSV Tables
//!
//! `casadm --output-format csv` prints one header record followed by one record
//! per item. Records are read with the `csv` crate, so quoted cells may hold
//! commas, escaped quotes and line breaks. The header text differs between casadm releases (capitalisation,
//! extra columns, column order), so every field is located through a [`Column`]
//! that lists all header spellings known for it. Nothing is ever read by
//! position.

use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a casadm table could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("output has no header line")]
    MissingHeader,

    #[error("line {line} has {found} fields, header has {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("malformed CSV: {0}")]
    Malformed(String),

    #[error("required column '{column}' not found in header")]
    MissingColumn { column: &'static str },

    #[error("column '{column}' on line {line} holds '{value}', expected a number")]
    InvalidNumber {
        column: &'static str,
        line: usize,
        value: String,
    },
}

/// A named field and every header text casadm has used for it
#[derive(Debug, Clone, Copy)]
pub struct Column {
    aliases: &'static [&'static str],
}

impl Column {
    /// The first alias is the canonical name used in error messages.
    pub const fn new(aliases: &'static [&'static str]) -> Self {
        Self { aliases }
    }

    pub fn name(&self) -> &'static str {
        self.aliases.first().copied().unwrap_or("")
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }
}

/// Parsed CSV output with a header index
#[derive(Debug, Clone)]
pub struct Table {
    index: HashMap<String, usize>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(DecodeError::MissingHeader);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| decode_error(&e))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() {
            return Err(DecodeError::MissingHeader);
        }

        let mut index = HashMap::with_capacity(headers.len());
        for (position, header) in headers.iter().enumerate() {
            // First occurrence wins if casadm ever repeats a header.
            index.entry(normalize(header)).or_insert(position);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| decode_error(&e))?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            rows.push((line, record.iter().map(str::to_string).collect()));
        }

        Ok(Self { index, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first alias of `column` present in the header
    pub fn position(&self, column: &Column) -> Option<usize> {
        column
            .aliases()
            .iter()
            .find_map(|alias| self.index.get(&normalize(alias)).copied())
    }

    /// Fails with the first column from `columns` that the header lacks
    pub fn require(&self, columns: &[Column]) -> Result<(), DecodeError> {
        match columns.iter().find(|c| self.position(c).is_none()) {
            Some(missing) => Err(DecodeError::MissingColumn {
                column: missing.name(),
            }),
            None => Ok(()),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |(line, cells)| Row {
            table: self,
            line: *line,
            cells,
        })
    }
}

/// One record of a [`Table`], addressed by column name
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    line: usize,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn text(&self, column: &Column) -> Result<&'a str, DecodeError> {
        self.optional_text(column)
            .ok_or(DecodeError::MissingColumn {
                column: column.name(),
            })
    }

    pub fn optional_text(&self, column: &Column) -> Option<&'a str> {
        self.table
            .position(column)
            .and_then(|position| self.cells.get(position))
            .map(|cell| cell.trim())
    }

    pub fn number<T: FromStr>(&self, column: &Column) -> Result<T, DecodeError> {
        let value = self.text(column)?;
        self.parse_number(column, value)
    }

    /// Missing columns and blank cells are `None`; garbage is still an error.
    pub fn optional_number<T: FromStr>(&self, column: &Column) -> Result<Option<T>, DecodeError> {
        match self.optional_text(column) {
            None | Some("") | Some("-") => Ok(None),
            Some(value) => self.parse_number(column, value).map(Some),
        }
    }

    fn parse_number<T: FromStr>(&self, column: &Column, value: &str) -> Result<T, DecodeError> {
        value.parse().map_err(|_| DecodeError::InvalidNumber {
            column: column.name(),
            line: self.line,
            value: value.to_string(),
        })
    }
}

/// Lowercase, trim and collapse inner whitespace
fn normalize(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn decode_error(error: &csv::Error) -> DecodeError {
    match error.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => DecodeError::RaggedRow {
            line: pos.as_ref().map_or(0, |p| p.line() as usize),
            expected: *expected_len as usize,
            found: *len as usize,
        },
        _ => DecodeError::Malformed(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: Column = Column::new(&["Cache Id", "Id"]);
    const SIZE: Column = Column::new(&["Size [4KiB Blocks]"]);

    #[test]
    fn quoted_cells_keep_commas_quotes_and_newlines() {
        let table = Table::parse("Id,Name\n1,\"say \"\"hi\"\", a,b\"\n2,\"two\nlines\"\n").unwrap();
        let rows: Vec<_> = table.rows().collect();
        let name = Column::new(&["Name"]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(&name).unwrap(), r#"say "hi", a,b"#);
        assert_eq!(rows[1].text(&name).unwrap(), "two\nlines");
        assert_eq!(rows[1].line(), 3);
    }

    #[test]
    fn header_lookup_ignores_case_and_spacing() {
        let table = Table::parse("cache  ID,size [4kib blocks]\n1,20\n").unwrap();
        let row = table.rows().next().unwrap();

        assert_eq!(row.number::<u16>(&ID).unwrap(), 1);
        assert_eq!(row.number::<f64>(&SIZE).unwrap(), 20.0);
    }

    #[test]
    fn second_alias_is_used_when_first_is_absent() {
        let table = Table::parse("Id\n7\n").unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row.number::<u16>(&ID).unwrap(), 7);
    }

    #[test]
    fn blank_lines_and_crlf_are_skipped() {
        let table = Table::parse("\u{feff}Cache Id\r\n\r\n3\r\n\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows().next().unwrap().line(), 3);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::parse("a,b\n1\n").unwrap_err();
        assert_eq!(
            err,
            DecodeError::RaggedRow {
                line: 2,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn empty_output_has_no_header() {
        assert_eq!(Table::parse(" \n\n").unwrap_err(), DecodeError::MissingHeader);
    }

    #[test]
    fn optional_number_treats_dash_as_absent() {
        let table = Table::parse("Size [4KiB Blocks]\n-\n").unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row.optional_number::<f64>(&SIZE).unwrap(), None);
    }

    #[test]
    fn invalid_number_names_the_column() {
        let table = Table::parse("Cache Id\nabc\n").unwrap();
        let err = table.rows().next().unwrap().number::<u16>(&ID).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidNumber { column: "Cache Id", line: 2, .. }
        ));
    }
}
