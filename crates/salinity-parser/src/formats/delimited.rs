use csv::StringRecord;

use crate::errors::ParserError;
use crate::model::{RawTable, SourceSchema};
use crate::registry::TableParser;

use super::{build_text_dataframe, clean_cell, TextColumn};

/// Reads a delimited export whose layout is described by a [`SourceSchema`].
///
/// A file whose header row lacks any of the mapped columns is reported as a
/// format mismatch so that the registry can move on to the next layout.
#[derive(Debug, Clone)]
pub struct DelimitedParser {
    name: String,
    schema: SourceSchema,
}

impl DelimitedParser {
    pub fn new(name: impl Into<String>, schema: SourceSchema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    fn locate_columns(&self, headers: &StringRecord) -> Result<Vec<TextColumn>, ParserError> {
        let mut located = Vec::new();
        let mut missing = Vec::new();

        for (role, expected) in self.schema.mapped_roles() {
            let expected = expected.trim();
            match headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(expected))
            {
                Some(index) => located.push(TextColumn::new(role, index, 0)),
                None => missing.push(format!("{role} ('{expected}')")),
            }
        }

        if !missing.is_empty() {
            return Err(ParserError::FormatMismatch {
                parser: self.name.clone(),
                reason: format!("header row is missing {}", missing.join(", ")),
            });
        }

        Ok(located)
    }
}

impl TableParser for DelimitedParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, content: &str) -> Result<RawTable, ParserError> {
        let delimiter = self
            .schema
            .delimiter_byte()
            .map_err(|message| ParserError::InvalidSchema {
                parser: self.name.clone(),
                message,
            })?;

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|source| ParserError::Csv {
                parser: self.name.clone(),
                source,
            })?
            .clone();

        let mut columns = self.locate_columns(&headers)?;

        for record in reader.records() {
            let record = record.map_err(|source| ParserError::Csv {
                parser: self.name.clone(),
                source,
            })?;
            for column in columns.iter_mut() {
                column.values.push(clean_cell(record.get(column.index)));
            }
        }

        if columns.iter().all(|c| c.values.is_empty()) {
            return Err(ParserError::EmptyData {
                parser: self.name.clone(),
            });
        }

        let df = build_text_dataframe(&self.name, columns)?;

        Ok(RawTable {
            source: self.name.clone(),
            schema: self.schema.clone(),
            df,
        })
    }
}
