use polars::prelude::*;

use crate::errors::ParserError;
use crate::model::ColumnRole;

/// Raw cell text gathered for one mapped column.
#[derive(Debug, Clone)]
pub(crate) struct TextColumn {
    pub role: ColumnRole,
    pub index: usize,
    pub values: Vec<Option<String>>,
}

impl TextColumn {
    pub fn new(role: ColumnRole, index: usize, capacity: usize) -> Self {
        Self {
            role,
            index,
            values: Vec::with_capacity(capacity),
        }
    }
}

pub(crate) fn clean_cell(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

pub(crate) fn build_text_dataframe(
    parser: &str,
    columns: Vec<TextColumn>,
) -> Result<DataFrame, ParserError> {
    let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);

    let mut cols: Vec<Column> = Vec::with_capacity(columns.len());
    for column in columns {
        if column.values.len() != row_count {
            return Err(ParserError::Validation {
                parser: parser.to_string(),
                message: format!(
                    "column {} had {} rows, expected {row_count}",
                    column.role,
                    column.values.len()
                ),
            });
        }
        let utf8: Vec<Option<&str>> = column.values.iter().map(|v| v.as_deref()).collect();
        cols.push(Series::new(column.role.canonical_name().into(), utf8).into());
    }

    DataFrame::new(cols).map_err(|err| ParserError::Validation {
        parser: parser.to_string(),
        message: format!("failed to build text dataframe: {err}"),
    })
}
