pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{ParserAttempt, ParserError};
pub use formats::DelimitedParser;
pub use model::{ColumnRole, RawTable, SourceSchema, DEFAULT_TIMESTAMP_FORMAT};
pub use registry::{detect_and_parse, parse_table, parse_with_parsers, TableParser};

#[cfg(test)]
mod tests;
