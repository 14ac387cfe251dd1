use crate::errors::{ParserAttempt, ParserError};
use crate::formats::DelimitedParser;
use crate::model::{RawTable, SourceSchema};

pub trait TableParser {
    fn name(&self) -> &str;
    fn parse(&self, content: &str) -> Result<RawTable, ParserError>;
}

/// Parses `content` with the named layout only.
pub fn parse_table(
    content: &str,
    name: &str,
    schema: &SourceSchema,
) -> Result<RawTable, ParserError> {
    DelimitedParser::new(name, schema.clone()).parse(content)
}

/// Tries each configured layout in order and returns the first that
/// recognizes the header row.
pub fn detect_and_parse<'a, I>(content: &str, schemas: I) -> Result<RawTable, ParserError>
where
    I: IntoIterator<Item = (&'a str, &'a SourceSchema)>,
{
    let parsers: Vec<DelimitedParser> = schemas
        .into_iter()
        .map(|(name, schema)| DelimitedParser::new(name, schema.clone()))
        .collect();
    let refs: Vec<&dyn TableParser> = parsers.iter().map(|p| p as &dyn TableParser).collect();
    parse_with_parsers(content, &refs)
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn TableParser],
) -> Result<RawTable, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}
