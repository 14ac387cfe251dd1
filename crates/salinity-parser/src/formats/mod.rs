mod common;
mod delimited;

pub use delimited::DelimitedParser;

pub(crate) use common::{build_text_dataframe, clean_cell, TextColumn};
