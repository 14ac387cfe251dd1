pub mod alignment;
pub mod cleaning;
pub mod comparison;
pub mod config;
pub mod conversion;
pub mod error;
pub mod pipelines;
pub mod quality;
pub mod stats;
pub mod types;

pub use error::{AnalysisError, Result, Side};
