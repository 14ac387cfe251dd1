mod render;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use polars::prelude::*;
use salinity_core::config::AnalysisConfig;
use salinity_core::pipelines::{run_before_after, run_upstream_downstream, salinity_from_table};
use salinity_parser::{detect_and_parse, parse_table, RawTable};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Salinity conversion and intervention analysis", long_about = None)]
struct Cli {
    /// TOML config file (falls back to SALINITY_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How results are printed
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare one station's salinity before and after an intervention
    BeforeAfter(BeforeAfterArgs),
    /// Compare two stations aligned on nearest timestamp
    UpstreamDownstream(UpstreamDownstreamArgs),
    /// Convert a conductivity/temperature export to practical salinity
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct BeforeAfterArgs {
    /// Table covering the period before the intervention
    #[arg(long)]
    before: PathBuf,
    /// Table covering the period after the intervention
    #[arg(long)]
    after: PathBuf,
    /// Source layout of the before table (detected from headers when omitted)
    #[arg(long)]
    before_source: Option<String>,
    /// Source layout of the after table (detected from headers when omitted)
    #[arg(long)]
    after_source: Option<String>,
    /// Write both salinity series to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UpstreamDownstreamArgs {
    #[arg(long)]
    downstream: PathBuf,
    #[arg(long)]
    upstream: PathBuf,
    /// Source layout of both tables (detected from headers when omitted)
    #[arg(long)]
    source: Option<String>,
    /// Overrides alignment.tolerance_minutes from the config
    #[arg(long)]
    tolerance_minutes: Option<i64>,
    /// Write the aligned series to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    source: Option<String>,
    /// Write the salinity series to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let mut config = AnalysisConfig::resolve(cli.config.as_deref())
        .context("failed to load analysis config")?;

    match cli.command {
        Command::BeforeAfter(args) => {
            let before = read_table(&args.before, args.before_source.as_deref(), &config)?;
            let after = read_table(&args.after, args.after_source.as_deref(), &config)?;
            let report = run_before_after(&before, &after, &config)?;

            if let Some(path) = &args.export {
                let mut before_df = labelled_frame(report.before.series.to_dataframe()?, "before")?;
                let after_df = labelled_frame(report.after.series.to_dataframe()?, "after")?;
                before_df.vstack_mut(&after_df)?;
                write_csv(path, &mut before_df)?;
            }

            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => render::before_after(&report),
            }
        }
        Command::UpstreamDownstream(args) => {
            if let Some(minutes) = args.tolerance_minutes {
                config.alignment.tolerance_minutes = minutes;
                config.validate()?;
            }
            let source = args.source.as_deref();
            let downstream = read_table(&args.downstream, source, &config)?;
            let upstream = read_table(&args.upstream, source, &config)?;
            let report = run_upstream_downstream(&downstream, &upstream, &config)?;

            if let Some(path) = &args.export {
                let mut df = report
                    .alignment
                    .to_dataframe("salinity_downstream", "salinity_upstream")?;
                write_csv(path, &mut df)?;
            }

            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => render::upstream_downstream(&report, &config),
            }
        }
        Command::Convert(args) => {
            let table = read_table(&args.input, args.source.as_deref(), &config)?;
            let cleaned = salinity_from_table(&table, "salinity_psu", &config)?;

            if let Some(path) = &args.output {
                let mut df = cleaned.series.to_dataframe()?;
                write_csv(path, &mut df)?;
            }

            match cli.format {
                OutputFormat::Json => print_json(&cleaned)?,
                OutputFormat::Table => render::conversion(&table.source, &cleaned),
            }
        }
    }

    Ok(())
}

fn read_table(path: &Path, source: Option<&str>, config: &AnalysisConfig) -> Result<RawTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let table = match source {
        Some(name) => {
            let schema = config.source(name).ok_or_else(|| {
                anyhow!(
                    "unknown source '{name}'; configured sources: {}",
                    config.sources.keys().cloned().collect::<Vec<_>>().join(", ")
                )
            })?;
            parse_table(&content, name, schema)
        }
        None => detect_and_parse(&content, config.source_candidates()),
    }
    .with_context(|| format!("failed to parse {}", path.display()))?;

    info!(
        path = %path.display(),
        source = %table.source,
        rows = table.height(),
        "read table"
    );
    Ok(table)
}

/// Renames the value column to `salinity_psu` and tags every row with `period`.
fn labelled_frame(mut df: DataFrame, period: &str) -> Result<DataFrame> {
    let value_column = df
        .get_column_names()
        .into_iter()
        .find(|name| name.as_str() != "timestamp")
        .map(|name| name.to_string())
        .ok_or_else(|| anyhow!("series frame has no value column"))?;
    df.rename(&value_column, "salinity_psu".into())?;

    let periods = Series::new("period".into(), vec![period; df.height()]);
    df.with_column(periods)?;
    Ok(df)
}

fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = df.height(), "exported series");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
