use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use salinity_core::cleaning::CleanedSeries;
use salinity_core::comparison::{ComparisonResult, PercentChange, Verdict};
use salinity_core::config::AnalysisConfig;
use salinity_core::pipelines::{BeforeAfterReport, PipelineKind, UpstreamDownstreamReport};
use salinity_core::quality::QualityReport;

fn table(header: [&str; 2]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

fn percent(change: &PercentChange) -> String {
    match change {
        PercentChange::Defined(value) => format!("{value:+.2}%"),
        PercentChange::Undefined => "undefined (zero baseline)".to_string(),
    }
}

fn comparison_rows(table: &mut Table, result: &ComparisonResult, before: &str, after: &str) {
    table
        .add_row(vec![format!("{before} median"), format!("{:.2} PSU", result.median_before)])
        .add_row(vec![format!("{after} median"), format!("{:.2} PSU", result.median_after)])
        .add_row(vec!["Percent change".to_string(), percent(&result.percent_change)])
        .add_row(vec!["U statistic".to_string(), format!("{:.0}", result.test_statistic)])
        .add_row(vec!["p-value".to_string(), format!("{:.4e}", result.p_value)])
        .add_row(vec!["Test".to_string(), format!("{:?}", result.test_method)])
        .add_row(vec!["Effect size".to_string(), format!("{:.3}", result.effect_size)])
        .add_row(vec!["Verdict".to_string(), result.verdict.as_str().to_string()]);
}

fn quality_row(table: &mut Table, label: &str, report: &QualityReport) {
    table.add_row(vec![
        label.to_string(),
        format!(
            "n = {}, {} missing, {} outliers",
            report.n, report.missing_count, report.outlier_count
        ),
    ]);
}

fn cleaning_row(table: &mut Table, label: &str, cleaned: &CleanedSeries) {
    table.add_row(vec![
        label.to_string(),
        format!(
            "{} of {} rows kept ({} missing, {} bad timestamps)",
            cleaned.series.len(),
            cleaned.raw_rows,
            cleaned.missing_count,
            cleaned.malformed_timestamps
        ),
    ]);
}

fn statement(result: &ComparisonResult) -> String {
    let change = percent(&result.percent_change);
    match result.verdict {
        Verdict::DecreaseSignificant => format!(
            "Median salinity fell from {:.2} to {:.2} PSU ({change}), a significant reduction (p = {:.4e}).",
            result.median_before, result.median_after, result.p_value
        ),
        Verdict::IncreaseSignificant => format!(
            "Median salinity rose from {:.2} to {:.2} PSU ({change}), a significant increase (p = {:.4e}).",
            result.median_before, result.median_after, result.p_value
        ),
        Verdict::Inconclusive => format!(
            "No significant change in median salinity ({change}, p = {:.4e}).",
            result.p_value
        ),
    }
}

fn pipeline_row(table: &mut Table, kind: PipelineKind) {
    table.add_row(vec![
        "Pipeline".to_string(),
        format!("{}: {}", kind.code(), kind.description()),
    ]);
}

pub fn before_after(report: &BeforeAfterReport) {
    let mut summary = table(["Metric", "Value"]);
    pipeline_row(&mut summary, PipelineKind::BeforeAfter);
    comparison_rows(&mut summary, &report.comparison, "Before", "After");
    cleaning_row(&mut summary, "Before rows", &report.before);
    cleaning_row(&mut summary, "After rows", &report.after);
    quality_row(&mut summary, "Before quality", &report.comparison.before);
    quality_row(&mut summary, "After quality", &report.comparison.after);
    println!("{summary}");
    println!("{}", statement(&report.comparison));
}

pub fn upstream_downstream(report: &UpstreamDownstreamReport, config: &AnalysisConfig) {
    let mut summary = table(["Metric", "Value"]);
    pipeline_row(&mut summary, PipelineKind::UpstreamDownstream);
    summary
        .add_row(vec![
            "Aligned pairs".to_string(),
            format!(
                "{} (tolerance {} min)",
                report.alignment.len(),
                config.alignment.tolerance_minutes
            ),
        ])
        .add_row(vec![
            "Unmatched downstream".to_string(),
            report.alignment.unmatched_anchors.to_string(),
        ]);
    comparison_rows(&mut summary, &report.comparison, "Downstream", "Upstream");

    let diff = &report.mean_difference;
    summary
        .add_row(vec![
            "Mean difference".to_string(),
            format!("{:.4} PSU", diff.difference),
        ])
        .add_row(vec!["Percent difference".to_string(), percent(&diff.percent_difference)])
        .add_row(vec![
            "Downstream higher".to_string(),
            format!("{} of {} pairs", diff.pairs_downstream_higher, report.alignment.len()),
        ]);
    cleaning_row(&mut summary, "Downstream rows", &report.downstream);
    cleaning_row(&mut summary, "Upstream rows", &report.upstream);
    quality_row(&mut summary, "Downstream quality", &report.downstream_quality);
    quality_row(&mut summary, "Upstream quality", &report.upstream_quality);
    println!("{summary}");

    if diff.downstream_higher() {
        println!("Downstream salinity exceeds upstream on average.");
    } else {
        println!("Downstream salinity does not exceed upstream on average.");
    }
}

pub fn conversion(source: &str, cleaned: &CleanedSeries) {
    let mut summary = table(["Metric", "Value"]);
    summary.add_row(vec!["Source".to_string(), source.to_string()]);
    cleaning_row(&mut summary, "Rows", cleaned);
    if let (Some(first), Some(last)) = (
        cleaned.series.first_timestamp(),
        cleaned.series.last_timestamp(),
    ) {
        summary.add_row(vec!["Period".to_string(), format!("{first} to {last}")]);
    }
    println!("{summary}");
}
