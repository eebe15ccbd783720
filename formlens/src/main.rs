//! formlens - run an ad-hoc analysis over exported form submissions
//!
//! Reads a form definition and its submissions from JSON files, checks that
//! the chosen fields suit the template, and prints the analysis result.
//!
//! Exit status: 0 for a result, 2 when there is not enough data, 1 for any
//! failure (unknown or unreleased template, incompatible fields, bad input).

use anyhow::{Context, Result};
use clap::Parser;
use formlens_core::analytics::{
    classify, create_default_engine, validate_field_compatibility, TemplateType,
};
use formlens_core::format::format_metric;
use formlens_core::types::find_field;
use formlens_core::{
    Aggregation, AnalysisOptions, AnalysisResult, Config, FieldDefinition, Filter,
    FilterOperator, Submission, TimeGranularity,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status for a result that carries an insufficient-data error.
const EXIT_INSUFFICIENT: u8 = 2;

/// Width of the longest bar in terminal output.
const BAR_WIDTH: usize = 30;

#[derive(Parser, Debug)]
#[command(name = "formlens")]
#[command(about = "Ad-hoc analytics over form submissions")]
#[command(version)]
struct Args {
    /// JSON file with the form's field definitions
    #[arg(long, required_unless_present = "list_templates")]
    fields: Option<PathBuf>,

    /// JSON file with the submissions to analyze
    #[arg(long, required_unless_present = "list_templates")]
    submissions: Option<PathBuf>,

    /// Analysis template (breakdown, over-time, ...)
    #[arg(short, long, default_value = "breakdown")]
    template: String,

    /// Primary field id
    #[arg(long, required_unless_present = "list_templates")]
    primary: Option<String>,

    /// Secondary field id
    #[arg(long, required_unless_present = "list_templates")]
    secondary: Option<String>,

    /// Aggregation: mean, median or p90 (default from config)
    #[arg(short, long)]
    aggregation: Option<String>,

    /// Over-time bucket size: day, week or month (default from config)
    #[arg(short, long)]
    granularity: Option<String>,

    /// Filter as FIELD:OPERATOR:VALUE (repeatable, all must match)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// JSON file with a full options bag; --filter values are appended
    #[arg(long)]
    options: Option<PathBuf>,

    /// Output format: json (default) or text
    #[arg(short, long, default_value = "json")]
    format: String,

    /// List templates and whether they are available
    #[arg(long)]
    list_templates: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = formlens_core::logging::init(&config.logging).ok();

    tracing::debug!(?args, "Starting formlens");

    let engine = create_default_engine(&config.analysis);

    if args.list_templates {
        println!("Templates:");
        for template in [
            TemplateType::Breakdown,
            TemplateType::OverTime,
            TemplateType::Relationship,
            TemplateType::Composition,
            TemplateType::Distribution,
            TemplateType::TextInsights,
        ] {
            let status = if engine.supports(template) {
                "available"
            } else {
                "not yet implemented"
            };
            println!("  - {:<14} {}", template.as_str(), status);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let template: TemplateType = args
        .template
        .parse()
        .with_context(|| format!("invalid --template '{}'", args.template))?;

    // clap enforces these unless --list-templates is given
    let (Some(fields_path), Some(submissions_path), Some(primary_id), Some(secondary_id)) = (
        args.fields.as_deref(),
        args.submissions.as_deref(),
        args.primary.as_deref(),
        args.secondary.as_deref(),
    ) else {
        anyhow::bail!("--fields, --submissions, --primary and --secondary are required");
    };

    let fields: Vec<FieldDefinition> = read_json(fields_path).context("failed to read fields")?;
    let submissions: Vec<Submission> =
        read_json(submissions_path).context("failed to read submissions")?;

    let primary = find_field(&fields, primary_id)?;
    let secondary = find_field(&fields, secondary_id)?;

    if !validate_field_compatibility(template.as_str(), primary, secondary) {
        anyhow::bail!(
            "{} template cannot analyze {} field '{}' against {} field '{}'",
            template,
            classify(primary),
            primary.id,
            classify(secondary),
            secondary.id
        );
    }

    let options = build_options(&args)?;
    tracing::info!(
        template = %template,
        submissions = submissions.len(),
        filters = options.filters.len(),
        "Computing analysis"
    );

    let result = engine
        .compute(&submissions, template.as_str(), primary, secondary, &options)
        .context("analysis failed")?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => print_terminal(&result, template, primary, secondary),
        other => anyhow::bail!("Unknown format: {}. Use 'json' or 'text'", other),
    }

    if result.is_insufficient() {
        Ok(ExitCode::from(EXIT_INSUFFICIENT))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Merge the options file, CLI flags and --filter values into one options bag.
fn build_options(args: &Args) -> Result<AnalysisOptions> {
    let mut options: AnalysisOptions = match &args.options {
        Some(path) => read_json(path).context("failed to read options")?,
        None => AnalysisOptions::default(),
    };

    if let Some(aggregation) = &args.aggregation {
        options.aggregation = Some(Aggregation::from(aggregation.clone()));
    }
    if let Some(granularity) = &args.granularity {
        options.time_granularity = Some(TimeGranularity::from(granularity.clone()));
    }
    for raw in &args.filters {
        options.filters.push(parse_filter(raw)?);
    }

    Ok(options)
}

/// Parse `FIELD:OPERATOR:VALUE`. The value is read as JSON when possible,
/// otherwise as a plain string.
fn parse_filter(input: &str) -> Result<Filter> {
    let mut parts = input.splitn(3, ':');
    let (Some(field_id), Some(operator), Some(raw)) = (parts.next(), parts.next(), parts.next())
    else {
        anyhow::bail!("Invalid filter '{}'. Use FIELD:OPERATOR:VALUE", input);
    };
    if field_id.is_empty() {
        anyhow::bail!("Invalid filter '{}': field is empty", input);
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::from(raw));
    Ok(Filter::new(
        field_id,
        FilterOperator::from(operator.to_string()),
        value,
    ))
}

fn print_terminal(
    result: &AnalysisResult,
    template: TemplateType,
    primary: &FieldDefinition,
    secondary: &FieldDefinition,
) {
    let title = format!("{}: {} by {}", template, primary.label, secondary.label);

    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();

    if let Some(error) = &result.error {
        println!("  {}", error);
        println!("  Usable responses: {}", result.sample_size);
        print_diagnostics(result);
        println!();
        return;
    }

    if let Some(big) = &result.big_number {
        println!("  {}", big.value);
        println!("  {} ({})", big.comparison, big.trend.as_str());
        println!();
    }

    let max = result
        .chart_data
        .iter()
        .map(|p| p.y)
        .fold(0.0_f64, f64::max);
    let label_width = result
        .chart_data
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(32);

    for point in &result.chart_data {
        let filled = if max > 0.0 {
            ((point.y / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        println!(
            "  {:<width$}  {:<bar$}  {} (n={})",
            point.label,
            "█".repeat(filled),
            format_metric(point.y),
            point.count,
            width = label_width,
            bar = BAR_WIDTH
        );
    }

    println!();
    println!("  Strength: {}", result.strength.as_str());
    println!("  Sample size: {}", result.sample_size);
    print_diagnostics(result);
    println!();
}

fn print_diagnostics(result: &AnalysisResult) {
    let d = &result.diagnostics;
    if d.excluded_by_filters > 0 {
        println!("  Excluded by filters: {}", d.excluded_by_filters);
    }
    let incomplete = d.missing_primary + d.missing_secondary + d.missing_both;
    if incomplete > 0 {
        println!(
            "  Incomplete responses: {} (primary missing: {}, secondary missing: {}, both: {})",
            incomplete, d.missing_primary, d.missing_secondary, d.missing_both
        );
    }
}
