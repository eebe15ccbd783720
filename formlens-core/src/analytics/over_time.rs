//! Over-time analyzer.
//!
//! Buckets submissions by a date field and tracks a second field per bucket.
//! Buckets are calendar aligned in UTC:
//!
//! | Granularity | Bucket key |
//! |-------------|------------|
//! | day | `YYYY-MM-DD` |
//! | week | `YYYY-MM-DD` of the Sunday on or before the date |
//! | month | `YYYY-MM` |
//!
//! A numeric second field is aggregated per bucket. A categorical second field
//! reports, per bucket, how many times its most common answer was given.

use super::aggregate::{aggregate, mean, rate_strength};
use super::classify::SemanticType;
use super::compatibility::ensure_compatible;
use super::engine::{AnalysisContext, TemplateAnalyzer, TemplateType};
use super::value::{as_date, as_number, as_text};
use super::MIN_PAIRS;
use crate::error::Result;
use crate::format::{format_metric, format_percent, round1, trend_arrow};
use crate::types::{
    Aggregation, AnalysisResult, BigNumber, ChartPoint, ChartType, Diagnostics, Strength,
    Submission, TimeGranularity, Trend,
};
use chrono::{DateTime, Datelike, Days, Utc};
use std::collections::BTreeMap;

/// A usable answer of the tracked field.
#[derive(Debug, Clone, PartialEq)]
enum Reading {
    Number(f64),
    Category(String),
}

/// Bucket key for an instant at the given granularity.
pub fn bucket_key(instant: DateTime<Utc>, granularity: TimeGranularity) -> String {
    let date = instant.date_naive();
    match granularity {
        TimeGranularity::Day => date.format("%Y-%m-%d").to_string(),
        TimeGranularity::Week => {
            let back = u64::from(date.weekday().num_days_from_sunday());
            date.checked_sub_days(Days::new(back))
                .unwrap_or(date)
                .format("%Y-%m-%d")
                .to_string()
        }
        TimeGranularity::Month => date.format("%Y-%m").to_string(),
    }
}

/// Analyzer for the `over-time` template.
pub struct OverTimeAnalyzer;

impl OverTimeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Collect `(instant, reading)` pairs, counting incomplete submissions.
    fn extract_pairs(
        submissions: &[Submission],
        date_id: &str,
        tracked_id: &str,
        tracked_type: SemanticType,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(DateTime<Utc>, Reading)> {
        let mut pairs = Vec::new();

        for submission in submissions {
            let instant = submission.value(date_id).and_then(as_date);
            let reading = submission.value(tracked_id).and_then(|v| match tracked_type {
                SemanticType::Number => as_number(v).map(Reading::Number),
                _ => Some(as_text(v))
                    .filter(|s| !s.is_empty())
                    .map(Reading::Category),
            });

            diagnostics.record(instant.is_some(), reading.is_some());
            if let (Some(instant), Some(reading)) = (instant, reading) {
                pairs.push((instant, reading));
            }
        }

        pairs
    }

    /// Chart points for a numeric tracked field, chronological.
    fn numeric_points(
        buckets: &BTreeMap<String, Vec<Reading>>,
        aggregation: Aggregation,
    ) -> Vec<ChartPoint> {
        buckets
            .iter()
            .filter_map(|(key, readings)| {
                let values: Vec<f64> = readings
                    .iter()
                    .filter_map(|r| match r {
                        Reading::Number(n) => Some(*n),
                        Reading::Category(_) => None,
                    })
                    .collect();
                let y = round1(aggregate(&values, aggregation)?);
                Some(ChartPoint {
                    x: key.clone(),
                    y,
                    count: values.len(),
                    label: key.clone(),
                })
            })
            .collect()
    }

    /// Chart points for a categorical tracked field, chronological.
    fn category_points(buckets: &BTreeMap<String, Vec<Reading>>) -> Vec<ChartPoint> {
        buckets
            .iter()
            .filter_map(|(key, readings)| {
                let (top, top_count) = most_common(readings)?;
                Some(ChartPoint {
                    x: key.clone(),
                    y: top_count as f64,
                    count: readings.len(),
                    label: format!("{} ({})", key, top),
                })
            })
            .collect()
    }
}

impl Default for OverTimeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Most frequent category and its count. Ties go to the first one seen.
fn most_common(readings: &[Reading]) -> Option<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for reading in readings {
        if let Reading::Category(value) = reading {
            match counts.iter_mut().find(|(v, _)| *v == value.as_str()) {
                Some((_, count)) => *count += 1,
                None => counts.push((value.as_str(), 1)),
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best
}

fn plural(granularity: TimeGranularity, n: usize) -> String {
    if n == 1 {
        granularity.as_str().to_string()
    } else {
        format!("{}s", granularity.as_str())
    }
}

impl TemplateAnalyzer for OverTimeAnalyzer {
    fn template(&self) -> TemplateType {
        TemplateType::OverTime
    }

    fn analyze(&self, ctx: AnalysisContext<'_>) -> Result<AnalysisResult> {
        let (_, tracked_type) =
            ensure_compatible(TemplateType::OverTime, ctx.primary, ctx.secondary)?;
        let numeric = tracked_type == SemanticType::Number;

        let mut diagnostics = ctx.diagnostics;
        let pairs = Self::extract_pairs(
            ctx.submissions,
            &ctx.primary.id,
            &ctx.secondary.id,
            tracked_type,
            &mut diagnostics,
        );

        tracing::debug!(
            complete = diagnostics.complete_pairs,
            missing_primary = diagnostics.missing_primary,
            missing_secondary = diagnostics.missing_secondary,
            missing_both = diagnostics.missing_both,
            granularity = ctx.granularity.as_str(),
            "Extracted over-time pairs"
        );

        if pairs.len() < MIN_PAIRS {
            return Ok(AnalysisResult::insufficient(ChartType::Line, diagnostics));
        }

        let mut buckets: BTreeMap<String, Vec<Reading>> = BTreeMap::new();
        for (instant, reading) in &pairs {
            buckets
                .entry(bucket_key(*instant, ctx.granularity))
                .or_default()
                .push(reading.clone());
        }

        let chart_data = if numeric {
            Self::numeric_points(&buckets, ctx.aggregation)
        } else {
            Self::category_points(&buckets)
        };
        let ys: Vec<f64> = chart_data.iter().map(|p| p.y).collect();

        let (big_number, strength) = if numeric {
            let all_values: Vec<f64> = pairs
                .iter()
                .filter_map(|(_, r)| match r {
                    Reading::Number(n) => Some(*n),
                    Reading::Category(_) => None,
                })
                .collect();
            let overall_avg = mean(&all_values);

            if let [.., previous, latest] = chart_data.as_slice() {
                let trend = Trend::between(latest.y, previous.y);
                let change = if previous.y == 0.0 {
                    0.0
                } else {
                    (latest.y - previous.y) / previous.y.abs() * 100.0
                };
                let big = BigNumber {
                    value: format!("{} {}", trend_arrow(trend), format_metric(latest.y)),
                    comparison: format!(
                        "{} vs previous {}",
                        format_percent(change),
                        ctx.granularity.as_str()
                    ),
                    trend,
                };
                (big, rate_strength(&ys, overall_avg))
            } else {
                let big = BigNumber {
                    value: format_metric(overall_avg),
                    comparison: format!(
                        "overall avg across {} {}",
                        chart_data.len(),
                        plural(ctx.granularity, chart_data.len())
                    ),
                    trend: Trend::Neutral,
                };
                (big, Strength::SomePattern)
            }
        } else {
            let avg_count = if ys.is_empty() { 0.0 } else { mean(&ys) };
            let big = BigNumber {
                value: format_metric(avg_count),
                comparison: format!(
                    "avg responses for the top answer per {}",
                    ctx.granularity.as_str()
                ),
                trend: Trend::Neutral,
            };
            (big, Strength::SomePattern)
        };

        Ok(AnalysisResult {
            big_number: Some(big_number),
            chart_data,
            chart_type: ChartType::Line,
            sample_size: pairs.len(),
            strength,
            error: None,
            diagnostics,
        })
    }
}
