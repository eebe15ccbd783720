//! Breakdown analyzer.
//!
//! Groups a numeric metric by a category, date or boolean dimension and
//! aggregates each group.
//!
//! ## Example
//!
//! | rating | team |
//! |--------|------|
//! | 5, 4   | A    |
//! | 5, 3   | B    |
//! | 5, 2   | C    |
//!
//! With `mean`, the chart is `A = 4.5, B = 4, C = 3.5` (descending), the
//! overall average is 4, and the headline names A as the top group.

use super::aggregate::{aggregate, mean, rate_strength};
use super::compatibility::ensure_compatible;
use super::engine::{AnalysisContext, TemplateAnalyzer, TemplateType};
use super::value::{as_number, as_text};
use super::MIN_PAIRS;
use crate::error::Result;
use crate::format::{format_metric, round1};
use crate::types::{
    AnalysisResult, BigNumber, ChartPoint, ChartType, Diagnostics, Submission, Trend,
};
use std::collections::HashMap;

/// Analyzer for the `breakdown` template.
pub struct BreakdownAnalyzer;

impl BreakdownAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Collect `(metric, group)` pairs, counting incomplete submissions.
    fn extract_pairs(
        submissions: &[Submission],
        metric_id: &str,
        group_id: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(f64, String)> {
        let mut pairs = Vec::new();

        for submission in submissions {
            let metric = submission.value(metric_id).and_then(as_number);
            let group = submission
                .value(group_id)
                .map(as_text)
                .filter(|s| !s.is_empty());

            diagnostics.record(metric.is_some(), group.is_some());
            if let (Some(metric), Some(group)) = (metric, group) {
                pairs.push((metric, group));
            }
        }

        pairs
    }

    /// Group metric values by key, in order of first appearance.
    fn group_pairs(pairs: &[(f64, String)]) -> Vec<(&str, Vec<f64>)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();

        for (metric, key) in pairs {
            let slot = *index.entry(key.as_str()).or_insert_with(|| {
                groups.push((key.as_str(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(*metric);
        }

        groups
    }
}

impl Default for BreakdownAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateAnalyzer for BreakdownAnalyzer {
    fn template(&self) -> TemplateType {
        TemplateType::Breakdown
    }

    fn analyze(&self, ctx: AnalysisContext<'_>) -> Result<AnalysisResult> {
        ensure_compatible(TemplateType::Breakdown, ctx.primary, ctx.secondary)?;

        let mut diagnostics = ctx.diagnostics;
        let pairs = Self::extract_pairs(
            ctx.submissions,
            &ctx.primary.id,
            &ctx.secondary.id,
            &mut diagnostics,
        );

        tracing::debug!(
            complete = diagnostics.complete_pairs,
            missing_primary = diagnostics.missing_primary,
            missing_secondary = diagnostics.missing_secondary,
            missing_both = diagnostics.missing_both,
            "Extracted breakdown pairs"
        );

        if pairs.len() < MIN_PAIRS {
            return Ok(AnalysisResult::insufficient(ChartType::Bars, diagnostics));
        }

        let mut chart_data: Vec<ChartPoint> = Self::group_pairs(&pairs)
            .into_iter()
            .filter_map(|(key, values)| {
                let y = round1(aggregate(&values, ctx.aggregation)?);
                Some(ChartPoint {
                    x: key.to_string(),
                    y,
                    count: values.len(),
                    label: key.to_string(),
                })
            })
            .collect();
        // Stable: ties keep first-appearance order
        chart_data.sort_by(|a, b| b.y.total_cmp(&a.y));

        let all_values: Vec<f64> = pairs.iter().map(|(metric, _)| *metric).collect();
        let overall_avg = mean(&all_values);

        let ys: Vec<f64> = chart_data.iter().map(|p| p.y).collect();
        let strength = rate_strength(&ys, overall_avg);

        let big_number = chart_data.first().map(|top| BigNumber {
            value: format!(
                "{}: {} {}",
                top.x,
                format_metric(top.y),
                ctx.aggregation.label()
            ),
            comparison: format!("vs {} overall avg", format_metric(overall_avg)),
            trend: Trend::between(top.y, overall_avg),
        });

        Ok(AnalysisResult {
            big_number,
            chart_data,
            chart_type: ChartType::Bars,
            sample_size: pairs.len(),
            strength,
            error: None,
            diagnostics,
        })
    }
}
