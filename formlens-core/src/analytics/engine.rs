//! Analysis engine facade.
//!
//! The engine is the only entry point callers use. One call:
//!
//! ```text
//! submissions ──► apply_filters ──► analyzer for template ──► AnalysisResult
//!                   (conjunction)    (breakdown / over-time)
//! ```
//!
//! Analyzers are registered per [`TemplateType`]. A template that is known but
//! has no registered analyzer fails with [`Error::NotImplemented`]; a template
//! name that is not known at all fails with [`Error::UnknownTemplate`]. Neither
//! case ever produces a partial result.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formlens_core::analytics::create_default_engine;
//!
//! let engine = create_default_engine(&config.analysis);
//! let result = engine.compute(&submissions, "over-time", &date_field, &score_field, &options)?;
//! ```
//!
//! The engine holds no per-call state, so a single instance can serve
//! concurrent calls.

use super::classify::is_recognized_type;
use super::filter::apply_filters;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::types::{
    Aggregation, AnalysisOptions, AnalysisResult, Diagnostics, FieldDefinition, Submission,
    TimeGranularity,
};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

// ============================================
// Templates
// ============================================

/// Analysis templates a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateType {
    /// Numeric metric grouped by a dimension
    Breakdown,
    /// Metric bucketed by a date field
    OverTime,
    /// Numeric vs numeric (unreleased)
    Relationship,
    /// Category vs category (unreleased)
    Composition,
    /// Single-field distribution (unreleased)
    Distribution,
    /// Free-text summarization (unreleased)
    TextInsights,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Breakdown => "breakdown",
            TemplateType::OverTime => "over-time",
            TemplateType::Relationship => "relationship",
            TemplateType::Composition => "composition",
            TemplateType::Distribution => "distribution",
            TemplateType::TextInsights => "text-insights",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "breakdown" => Ok(TemplateType::Breakdown),
            "over-time" => Ok(TemplateType::OverTime),
            "relationship" => Ok(TemplateType::Relationship),
            "composition" => Ok(TemplateType::Composition),
            "distribution" => Ok(TemplateType::Distribution),
            "text-insights" => Ok(TemplateType::TextInsights),
            _ => Err(Error::UnknownTemplate(s.to_string())),
        }
    }
}

// ============================================
// Analyzer trait
// ============================================

/// Everything an analyzer needs for one call.
///
/// `submissions` have already been filtered; options have been resolved
/// against the configured defaults.
pub struct AnalysisContext<'a> {
    pub submissions: &'a [Submission],
    pub primary: &'a FieldDefinition,
    pub secondary: &'a FieldDefinition,
    pub aggregation: Aggregation,
    pub granularity: TimeGranularity,
    /// Seeded with submission and filter counts; analyzers add pair counts
    pub diagnostics: Diagnostics,
}

/// Trait implemented by each analysis template.
///
/// Analyzers are stateless and must be deterministic: the same context always
/// produces the same result. They return `Err` only for contract violations
/// (such as incompatible field types); insufficient data is an `Ok` result
/// with its `error` set.
pub trait TemplateAnalyzer: Send + Sync {
    /// Template this analyzer serves.
    fn template(&self) -> TemplateType;

    /// Run the analysis.
    fn analyze(&self, ctx: AnalysisContext<'_>) -> Result<AnalysisResult>;
}

// ============================================
// Engine
// ============================================

/// Engine that routes calls to registered analyzers.
pub struct AnalysisEngine {
    analyzers: Vec<Box<dyn TemplateAnalyzer>>,
    defaults: AnalysisConfig,
}

impl AnalysisEngine {
    /// Create an engine with no analyzers.
    pub fn new(defaults: AnalysisConfig) -> Self {
        Self {
            analyzers: Vec::new(),
            defaults,
        }
    }

    /// Register an analyzer. A later registration for the same template wins.
    pub fn register(&mut self, analyzer: Box<dyn TemplateAnalyzer>) {
        tracing::debug!(template = %analyzer.template(), "Registered analyzer");
        self.analyzers.retain(|a| a.template() != analyzer.template());
        self.analyzers.push(analyzer);
    }

    /// Templates that currently have an analyzer.
    pub fn templates(&self) -> Vec<TemplateType> {
        self.analyzers.iter().map(|a| a.template()).collect()
    }

    /// Check if a template can be computed.
    pub fn supports(&self, template: TemplateType) -> bool {
        self.analyzers.iter().any(|a| a.template() == template)
    }

    /// Compute an analysis.
    ///
    /// Applies `options.filters`, then dispatches on `template_type`.
    pub fn compute(
        &self,
        submissions: &[Submission],
        template_type: &str,
        primary: &FieldDefinition,
        secondary: &FieldDefinition,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult> {
        let template: TemplateType = template_type.parse()?;

        let analyzer = self
            .analyzers
            .iter()
            .find(|a| a.template() == template)
            .ok_or_else(|| Error::NotImplemented(template.as_str().to_string()))?;

        for field in [primary, secondary] {
            if !is_recognized_type(field) {
                tracing::warn!(
                    field_id = %field.id,
                    field_type = field.field_type.as_deref().unwrap_or("<missing>"),
                    "Unrecognized field type, classifying as category"
                );
            }
        }

        let start = Instant::now();
        let filtered = apply_filters(submissions, &options.filters);

        let diagnostics = Diagnostics {
            total_submissions: submissions.len(),
            excluded_by_filters: submissions.len() - filtered.len(),
            ..Default::default()
        };

        let ctx = AnalysisContext {
            submissions: &filtered,
            primary,
            secondary,
            aggregation: options
                .aggregation
                .unwrap_or(self.defaults.default_aggregation),
            granularity: options
                .time_granularity
                .unwrap_or(self.defaults.default_granularity),
            diagnostics,
        };

        tracing::debug!(
            template = %template,
            primary = %primary.id,
            secondary = %secondary.id,
            submissions = submissions.len(),
            filtered = filtered.len(),
            aggregation = ctx.aggregation.as_str(),
            "Running analysis"
        );

        match analyzer.analyze(ctx) {
            Ok(result) => {
                tracing::info!(
                    template = %template,
                    sample_size = result.sample_size,
                    insufficient = result.is_insufficient(),
                    duration_us = start.elapsed().as_micros() as u64,
                    "Analysis completed"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!(template = %template, error = %e, "Analysis failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChartType, Strength};

    struct FixedAnalyzer;

    impl TemplateAnalyzer for FixedAnalyzer {
        fn template(&self) -> TemplateType {
            TemplateType::Distribution
        }

        fn analyze(&self, ctx: AnalysisContext<'_>) -> Result<AnalysisResult> {
            Ok(AnalysisResult {
                big_number: None,
                chart_data: Vec::new(),
                chart_type: ChartType::Bars,
                sample_size: ctx.submissions.len(),
                strength: Strength::NoClearPattern,
                error: None,
                diagnostics: ctx.diagnostics,
            })
        }
    }

    fn fields() -> (FieldDefinition, FieldDefinition) {
        (
            FieldDefinition::new("a", "A", "number"),
            FieldDefinition::new("b", "B", "text"),
        )
    }

    #[test]
    fn test_template_names_round_trip() {
        for t in [
            TemplateType::Breakdown,
            TemplateType::OverTime,
            TemplateType::Relationship,
            TemplateType::Composition,
            TemplateType::Distribution,
            TemplateType::TextInsights,
        ] {
            assert_eq!(t.as_str().parse::<TemplateType>().unwrap(), t);
        }
        assert!("scatter".parse::<TemplateType>().is_err());
    }

    #[test]
    fn test_empty_engine_reports_not_implemented() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let (a, b) = fields();
        let err = engine
            .compute(&[], "breakdown", &a, &b, &AnalysisOptions::default())
            .unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_unknown_template_is_distinct_error() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let (a, b) = fields();
        let err = engine
            .compute(&[], "scatter", &a, &b, &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTemplate(name) if name == "scatter"));
    }

    #[test]
    fn test_registered_analyzer_receives_diagnostics() {
        let mut engine = AnalysisEngine::new(AnalysisConfig::default());
        engine.register(Box::new(FixedAnalyzer));
        assert!(engine.supports(TemplateType::Distribution));
        assert_eq!(engine.templates(), vec![TemplateType::Distribution]);

        let (a, b) = fields();
        let submissions = vec![Submission::default(), Submission::default()];
        let result = engine
            .compute(&submissions, "distribution", &a, &b, &AnalysisOptions::default())
            .unwrap();
        assert_eq!(result.sample_size, 2);
        assert_eq!(result.diagnostics.total_submissions, 2);
        assert_eq!(result.diagnostics.excluded_by_filters, 0);
    }

    #[test]
    fn test_register_replaces_existing_template() {
        let mut engine = AnalysisEngine::new(AnalysisConfig::default());
        engine.register(Box::new(FixedAnalyzer));
        engine.register(Box::new(FixedAnalyzer));
        assert_eq!(engine.templates().len(), 1);
    }
}
