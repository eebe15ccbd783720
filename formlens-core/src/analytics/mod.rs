//! Analytics module for formlens
//!
//! Computes plain-language summaries of form submissions:
//! - Field type classification
//! - Conjunctive filtering
//! - Aggregation (mean, median, 90th percentile)
//! - Breakdown and over-time templates
//! - Template / field-type compatibility
//!
//! See [`engine`] for the entry point and [`create_default_engine`] for an
//! engine with every released template registered.

pub mod aggregate;
pub mod breakdown;
pub mod classify;
pub mod compatibility;
pub mod engine;
pub mod filter;
pub mod over_time;
pub mod value;

pub use aggregate::{aggregate, rate_strength};
pub use breakdown::BreakdownAnalyzer;
pub use classify::{classify, is_recognized_type, SemanticType};
pub use compatibility::{is_compatible, validate_field_compatibility};
pub use engine::{AnalysisContext, AnalysisEngine, TemplateAnalyzer, TemplateType};
pub use filter::apply_filters;
pub use over_time::OverTimeAnalyzer;

use crate::config::AnalysisConfig;

/// Fewest complete pairs a template will analyze.
pub const MIN_PAIRS: usize = 2;

/// Create an engine with all released templates registered.
///
/// ```rust,ignore
/// use formlens_core::analytics::create_default_engine;
///
/// let engine = create_default_engine(&config.analysis);
/// println!("Templates: {:?}", engine.templates());
/// ```
pub fn create_default_engine(defaults: &AnalysisConfig) -> AnalysisEngine {
    let mut engine = AnalysisEngine::new(defaults.clone());
    engine.register(Box::new(BreakdownAnalyzer::new()));
    engine.register(Box::new(OverTimeAnalyzer::new()));
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_has_released_templates() {
        let engine = create_default_engine(&AnalysisConfig::default());

        assert!(engine.supports(TemplateType::Breakdown));
        assert!(engine.supports(TemplateType::OverTime));
        assert!(!engine.supports(TemplateType::Relationship));
        assert!(!engine.supports(TemplateType::Composition));
    }
}
