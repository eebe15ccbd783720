//! Core domain types for formlens
//!
//! These types describe the inputs handed to the analysis engine by the form
//! storage layer and the result it hands back.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Field** | One question on a form, identified by a form-unique id |
//! | **Submission** | One respondent's answers, keyed by field id |
//! | **Filter** | A predicate on one field; a filter list is a conjunction |
//! | **Template** | The kind of analysis to run (breakdown, over-time, ...) |
//! | **BigNumber** | The headline statistic shown above a chart |
//! | **Strength** | How pronounced the observed pattern is |
//!
//! ### Submission payload keys
//!
//! Older form versions stored answers under `responses` or `answers` instead of
//! `data`. [`Submission`] accepts all three on deserialization and always
//! exposes them as [`Submission::data`], so nothing past this module needs to
//! know about the older shapes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message returned when a template has fewer than two usable pairs.
pub const INSUFFICIENT_DATA_MESSAGE: &str =
    "Not enough data to analyze. At least 2 responses with both fields answered are required.";

// ============================================
// Field definitions
// ============================================

/// A form field as stored by the form builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique within a form
    pub id: String,
    /// Question text shown to respondents
    #[serde(default)]
    pub label: String,
    /// Raw builder type (`number`, `select`, `date`, ...)
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    /// Choices for select-like fields
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
}

impl FieldDefinition {
    /// Create a field with no options.
    pub fn new(id: &str, label: &str, field_type: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type: Some(field_type.to_string()),
            options: None,
        }
    }

    /// Attach plain string options.
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(
            options
                .iter()
                .map(|o| FieldOption::Plain(Value::String(o.to_string())))
                .collect(),
        );
        self
    }
}

/// Look up a field by id in a form definition.
pub fn find_field<'a>(fields: &'a [FieldDefinition], id: &str) -> Result<&'a FieldDefinition> {
    fields
        .iter()
        .find(|f| f.id == id)
        .ok_or_else(|| Error::FieldNotFound(id.to_string()))
}

/// A choice on a select-like field.
///
/// Stored either as a bare value or as a `{value, label}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    Labeled {
        #[serde(default)]
        value: Option<Value>,
        #[serde(default)]
        label: Option<Value>,
    },
    Plain(Value),
}

impl FieldOption {
    /// The stored value of this option, falling back to its label.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            FieldOption::Labeled { value, label } => value
                .as_ref()
                .filter(|v| !v.is_null())
                .or_else(|| label.as_ref().filter(|v| !v.is_null())),
            FieldOption::Plain(value) => Some(value).filter(|v| !v.is_null()),
        }
    }
}

// ============================================
// Submissions
// ============================================

/// One form submission in canonical shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSubmission")]
pub struct Submission {
    pub id: String,
    /// Answers keyed by field id
    pub data: Map<String, Value>,
}

impl Submission {
    /// Create a submission from an id and an answer map.
    pub fn new(id: &str, data: Map<String, Value>) -> Self {
        Self {
            id: id.to_string(),
            data,
        }
    }

    /// Returns the answer for a field if it is present.
    ///
    /// `null` and the empty string count as unanswered.
    pub fn value(&self, field_id: &str) -> Option<&Value> {
        self.data.get(field_id).filter(|v| is_present(v))
    }
}

/// Whether an answer counts as given.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Submission as it arrives from storage, before normalization.
#[derive(Debug, Deserialize)]
struct RawSubmission {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    responses: Option<Value>,
    #[serde(default)]
    answers: Option<Value>,
}

impl From<RawSubmission> for Submission {
    fn from(raw: RawSubmission) -> Self {
        let id = match raw.id {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let payload = [raw.data, raw.responses, raw.answers]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null());

        let data = match payload {
            Some(Value::Object(map)) => map,
            // Some rows keep the payload as serialized JSON text
            Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                _ => {
                    tracing::warn!(submission_id = %id, "Submission payload is not a JSON object");
                    Map::new()
                }
            },
            Some(_) => {
                tracing::warn!(submission_id = %id, "Submission payload is not a JSON object");
                Map::new()
            }
            None => Map::new(),
        };

        Submission { id, data }
    }
}

// ============================================
// Options
// ============================================

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    Before,
    After,
    /// Operator from an older or newer filter config; always passes
    Unknown(String),
}

impl FilterOperator {
    pub fn as_str(&self) -> &str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not_equals",
            FilterOperator::GreaterThan => "greater_than",
            FilterOperator::LessThan => "less_than",
            FilterOperator::Contains => "contains",
            FilterOperator::Before => "before",
            FilterOperator::After => "after",
            FilterOperator::Unknown(name) => name,
        }
    }
}

impl From<String> for FilterOperator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "equals" => FilterOperator::Equals,
            "not_equals" => FilterOperator::NotEquals,
            "greater_than" => FilterOperator::GreaterThan,
            "less_than" => FilterOperator::LessThan,
            "contains" => FilterOperator::Contains,
            "before" => FilterOperator::Before,
            "after" => FilterOperator::After,
            _ => FilterOperator::Unknown(s),
        }
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.as_str().to_string()
    }
}

/// A single predicate on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(alias = "fieldId")]
    pub field_id: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    pub fn new(field_id: &str, operator: FilterOperator, value: Value) -> Self {
        Self {
            field_id: field_id.to_string(),
            operator,
            value,
        }
    }
}

/// How values inside a group or time bucket are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
    /// 90th percentile
    P90,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::P90 => "p90",
        }
    }

    /// Short label used in headline text.
    pub fn label(&self) -> &'static str {
        match self {
            Aggregation::Mean => "Avg",
            Aggregation::Median => "Median",
            Aggregation::P90 => "Top 10% Avg",
        }
    }
}

impl From<String> for Aggregation {
    fn from(s: String) -> Self {
        match s.as_str() {
            "mean" => Aggregation::Mean,
            "median" => Aggregation::Median,
            "p90" => Aggregation::P90,
            other => {
                tracing::warn!(aggregation = other, "Unknown aggregation mode, using mean");
                Aggregation::Mean
            }
        }
    }
}

impl From<Aggregation> for String {
    fn from(agg: Aggregation) -> Self {
        agg.as_str().to_string()
    }
}

/// Bucket size for the over-time template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeGranularity {
    #[default]
    Day,
    Week,
    Month,
}

impl TimeGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGranularity::Day => "day",
            TimeGranularity::Week => "week",
            TimeGranularity::Month => "month",
        }
    }
}

impl From<String> for TimeGranularity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "day" => TimeGranularity::Day,
            "week" => TimeGranularity::Week,
            "month" => TimeGranularity::Month,
            other => {
                tracing::warn!(granularity = other, "Unknown time granularity, using day");
                TimeGranularity::Day
            }
        }
    }
}

impl From<TimeGranularity> for String {
    fn from(g: TimeGranularity) -> Self {
        g.as_str().to_string()
    }
}

/// Per-call options supplied alongside the template and fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Conjunctive filter set
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Falls back to the configured default when absent
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
    /// Only used by the over-time template
    #[serde(default, alias = "time_granularity")]
    pub time_granularity: Option<TimeGranularity>,
}

// ============================================
// Results
// ============================================

/// Direction of the headline comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Neutral => "neutral",
        }
    }

    /// Trend of `value` relative to `baseline`.
    pub fn between(value: f64, baseline: f64) -> Self {
        if value > baseline {
            Trend::Up
        } else if value < baseline {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }
}

/// Qualitative rating of how pronounced a pattern is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    #[serde(rename = "strong pattern")]
    Strong,
    #[serde(rename = "some pattern")]
    SomePattern,
    #[serde(rename = "no clear pattern")]
    NoClearPattern,
}

impl Strength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Strong => "strong pattern",
            Strength::SomePattern => "some pattern",
            Strength::NoClearPattern => "no clear pattern",
        }
    }
}

/// How the chart series should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bars,
    Line,
}

/// Headline statistic shown above the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigNumber {
    pub value: String,
    pub comparison: String,
    pub trend: Trend,
}

/// One point of the chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
    pub count: usize,
    pub label: String,
}

/// Data-quality counters for a single analysis call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Submissions handed to the engine
    pub total_submissions: usize,
    /// Submissions removed by the filter set
    pub excluded_by_filters: usize,
    /// Submissions with both fields usable
    pub complete_pairs: usize,
    /// Primary missing or unusable, secondary usable
    pub missing_primary: usize,
    /// Secondary missing or unusable, primary usable
    pub missing_secondary: usize,
    /// Neither side usable
    pub missing_both: usize,
}

impl Diagnostics {
    /// Count one submission by which sides were usable.
    pub fn record(&mut self, has_primary: bool, has_secondary: bool) {
        match (has_primary, has_secondary) {
            (true, true) => self.complete_pairs += 1,
            (false, true) => self.missing_primary += 1,
            (true, false) => self.missing_secondary += 1,
            (false, false) => self.missing_both += 1,
        }
    }
}

/// Output of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub big_number: Option<BigNumber>,
    pub chart_data: Vec<ChartPoint>,
    pub chart_type: ChartType,
    pub sample_size: usize,
    pub strength: Strength,
    /// Set when the data cannot support the analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl AnalysisResult {
    /// Result for a call without enough complete pairs.
    pub fn insufficient(chart_type: ChartType, diagnostics: Diagnostics) -> Self {
        Self {
            big_number: None,
            chart_data: Vec::new(),
            chart_type,
            sample_size: diagnostics.complete_pairs,
            strength: Strength::NoClearPattern,
            error: Some(INSUFFICIENT_DATA_MESSAGE.to_string()),
            diagnostics,
        }
    }

    /// Whether the caller should render this as an insufficient-data state.
    pub fn is_insufficient(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_payload_keys_are_equivalent() {
        let a: Submission = serde_json::from_value(json!({"id": "1", "data": {"q1": 5}})).unwrap();
        let b: Submission =
            serde_json::from_value(json!({"id": "1", "responses": {"q1": 5}})).unwrap();
        let c: Submission =
            serde_json::from_value(json!({"id": "1", "answers": {"q1": 5}})).unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.value("q1"), Some(&json!(5)));
    }

    #[test]
    fn test_submission_payload_precedence_and_text() {
        // Null `data` falls through to the next key
        let s: Submission = serde_json::from_value(
            json!({"id": 7, "data": null, "responses": {"q": "a"}, "answers": {"q": "b"}}),
        )
        .unwrap();
        assert_eq!(s.id, "7");
        assert_eq!(s.value("q"), Some(&json!("a")));

        let s: Submission =
            serde_json::from_value(json!({"id": "x", "data": "{\"q\": 3}"})).unwrap();
        assert_eq!(s.value("q"), Some(&json!(3)));

        let s: Submission = serde_json::from_value(json!({"id": "y"})).unwrap();
        assert!(s.data.is_empty());
    }

    #[test]
    fn test_value_presence() {
        let s: Submission = serde_json::from_value(
            json!({"id": "1", "data": {"a": null, "b": "", "c": 0, "d": false, "e": " "}}),
        )
        .unwrap();
        assert!(s.value("a").is_none());
        assert!(s.value("b").is_none());
        assert!(s.value("c").is_some());
        assert!(s.value("d").is_some());
        assert!(s.value("e").is_some());
        assert!(s.value("missing").is_none());
    }

    #[test]
    fn test_find_field() {
        let fields = vec![
            FieldDefinition::new("a", "A", "number"),
            FieldDefinition::new("b", "B", "date"),
        ];
        assert_eq!(find_field(&fields, "b").unwrap().label, "B");
        assert!(matches!(
            find_field(&fields, "c"),
            Err(Error::FieldNotFound(id)) if id == "c"
        ));
    }

    #[test]
    fn test_field_options_parse_both_shapes() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "id": "q",
            "label": "Q",
            "type": "select",
            "options": ["1", {"value": "2", "label": "Two"}, {"label": "3"}, 4]
        }))
        .unwrap();
        let raws: Vec<_> = field
            .options
            .unwrap()
            .iter()
            .map(|o| o.raw().cloned())
            .collect();
        assert_eq!(
            raws,
            vec![Some(json!("1")), Some(json!("2")), Some(json!("3")), Some(json!(4))]
        );
    }

    #[test]
    fn test_lenient_enums() {
        let op: FilterOperator = serde_json::from_value(json!("not_equals")).unwrap();
        assert_eq!(op, FilterOperator::NotEquals);
        let op: FilterOperator = serde_json::from_value(json!("between")).unwrap();
        assert_eq!(op, FilterOperator::Unknown("between".to_string()));
        assert_eq!(serde_json::to_value(&op).unwrap(), json!("between"));

        let agg: Aggregation = serde_json::from_value(json!("p90")).unwrap();
        assert_eq!(agg, Aggregation::P90);
        let agg: Aggregation = serde_json::from_value(json!("mode")).unwrap();
        assert_eq!(agg, Aggregation::Mean);
    }

    #[test]
    fn test_options_accept_camel_case() {
        let options: AnalysisOptions = serde_json::from_value(json!({
            "filters": [{"field_id": "q", "operator": "equals", "value": "x"}],
            "aggregation": "median",
            "timeGranularity": "week"
        }))
        .unwrap();
        assert_eq!(options.filters.len(), 1);
        assert_eq!(options.aggregation, Some(Aggregation::Median));
        assert_eq!(options.time_granularity, Some(TimeGranularity::Week));
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = AnalysisResult::insufficient(
            ChartType::Line,
            Diagnostics {
                complete_pairs: 1,
                ..Default::default()
            },
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["bigNumber"], Value::Null);
        assert_eq!(value["chartData"], json!([]));
        assert_eq!(value["chartType"], json!("line"));
        assert_eq!(value["sampleSize"], json!(1));
        assert_eq!(value["strength"], json!("no clear pattern"));
        assert!(value["error"].is_string());
        assert_eq!(value["diagnostics"]["completePairs"], json!(1));
    }

    #[test]
    fn test_trend_between() {
        assert_eq!(Trend::between(4.5, 4.0), Trend::Up);
        assert_eq!(Trend::between(3.0, 4.5), Trend::Down);
        assert_eq!(Trend::between(2.0, 2.0), Trend::Neutral);
    }

    #[test]
    fn test_trend_as_str_matches_serialized_name() {
        for trend in [Trend::Up, Trend::Down, Trend::Neutral] {
            assert_eq!(serde_json::to_value(trend).unwrap(), trend.as_str());
        }
    }
}
