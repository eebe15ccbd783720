//! Filter engine.
//!
//! A filter list is a conjunction: a submission is kept only when every filter
//! matches. A filter on a field the submission did not answer never matches,
//! including `not_equals`.

use super::value::{as_date, as_number, as_text};
use crate::types::{Filter, FilterOperator, Submission};
use serde_json::Value;

/// Apply a filter set, keeping submission order.
pub fn apply_filters(submissions: &[Submission], filters: &[Filter]) -> Vec<Submission> {
    if filters.is_empty() {
        return submissions.to_vec();
    }

    for filter in filters {
        if let FilterOperator::Unknown(name) = &filter.operator {
            tracing::warn!(
                field_id = %filter.field_id,
                operator = %name,
                "Unknown filter operator, treating as pass-through"
            );
        }
    }

    let kept: Vec<Submission> = submissions
        .iter()
        .filter(|s| matches_all(s, filters))
        .cloned()
        .collect();

    tracing::debug!(
        filters = filters.len(),
        before = submissions.len(),
        after = kept.len(),
        "Applied filters"
    );

    kept
}

/// Whether a submission passes every filter.
pub fn matches_all(submission: &Submission, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(submission, f))
}

/// Whether a submission passes a single filter.
pub fn matches(submission: &Submission, filter: &Filter) -> bool {
    let Some(actual) = submission.value(&filter.field_id) else {
        return false;
    };
    let expected = &filter.value;

    match &filter.operator {
        FilterOperator::Equals => as_text(actual) == as_text(expected),
        FilterOperator::NotEquals => as_text(actual) != as_text(expected),
        FilterOperator::GreaterThan => compare_numbers(actual, expected, |a, b| a > b),
        FilterOperator::LessThan => compare_numbers(actual, expected, |a, b| a < b),
        FilterOperator::Contains => as_text(actual)
            .to_lowercase()
            .contains(&as_text(expected).to_lowercase()),
        FilterOperator::Before => match (as_date(actual), as_date(expected)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        FilterOperator::After => match (as_date(actual), as_date(expected)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        FilterOperator::Unknown(_) => true,
    }
}

fn compare_numbers(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(id: &str, data: Value) -> Submission {
        serde_json::from_value(json!({ "id": id, "data": data })).unwrap()
    }

    fn sample() -> Vec<Submission> {
        vec![
            submission("1", json!({"team": "Sales", "score": 8, "joined": "2024-01-10"})),
            submission("2", json!({"team": "Support", "score": "5", "joined": "2024-03-02"})),
            submission("3", json!({"team": "sales ops", "score": 3})),
            submission("4", json!({"score": 9, "joined": "2023-12-31"})),
            submission("5", json!({"team": "", "score": null})),
        ]
    }

    fn ids(submissions: &[Submission]) -> Vec<&str> {
        submissions.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let all = sample();
        assert_eq!(apply_filters(&all, &[]), all);
    }

    #[test]
    fn test_equals_is_string_coerced() {
        let f = Filter::new("score", FilterOperator::Equals, json!("5"));
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["2"]);

        let f = Filter::new("score", FilterOperator::Equals, json!(8));
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["1"]);
    }

    #[test]
    fn test_equals_matches_multi_select_as_comma_list() {
        let subs = vec![
            submission("1", json!({"tags": ["a", "b"]})),
            submission("2", json!({"tags": ["a"]})),
        ];
        let f = Filter::new("tags", FilterOperator::Equals, json!("a,b"));
        assert_eq!(ids(&apply_filters(&subs, &[f])), vec!["1"]);
    }

    #[test]
    fn test_not_equals_excludes_missing_values() {
        let f = Filter::new("team", FilterOperator::NotEquals, json!("Sales"));
        // 4 has no team, 5 has an empty team: both excluded
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["2", "3"]);
    }

    #[test]
    fn test_numeric_comparisons() {
        let f = Filter::new("score", FilterOperator::GreaterThan, json!(4));
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["1", "2", "4"]);

        let f = Filter::new("score", FilterOperator::LessThan, json!("5"));
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["3"]);

        // Non-numeric threshold never matches
        let f = Filter::new("score", FilterOperator::GreaterThan, json!("lots"));
        assert!(apply_filters(&sample(), &[f]).is_empty());
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let f = Filter::new("team", FilterOperator::Contains, json!("SALES"));
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["1", "3"]);
    }

    #[test]
    fn test_date_comparisons() {
        let f = Filter::new("joined", FilterOperator::Before, json!("2024-02-01"));
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["1", "4"]);

        let f = Filter::new("joined", FilterOperator::After, json!("2024-01-10"));
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["2"]);

        let f = Filter::new("joined", FilterOperator::After, json!("someday"));
        assert!(apply_filters(&sample(), &[f]).is_empty());
    }

    #[test]
    fn test_unknown_operator_passes_present_values() {
        let f = Filter::new(
            "score",
            FilterOperator::Unknown("between".to_string()),
            json!([1, 5]),
        );
        assert_eq!(ids(&apply_filters(&sample(), &[f])), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_conjunction_equals_sequential_application() {
        let all = sample();
        let f1 = Filter::new("score", FilterOperator::GreaterThan, json!(2));
        let f2 = Filter::new("team", FilterOperator::Contains, json!("s"));

        let together = apply_filters(&all, &[f1.clone(), f2.clone()]);
        let sequential = apply_filters(&apply_filters(&all, &[f1]), &[f2]);

        assert_eq!(together, sequential);
        assert_eq!(ids(&together), vec!["1", "2", "3"]);
    }
}
