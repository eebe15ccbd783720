//! Field type classification.
//!
//! Maps a raw field definition to the [`SemanticType`] the analyzers work
//! with. Classification looks only at the definition, never at answers.

use super::value::as_number;
use crate::types::FieldDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What kind of analysis a field supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Number,
    Category,
    Date,
    Boolean,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Number => "number",
            SemanticType::Category => "category",
            SemanticType::Date => "date",
            SemanticType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder types with a dedicated classification rule.
const SELECT_TYPES: &[&str] = &["select", "radio", "radio-with-other", "dropdown"];

/// Builder types that classify as category without further inspection.
const TEXT_TYPES: &[&str] = &[
    "text", "textarea", "email", "phone", "tel", "url", "time", "file", "signature",
];

/// Classify a field definition.
pub fn classify(field: &FieldDefinition) -> SemanticType {
    match field.field_type.as_deref() {
        Some("number") | Some("rating") => SemanticType::Number,
        Some(t) if SELECT_TYPES.contains(&t) => {
            if has_numeric_options(field) {
                SemanticType::Number
            } else {
                SemanticType::Category
            }
        }
        Some("checkbox") | Some("checkbox-with-other") => SemanticType::Category,
        Some("date") | Some("datetime-local") => SemanticType::Date,
        Some("boolean") => SemanticType::Boolean,
        _ => SemanticType::Category,
    }
}

/// Whether the builder type is one we have a rule for.
///
/// Fields for which this is false still classify (as category), but callers
/// should report them as a data-quality problem.
pub fn is_recognized_type(field: &FieldDefinition) -> bool {
    match field.field_type.as_deref() {
        Some(t) => {
            matches!(
                t,
                "number"
                    | "rating"
                    | "checkbox"
                    | "checkbox-with-other"
                    | "date"
                    | "datetime-local"
                    | "boolean"
            ) || SELECT_TYPES.contains(&t)
                || TEXT_TYPES.contains(&t)
        }
        None => false,
    }
}

/// True when there is at least one option and every option is a number.
fn has_numeric_options(field: &FieldDefinition) -> bool {
    match field.options.as_deref() {
        Some(options) if !options.is_empty() => options.iter().all(|option| {
            option.raw().is_some_and(|raw| match raw {
                Value::String(s) => !s.trim().is_empty() && as_number(raw).is_some(),
                Value::Number(_) => as_number(raw).is_some(),
                _ => false,
            })
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldOption;
    use serde_json::json;

    #[test]
    fn test_numeric_types() {
        assert_eq!(classify(&FieldDefinition::new("a", "A", "number")), SemanticType::Number);
        assert_eq!(classify(&FieldDefinition::new("a", "A", "rating")), SemanticType::Number);
    }

    #[test]
    fn test_select_with_numeric_options() {
        for t in ["select", "radio", "radio-with-other", "dropdown"] {
            let field = FieldDefinition::new("a", "A", t).with_options(&["1", "2", "3", "4.5"]);
            assert_eq!(classify(&field), SemanticType::Number, "type {t}");
        }
    }

    #[test]
    fn test_select_with_mixed_or_missing_options() {
        let field = FieldDefinition::new("a", "A", "select").with_options(&["1", "2", "Other"]);
        assert_eq!(classify(&field), SemanticType::Category);

        let field = FieldDefinition::new("a", "A", "select").with_options(&["1", ""]);
        assert_eq!(classify(&field), SemanticType::Category);

        let field = FieldDefinition::new("a", "A", "radio");
        assert_eq!(classify(&field), SemanticType::Category);

        let field = FieldDefinition::new("a", "A", "dropdown").with_options(&[]);
        assert_eq!(classify(&field), SemanticType::Category);
    }

    #[test]
    fn test_select_with_labeled_options() {
        let mut field = FieldDefinition::new("a", "A", "select");
        field.options = Some(vec![
            FieldOption::Labeled {
                value: Some(json!("1")),
                label: Some(json!("Poor")),
            },
            FieldOption::Labeled {
                value: Some(json!(5)),
                label: Some(json!("Great")),
            },
        ]);
        assert_eq!(classify(&field), SemanticType::Number);

        field.options = Some(vec![FieldOption::Labeled {
            value: None,
            label: Some(json!("Great")),
        }]);
        assert_eq!(classify(&field), SemanticType::Category);
    }

    #[test]
    fn test_other_types() {
        let cases = [
            ("checkbox", SemanticType::Category),
            ("checkbox-with-other", SemanticType::Category),
            ("date", SemanticType::Date),
            ("datetime-local", SemanticType::Date),
            ("boolean", SemanticType::Boolean),
            ("email", SemanticType::Category),
            ("text", SemanticType::Category),
            ("hologram", SemanticType::Category),
        ];
        for (t, expected) in cases {
            assert_eq!(classify(&FieldDefinition::new("a", "A", t)), expected, "type {t}");
        }
    }

    #[test]
    fn test_missing_type_falls_back_to_category() {
        let mut field = FieldDefinition::new("a", "A", "number");
        field.field_type = None;
        assert_eq!(classify(&field), SemanticType::Category);
        assert!(!is_recognized_type(&field));
    }

    #[test]
    fn test_recognized_types() {
        assert!(is_recognized_type(&FieldDefinition::new("a", "A", "email")));
        assert!(is_recognized_type(&FieldDefinition::new("a", "A", "radio")));
        assert!(!is_recognized_type(&FieldDefinition::new("a", "A", "hologram")));
    }
}
