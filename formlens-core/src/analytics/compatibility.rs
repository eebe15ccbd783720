//! Which field-type pairs each template accepts.
//!
//! | Template | Primary | Secondary |
//! |----------|---------|-----------|
//! | breakdown | number | category, date, boolean |
//! | over-time | date | number, category |
//! | relationship | number | number |
//! | composition | category | category |
//!
//! Every other combination, and every other template, is incompatible.

use super::classify::{classify, SemanticType};
use super::engine::TemplateType;
use crate::error::{Error, Result};
use crate::types::FieldDefinition;

/// Matrix lookup on already-classified types.
pub fn is_compatible(template: TemplateType, primary: SemanticType, secondary: SemanticType) -> bool {
    use SemanticType::*;

    match template {
        TemplateType::Breakdown => {
            primary == Number && matches!(secondary, Category | Date | Boolean)
        }
        TemplateType::OverTime => primary == Date && matches!(secondary, Number | Category),
        TemplateType::Relationship => primary == Number && secondary == Number,
        TemplateType::Composition => primary == Category && secondary == Category,
        TemplateType::Distribution | TemplateType::TextInsights => false,
    }
}

/// Whether two fields can be analyzed together under a template name.
///
/// Callers check this before invoking the engine; unknown template names are
/// simply incompatible here.
pub fn validate_field_compatibility(
    template: &str,
    primary: &FieldDefinition,
    secondary: &FieldDefinition,
) -> bool {
    match template.parse::<TemplateType>() {
        Ok(t) => is_compatible(t, classify(primary), classify(secondary)),
        Err(_) => false,
    }
}

/// Classify both fields and fail if the template cannot take them.
pub(crate) fn ensure_compatible(
    template: TemplateType,
    primary: &FieldDefinition,
    secondary: &FieldDefinition,
) -> Result<(SemanticType, SemanticType)> {
    let primary_type = classify(primary);
    let secondary_type = classify(secondary);

    if is_compatible(template, primary_type, secondary_type) {
        Ok((primary_type, secondary_type))
    } else {
        Err(Error::IncompatibleFields {
            template: template.as_str().to_string(),
            primary: primary_type.to_string(),
            secondary: secondary_type.to_string(),
        })
    }
}
