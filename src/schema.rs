//! JSON Schema compilation for tool input schemas.
//!
//! Schemas are compiled with one extension keyword, `x-ordered-items`, for
//! the ordering rules plain JSON Schema cannot state (a bounding box whose
//! south edge lies above its north edge is well-typed but meaningless):
//!
//! ```json
//! { "x-ordered-items": [{ "lower": 0, "upper": 2, "message": "south must not be greater than north" }] }
//! ```
//!
//! Each rule says item `lower` of the array instance must not be greater
//! than item `upper`. Validators that do not know the keyword ignore it.

use jsonschema::paths::{Location, LocationSegment};
use jsonschema::{Keyword, ValidationError, Validator};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::validation::ValidationErrors;

pub const ORDERED_ITEMS: &str = "x-ordered-items";

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
}

/// Compile a JSON Schema (draft 2020-12 unless `$schema` says otherwise).
pub fn compile_schema(schema: &Value) -> Result<Validator, SchemaValidationError> {
    jsonschema::options()
        .with_keyword(ORDERED_ITEMS, ordered_items)
        .build(schema)
        .map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))
}

/// Check `instance` and collect every violation as a `path: reason` pair.
///
/// A missing required property is reported at the property's own path.
pub fn check(validator: &Validator, instance: &Value) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for error in validator.iter_errors(instance) {
        let path = display_path(error.instance_path());
        match error.kind() {
            jsonschema::error::ValidationErrorKind::Required { property } => {
                let property = property.as_str().map_or_else(|| property.to_string(), str::to_string);
                let path = if path.is_empty() { property } else { format!("{path}.{property}") };
                errors.push(path, "Required");
            }
            _ => {
                let path = if path.is_empty() { "arguments".to_string() } else { path };
                errors.push(path, error.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `/bbox/0` renders as `bbox[0]`; the root renders as an empty string.
fn display_path(location: &Location) -> String {
    let mut out = String::new();
    for segment in location {
        match segment {
            LocationSegment::Property(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(&name);
            }
            LocationSegment::Index(idx) => out.push_str(&format!("[{idx}]")),
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct OrderRule {
    lower: usize,
    upper: usize,
    message: String,
}

struct OrderedItems {
    rules: Vec<OrderRule>,
}

impl OrderedItems {
    fn violation(&self, instance: &Value) -> Option<&OrderRule> {
        let items = instance.as_array()?;
        self.rules.iter().find(|rule| {
            match (
                items.get(rule.lower).and_then(Value::as_f64),
                items.get(rule.upper).and_then(Value::as_f64),
            ) {
                (Some(lower), Some(upper)) => lower > upper,
                _ => false,
            }
        })
    }
}

impl Keyword for OrderedItems {
    fn validate<'i>(&self, instance: &'i Value) -> Result<(), ValidationError<'i>> {
        match self.violation(instance) {
            Some(rule) => Err(ValidationError::custom(rule.message.clone())),
            None => Ok(()),
        }
    }

    fn is_valid(&self, instance: &Value) -> bool {
        self.violation(instance).is_none()
    }
}

fn ordered_items<'a>(
    _parent: &'a Map<String, Value>,
    value: &'a Value,
    _path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    let rules = Vec::<OrderRule>::deserialize(value)
        .map_err(|e| ValidationError::schema(format!("{ORDERED_ITEMS}: {e}")))?;
    Ok(Box::new(OrderedItems { rules }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bbox_schema() -> Value {
        json!({
            "type": "object",
            "required": ["bbox"],
            "properties": {
                "bbox": {
                    "type": "array",
                    "prefixItems": [
                        { "type": "number", "minimum": -90, "maximum": 90 },
                        { "type": "number" },
                        { "type": "number", "minimum": -90, "maximum": 90 },
                        { "type": "number" }
                    ],
                    "minItems": 4,
                    "maxItems": 4,
                    ORDERED_ITEMS: [{ "lower": 0, "upper": 2, "message": "south must not be greater than north" }]
                }
            }
        })
    }

    #[test]
    fn ordered_items_rejects_inverted_pair() {
        let validator = compile_schema(&bbox_schema()).unwrap();
        assert!(validator.is_valid(&json!({ "bbox": [48.0, 2.0, 49.0, 3.0] })));

        let err = check(&validator, &json!({ "bbox": [49.0, 2.0, 48.0, 3.0] })).unwrap_err();
        assert_eq!(err.to_string(), "bbox: south must not be greater than north");
    }

    #[test]
    fn item_paths_use_brackets() {
        let validator = compile_schema(&bbox_schema()).unwrap();
        let err = check(&validator, &json!({ "bbox": [95.0, 2.0, 96.0, 3.0] })).unwrap_err();
        assert_eq!(err.violations()[0].path, "bbox[0]");
        assert_eq!(err.violations()[0].reason, "95.0 is greater than the maximum of 90");
    }

    #[test]
    fn missing_property_is_reported_at_its_path() {
        let validator = compile_schema(&bbox_schema()).unwrap();
        let err = check(&validator, &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "bbox: Required");
    }

    #[test]
    fn malformed_rule_fails_to_compile() {
        let schema = json!({ ORDERED_ITEMS: [{ "lower": "zero" }] });
        assert!(matches!(
            compile_schema(&schema),
            Err(SchemaValidationError::SchemaCompile(_))
        ));
    }
}
