//! Input validation against catalog field rules. Collects every field issue before failing.

use crate::case::to_camel_case;
use crate::config::{FieldType, ResolvedField, ResolvedRouter};
use crate::error::{AppError, FieldErrors};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Basic address shape: something@something.tld, no whitespace.
pub fn is_valid_email(s: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
        .is_match(s)
}

pub struct InputValidator;

impl InputValidator {
    /// Full input for `create`: unknown keys rejected, required fields enforced, null optionals dropped.
    pub fn validate_create(router: &ResolvedRouter, input: Map<String, Value>) -> Result<Map<String, Value>, AppError> {
        let input = normalize(router, input);
        let mut errors = FieldErrors::default();
        reject_unknown(router, &input, &mut errors);
        for field in &router.fields {
            match input.get(&field.name) {
                None | Some(Value::Null) if field.required => errors.push(to_camel_case(&field.name), "is required"),
                Some(v) if !v.is_null() => check_field(field, v, &mut errors),
                _ => {}
            }
        }
        errors.into_result()?;
        Ok(input.into_iter().filter(|(_, v)| !v.is_null()).collect())
    }

    /// Partial input for `update`: only present keys are checked; null clears optional fields only.
    pub fn validate_patch(router: &ResolvedRouter, data: Map<String, Value>) -> Result<Map<String, Value>, AppError> {
        let data = normalize(router, data);
        let mut errors = FieldErrors::default();
        reject_unknown(router, &data, &mut errors);
        if data.is_empty() {
            errors.push("data", "must contain at least one field");
        }
        for (name, v) in &data {
            let Some(field) = router.field(name) else { continue };
            if v.is_null() {
                if field.required {
                    errors.push(to_camel_case(name), "is required and cannot be cleared");
                }
            } else {
                check_field(field, v, &mut errors);
            }
        }
        errors.into_result()?;
        Ok(data)
    }

    /// `list` filters: keys must be filterable fields, values must satisfy the field rules.
    pub fn validate_filters(router: &ResolvedRouter, filters: Map<String, Value>) -> Result<Map<String, Value>, AppError> {
        let filters = normalize(router, filters);
        let mut errors = FieldErrors::default();
        for (name, v) in &filters {
            match router.field(name) {
                Some(field) if router.filterable.contains(name) => {
                    if v.is_null() {
                        errors.push(to_camel_case(name), "filter value cannot be null");
                    } else {
                        check_field(field, v, &mut errors);
                    }
                }
                _ => errors.push(to_camel_case(name), "is not a filterable field"),
            }
        }
        errors.into_result()?;
        Ok(filters)
    }
}

/// Email values are stored trimmed and lowercase so exact-match filters and containment checks see one spelling.
fn normalize(router: &ResolvedRouter, mut input: Map<String, Value>) -> Map<String, Value> {
    for (name, v) in input.iter_mut() {
        let is_email = router.field(name).is_some_and(|f| f.type_ == FieldType::Email);
        if let (true, Value::String(s)) = (is_email, v) {
            *s = s.trim().to_lowercase();
        }
    }
    input
}

fn reject_unknown(router: &ResolvedRouter, input: &Map<String, Value>, errors: &mut FieldErrors) {
    for key in input.keys() {
        if router.field(key).is_none() {
            errors.push(to_camel_case(key), "unknown field");
        }
    }
}

fn check_field(field: &ResolvedField, v: &Value, errors: &mut FieldErrors) {
    let name = to_camel_case(&field.name);
    let name = name.as_str();
    match field.type_ {
        FieldType::Text => match v.as_str() {
            Some(s) => check_text(field, s, errors),
            None => errors.push(name, "must be a string"),
        },
        FieldType::Email => match v.as_str() {
            Some(s) if is_valid_email(s) => check_text(field, s, errors),
            _ => errors.push(name, "must be a valid email"),
        },
        FieldType::Uuid => {
            if v.as_str().and_then(|s| uuid::Uuid::parse_str(s).ok()).is_none() {
                errors.push(name, "must be a valid UUID");
            }
        }
        FieldType::Datetime => {
            if v.as_str().and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok()).is_none() {
                errors.push(name, "must be an RFC 3339 date-time");
            }
        }
        FieldType::Date => {
            if v.as_str()
                .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .is_none()
            {
                errors.push(name, "must be a date (YYYY-MM-DD)");
            }
        }
        FieldType::Boolean => {
            if !v.is_boolean() {
                errors.push(name, "must be a boolean");
            }
        }
        FieldType::Number => match v.as_f64() {
            Some(n) => check_range(field, n, errors),
            None => errors.push(name, "must be a number"),
        },
        FieldType::Integer => match v.as_i64() {
            Some(n) => check_range(field, n as f64, errors),
            None => errors.push(name, "must be an integer"),
        },
        FieldType::Enum => match v.as_str() {
            Some(s) if field.allowed.iter().any(|a| a == s) => {}
            _ => errors.push(name, format!("must be one of: {}", field.allowed.join(", "))),
        },
        FieldType::TextList => match v.as_array() {
            Some(items) => {
                for item in items {
                    match item.as_str() {
                        Some(s) => check_text(field, s, errors),
                        None => {
                            errors.push(name, "must be a list of strings");
                            break;
                        }
                    }
                }
            }
            None => errors.push(name, "must be a list of strings"),
        },
        FieldType::Opaque => {}
    }
}

fn check_text(field: &ResolvedField, s: &str, errors: &mut FieldErrors) {
    let len = s.chars().count();
    if let Some(min) = field.min_length {
        if len < min as usize {
            errors.push(to_camel_case(&field.name), format!("must be at least {} characters", min));
        }
    }
    if let Some(max) = field.max_length {
        if len > max as usize {
            errors.push(to_camel_case(&field.name), format!("must be at most {} characters", max));
        }
    }
    if let Some(re) = &field.pattern {
        if !re.is_match(s) {
            errors.push(to_camel_case(&field.name), "does not match required pattern");
        }
    }
}

fn check_range(field: &ResolvedField, n: f64, errors: &mut FieldErrors) {
    if let Some(min) = field.minimum {
        if n < min {
            errors.push(to_camel_case(&field.name), format!("must be at least {}", min));
        }
    }
    if let Some(max) = field.maximum {
        if n > max {
            errors.push(to_camel_case(&field.name), format!("must be at most {}", max));
        }
    }
}
