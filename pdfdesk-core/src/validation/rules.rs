//! Validation rule, type-shape and condition evaluation

use super::{is_blank, is_valid_email, is_valid_phone, is_valid_url};
use crate::model::field::{Condition, FieldType, Operator, RuleKind, StandardizedField, ValidationRule};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Numeric view of a value; numeric strings count
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text view of a scalar value
pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Equality that tolerates numbers sent as strings
fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => matches!((as_text(a), as_text(b)), (Some(x), Some(y)) if x == y),
    }
}

fn list_contains(list: &Value, needle: &Value) -> Option<bool> {
    list.as_array().map(|items| items.iter().any(|item| loose_eq(item, needle)))
}

fn bounds(value: &Option<Value>) -> Option<(f64, f64)> {
    match value.as_ref()? {
        Value::Array(pair) if pair.len() == 2 => Some((as_number(&pair[0])?, as_number(&pair[1])?)),
        Value::Object(map) => Some((as_number(map.get("min")?)?, as_number(map.get("max")?)?)),
        _ => None,
    }
}

fn regex_match(pattern: &str, text: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            log::warn!("Ignoring invalid validation pattern {:?}: {}", pattern, e);
            true
        }
    }
}

fn describe(value: &Option<Value>) -> String {
    value.as_ref().and_then(as_text).unwrap_or_default()
}

fn default_message(rule: &ValidationRule, label: &str) -> String {
    let v = describe(&rule.value);
    match rule.kind {
        RuleKind::Required => format!("{} is required", label),
        RuleKind::Min => format!("{} must be at least {}", label, v),
        RuleKind::Max => format!("{} must be at most {}", label, v),
        RuleKind::MinLength => format!("{} must be at least {} characters", label, v),
        RuleKind::MaxLength => format!("{} must be at most {} characters", label, v),
        RuleKind::Pattern => format!("{} has an invalid format", label),
        RuleKind::Email => format!("{} must be a valid email address", label),
        RuleKind::Url => format!("{} must be a valid URL", label),
        RuleKind::Phone => format!("{} must be a valid phone number", label),
        RuleKind::Date => format!("{} must be a valid date", label),
        RuleKind::Number => format!("{} must be a number", label),
        RuleKind::Integer => format!("{} must be a whole number", label),
        RuleKind::Positive => format!("{} must be positive", label),
        RuleKind::Negative => format!("{} must be negative", label),
        RuleKind::Between => match bounds(&rule.value) {
            Some((lo, hi)) => format!("{} must be between {} and {}", label, lo, hi),
            None => format!("{} is out of range", label),
        },
        RuleKind::In => format!("{} must be one of the allowed values", label),
        RuleKind::NotIn => format!("{} is not an allowed value", label),
        RuleKind::Custom => format!("{} is invalid", label),
    }
}

fn is_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok()
}

fn is_datetime(text: &str) -> bool {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M").is_ok()
}

fn is_time(text: &str) -> bool {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M").is_ok()
        || NaiveTime::parse_from_str(text, "%H:%M:%S").is_ok()
}

/// Evaluate one rule. Returns the failure message, or `None` when it passes.
///
/// Blank values only fail `required`; every other rule skips them. A rule
/// whose parameter is missing passes. `custom` rules are evaluated by the
/// backend and always pass here.
pub fn check_rule(rule: &ValidationRule, value: &Value, label: &str) -> Option<String> {
    let passed = if rule.kind == RuleKind::Required {
        !is_blank(value)
    } else if is_blank(value) {
        true
    } else {
        let param = rule.value.as_ref().and_then(as_number);
        let number = as_number(value);
        let text = as_text(value);
        match rule.kind {
            RuleKind::Required => true,
            RuleKind::Min => param.map_or(true, |bound| number.is_some_and(|n| n >= bound)),
            RuleKind::Max => param.map_or(true, |bound| number.is_some_and(|n| n <= bound)),
            RuleKind::MinLength => {
                param.map_or(true, |bound| length(value).is_some_and(|l| l as f64 >= bound))
            }
            RuleKind::MaxLength => {
                param.map_or(true, |bound| length(value).is_some_and(|l| l as f64 <= bound))
            }
            RuleKind::Pattern => match (rule.value.as_ref().and_then(Value::as_str), &text) {
                (Some(pattern), Some(text)) => regex_match(pattern, text),
                (Some(_), None) => false,
                (None, _) => true,
            },
            RuleKind::Email => text.as_deref().is_some_and(is_valid_email),
            RuleKind::Url => text.as_deref().is_some_and(is_valid_url),
            RuleKind::Phone => text.as_deref().is_some_and(is_valid_phone),
            RuleKind::Date => text.as_deref().is_some_and(is_date),
            RuleKind::Number => number.is_some(),
            RuleKind::Integer => number.is_some_and(|n| n.fract() == 0.0),
            RuleKind::Positive => number.is_some_and(|n| n > 0.0),
            RuleKind::Negative => number.is_some_and(|n| n < 0.0),
            RuleKind::Between => bounds(&rule.value)
                .map_or(true, |(lo, hi)| number.is_some_and(|n| n >= lo && n <= hi)),
            RuleKind::In => {
                rule.value.as_ref().and_then(|list| list_contains(list, value)).unwrap_or(true)
            }
            RuleKind::NotIn => {
                !rule.value.as_ref().and_then(|list| list_contains(list, value)).unwrap_or(false)
            }
            RuleKind::Custom => true,
        }
    };

    if passed {
        None
    } else if rule.message.trim().is_empty() {
        Some(default_message(rule, label))
    } else {
        Some(rule.message.clone())
    }
}

/// Check that a non-blank value has the shape its field type requires
pub fn check_type(field: &StandardizedField, value: &Value) -> Option<String> {
    let label = &field.label;
    let text = as_text(value);
    let ok = match field.field_type {
        FieldType::Number | FieldType::Currency | FieldType::Range => as_number(value).is_some(),
        FieldType::Percentage => {
            if !as_number(value).is_some_and(|n| (0.0..=100.0).contains(&n)) {
                return Some(format!("{} must be a percentage between 0 and 100", label));
            }
            true
        }
        FieldType::Checkbox => match value {
            Value::Bool(_) => true,
            Value::String(s) => matches!(s.as_str(), "true" | "false"),
            _ => false,
        },
        FieldType::Email => text.as_deref().is_some_and(is_valid_email),
        FieldType::Url => text.as_deref().is_some_and(is_valid_url),
        FieldType::Phone => text.as_deref().is_some_and(is_valid_phone),
        FieldType::Date => text.as_deref().is_some_and(is_date),
        FieldType::Datetime => text.as_deref().is_some_and(is_datetime),
        FieldType::Time => text.as_deref().is_some_and(is_time),
        FieldType::Color => text.as_deref().is_some_and(|t| {
            let hex = t.trim().trim_start_matches('#');
            t.trim().starts_with('#')
                && matches!(hex.len(), 3 | 6)
                && hex.chars().all(|c| c.is_ascii_hexdigit())
        }),
        FieldType::Ssn => text.as_deref().is_some_and(|t| {
            let digits: String = t.chars().filter(|c| *c != '-').collect();
            digits.len() == 9 && digits.chars().all(|c| c.is_ascii_digit())
        }),
        FieldType::Select | FieldType::Radio => {
            let Some(choice) = text else {
                return Some(format!("{} must be a single value", label));
            };
            return check_choices(field, std::slice::from_ref(&choice));
        }
        FieldType::Multiselect => {
            let Some(items) = value.as_array() else {
                return Some(format!("{} must be a list of values", label));
            };
            let picked: Vec<String> = items.iter().filter_map(as_text).collect();
            if picked.len() != items.len() {
                return Some(format!("{} must be a list of values", label));
            }
            return check_choices(field, &picked);
        }
        FieldType::Address => value.is_string() || value.is_object(),
        FieldType::Text
        | FieldType::Textarea
        | FieldType::Password
        | FieldType::Signature
        | FieldType::File => value.is_string() || value.is_number(),
    };

    if ok {
        None
    } else {
        Some(match field.field_type {
            FieldType::Number | FieldType::Currency | FieldType::Range => {
                format!("{} must be a number", label)
            }
            FieldType::Checkbox => format!("{} must be true or false", label),
            FieldType::Email => format!("{} must be a valid email address", label),
            FieldType::Url => format!("{} must be a valid URL", label),
            FieldType::Phone => format!("{} must be a valid phone number", label),
            FieldType::Date => format!("{} must be a date (YYYY-MM-DD)", label),
            FieldType::Datetime => format!("{} must be a date and time", label),
            FieldType::Time => format!("{} must be a time (HH:MM)", label),
            FieldType::Color => format!("{} must be a hex colour", label),
            FieldType::Ssn => format!("{} must be a valid SSN", label),
            _ => format!("{} has an invalid value", label),
        })
    }
}

fn check_choices(field: &StandardizedField, picked: &[String]) -> Option<String> {
    let choices = field.choices()?;
    if picked.iter().all(|p| choices.contains(p)) {
        None
    } else {
        Some(format!("{} must be one of: {}", field.label, choices.join(", ")))
    }
}

/// Evaluate a relationship condition against record values
pub fn condition_holds(condition: &Condition, values: &BTreeMap<String, Value>) -> bool {
    let actual = values.get(&condition.field).unwrap_or(&Value::Null);
    let expected = &condition.value;
    let actual_text = as_text(actual).unwrap_or_default();
    let expected_text = as_text(expected).unwrap_or_default();

    let compare = |f: fn(f64, f64) -> bool| match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => f(a, b),
        _ => false,
    };
    let contains = || match actual {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, expected)),
        _ => actual_text.contains(&expected_text),
    };

    match condition.operator {
        Operator::Equals => loose_eq(actual, expected),
        Operator::NotEquals => !loose_eq(actual, expected),
        Operator::Contains => contains(),
        Operator::NotContains => !contains(),
        Operator::GreaterThan => compare(|a, b| a > b),
        Operator::LessThan => compare(|a, b| a < b),
        Operator::GreaterThanOrEqual => compare(|a, b| a >= b),
        Operator::LessThanOrEqual => compare(|a, b| a <= b),
        Operator::In => list_contains(expected, actual).unwrap_or(false),
        Operator::NotIn => !list_contains(expected, actual).unwrap_or(false),
        Operator::Between => match (bounds(&Some(expected.clone())), as_number(actual)) {
            (Some((lo, hi)), Some(n)) => n >= lo && n <= hi,
            _ => false,
        },
        Operator::StartsWith => !is_blank(actual) && actual_text.starts_with(&expected_text),
        Operator::EndsWith => !is_blank(actual) && actual_text.ends_with(&expected_text),
        Operator::Matches => !is_blank(actual) && regex_match(&expected_text, &actual_text),
        Operator::Custom => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldCategory;
    use serde_json::json;

    fn rule(kind: RuleKind, value: Option<Value>) -> ValidationRule {
        ValidationRule::new(kind, value, "")
    }

    #[test]
    fn test_required_and_blank_skipping() {
        let required = rule(RuleKind::Required, None);
        assert_eq!(check_rule(&required, &json!(""), "Email").as_deref(), Some("Email is required"));
        assert!(check_rule(&required, &json!("x"), "Email").is_none());

        let min_len = rule(RuleKind::MinLength, Some(json!(3)));
        assert!(check_rule(&min_len, &Value::Null, "Code").is_none());
        assert!(check_rule(&min_len, &json!("ab"), "Code").is_some());
    }

    #[test]
    fn test_numeric_rules() {
        let between = rule(RuleKind::Between, Some(json!([18, 65])));
        assert!(check_rule(&between, &json!(30), "Age").is_none());
        assert_eq!(
            check_rule(&between, &json!("70"), "Age").as_deref(),
            Some("Age must be between 18 and 65")
        );

        assert!(check_rule(&rule(RuleKind::Integer, None), &json!(2.5), "Count").is_some());
        assert!(check_rule(&rule(RuleKind::Positive, None), &json!("-1"), "Income").is_some());
        assert!(check_rule(&rule(RuleKind::Max, Some(json!(10))), &json!("abc"), "N").is_some());
        assert!(check_rule(&rule(RuleKind::Min, None), &json!(1), "N").is_none());
    }

    #[test]
    fn test_custom_message_wins() {
        let pattern = ValidationRule::new(RuleKind::Pattern, Some(json!("^[A-Z]\\d{6}$")), "Bad HKID");
        assert_eq!(check_rule(&pattern, &json!("a123"), "HKID").as_deref(), Some("Bad HKID"));
        assert!(check_rule(&pattern, &json!("A123456"), "HKID").is_none());
    }

    #[test]
    fn test_membership_rules() {
        let allowed = rule(RuleKind::In, Some(json!(["M", "F", "O"])));
        assert!(check_rule(&allowed, &json!("F"), "Gender").is_none());
        assert!(check_rule(&allowed, &json!("X"), "Gender").is_some());

        let banned = rule(RuleKind::NotIn, Some(json!([0])));
        assert!(check_rule(&banned, &json!("0"), "Amount").is_some());
    }

    #[test]
    fn test_type_shapes() {
        let mut field =
            StandardizedField::new("1", "pct", "Share", FieldType::Percentage, FieldCategory::Client);
        assert!(check_type(&field, &json!(55)).is_none());
        assert!(check_type(&field, &json!(120)).is_some());

        field.field_type = FieldType::Date;
        assert!(check_type(&field, &json!("2024-02-29")).is_none());
        assert!(check_type(&field, &json!("29/02/2024")).is_some());

        field.field_type = FieldType::Checkbox;
        assert!(check_type(&field, &json!(true)).is_none());
        assert!(check_type(&field, &json!("yes")).is_some());

        field.field_type = FieldType::Select;
        field.options = json!({"choices": ["single", "married"]}).as_object().cloned();
        assert!(check_type(&field, &json!("married")).is_none());
        assert_eq!(
            check_type(&field, &json!("complicated")).as_deref(),
            Some("Share must be one of: single, married")
        );

        field.field_type = FieldType::Multiselect;
        assert!(check_type(&field, &json!(["single"])).is_none());
        assert!(check_type(&field, &json!("single")).is_some());

        field.field_type = FieldType::Color;
        assert!(check_type(&field, &json!("#A0b1C2")).is_none());
        assert!(check_type(&field, &json!("red")).is_some());
    }

    #[test]
    fn test_conditions() {
        let values: BTreeMap<String, Value> = [
            ("employment".to_string(), json!("employed")),
            ("income".to_string(), json!("52000")),
            ("tags".to_string(), json!(["vip", "hk"])),
        ]
        .into_iter()
        .collect();

        let cond = |field: &str, operator: Operator, value: Value| Condition {
            field: field.to_string(),
            operator,
            value,
        };

        assert!(condition_holds(&cond("employment", Operator::Equals, json!("employed")), &values));
        assert!(condition_holds(&cond("income", Operator::GreaterThan, json!(50000)), &values));
        assert!(condition_holds(&cond("tags", Operator::Contains, json!("vip")), &values));
        assert!(condition_holds(
            &cond("employment", Operator::In, json!(["employed", "self_employed"])),
            &values
        ));
        assert!(!condition_holds(&cond("missing", Operator::Equals, json!("x")), &values));
        assert!(condition_holds(&cond("missing", Operator::NotEquals, json!("x")), &values));
        assert!(condition_holds(&cond("income", Operator::Between, json!([1, 60000])), &values));
        assert!(condition_holds(&cond("employment", Operator::Matches, json!("^emp")), &values));
    }
}
