//! Registry-driven validation of client extension values

use super::is_blank;
use super::rules::{check_rule, check_type, condition_holds};
use crate::error::FieldErrors;
use crate::model::field::{RelationshipKind, StandardizedField};
use serde_json::Value;
use std::collections::BTreeMap;

/// The field registry viewed as a schema, keyed by field name
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: BTreeMap<String, StandardizedField>,
    allow_unknown: bool,
}

impl FieldSchema {
    pub fn new(fields: impl IntoIterator<Item = StandardizedField>) -> Self {
        Self {
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
            allow_unknown: false,
        }
    }

    /// Accept keys the registry does not define instead of rejecting them
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    pub fn get(&self, name: &str) -> Option<&StandardizedField> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A field is in play unless one of its `depends_on` relationships is
    /// unmet. A relationship with a condition is met when the condition holds;
    /// without one, when the target field has a value.
    fn is_applicable(field: &StandardizedField, values: &BTreeMap<String, Value>) -> bool {
        field
            .active_relationship_rules()
            .iter()
            .filter(|rule| rule.kind == RelationshipKind::DependsOn)
            .all(|rule| match &rule.condition {
                Some(condition) => condition_holds(condition, values),
                None => values.get(&rule.target_field).is_some_and(|v| !is_blank(v)),
            })
    }

    /// Validate extension values keyed by standardized field name. Values for
    /// inactive fields are reported as unknown.
    pub fn validate_values(&self, values: &BTreeMap<String, Value>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if !self.allow_unknown {
            for (key, value) in values {
                let known = self.fields.get(key).is_some_and(|f| f.is_active);
                if !known && !is_blank(value) {
                    errors.add(key.as_str(), "Unknown field");
                }
            }
        }

        for field in self.fields.values().filter(|f| f.is_active) {
            if !Self::is_applicable(field, values) {
                continue;
            }

            let value = values.get(&field.name).unwrap_or(&Value::Null);
            if is_blank(value) {
                if field.is_required {
                    errors.add(field.name.as_str(), format!("{} is required", field.label));
                } else if let Some(message) = field
                    .active_validation_rules()
                    .iter()
                    .find_map(|rule| check_rule(rule, value, &field.label))
                {
                    errors.add(field.name.as_str(), message);
                }
                continue;
            }

            if let Some(message) = check_type(field, value) {
                errors.add(field.name.as_str(), message);
                continue;
            }
            for rule in field.active_validation_rules() {
                if let Some(message) = check_rule(rule, value, &field.label) {
                    errors.add(field.name.as_str(), message);
                }
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::{
        Condition, FieldCategory, FieldType, Operator, RelationshipRule, RuleKind, ValidationRule,
    };
    use serde_json::json;

    fn field(name: &str, label: &str, field_type: FieldType) -> StandardizedField {
        StandardizedField::new(name, name, label, field_type, FieldCategory::Client)
    }

    fn values(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn schema() -> FieldSchema {
        let mut email = field("email", "Email", FieldType::Email);
        email.is_required = true;

        let mut income = field("annual_income", "Annual income", FieldType::Currency);
        income.has_validation = true;
        income.validation_rules = vec![ValidationRule::new(RuleKind::Min, Some(json!(0)), "")];

        let mut employer = field("employer", "Employer", FieldType::Text);
        employer.is_required = true;
        employer.has_relationship = true;
        employer.relationship_rules = vec![RelationshipRule {
            kind: RelationshipKind::DependsOn,
            target_field: "employment_status".into(),
            condition: Some(Condition {
                field: "employment_status".into(),
                operator: Operator::Equals,
                value: json!("employed"),
            }),
        }];

        let status = field("employment_status", "Employment status", FieldType::Text);

        let mut retired = field("legacy_code", "Legacy code", FieldType::Text);
        retired.is_active = false;
        retired.is_required = true;

        FieldSchema::new([email, income, employer, status, retired])
    }

    #[test]
    fn test_valid_record_passes() {
        let result = schema().validate_values(&values(&[
            ("email", json!("lee@example.com")),
            ("annual_income", json!("52000")),
            ("employment_status", json!("retired")),
        ]));
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_required_type_and_rule_failures() {
        let errors = schema()
            .validate_values(&values(&[
                ("annual_income", json!(-5)),
                ("employment_status", json!("employed")),
            ]))
            .unwrap_err();

        assert_eq!(errors.get("email"), ["Email is required"]);
        assert_eq!(errors.get("annual_income"), ["Annual income must be at least 0"]);
        assert_eq!(errors.get("employer"), ["Employer is required"]);
        assert!(!errors.contains("legacy_code"));
    }

    #[test]
    fn test_type_failure_skips_rules() {
        let errors = schema()
            .validate_values(&values(&[
                ("email", json!("not-an-email")),
                ("annual_income", json!("lots")),
            ]))
            .unwrap_err();
        assert_eq!(errors.get("email"), ["Email must be a valid email address"]);
        assert_eq!(errors.get("annual_income"), ["Annual income must be a number"]);
    }

    #[test]
    fn test_unmet_dependency_skips_field() {
        let result = schema().validate_values(&values(&[
            ("email", json!("lee@example.com")),
            ("employment_status", json!("student")),
        ]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_keys() {
        let record = values(&[("email", json!("lee@example.com")), ("shoe_size", json!(44))]);
        let errors = schema().validate_values(&record).unwrap_err();
        assert_eq!(errors.get("shoe_size"), ["Unknown field"]);

        assert!(schema().allow_unknown().validate_values(&record).is_ok());

        let blank_unknown = values(&[("email", json!("lee@example.com")), ("nickname", json!(""))]);
        assert!(schema().validate_values(&blank_unknown).is_ok());
    }

    #[test]
    fn test_inactive_field_value_is_unknown() {
        let record = values(&[("email", json!("lee@example.com")), ("legacy_code", json!("X9"))]);
        let errors = schema().validate_values(&record).unwrap_err();
        assert_eq!(errors.get("legacy_code"), ["Unknown field"]);

        let without = values(&[("email", json!("lee@example.com"))]);
        assert!(schema().validate_values(&without).is_ok());
        assert!(schema().allow_unknown().validate_values(&record).is_ok());
    }
}
