//! Standardized field registry types

use super::{default_true, wire_enum};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

wire_enum! {
    /// Input type of a standardized field
    pub enum FieldType {
        Text => "text",
        Number => "number",
        Date => "date",
        Select => "select",
        Checkbox => "checkbox",
        Radio => "radio",
        Textarea => "textarea",
        Email => "email",
        Phone => "phone",
        Ssn => "ssn",
        Address => "address",
        Signature => "signature",
        Multiselect => "multiselect",
        Currency => "currency",
        Percentage => "percentage",
        Url => "url",
        Password => "password",
        Time => "time",
        Datetime => "datetime",
        Color => "color",
        Range => "range",
        File => "file",
    }
}

impl FieldType {
    /// Types whose values are numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency | FieldType::Percentage | FieldType::Range)
    }

    /// Types that pick from `options`
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio | FieldType::Multiselect)
    }
}

wire_enum! {
    /// Subject a field describes
    pub enum FieldCategory {
        Client => "client",
        User => "user",
        Broker => "broker",
    }
}

wire_enum! {
    /// Kind of a validation rule; rules the client does not know are `Custom`
    pub enum RuleKind {
        Required => "required",
        Min => "min",
        Max => "max",
        MinLength => "minLength",
        MaxLength => "maxLength",
        Pattern => "pattern",
        Email => "email",
        Url => "url",
        Phone => "phone",
        Date => "date",
        Number => "number",
        Integer => "integer",
        Positive => "positive",
        Negative => "negative",
        Between => "between",
        In => "in",
        NotIn => "notIn",
        Custom => "custom",
    }
    fallback Custom
}

wire_enum! {
    /// How a field relates to its target field
    pub enum RelationshipKind {
        DependsOn => "depends_on",
        Affects => "affects",
        Validates => "validates",
        Calculates => "calculates",
        Transforms => "transforms",
    }
    fallback Affects
}

wire_enum! {
    /// Comparison used by relationship conditions
    pub enum Operator {
        Equals => "equals",
        NotEquals => "notEquals",
        Contains => "contains",
        NotContains => "notContains",
        GreaterThan => "greaterThan",
        LessThan => "lessThan",
        GreaterThanOrEqual => "greaterThanOrEqual",
        LessThanOrEqual => "lessThanOrEqual",
        In => "in",
        NotIn => "notIn",
        Between => "between",
        StartsWith => "startsWith",
        EndsWith => "endsWith",
        Matches => "matches",
        Custom => "custom",
    }
    fallback Custom
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub message: String,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, value: Option<Value>, message: impl Into<String>) -> Self {
        Self { kind, value, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRule {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub target_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// A reusable field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedField {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub field_category: FieldCategory,
    #[serde(default)]
    pub display_category: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub field_definition: Option<String>,
    #[serde(default)]
    pub llm_guide: Option<String>,
    #[serde(default)]
    pub has_validation: bool,
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
    #[serde(default)]
    pub has_relationship: bool,
    #[serde(default)]
    pub relationship_rules: Vec<RelationshipRule>,
    #[serde(default)]
    pub options: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StandardizedField {
    /// Minimal active field, mostly useful for fixtures
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        field_category: FieldCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            label: label.into(),
            field_type,
            field_category,
            display_category: None,
            is_required: false,
            field_definition: None,
            llm_guide: None,
            has_validation: false,
            validation_rules: Vec::new(),
            has_relationship: false,
            relationship_rules: Vec::new(),
            options: None,
            metadata: None,
            default_value: None,
            placeholder: None,
            help_text: None,
            display_order: None,
            is_active: true,
            is_system: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Validation rules in force; empty when `has_validation` is false
    pub fn active_validation_rules(&self) -> &[ValidationRule] {
        if self.has_validation {
            &self.validation_rules
        } else {
            &[]
        }
    }

    /// Relationship rules in force; empty when `has_relationship` is false
    pub fn active_relationship_rules(&self) -> &[RelationshipRule] {
        if self.has_relationship {
            &self.relationship_rules
        } else {
            &[]
        }
    }

    /// Allowed values for choice fields.
    ///
    /// Read from `options.choices` when it is an array, otherwise the option
    /// keys. `None` means the choices are unconstrained.
    pub fn choices(&self) -> Option<Vec<String>> {
        let options = self.options.as_ref().filter(|o| !o.is_empty())?;
        if let Some(Value::Array(items)) = options.get("choices") {
            return Some(
                items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        Value::Object(o) => o.get("value").map(value_text).unwrap_or_default(),
                        other => other.to_string(),
                    })
                    .collect(),
            );
        }
        Some(options.keys().cloned().collect())
    }

    /// Display ordering: `display_order` ascending with unset orders last,
    /// then `name`
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        let by_order = match (self.display_order, other.display_order) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_order.then_with(|| self.name.cmp(&other.name))
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Sort fields in display order
pub fn sort_for_display(fields: &mut [StandardizedField]) {
    fields.sort_by(StandardizedField::display_cmp);
}

/// Create payload for a standardized field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStandardizedField {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub field_category: FieldCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_category: Option<String>,
    pub is_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_guide: Option<String>,
    pub has_validation: bool,
    pub validation_rules: Vec<ValidationRule>,
    pub has_relationship: bool,
    pub relationship_rules: Vec<RelationshipRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    pub is_active: bool,
}

/// Partial update for a standardized field; unset members are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StandardizedFieldPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_category: Option<FieldCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_guide: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_validation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<Vec<ValidationRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_relationship: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_rules: Option<Vec<RelationshipRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl StandardizedFieldPatch {
    pub fn display_order(order: i64) -> Self {
        Self { display_order: Some(order), ..Self::default() }
    }
}

/// Grouping entity used for display ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedFieldCategory {
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFieldCategory {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_decodes_with_backend_defaults() {
        let field: StandardizedField = serde_json::from_value(json!({
            "id": "7",
            "name": "client_email",
            "label": "Email",
            "field_type": "email",
            "field_category": "client",
            "has_validation": false,
            "validation_rules": [{"type": "required", "message": "Required"}]
        }))
        .unwrap();

        assert_eq!(field.field_type, FieldType::Email);
        assert!(field.is_active);
        assert!(field.active_validation_rules().is_empty());
        assert_eq!(field.validation_rules.len(), 1);
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let err = serde_json::from_value::<FieldType>(json!("bogus")).unwrap_err();
        assert!(err.to_string().contains("unknown FieldType: bogus"));
        assert_eq!(FieldType::ALL.len(), 22);
    }

    #[test]
    fn test_lenient_rule_and_operator_kinds() {
        let rule: ValidationRule =
            serde_json::from_value(json!({"type": "luhn", "message": "bad card"})).unwrap();
        assert_eq!(rule.kind, RuleKind::Custom);

        let rule: ValidationRule =
            serde_json::from_value(json!({"type": "minLength", "value": 3})).unwrap();
        assert_eq!(rule.kind, RuleKind::MinLength);
        assert_eq!(serde_json::to_value(&rule).unwrap()["type"], "minLength");

        let cond: Condition = serde_json::from_value(
            json!({"field": "status", "operator": "greaterThanOrEqual", "value": 2}),
        )
        .unwrap();
        assert_eq!(cond.operator, Operator::GreaterThanOrEqual);
    }

    #[test]
    fn test_display_order_sorts_unset_last_then_by_name() {
        let mut a = StandardizedField::new("1", "alpha", "A", FieldType::Text, FieldCategory::Client);
        let mut b = StandardizedField::new("2", "beta", "B", FieldType::Text, FieldCategory::Client);
        let c = StandardizedField::new("3", "gamma", "C", FieldType::Text, FieldCategory::Client);
        let mut d = StandardizedField::new("4", "delta", "D", FieldType::Text, FieldCategory::Client);
        a.display_order = Some(2);
        b.display_order = Some(1);
        d.display_order = Some(2);

        let mut fields = vec![c, a, d, b];
        sort_for_display(&mut fields);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["beta", "alpha", "delta", "gamma"]);
    }

    #[test]
    fn test_choices_from_options() {
        let mut field =
            StandardizedField::new("1", "marital", "Marital", FieldType::Select, FieldCategory::Client);
        assert_eq!(field.choices(), None);

        field.options = json!({"choices": ["single", {"value": "married", "label": "Married"}]})
            .as_object()
            .cloned();
        assert_eq!(field.choices().unwrap(), ["single", "married"]);

        field.options = json!({"yes": "Yes", "no": "No"}).as_object().cloned();
        assert_eq!(field.choices().unwrap(), ["no", "yes"]);
    }

    #[test]
    fn test_patch_serializes_only_set_members() {
        let patch = StandardizedFieldPatch::display_order(3);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"display_order": 3}));
    }
}
