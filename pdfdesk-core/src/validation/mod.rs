//! Client-side validation
//!
//! Every create/update path validates before a request is issued. Raw form
//! input (`*Form` structs, enumerations as strings) is parsed into the typed
//! payloads in [`crate::model`], or rejected with [`FieldErrors`].
//!
//! [`FieldSchema`] validates client extension values against the field
//! registry: type shapes, gated validation rules and `depends_on`
//! relationships.

pub mod forms;
pub mod record;
pub mod rules;

pub use forms::{
    BrokerCompanyForm, CategoryForm, FieldMappingForm, FormSetForm, StandardizedFieldForm,
    TemplateForm, UserForm,
};
pub use record::FieldSchema;
pub use rules::{check_rule, check_type, condition_holds};

use crate::error::FieldErrors;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()\-]{7,20}$").expect("phone pattern compiles"));

/// Types a payload can be validated into
pub trait Validate {
    type Output;

    fn validate(&self) -> Result<Self::Output, FieldErrors>;
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

pub fn is_valid_phone(value: &str) -> bool {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    PHONE.is_match(value.trim()) && digits >= 7
}

pub fn is_valid_url(value: &str) -> bool {
    reqwest::Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Null, empty/whitespace string, empty array or empty object
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Record `message` under `field` when `value` is blank
pub(crate) fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_checks() {
        assert!(is_valid_email("broker@example.com"));
        assert!(!is_valid_email("broker@example"));
        assert!(!is_valid_email("two words@example.com"));

        assert!(is_valid_phone("+852 9123 4567"));
        assert!(!is_valid_phone("12-34"));

        assert!(is_valid_url("https://example.com/a?b=c"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("example.com"));
    }

    #[test]
    fn test_blank_values() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
    }
}
