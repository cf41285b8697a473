//! Raw form input and its validation into request payloads

use super::{is_valid_email, require, Validate};
use crate::error::FieldErrors;
use crate::model::field::{
    FieldCategory, FieldType, NewFieldCategory, NewStandardizedField, RelationshipRule, RuleKind,
    StandardizedFieldPatch, ValidationRule,
};
use crate::model::form_set::{FormSetPatch, NewFormSet};
use crate::model::mapping::{FieldMappingPatch, NewFieldMapping};
use crate::model::template::{
    FormAffiliation, FormType, NewTemplate, PdfFile, TemplateCategory, TemplateMetadata,
    TemplatePatch,
};
use crate::model::user::{NewBrokerCompany, NewUser, Role, UserPatch};
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;

pub const MIN_PASSWORD_LENGTH: usize = 10;
const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Parse an enumeration chosen in a form; blank and unknown values both
/// yield `message`
fn parse_choice<T: FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    raw: &str,
    message: &str,
) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, message);
            None
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Standardized field editor input
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedFieldForm {
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub field_category: String,
    pub display_category: String,
    pub is_required: bool,
    pub field_definition: String,
    pub llm_guide: String,
    pub has_validation: bool,
    pub validation_rules: Vec<ValidationRule>,
    pub has_relationship: bool,
    pub relationship_rules: Vec<RelationshipRule>,
    pub options: Option<Map<String, Value>>,
    pub metadata: Option<Map<String, Value>>,
    pub display_order: Option<i64>,
    pub is_active: bool,
}

impl Default for StandardizedFieldForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            label: String::new(),
            field_type: String::new(),
            field_category: String::new(),
            display_category: String::new(),
            is_required: false,
            field_definition: String::new(),
            llm_guide: String::new(),
            has_validation: false,
            validation_rules: Vec::new(),
            has_relationship: false,
            relationship_rules: Vec::new(),
            options: None,
            metadata: None,
            display_order: None,
            is_active: true,
        }
    }
}

impl StandardizedFieldForm {
    /// Validate for an update; the editor always submits every member
    pub fn validate_update(&self) -> Result<StandardizedFieldPatch, FieldErrors> {
        let field = self.validate()?;
        Ok(StandardizedFieldPatch {
            name: Some(field.name),
            label: Some(field.label),
            field_type: Some(field.field_type),
            field_category: Some(field.field_category),
            display_category: field.display_category,
            is_required: Some(field.is_required),
            field_definition: field.field_definition,
            llm_guide: field.llm_guide,
            has_validation: Some(field.has_validation),
            validation_rules: Some(field.validation_rules),
            has_relationship: Some(field.has_relationship),
            relationship_rules: Some(field.relationship_rules),
            options: field.options,
            metadata: field.metadata,
            display_order: field.display_order,
            is_active: Some(field.is_active),
        })
    }

    fn check_rules(&self, errors: &mut FieldErrors) {
        if self.has_validation {
            for (i, rule) in self.validation_rules.iter().enumerate() {
                if rule.kind != RuleKind::Pattern {
                    continue;
                }
                let valid = rule
                    .value
                    .as_ref()
                    .and_then(Value::as_str)
                    .is_some_and(|pattern| Regex::new(pattern).is_ok());
                if !valid {
                    errors.add(format!("validation_rules.{}.value", i), "Invalid pattern");
                }
            }
        }
        if self.has_relationship {
            for (i, rule) in self.relationship_rules.iter().enumerate() {
                if rule.target_field.trim().is_empty() {
                    errors.add(format!("relationship_rules.{}.target_field", i), "Target field is required");
                }
            }
        }
    }
}

impl Validate for StandardizedFieldForm {
    type Output = NewStandardizedField;

    fn validate(&self) -> Result<NewStandardizedField, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require(&mut errors, "label", &self.label, "Label is required");
        let field_type: Option<FieldType> =
            parse_choice(&mut errors, "field_type", &self.field_type, "Field type is required");
        let field_category: Option<FieldCategory> = parse_choice(
            &mut errors,
            "field_category",
            &self.field_category,
            "Field category is required",
        );
        require(&mut errors, "display_category", &self.display_category, "Display category is required");
        self.check_rules(&mut errors);

        match (field_type, field_category) {
            (Some(field_type), Some(field_category)) if errors.is_empty() => Ok(NewStandardizedField {
                name: self.name.trim().to_string(),
                label: self.label.trim().to_string(),
                field_type,
                field_category,
                display_category: optional(&self.display_category),
                is_required: self.is_required,
                field_definition: optional(&self.field_definition),
                llm_guide: optional(&self.llm_guide),
                has_validation: self.has_validation,
                validation_rules: self.validation_rules.clone(),
                has_relationship: self.has_relationship,
                relationship_rules: self.relationship_rules.clone(),
                options: self.options.clone(),
                metadata: self.metadata.clone(),
                display_order: self.display_order,
                is_active: self.is_active,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
}

impl Validate for CategoryForm {
    type Output = NewFieldCategory;

    fn validate(&self) -> Result<NewFieldCategory, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        errors.into_result()?;
        Ok(NewFieldCategory {
            name: self.name.trim().to_string(),
            description: optional(&self.description),
        })
    }
}

/// Field mapping editor input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMappingForm {
    pub pdf_field_name: String,
    pub system_field_name: String,
    pub standardized_field_id: Option<String>,
    pub field_type: String,
    pub validation_rules: Option<Value>,
    pub transformation_rules: Option<Value>,
    pub field_definition_override: String,
}

impl FieldMappingForm {
    pub fn validate_update(&self) -> Result<FieldMappingPatch, FieldErrors> {
        let mapping = self.validate()?;
        Ok(FieldMappingPatch {
            pdf_field_name: Some(mapping.pdf_field_name),
            system_field_name: Some(mapping.system_field_name),
            standardized_field_id: mapping.standardized_field_id,
            field_type: Some(mapping.field_type),
            validation_rules: mapping.validation_rules,
            transformation_rules: mapping.transformation_rules,
            field_definition_override: mapping.field_definition_override,
        })
    }
}

impl Validate for FieldMappingForm {
    type Output = NewFieldMapping;

    fn validate(&self) -> Result<NewFieldMapping, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "pdf_field_name", &self.pdf_field_name, "PDF field name is required");
        require(
            &mut errors,
            "system_field_name",
            &self.system_field_name,
            "System field name is required",
        );
        let field_type: Option<FieldType> =
            parse_choice(&mut errors, "field_type", &self.field_type, "Field type is required");

        match field_type {
            Some(field_type) if errors.is_empty() => Ok(NewFieldMapping {
                pdf_field_name: self.pdf_field_name.trim().to_string(),
                system_field_name: self.system_field_name.trim().to_string(),
                standardized_field_id: self.standardized_field_id.as_deref().and_then(optional),
                field_type,
                validation_rules: self.validation_rules.clone(),
                transformation_rules: self.transformation_rules.clone(),
                field_definition_override: optional(&self.field_definition_override),
            }),
            _ => Err(errors),
        }
    }
}

/// Template upload/edit input
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub form_type: String,
    pub form_affiliation: String,
    pub version: String,
    pub is_active: bool,
    pub file: Option<PdfFile>,
}

impl Default for TemplateForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: String::new(),
            form_type: String::new(),
            form_affiliation: String::new(),
            version: String::new(),
            is_active: true,
            file: None,
        }
    }
}

impl TemplateForm {
    fn metadata(&self, errors: &mut FieldErrors) -> Option<TemplateMetadata> {
        require(errors, "name", &self.name, "Template name is required");
        require(errors, "description", &self.description, "Description is required");
        let category: Option<TemplateCategory> =
            parse_choice(errors, "category", &self.category, "Category is required");
        require(errors, "version", &self.version, "Version is required");
        let form_type: Option<FormType> =
            parse_choice(errors, "form_type", &self.form_type, "Form type is required");
        let form_affiliation: Option<FormAffiliation> = parse_choice(
            errors,
            "form_affiliation",
            &self.form_affiliation,
            "Form affiliation is required",
        );

        Some(TemplateMetadata {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: category?,
            form_type: form_type?,
            form_affiliation: form_affiliation?,
            version: self.version.trim().to_string(),
            is_active: self.is_active,
        })
    }

    fn check_file(file: &PdfFile, errors: &mut FieldErrors) {
        if file.is_empty() {
            errors.add("file", "PDF file is required");
        } else if !file.file_name.to_ascii_lowercase().ends_with(".pdf") {
            errors.add("file", "Only PDF files are allowed");
        }
    }

    /// Validate for an update: the PDF is optional, a supplied one must
    /// still be a non-empty PDF
    pub fn validate_for_update(&self) -> Result<TemplatePatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let metadata = self.metadata(&mut errors);
        if let Some(file) = &self.file {
            Self::check_file(file, &mut errors);
        }
        match metadata {
            Some(metadata) if errors.is_empty() => {
                Ok(TemplatePatch { file: self.file.clone(), ..TemplatePatch::from(metadata) })
            }
            _ => Err(errors),
        }
    }
}

impl Validate for TemplateForm {
    type Output = NewTemplate;

    fn validate(&self) -> Result<NewTemplate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let metadata = self.metadata(&mut errors);
        match &self.file {
            Some(file) => Self::check_file(file, &mut errors),
            None => errors.add("file", "PDF file is required"),
        }
        match (metadata, &self.file) {
            (Some(metadata), Some(file)) if errors.is_empty() => {
                Ok(NewTemplate { metadata, file: file.clone() })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSetForm {
    pub name: String,
    pub description: String,
    pub template_ids: Vec<String>,
}

fn require_templates(errors: &mut FieldErrors, ids: &[String]) {
    if ids.iter().all(|id| id.trim().is_empty()) {
        errors.add("template_ids", "At least one template is required");
    }
}

impl Validate for FormSetForm {
    type Output = NewFormSet;

    fn validate(&self) -> Result<NewFormSet, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require_templates(&mut errors, &self.template_ids);
        errors.into_result()?;
        Ok(NewFormSet {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            template_ids: self.template_ids.iter().filter_map(|id| optional(id)).collect(),
        })
    }
}

impl Validate for FormSetPatch {
    type Output = FormSetPatch;

    /// Members that are supplied must satisfy the create rules
    fn validate(&self) -> Result<FormSetPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            require(&mut errors, "name", name, "Name is required");
        }
        if let Some(ids) = &self.template_ids {
            require_templates(&mut errors, ids);
        }
        errors.into_result()?;
        Ok(self.clone())
    }
}

/// Account creation input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserForm {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub broker_company: String,
    pub tr_name: String,
    pub tr_license_number: String,
    pub tr_phone_number: String,
}

/// Password policy: minimum length plus lower, upper, digit and special
pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.is_empty() {
        errors.add(field, "Password is required");
        return;
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(field, format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH));
    }
    let strong = password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !strong {
        errors.add(
            field,
            "Password must contain at least one uppercase letter, one lowercase letter, one number and one special character",
        );
    }
}

impl UserForm {
    fn names(&self, errors: &mut FieldErrors) {
        require(errors, "first_name", &self.first_name, "First name is required");
        require(errors, "last_name", &self.last_name, "Last name is required");
    }

    /// Validate the edit form, which has no email, role or password
    pub fn validate_update(&self) -> Result<UserPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        self.names(&mut errors);
        errors.into_result()?;
        Ok(UserPatch {
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            broker_company: optional(&self.broker_company),
            tr_name: optional(&self.tr_name),
            tr_license_number: optional(&self.tr_license_number),
            tr_phone_number: optional(&self.tr_phone_number),
            is_active: None,
        })
    }
}

impl Validate for UserForm {
    type Output = NewUser;

    fn validate(&self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Invalid email");
        }
        check_password(&mut errors, "password", &self.password);
        if self.password != self.password2 {
            errors.add("password2", "Passwords must match");
        }
        self.names(&mut errors);
        let role: Option<Role> = parse_choice(&mut errors, "role", &self.role, "Role is required");
        require(&mut errors, "broker_company", &self.broker_company, "Broker company is required");

        match role {
            Some(role) if errors.is_empty() => Ok(NewUser {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
                password2: self.password2.clone(),
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                role,
                broker_company: self.broker_company.trim().to_string(),
                tr_name: optional(&self.tr_name),
                tr_license_number: optional(&self.tr_license_number),
                tr_phone_number: optional(&self.tr_phone_number),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrokerCompanyForm {
    pub name: String,
    pub ia_reg_code: String,
    pub mpfa_reg_code: String,
    pub phone_number: String,
    pub address: String,
    pub responsible_officer_email: String,
    pub contact_email: String,
}

impl Validate for BrokerCompanyForm {
    type Output = NewBrokerCompany;

    fn validate(&self) -> Result<NewBrokerCompany, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Company name is required");
        require(&mut errors, "ia_reg_code", &self.ia_reg_code, "IA registration code is required");
        for (field, email) in [
            ("responsible_officer_email", &self.responsible_officer_email),
            ("contact_email", &self.contact_email),
        ] {
            if !email.trim().is_empty() && !is_valid_email(email) {
                errors.add(field, "Invalid email");
            }
        }
        errors.into_result()?;
        Ok(NewBrokerCompany {
            name: self.name.trim().to_string(),
            ia_reg_code: self.ia_reg_code.trim().to_string(),
            mpfa_reg_code: self.mpfa_reg_code.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            address: self.address.trim().to_string(),
            responsible_officer_email: self.responsible_officer_email.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_form() -> StandardizedFieldForm {
        StandardizedFieldForm {
            name: "client_email".into(),
            label: "Email".into(),
            field_type: "email".into(),
            field_category: "client".into(),
            display_category: "Contact".into(),
            ..StandardizedFieldForm::default()
        }
    }

    #[test]
    fn test_field_form_parses_enumerations() {
        let field = field_form().validate().unwrap();
        assert_eq!(field.field_type, FieldType::Email);
        assert_eq!(field.field_category, FieldCategory::Client);
        assert_eq!(field.display_category.as_deref(), Some("Contact"));
        assert!(field.is_active);
    }

    #[test]
    fn test_unknown_field_type_reads_as_missing() {
        let form = StandardizedFieldForm { field_type: "bogus".into(), ..field_form() };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("field_type"), ["Field type is required"]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_field_form_reports_every_missing_member() {
        let errors = StandardizedFieldForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), ["Name is required"]);
        assert_eq!(errors.get("label"), ["Label is required"]);
        assert_eq!(errors.get("field_type"), ["Field type is required"]);
        assert_eq!(errors.get("field_category"), ["Field category is required"]);
        assert_eq!(errors.get("display_category"), ["Display category is required"]);
    }

    #[test]
    fn test_invalid_pattern_rule() {
        let form = StandardizedFieldForm {
            has_validation: true,
            validation_rules: vec![ValidationRule::new(RuleKind::Pattern, Some(json!("([")), "")],
            ..field_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("validation_rules.0.value"), ["Invalid pattern"]);

        // Rules are ignored while validation is switched off
        let form = StandardizedFieldForm { has_validation: false, ..form };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_mapping_form() {
        let errors = FieldMappingForm::default().validate().unwrap_err();
        assert_eq!(errors.get("pdf_field_name"), ["PDF field name is required"]);
        assert_eq!(errors.get("system_field_name"), ["System field name is required"]);
        assert_eq!(errors.get("field_type"), ["Field type is required"]);

        let mapping = FieldMappingForm {
            pdf_field_name: "Text1".into(),
            system_field_name: "first_name".into(),
            standardized_field_id: Some(" ".into()),
            field_type: "text".into(),
            ..FieldMappingForm::default()
        }
        .validate()
        .unwrap();
        assert_eq!(mapping.standardized_field_id, None);
    }

    fn template_form() -> TemplateForm {
        TemplateForm {
            name: "FNA".into(),
            description: "Financial needs analysis".into(),
            category: "boclife".into(),
            form_type: "fna".into(),
            form_affiliation: "insurance".into(),
            version: "2024.1".into(),
            file: Some(PdfFile::new("fna.pdf", b"%PDF-1.7".to_vec())),
            ..TemplateForm::default()
        }
    }

    #[test]
    fn test_template_file_required_on_create_only() {
        let form = TemplateForm { file: None, ..template_form() };
        assert_eq!(form.validate().unwrap_err().get("file"), ["PDF file is required"]);

        let patch = form.validate_for_update().unwrap();
        assert_eq!(patch.name.as_deref(), Some("FNA"));
        assert!(patch.file.is_none());

        let form = TemplateForm { file: Some(PdfFile::new("fna.docx", b"x".to_vec())), ..template_form() };
        assert_eq!(form.validate_for_update().unwrap_err().get("file"), ["Only PDF files are allowed"]);
    }

    #[test]
    fn test_template_metadata_messages() {
        let errors = TemplateForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), ["Template name is required"]);
        assert_eq!(errors.get("description"), ["Description is required"]);
        assert_eq!(errors.get("category"), ["Category is required"]);
        assert_eq!(errors.get("version"), ["Version is required"]);
        assert_eq!(errors.get("form_type"), ["Form type is required"]);
        assert_eq!(errors.get("form_affiliation"), ["Form affiliation is required"]);
        assert_eq!(errors.get("file"), ["PDF file is required"]);
    }

    #[test]
    fn test_form_set_needs_a_template() {
        let form = FormSetForm { name: "Onboarding".into(), ..FormSetForm::default() };
        assert_eq!(
            form.validate().unwrap_err().get("template_ids"),
            ["At least one template is required"]
        );

        let patch = FormSetPatch { template_ids: Some(vec![]), ..FormSetPatch::default() };
        assert!(patch.validate().is_err());
        let patch = FormSetPatch { description: Some("x".into()), ..FormSetPatch::default() };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_user_form_password_policy() {
        let form = UserForm {
            email: "new@broker.hk".into(),
            password: "Str0ng!Pass".into(),
            password2: "Str0ng!Pass".into(),
            first_name: "Mei".into(),
            last_name: "Chan".into(),
            role: "standard".into(),
            broker_company: "IA001".into(),
            ..UserForm::default()
        };
        let user = form.validate().unwrap();
        assert_eq!(user.role, Role::Standard);
        assert_eq!(user.tr_name, None);

        let weak = UserForm { password: "weakpass".into(), password2: "other".into(), ..form.clone() };
        let errors = weak.validate().unwrap_err();
        assert_eq!(errors.get("password").len(), 2);
        assert_eq!(errors.get("password2"), ["Passwords must match"]);

        let bad_email = UserForm { email: "nope".into(), ..form };
        assert_eq!(bad_email.validate().unwrap_err().get("email"), ["Invalid email"]);
    }

    #[test]
    fn test_broker_company_form() {
        let errors = BrokerCompanyForm::default().validate().unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("ia_reg_code"));

        let form = BrokerCompanyForm {
            name: "Harbour Brokers".into(),
            ia_reg_code: "FB1234".into(),
            contact_email: "bad".into(),
            ..BrokerCompanyForm::default()
        };
        assert_eq!(form.validate().unwrap_err().get("contact_email"), ["Invalid email"]);
    }
}
