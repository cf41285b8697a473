use crate::features::world::PdfdeskWorld;
use cucumber::{gherkin::Step, given, then, when};
use http::Method;
use pdfdesk_core::registry::templates::TEMPLATES_PATH;
use pdfdesk_core::registry::FieldMappingLayer;
use pdfdesk_core::testing::MockReply;
use pdfdesk_core::validation::FieldMappingForm;
use serde_json::{json, Value};

fn mappings_path(template_id: &str) -> String {
    format!("{}{}/field-mappings/", TEMPLATES_PATH, template_id)
}

/// Table of `| id | pdf_field_name | system_field_name |` rows
#[given(expr = "template {string} maps")]
async fn given_mappings(world: &mut PdfdeskWorld, template_id: String, step: &Step) {
    let table = step.table.as_ref().expect("Step needs a table");
    let mappings: Vec<Value> = table
        .rows
        .iter()
        .skip(1)
        .map(|row| json!({"id": row[0], "pdf_field_name": row[1], "system_field_name": row[2]}))
        .collect();
    let path = mappings_path(&template_id);
    world.backend.on(Method::GET, &path, MockReply::json(200, json!(mappings)));
    world.backend.on_fn(Method::POST, &path, |request, _| {
        let mut body = request.json_body().cloned().unwrap_or_else(|| json!({}));
        body["id"] = json!(99);
        MockReply::json(201, body)
    });
}

#[given(expr = "the backend reports for template {string}")]
async fn given_validation_result(world: &mut PdfdeskWorld, template_id: String, step: &Step) {
    let body: Value = serde_json::from_str(step.docstring.as_deref().expect("Step needs a docstring"))
        .expect("Docstring must be JSON");
    let path = format!("{}validate-mappings/", mappings_path(&template_id));
    world.backend.on(Method::POST, &path, MockReply::json(200, body));
}

#[when(expr = "I map PDF field {string} of template {string} to {string}")]
async fn when_create_mapping(world: &mut PdfdeskWorld, pdf_field: String, template_id: String, system_field: String) {
    let layer = FieldMappingLayer::new(world.client().await);
    let form = FieldMappingForm {
        pdf_field_name: pdf_field,
        system_field_name: system_field,
        field_type: "text".into(),
        ..FieldMappingForm::default()
    };
    let result = layer.create(&template_id, &form).await;
    world.remember(result);
}

#[then(expr = "the mapping is created")]
async fn then_mapping_created(world: &mut PdfdeskWorld) {
    assert!(world.last_error.is_none(), "Mapping failed: {:?}", world.last_error);
}

#[then(expr = "validating template {string} reports {string} against mapping {string}")]
async fn then_error_for_mapping(world: &mut PdfdeskWorld, template_id: String, message: String, key: String) {
    let layer = FieldMappingLayer::new(world.client().await);
    let report = layer.validate(&template_id).await.expect("Validation request failed");
    assert!(!report.valid);
    assert_eq!(report.errors.get(&key), [message]);
}

#[then(expr = "validating template {string} reports the general error {string}")]
async fn then_general_error(world: &mut PdfdeskWorld, template_id: String, message: String) {
    let layer = FieldMappingLayer::new(world.client().await);
    let report = layer.validate(&template_id).await.expect("Validation request failed");
    assert!(report.general.contains(&message), "General errors were {:?}", report.general);
}
