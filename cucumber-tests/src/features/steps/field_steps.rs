use crate::features::world::{field_json, PdfdeskWorld};
use cucumber::{gherkin::Step, given, then, when};
use http::Method;
use pdfdesk_core::error::ApiError;
use pdfdesk_core::model::field::StandardizedField;
use pdfdesk_core::notify::AlwaysConfirm;
use pdfdesk_core::registry::fields::FIELDS_PATH;
use pdfdesk_core::registry::FieldRegistry;
use pdfdesk_core::testing::MockReply;
use pdfdesk_core::validation::StandardizedFieldForm;

/// Form built from a `| member | value |` table
fn field_form(step: &Step) -> StandardizedFieldForm {
    let mut form = StandardizedFieldForm::default();
    let table = step.table.as_ref().expect("Step needs a table");
    for row in &table.rows {
        let value = row[1].clone();
        match row[0].as_str() {
            "name" => form.name = value,
            "label" => form.label = value,
            "field_type" => form.field_type = value,
            "field_category" => form.field_category = value,
            "display_category" => form.display_category = value,
            "is_required" => form.is_required = value == "true",
            other => panic!("Unknown field member {}", other),
        }
    }
    form
}

#[given(expr = "the backend accepts new standardized fields")]
async fn given_backend_accepts_fields(world: &mut PdfdeskWorld) {
    world.backend.on(
        Method::POST,
        FIELDS_PATH,
        MockReply::json(201, field_json("41", "client_email", "Contact", 1)),
    );
}

#[when(expr = "I create a standardized field with")]
async fn when_create_field(world: &mut PdfdeskWorld, step: &Step) {
    let registry = FieldRegistry::new(world.client().await);
    let result = registry.create(&field_form(step)).await;
    world.remember(result);
}

#[when(expr = "I delete the system field {string}")]
async fn when_delete_system_field(world: &mut PdfdeskWorld, name: String) {
    let registry = FieldRegistry::new(world.client().await);
    let mut field: StandardizedField =
        serde_json::from_value(field_json("9", &name, "Personal", 1)).expect("Invalid field fixture");
    field.is_system = true;
    let result = registry.delete(&field, &AlwaysConfirm).await;
    world.remember(result);
}

#[then(expr = "the field is created")]
async fn then_field_created(world: &mut PdfdeskWorld) {
    assert!(world.last_error.is_none(), "Creation failed: {:?}", world.last_error);
}

#[then(expr = "the call is refused as forbidden")]
async fn then_forbidden(world: &mut PdfdeskWorld) {
    assert!(
        matches!(world.last_error, Some(ApiError::Forbidden(_))),
        "Expected a forbidden error, got {:?}",
        world.last_error
    );
}
