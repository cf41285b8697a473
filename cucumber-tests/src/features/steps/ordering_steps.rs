use crate::features::world::{field_json, page, PdfdeskWorld};
use cucumber::{gherkin::Step, given, then, when};
use http::Method;
use pdfdesk_core::ordering::{DisplayOrderManager, ReorderOutcome};
use pdfdesk_core::registry::fields::FIELDS_PATH;
use pdfdesk_core::registry::FieldRegistry;
use pdfdesk_core::testing::MockReply;
use serde_json::{json, Value};

fn field_path(id: &str) -> String {
    format!("{}{}/", FIELDS_PATH, id)
}

// ==================== BACKGROUND ====================

/// Table of `| id | name | display_order |` rows, listed in that order
#[given(expr = "the display category {string} holds")]
async fn given_category_fields(world: &mut PdfdeskWorld, category: String, step: &Step) {
    let table = step.table.as_ref().expect("Step needs a table");
    let fields: Vec<Value> = table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let order: i64 = row[2].parse().expect("display_order must be a number");
            field_json(&row[0], &row[1], &category, order)
        })
        .collect();

    world.backend.on(Method::GET, FIELDS_PATH, MockReply::json(200, page(fields.clone())));
    for field in &fields {
        let id = field["id"].as_str().unwrap_or_default().to_string();
        let echo = field.clone();
        world.backend.on_fn(Method::PATCH, &field_path(&id), move |request, _| {
            let mut body = echo.clone();
            if let Some(order) = request.json_body().and_then(|b| b.get("display_order")) {
                body["display_order"] = order.clone();
            }
            MockReply::json(200, body)
        });
    }
}

#[given(expr = "the backend fails display order writes for field {string}")]
async fn given_write_fails(world: &mut PdfdeskWorld, id: String) {
    world.backend.on(Method::PATCH, &field_path(&id), MockReply::json(500, json!({"detail": "boom"})));
}

#[given(expr = "I open the display category {string}")]
async fn given_open_category(world: &mut PdfdeskWorld, category: String) {
    let mut manager = DisplayOrderManager::new(FieldRegistry::new(world.client().await), world.notifier.clone());
    manager.select_category(&category).await.expect("Failed to load category");
    world.ordering = Some(manager);
    world.backend.reset_log();
}

// ==================== ACTIONS ====================

#[when(expr = "I move field {int} up")]
async fn when_move_up(world: &mut PdfdeskWorld, position: usize) {
    let result = world.ordering().move_up(position - 1).await;
    world.last_outcome = world.remember(result);
}

#[when(expr = "I move field {int} down")]
async fn when_move_down(world: &mut PdfdeskWorld, position: usize) {
    let result = world.ordering().move_down(position - 1).await;
    world.last_outcome = world.remember(result);
}

#[when(expr = "I drag field {int} to position {int}")]
async fn when_drag(world: &mut PdfdeskWorld, from: usize, to: usize) {
    let result = world.ordering().move_to(from - 1, to - 1).await;
    world.last_outcome = world.remember(result);
}

// ==================== ASSERTIONS ====================

#[then(expr = "the fields are listed as {string}")]
async fn then_listed_as(world: &mut PdfdeskWorld, expected: String) {
    let names: Vec<String> = world.ordering().fields().iter().map(|f| f.name.clone()).collect();
    assert_eq!(names.join(", "), expected);
}

#[then(expr = "field {string} is saved with display order {int}")]
async fn then_saved_with_order(world: &mut PdfdeskWorld, id: String, order: i64) {
    let bodies = world.bodies("PATCH", &field_path(&id));
    assert_eq!(bodies, [json!({"display_order": order})], "Writes for field {}", id);
}

#[then(expr = "field {string} is not written")]
async fn then_not_written(world: &mut PdfdeskWorld, id: String) {
    assert_eq!(world.count("PATCH", &field_path(&id)), 0);
}

#[then(expr = "the reorder is a no-op")]
async fn then_noop(world: &mut PdfdeskWorld) {
    assert_eq!(world.last_outcome, Some(ReorderOutcome::Unchanged));
}

#[then(expr = "{int} display order write(s) is/are saved")]
async fn then_writes_saved(world: &mut PdfdeskWorld, writes: usize) {
    assert_eq!(world.last_outcome, Some(ReorderOutcome::Saved { writes }));
}

#[then(expr = "the category is reloaded from the registry")]
async fn then_resynced(world: &mut PdfdeskWorld) {
    assert!(
        matches!(world.last_outcome, Some(ReorderOutcome::Resynced { .. })),
        "Expected a resync, got {:?}",
        world.last_outcome
    );
    assert_eq!(world.count("GET", FIELDS_PATH), 1);
}
