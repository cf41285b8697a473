use crate::features::world::{page, PdfdeskWorld};
use cucumber::{given, then, when};
use http::Method;
use pdfdesk_core::error::ApiError;
use pdfdesk_core::notify::{AlwaysConfirm, NeverConfirm};
use pdfdesk_core::registry::templates::TEMPLATES_PATH;
use pdfdesk_core::registry::{TemplateBoard, TemplateFilter, TemplateRegistry};
use pdfdesk_core::testing::MockReply;
use serde_json::json;

fn template_path(id: &str) -> String {
    format!("{}{}/", TEMPLATES_PATH, id)
}

fn deletable_path(id: &str) -> String {
    format!("{}check_deletable/", template_path(id))
}

#[given(expr = "the template list holds {string}")]
async fn given_template_list(world: &mut PdfdeskWorld, ids: String) {
    let templates = ids
        .split(',')
        .map(str::trim)
        .map(|id| json!({"id": id, "name": format!("Template {}", id), "category": "broker", "version": "1"}))
        .collect();
    world.backend.on(Method::GET, TEMPLATES_PATH, MockReply::json(200, page(templates)));
}

#[given(expr = "template {string} is deletable")]
async fn given_deletable(world: &mut PdfdeskWorld, id: String) {
    world.backend.on(Method::GET, &deletable_path(&id), MockReply::json(200, json!({"deletable": true})));
    world.backend.on(Method::DELETE, &template_path(&id), MockReply::status(204));
}

#[given(expr = "template {string} is used by a form set")]
async fn given_in_use(world: &mut PdfdeskWorld, id: String) {
    world.backend.on(Method::GET, &deletable_path(&id), MockReply::json(200, json!({"deletable": false})));
}

#[given(expr = "the deletable check for template {string} fails")]
async fn given_check_fails(world: &mut PdfdeskWorld, id: String) {
    world.backend.on(Method::GET, &deletable_path(&id), MockReply::network_error("connection reset"));
}

#[given(expr = "the template list is loaded")]
async fn given_board_loaded(world: &mut PdfdeskWorld) {
    let mut board = TemplateBoard::new(TemplateRegistry::new(world.client().await));
    board.load(&TemplateFilter::default()).await.expect("Failed to load templates");
    world.board = Some(board);
    world.backend.reset_log();
}

#[when(expr = "I delete template {string} from the list")]
async fn when_board_delete(world: &mut PdfdeskWorld, id: String) {
    let result = world.board().delete(&id, &AlwaysConfirm).await;
    world.remember(result);
}

#[when(expr = "I delete template {string} and decline the confirmation")]
async fn when_delete_declined(world: &mut PdfdeskWorld, id: String) {
    let registry = TemplateRegistry::new(world.client().await);
    let result = registry.delete(&id, &NeverConfirm).await;
    world.remember(result);
}

#[then(expr = "the delete action for template {string} is enabled")]
async fn then_delete_enabled(world: &mut PdfdeskWorld, id: String) {
    assert!(world.board().can_delete(&id));
}

#[then(expr = "the delete action for template {string} is disabled")]
async fn then_delete_disabled(world: &mut PdfdeskWorld, id: String) {
    assert!(!world.board().can_delete(&id));
}

#[then(expr = "the delete is refused because the template is in use")]
async fn then_not_deletable(world: &mut PdfdeskWorld) {
    assert!(
        matches!(world.last_error, Some(ApiError::NotDeletable(_))),
        "Expected a not-deletable error, got {:?}",
        world.last_error
    );
}

#[then(expr = "the delete is cancelled")]
async fn then_cancelled(world: &mut PdfdeskWorld) {
    assert!(matches!(world.last_error, Some(ApiError::Cancelled)), "Got {:?}", world.last_error);
}

#[then(expr = "template {string} is no longer listed")]
async fn then_not_listed(world: &mut PdfdeskWorld, id: String) {
    assert!(world.board().templates().iter().all(|t| t.id != id));
}
