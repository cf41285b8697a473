use crate::features::world::PdfdeskWorld;
use cucumber::{given, then, when};
use http::Method;
use pdfdesk_core::model::template::{Template, TemplateCategory};
use pdfdesk_core::quota::QuotaService;
use pdfdesk_core::registry::users::QUOTA_USAGE_PATH;
use pdfdesk_core::testing::MockReply;
use pdfdesk_core::workflow::{FormGenerationWorkflow, FormGenerator, WorkflowStep, BATCHES_PATH};
use serde_json::{json, Map};

// ==================== BACKGROUND ====================

#[given(expr = "the daily quota is {int} of {int} forms")]
async fn given_daily_quota(world: &mut PdfdeskWorld, used: u64, total: u64) {
    world.backend.on(
        Method::GET,
        QUOTA_USAGE_PATH,
        MockReply::json(200, json!({"daily_usage": used, "daily_quota": total, "has_daily_quota": true})),
    );
}

#[given(expr = "the form generation wizard is open for client {string}")]
async fn given_wizard_open(world: &mut PdfdeskWorld, client_id: String) {
    let client = world.client().await;
    let mut workflow = FormGenerationWorkflow::new(
        FormGenerator::new(client.clone()),
        QuotaService::new(client),
        world.notifier.clone(),
        client_id,
        Map::new(),
    );
    workflow.start().await;
    world.workflow = Some(workflow);
    world.backend.reset_log();
}

// ==================== BACKEND SCRIPTS ====================

#[given(expr = "the backend refuses form generation with status {int}")]
async fn given_generation_refused(world: &mut PdfdeskWorld, status: u16) {
    world.backend.on(
        Method::POST,
        BATCHES_PATH,
        MockReply::json(status, json!({"detail": "You have reached your daily limit."})),
    );
}

#[given(expr = "the backend generates batch {string} with {int} completed form(s)")]
async fn given_generation_succeeds(world: &mut PdfdeskWorld, batch_id: String, completed: u32) {
    let forms: Vec<_> = (1..=completed)
        .map(|i| json!({"id": i, "template_name": format!("Template {}", i), "status": "completed"}))
        .collect();
    world.backend.on(
        Method::POST,
        BATCHES_PATH,
        MockReply::json(201, json!({
            "id": batch_id,
            "status": "completed",
            "total_forms": completed,
            "completed_forms": completed,
            "failed_forms": 0,
            "forms": forms,
        })),
    );
}

// ==================== ACTIONS ====================

#[when(expr = "I select template {string}")]
async fn when_select_template(world: &mut PdfdeskWorld, template_id: String) {
    let name = format!("Template {}", template_id);
    world.workflow().toggle_template(Template::new(template_id, name, TemplateCategory::Broker));
}

#[when(expr = "I press next")]
async fn when_press_next(world: &mut PdfdeskWorld) {
    world.workflow().next().await;
}

#[when(expr = "I reset the wizard")]
async fn when_reset(world: &mut PdfdeskWorld) {
    world.workflow().reset();
}

// ==================== ASSERTIONS ====================

#[then(expr = "the wizard is on step {int}")]
async fn then_on_step(world: &mut PdfdeskWorld, index: usize) {
    assert_eq!(world.workflow().step().index(), index);
}

#[then(expr = "the wizard stays on step {int}")]
async fn then_stays_on_step(world: &mut PdfdeskWorld, index: usize) {
    then_on_step(world, index).await;
}

#[then(expr = "the wizard shows batch {string}")]
async fn then_shows_batch(world: &mut PdfdeskWorld, batch_id: String) {
    assert_eq!(world.workflow().step(), WorkflowStep::ReviewingResults);
    let batch = world.workflow().batch().expect("No batch after generation");
    assert_eq!(batch.id, batch_id);
}

#[then(expr = "no template is selected")]
async fn then_selection_empty(world: &mut PdfdeskWorld) {
    assert!(world.workflow().selected().is_empty());
    assert!(world.workflow().batch().is_none());
}
