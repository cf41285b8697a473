use crate::features::world::PdfdeskWorld;
use cucumber::{given, when};
use http::Method;
use pdfdesk_core::model::form_set::FormSetPatch;
use pdfdesk_core::registry::form_sets::FORM_SETS_PATH;
use pdfdesk_core::registry::FormSetComposer;
use pdfdesk_core::testing::MockReply;
use pdfdesk_core::validation::FormSetForm;
use serde_json::json;

fn template_ids(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[given(expr = "the backend stores form sets")]
async fn given_backend_stores_form_sets(world: &mut PdfdeskWorld) {
    world.backend.on_fn(Method::POST, FORM_SETS_PATH, |request, _| {
        let sent = request.json_body().cloned().unwrap_or_else(|| json!({}));
        let templates: Vec<_> = sent["template_ids"]
            .as_array()
            .map(|ids| {
                ids.iter().map(|id| json!({"id": id, "name": format!("Template {}", id), "category": "broker"})).collect()
            })
            .unwrap_or_default();
        MockReply::json(201, json!({"id": 8, "name": sent["name"], "templates": templates}))
    });
}

#[when(expr = "I create the form set {string} with templates {string}")]
async fn when_create_form_set(world: &mut PdfdeskWorld, name: String, templates: String) {
    let composer = FormSetComposer::new(world.client().await);
    let form = FormSetForm { name, description: String::new(), template_ids: template_ids(&templates) };
    let result = composer.create(&form).await;
    world.remember(result);
}

#[when(expr = "I create the form set {string} without templates")]
async fn when_create_empty_form_set(world: &mut PdfdeskWorld, name: String) {
    when_create_form_set(world, name, String::new()).await;
}

#[when(expr = "I remove every template from form set {string}")]
async fn when_empty_form_set(world: &mut PdfdeskWorld, id: String) {
    let composer = FormSetComposer::new(world.client().await);
    let patch = FormSetPatch { template_ids: Some(Vec::new()), ..FormSetPatch::default() };
    let result = composer.update(&id, &patch).await;
    world.remember(result);
}
