use crate::features::world::PdfdeskWorld;
use cucumber::then;
use pdfdesk_core::error::ApiError;

#[then(expr = "no request reaches the backend")]
async fn then_no_request(world: &mut PdfdeskWorld) {
    let sent = world.backend.requests();
    assert!(sent.is_empty(), "Expected no request, got {:?}", sent);
}

#[then(expr = "no write reaches the backend")]
async fn then_no_write(world: &mut PdfdeskWorld) {
    assert_eq!(world.backend.write_count(), 0);
}

#[then(expr = "{int} {word} request(s) is/are sent to {string}")]
async fn then_requests_sent(world: &mut PdfdeskWorld, expected: usize, method: String, path: String) {
    assert_eq!(world.count(&method, &path), expected, "{} {}", method, path);
}

#[then(expr = "the notice {string} is shown")]
async fn then_notice_shown(world: &mut PdfdeskWorld, message: String) {
    let messages = world.notifier.messages();
    assert!(messages.contains(&message), "Notices were {:?}", messages);
}

#[then(expr = "the call fails with a validation error on {string}")]
async fn then_validation_error(world: &mut PdfdeskWorld, field: String) {
    match &world.last_error {
        Some(ApiError::Validation(errors)) => {
            assert!(errors.contains(&field), "Errors were {:?}", errors);
        }
        other => panic!("Expected a validation error, got {:?}", other),
    }
}

#[then(expr = "the validation message for {string} is {string}")]
async fn then_validation_message(world: &mut PdfdeskWorld, field: String, message: String) {
    let errors = world
        .last_error
        .as_ref()
        .and_then(ApiError::field_errors)
        .expect("No validation error recorded");
    assert_eq!(errors.get(&field), [message]);
}
