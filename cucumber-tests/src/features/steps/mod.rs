// Shared request assertions
pub mod common_steps;

pub mod field_steps;
pub mod form_set_steps;
pub mod mapping_steps;
pub mod ordering_steps;
pub mod template_steps;
pub mod workflow_steps;
