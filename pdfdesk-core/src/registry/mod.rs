//! Resource services
//!
//! One service per backend collection. Every service wraps a cloned
//! [`ApiClient`](crate::api::ApiClient), validates input before issuing a
//! request and asks for confirmation before anything destructive.
//!
//! | Service | Collection |
//! |---------|------------|
//! | [`FieldRegistry`] | `forms/standardized-fields/` |
//! | [`CategoryRegistry`] | `forms/standardized-field-categories/` |
//! | [`TemplateRegistry`] | `forms/templates/` |
//! | [`FieldMappingLayer`] | `forms/templates/{id}/field-mappings/` |
//! | [`FormSetComposer`] | `form-sets/` |
//! | [`ClientStore`] | `clients/` |
//! | [`UserAdmin`] | `users/`, `users/broker-companies/` |

pub mod categories;
pub mod clients;
pub mod fields;
pub mod form_sets;
pub mod mappings;
pub mod templates;
pub mod users;

pub use categories::CategoryRegistry;
pub use clients::ClientStore;
pub use fields::{FieldFilter, FieldRegistry};
pub use form_sets::FormSetComposer;
pub use mappings::{FieldMappingLayer, MappingReport};
pub use templates::{Preview, TemplateBoard, TemplateFilter, TemplateRegistry};
pub use users::UserAdmin;

use crate::transport::segment;

/// `{base}/{id}/`
pub(crate) fn item_path(base: &str, id: &str) -> String {
    format!("{}/{}/", base.trim_end_matches('/'), segment(id))
}

/// `{base}/{id}/{action}/`
pub(crate) fn action_path(base: &str, id: &str, action: &str) -> String {
    format!("{}{}/", item_path(base, id), action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(item_path("forms/templates", "12"), "forms/templates/12/");
        assert_eq!(item_path("users/broker-companies/", "FB 1"), "users/broker-companies/FB%201/");
        assert_eq!(
            action_path("forms/templates", "12", "check_deletable"),
            "forms/templates/12/check_deletable/"
        );
    }
}
