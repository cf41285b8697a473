//! Display-order planning and persistence
//!
//! A move recomputes `display_order` locally as a contiguous `1..=N` sequence
//! and persists the affected fields with concurrent single-field updates.
//! Nothing is rolled back: if any update fails the category is re-fetched and
//! the local order replaced by what the registry holds.

use crate::model::field::{sort_for_display, StandardizedField};
use crate::notify::Notifier;
use crate::registry::FieldRegistry;
use crate::Result;
use futures::future::join_all;
use std::sync::Arc;

/// One `display_order` write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub id: String,
    pub display_order: i64,
}

/// New local order plus the writes needed to persist it
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    pub fields: Vec<StandardizedField>,
    pub updates: Vec<OrderUpdate>,
}

impl ReorderPlan {
    fn unchanged(fields: &[StandardizedField]) -> Self {
        Self { fields: fields.to_vec(), updates: Vec::new() }
    }

    pub fn is_noop(&self) -> bool {
        self.updates.is_empty()
    }
}

fn renumber(fields: &mut [StandardizedField]) {
    for (index, field) in fields.iter_mut().enumerate() {
        field.display_order = Some(index as i64 + 1);
    }
}

/// Move the field at `from` to `to`, shifting everything in between.
///
/// Every field whose `display_order` differs from its new position is
/// persisted. Moving a field onto its own index changes nothing. Returns
/// `None` when either index is out of range.
pub fn plan_move(fields: &[StandardizedField], from: usize, to: usize) -> Option<ReorderPlan> {
    if from >= fields.len() || to >= fields.len() {
        return None;
    }
    if from == to {
        return Some(ReorderPlan::unchanged(fields));
    }

    let mut reordered = fields.to_vec();
    let moved = reordered.remove(from);
    reordered.insert(to, moved);

    let before: Vec<Option<i64>> = reordered.iter().map(|f| f.display_order).collect();
    renumber(&mut reordered);

    let updates = reordered
        .iter()
        .zip(before)
        .filter(|(field, old)| field.display_order != *old)
        .filter_map(|(field, _)| {
            field.display_order.map(|order| OrderUpdate { id: field.id.clone(), display_order: order })
        })
        .collect();

    Some(ReorderPlan { fields: reordered, updates })
}

/// Swap the field at `index` with its neighbour at `index + 1`.
///
/// The local order is renumbered but only the two swapped fields are
/// persisted.
pub fn plan_swap(fields: &[StandardizedField], index: usize) -> Option<ReorderPlan> {
    let next = index.checked_add(1).filter(|n| *n < fields.len())?;

    let mut reordered = fields.to_vec();
    reordered.swap(index, next);
    renumber(&mut reordered);

    let updates = [index, next]
        .iter()
        .map(|&i| OrderUpdate { id: reordered[i].id.clone(), display_order: i as i64 + 1 })
        .collect();

    Some(ReorderPlan { fields: reordered, updates })
}

/// Result of persisting a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Nothing to persist
    Unchanged,
    /// Every write succeeded
    Saved { writes: usize },
    /// At least one write failed and the category was re-fetched
    Resynced { failed: usize },
}

/// Holds one display category's fields in display order and persists moves
pub struct DisplayOrderManager {
    registry: FieldRegistry,
    notifier: Arc<dyn Notifier>,
    category: Option<String>,
    fields: Vec<StandardizedField>,
}

impl DisplayOrderManager {
    pub fn new(registry: FieldRegistry, notifier: Arc<dyn Notifier>) -> Self {
        Self { registry, notifier, category: None, fields: Vec::new() }
    }

    /// Load `category` from the registry, replacing the local order
    pub async fn select_category(&mut self, category: &str) -> Result<&[StandardizedField]> {
        let fields = self.registry.list_by_category(category).await?;
        self.category = Some(category.to_string());
        self.fields = fields;
        Ok(&self.fields)
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn fields(&self) -> &[StandardizedField] {
        &self.fields
    }

    pub async fn move_up(&mut self, index: usize) -> Result<ReorderOutcome> {
        match index.checked_sub(1).and_then(|above| plan_swap(&self.fields, above)) {
            Some(plan) => self.apply(plan).await,
            None => Ok(ReorderOutcome::Unchanged),
        }
    }

    pub async fn move_down(&mut self, index: usize) -> Result<ReorderOutcome> {
        match plan_swap(&self.fields, index) {
            Some(plan) => self.apply(plan).await,
            None => Ok(ReorderOutcome::Unchanged),
        }
    }

    /// Drag the field at `from` to position `to`
    pub async fn move_to(&mut self, from: usize, to: usize) -> Result<ReorderOutcome> {
        match plan_move(&self.fields, from, to) {
            Some(plan) => self.apply(plan).await,
            None => Ok(ReorderOutcome::Unchanged),
        }
    }

    async fn apply(&mut self, plan: ReorderPlan) -> Result<ReorderOutcome> {
        if plan.is_noop() {
            return Ok(ReorderOutcome::Unchanged);
        }

        let ReorderPlan { fields, updates } = plan;
        let previous = std::mem::replace(&mut self.fields, fields);

        let results = join_all(
            updates.iter().map(|update| self.registry.reorder(&update.id, update.display_order)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        for (update, result) in updates.iter().zip(&results) {
            if let Err(err) = result {
                log::warn!("Display order write for field {} failed: {}", update.id, err);
            }
        }

        if failed == 0 {
            log::debug!("Persisted {} display order write(s)", updates.len());
            self.notifier.success("Display order updated");
            return Ok(ReorderOutcome::Saved { writes: updates.len() });
        }

        self.notifier.error("Failed to update display order");
        if let Err(err) = self.resync().await {
            // The registry could not be re-read; fall back to the order before the move
            self.fields = previous;
            return Err(err);
        }
        Ok(ReorderOutcome::Resynced { failed })
    }

    /// Replace the local order with the registry's
    pub async fn resync(&mut self) -> Result<()> {
        match self.category.clone() {
            Some(category) => {
                self.fields = self.registry.list_by_category(&category).await?;
            }
            None => sort_for_display(&mut self.fields),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::{FieldCategory, FieldType};
    use crate::notify::{RecordingNotifier, Severity};
    use crate::testing::{MockBackend, MockReply};
    use http::Method;
    use serde_json::{json, Value};

    fn field(id: &str, name: &str, order: Option<i64>) -> StandardizedField {
        let mut field = StandardizedField::new(id, name, name.to_uppercase(), FieldType::Text, FieldCategory::Client);
        field.display_category = Some("Personal".into());
        field.display_order = order;
        field
    }

    fn abc() -> Vec<StandardizedField> {
        vec![field("a", "a", Some(1)), field("b", "b", Some(2)), field("c", "c", Some(3))]
    }

    fn names(fields: &[StandardizedField]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn listing(fields: &[StandardizedField]) -> Value {
        json!({"count": fields.len(), "next": null, "previous": null, "results": fields})
    }

    fn field_reply() -> MockReply {
        MockReply::json(200, json!({
            "id": "x", "name": "x", "label": "X", "field_type": "text", "field_category": "client"
        }))
    }

    #[test]
    fn test_same_index_is_noop() {
        let fields = vec![field("a", "a", Some(4)), field("b", "b", None)];
        for i in 0..fields.len() {
            let plan = plan_move(&fields, i, i).unwrap();
            assert!(plan.is_noop());
            assert_eq!(plan.fields, fields);
        }
    }

    #[test]
    fn test_drag_persists_every_shifted_field() {
        let mut fields = abc();
        fields.push(field("d", "d", Some(4)));

        let plan = plan_move(&fields, 3, 0).unwrap();
        assert_eq!(names(&plan.fields), ["d", "a", "b", "c"]);
        assert_eq!(plan.updates.len(), 4);

        let plan = plan_move(&fields, 1, 2).unwrap();
        assert_eq!(names(&plan.fields), ["a", "c", "b", "d"]);
        assert_eq!(
            plan.updates,
            vec![
                OrderUpdate { id: "c".into(), display_order: 2 },
                OrderUpdate { id: "b".into(), display_order: 3 },
            ]
        );
        assert!(plan_move(&fields, 0, 9).is_none());
    }

    #[test]
    fn test_adjacent_swap_writes_two_fields() {
        let plan = plan_swap(&abc(), 0).unwrap();
        assert_eq!(names(&plan.fields), ["b", "a", "c"]);
        assert_eq!(
            plan.updates,
            vec![
                OrderUpdate { id: "b".into(), display_order: 1 },
                OrderUpdate { id: "a".into(), display_order: 2 },
            ]
        );
        assert!(plan_swap(&abc(), 2).is_none());
    }

    #[tokio::test]
    async fn test_move_up_persists_swapped_pair() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/standardized-fields/", MockReply::json(200, listing(&abc())));
        for id in ["a", "b", "c"] {
            backend.on(Method::PATCH, &format!("forms/standardized-fields/{}/", id), field_reply());
        }
        let notifier = Arc::new(RecordingNotifier::new());
        let mut manager =
            DisplayOrderManager::new(FieldRegistry::new(backend.client().await), notifier.clone());
        manager.select_category("Personal").await.unwrap();

        let outcome = manager.move_up(1).await.unwrap();
        assert_eq!(outcome, ReorderOutcome::Saved { writes: 2 });
        assert_eq!(names(manager.fields()), ["b", "a", "c"]);

        let a = backend.requests_to(&Method::PATCH, "forms/standardized-fields/a/");
        let b = backend.requests_to(&Method::PATCH, "forms/standardized-fields/b/");
        assert_eq!(a[0].json_body(), Some(&json!({"display_order": 2})));
        assert_eq!(b[0].json_body(), Some(&json!({"display_order": 1})));
        assert_eq!(backend.count(&Method::PATCH, "forms/standardized-fields/c/"), 0);
        assert_eq!(notifier.last().unwrap().severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_failed_write_resyncs_from_registry() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/standardized-fields/", MockReply::json(200, listing(&abc())));
        backend.on(Method::PATCH, "forms/standardized-fields/a/", field_reply());
        backend.on(Method::PATCH, "forms/standardized-fields/b/", MockReply::status(500));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut manager =
            DisplayOrderManager::new(FieldRegistry::new(backend.client().await), notifier.clone());
        manager.select_category("Personal").await.unwrap();

        let outcome = manager.move_down(0).await.unwrap();
        assert_eq!(outcome, ReorderOutcome::Resynced { failed: 1 });
        assert_eq!(names(manager.fields()), ["a", "b", "c"]);
        assert_eq!(backend.count(&Method::GET, "forms/standardized-fields/"), 2);
        assert_eq!(notifier.messages(), ["Failed to update display order"]);
    }

    #[tokio::test]
    async fn test_failed_resync_restores_previous_order() {
        let backend = MockBackend::new();
        backend.once(Method::GET, "forms/standardized-fields/", MockReply::json(200, listing(&abc())));
        backend.on(Method::GET, "forms/standardized-fields/", MockReply::status(500));
        backend.on(Method::PATCH, "forms/standardized-fields/a/", MockReply::status(500));
        backend.on(Method::PATCH, "forms/standardized-fields/b/", MockReply::status(500));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut manager =
            DisplayOrderManager::new(FieldRegistry::new(backend.client().await), notifier.clone());
        manager.select_category("Personal").await.unwrap();

        assert!(manager.move_up(1).await.is_err());
        assert_eq!(names(manager.fields()), ["a", "b", "c"]);
        assert_eq!(backend.count(&Method::GET, "forms/standardized-fields/"), 2);
        assert_eq!(notifier.messages(), ["Failed to update display order"]);
    }

    #[tokio::test]
    async fn test_edge_moves_issue_nothing() {
        let backend = MockBackend::new();
        backend.on(Method::GET, "forms/standardized-fields/", MockReply::json(200, listing(&abc())));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut manager = DisplayOrderManager::new(FieldRegistry::new(backend.client().await), notifier);
        manager.select_category("Personal").await.unwrap();

        assert_eq!(manager.move_up(0).await.unwrap(), ReorderOutcome::Unchanged);
        assert_eq!(manager.move_down(2).await.unwrap(), ReorderOutcome::Unchanged);
        assert_eq!(manager.move_to(1, 1).await.unwrap(), ReorderOutcome::Unchanged);
        assert_eq!(backend.write_count(), 0);
    }
}
