//! Merge-by-id: fold replacement records back onto the caller's full list.

use std::collections::HashMap;

use super::widget::{Widget, WidgetId};

/// Replacement records keyed by the id the record carried in the input list.
///
/// The key is usually the record's own id. A widget placed with an id
/// override is keyed by its old id so the merge still finds its row.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    entries: HashMap<WidgetId, Widget>,
}

impl Patch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `widget` as the replacement for the row with its own id.
    pub fn insert(&mut self, widget: Widget) {
        self.entries.insert(widget.id.clone(), widget);
    }

    /// Record `widget` as the replacement for the row with `original_id`.
    pub fn insert_for(&mut self, original_id: WidgetId, widget: Widget) {
        self.entries.insert(original_id, widget);
    }

    #[must_use]
    pub fn get(&self, original_id: &WidgetId) -> Option<&Widget> {
        self.entries.get(original_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite matching rows of a working list in place.
    pub fn apply_to(&self, widgets: &mut [Widget]) {
        for widget in widgets.iter_mut() {
            if let Some(replacement) = self.entries.get(&widget.id) {
                *widget = replacement.clone();
            }
        }
    }
}

/// Rebuild `base` row by row, taking each row from the first patch that has
/// an entry for it and falling back to the base record.
///
/// Patches are listed most specific first. The result has exactly the rows
/// of `base`, in the same order.
#[must_use]
pub fn merge_by_id(base: &[Widget], patches: &[&Patch]) -> Vec<Widget> {
    base.iter()
        .map(|widget| {
            patches
                .iter()
                .find_map(|patch| patch.get(&widget.id))
                .unwrap_or(widget)
                .clone()
        })
        .collect()
}
