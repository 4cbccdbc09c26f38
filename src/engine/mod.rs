//! Widget reordering engine: pure functions from a full widget list to the
//! full updated list.
//!
//! Callers hand in a complete, current snapshot of a context's widgets and
//! persist whatever comes back; [`changeset::plan_updates`] narrows the result
//! down to the rows that actually changed.

pub mod changeset;
pub mod home;
pub mod invariants;
pub mod merge;
pub mod reorder;
pub mod rules;
pub mod siblings;
pub mod widget;

#[cfg(test)]
mod test_properties;

pub use home::{HomeSlotRules, find_home_child, replace_home_widget, replace_home_widget_with};
pub use merge::{Patch, merge_by_id};
pub use reorder::{NewWidgetPosition, reorder_tree};
pub use widget::{Widget, WidgetId};
