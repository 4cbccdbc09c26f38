//! Single-widget moves: insert in front of a sibling, append to a parent, or
//! detach from the menu.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::merge::{Patch, merge_by_id};
use super::siblings::{next_order, open_slot, settle_after_removal};
use super::widget::{Widget, WidgetId, find};
use crate::core::errors::{Result, WidgetError};

/// Where a moved widget should end up, as sent by the menu editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWidgetPosition {
    /// Detach the widget (and its direct children) from the ordered menu.
    pub remove: bool,
    /// Place immediately before this sibling, adopting its parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_in_front_of_widget_id: Option<WidgetId>,
    /// Append after the last positioned child of `parent_id`.
    pub add_to_end: bool,
    /// Target parent for appends; `None` is the top level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<WidgetId>,
    /// Terminal id for a widget that had no persisted id yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<WidgetId>,
}

impl NewWidgetPosition {
    #[must_use]
    pub fn detach() -> Self {
        Self {
            remove: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_front_of(target: impl Into<WidgetId>) -> Self {
        Self {
            order_in_front_of_widget_id: Some(target.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_end(parent_id: Option<WidgetId>) -> Self {
        Self {
            add_to_end: true,
            parent_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<WidgetId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Human-readable summary for logs and CLI output.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.remove {
            return "remove from menu".to_string();
        }
        if let Some(target) = &self.order_in_front_of_widget_id {
            return format!("in front of {target}");
        }
        match &self.parent_id {
            Some(parent) => format!("end of {parent}"),
            None => "end of top level".to_string(),
        }
    }
}

/// Move one widget and return the full updated list.
///
/// The result has the same rows as `all_widgets`, in the same order; only
/// `order`/`parentId` change (and the moved widget's `id` when
/// `new_widget_position.id` overrides it).
///
/// # Errors
///
/// - [`WidgetError::NotFound`] when `widget_to_be_moved_id` is not in the list.
/// - [`WidgetError::InvalidState`] when the id override is taken by another
///   widget, the destination lies inside the moved widget, or the destination
///   group has no order left above `u32::MAX`.
pub fn reorder_tree(
    widget_to_be_moved_id: &WidgetId,
    new_widget_position: &NewWidgetPosition,
    all_widgets: &[Widget],
) -> Result<Vec<Widget>> {
    let moved = find(all_widgets, widget_to_be_moved_id).ok_or_else(|| WidgetError::NotFound {
        id: widget_to_be_moved_id.clone(),
        role: "widget to move",
    })?;

    let mut working: Vec<Widget> = all_widgets
        .iter()
        .filter(|widget| widget.id != *widget_to_be_moved_id)
        .cloned()
        .collect();

    let settled = match moved.order {
        Some(order) => settle_after_removal(&working, moved.parent_id.as_ref(), order),
        None => Patch::new(),
    };
    settled.apply_to(&mut working);

    if new_widget_position.remove {
        let mut detached = Patch::new();
        for child in working
            .iter()
            .filter(|widget| widget.parent_id.as_ref() == Some(widget_to_be_moved_id))
        {
            detached.insert(child.detached());
        }
        detached.insert_for(widget_to_be_moved_id.clone(), moved.detached());
        return Ok(merge_by_id(all_widgets, &[&detached, &settled]));
    }

    let terminal_id = new_widget_position
        .id
        .clone()
        .unwrap_or_else(|| moved.id.clone());
    if terminal_id != moved.id && find(&working, &terminal_id).is_some() {
        return Err(WidgetError::invalid_state(format!(
            "cannot give widget {} the id {terminal_id}: another widget already has it",
            moved.id
        )));
    }

    let target = new_widget_position
        .order_in_front_of_widget_id
        .as_ref()
        .and_then(|target_id| find(&working, target_id));
    // An unpositioned target still names the group the caller aimed at.
    let parent = target.map_or_else(
        || new_widget_position.parent_id.clone(),
        |target| target.parent_id.clone(),
    );
    if let Some(parent) = &parent
        && is_within(&working, parent, widget_to_be_moved_id)
    {
        return Err(WidgetError::invalid_state(format!(
            "widget {} cannot be placed under {parent}, which sits inside it",
            moved.id
        )));
    }

    let placed = match target.and_then(|target| target.order) {
        Some(target_order) => {
            let mut shifted = open_slot(&working, parent.as_ref(), target_order)?;
            let mut inserted = moved.placed(target_order, parent);
            inserted.id = terminal_id;
            shifted.insert_for(widget_to_be_moved_id.clone(), inserted);
            shifted
        }
        None => append(&working, moved, parent, terminal_id)?,
    };

    Ok(merge_by_id(all_widgets, &[&placed, &settled]))
}

/// Whether `parent` is `ancestor` or lies somewhere below it.
fn is_within(widgets: &[Widget], parent: &WidgetId, ancestor: &WidgetId) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(parent);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        if !seen.insert(id) {
            return false;
        }
        current = find(widgets, id).and_then(|widget| widget.parent_id.as_ref());
    }
    false
}

fn append(
    working: &[Widget],
    moved: &Widget,
    parent: Option<WidgetId>,
    terminal_id: WidgetId,
) -> Result<Patch> {
    let order = next_order(working, parent.as_ref())?;
    let mut appended = moved.placed(order, parent);
    let original_id = moved.id.clone();
    appended.id = terminal_id;
    let mut patch = Patch::new();
    patch.insert_for(original_id, appended);
    Ok(patch)
}
