//! Home slot replacement: swap which widget sits under the `home` widget.
//!
//! The displaced occupant goes to the front of the chats list when it is a
//! chat, and leaves the ordered menu otherwise.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::merge::{Patch, merge_by_id};
use super::siblings::{open_slot, settle_after_removal};
use super::widget::{Widget, WidgetId, find};
use crate::core::errors::{Result, WidgetError};

/// Type tags the home replacement keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeSlotRules {
    /// Tag of the widget whose single child is the home view.
    pub home_type: String,
    /// Tag of the container that lists chat widgets.
    pub chats_type: String,
    /// Tags of widgets that fall back into the chats list when displaced.
    pub chat_types: Vec<String>,
}

impl Default for HomeSlotRules {
    fn default() -> Self {
        Self {
            home_type: "home".to_string(),
            chats_type: "chats".to_string(),
            chat_types: vec!["chat".to_string(), "viewChat".to_string()],
        }
    }
}

impl HomeSlotRules {
    #[must_use]
    pub fn is_home(&self, widget: &Widget) -> bool {
        widget.is_kind(&self.home_type)
    }

    #[must_use]
    pub fn is_chats(&self, widget: &Widget) -> bool {
        widget.is_kind(&self.chats_type)
    }

    #[must_use]
    pub fn is_chat(&self, widget: &Widget) -> bool {
        widget
            .kind
            .as_deref()
            .is_some_and(|kind| self.chat_types.iter().any(|chat| chat == kind))
    }
}

/// The widget currently shown as the group's home view, if any.
#[must_use]
pub fn find_home_child<'a>(widgets: &'a [Widget], rules: &HomeSlotRules) -> Option<&'a Widget> {
    home_slot(widgets, rules).and_then(|(_, child)| child)
}

/// The home widget and whatever currently sits under it.
fn home_slot<'a>(
    widgets: &'a [Widget],
    rules: &HomeSlotRules,
) -> Option<(&'a Widget, Option<&'a Widget>)> {
    let home = widgets.iter().find(|widget| rules.is_home(widget))?;
    let child = widgets
        .iter()
        .find(|widget| widget.parent_id.as_ref() == Some(&home.id));
    Some((home, child))
}

/// [`replace_home_widget_with`] using the default type tags.
pub fn replace_home_widget(widgets: &[Widget], new_home_widget_id: &WidgetId) -> Result<Vec<Widget>> {
    replace_home_widget_with(widgets, new_home_widget_id, &HomeSlotRules::default())
}

/// Make `new_home_widget_id` the sole child of the home widget.
///
/// # Errors
///
/// - [`WidgetError::InvalidState`] when there is no home widget, the home slot
///   is empty, the home widget itself is proposed, a displaced chat has no
///   chats widget to land in, or a chat in the chats list sits at `u32::MAX`.
/// - [`WidgetError::NotFound`] when `new_home_widget_id` is not in the list.
pub fn replace_home_widget_with(
    widgets: &[Widget],
    new_home_widget_id: &WidgetId,
    rules: &HomeSlotRules,
) -> Result<Vec<Widget>> {
    let (home, occupant) = home_slot(widgets, rules).ok_or_else(|| {
        WidgetError::invalid_state(format!("no widget of type '{}'", rules.home_type))
    })?;
    let home_parent_id = home.id.clone();

    let incoming = find(widgets, new_home_widget_id).ok_or_else(|| WidgetError::NotFound {
        id: new_home_widget_id.clone(),
        role: "new home widget",
    })?;
    if incoming.id == home_parent_id {
        return Err(WidgetError::invalid_state(
            "the home widget cannot occupy its own slot",
        ));
    }

    let occupant = occupant.ok_or_else(|| {
        WidgetError::invalid_state(format!(
            "home widget {home_parent_id} has no current home view to replace"
        ))
    })?;
    if occupant.id == incoming.id {
        return Ok(widgets.to_vec());
    }

    let mut working: Vec<Widget> = widgets
        .iter()
        .filter(|widget| widget.id != incoming.id && widget.id != occupant.id)
        .cloned()
        .collect();

    let settled = match incoming.order {
        Some(order) => settle_after_removal(&working, incoming.parent_id.as_ref(), order),
        None => Patch::new(),
    };
    settled.apply_to(&mut working);

    let mut placed = if rules.is_chat(occupant) {
        let chats = working
            .iter()
            .find(|widget| rules.is_chats(widget))
            .ok_or_else(|| {
                WidgetError::invalid_state(format!(
                    "displaced home chat {} has no '{}' widget to return to",
                    occupant.id, rules.chats_type
                ))
            })?;
        let mut shifted = open_slot(&working, Some(&chats.id), 1)?;
        shifted.insert(occupant.placed(1, Some(chats.id.clone())));
        shifted
    } else {
        let mut evicted = Patch::new();
        evicted.insert(occupant.detached());
        evicted
    };
    placed.insert(incoming.placed(1, Some(home_parent_id)));

    Ok(merge_by_id(widgets, &[&placed, &settled]))
}
