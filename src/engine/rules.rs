//! Menu editing rules: what a widget is, and where it may be dropped.
//!
//! Linked entities are read from the pass-through fields, either in presented
//! form (`"viewChat": { "id": .. }`) or as raw row columns (`"view_chat_id"`).

use serde_json::Value;

use super::home::HomeSlotRules;
use super::widget::Widget;

/// Id prefix the menu editor gives widgets that are not persisted yet.
pub const PLACEHOLDER_ID_PREFIX: &str = "fake-id";

/// A kind of entity a widget can link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedEntity {
    Group,
    Post,
    User,
    Chat,
    CustomView,
    Track,
    FundingRound,
}

impl LinkedEntity {
    /// Presented field name and raw column name.
    const fn fields(self) -> (&'static str, &'static str) {
        match self {
            Self::Group => ("viewGroup", "view_group_id"),
            Self::Post => ("viewPost", "view_post_id"),
            Self::User => ("viewUser", "view_user_id"),
            Self::Chat => ("viewChat", "view_chat_id"),
            Self::CustomView => ("customView", "custom_view_id"),
            Self::Track => ("viewTrack", "view_track_id"),
            Self::FundingRound => ("viewFundingRound", "view_funding_round_id"),
        }
    }

    const fn type_tag(self) -> &'static str {
        self.fields().0
    }
}

fn is_present(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null | Value::Bool(false)))
}

/// Whether `widget` links to an entity of `entity` kind.
#[must_use]
pub fn links_to(widget: &Widget, entity: LinkedEntity) -> bool {
    let (presented, column) = entity.fields();
    let nested_id = widget
        .extra
        .get(presented)
        .and_then(|linked| linked.get("id"));
    is_present(nested_id) || is_present(widget.extra.get(column))
}

fn view_name(widget: &Widget) -> Option<&str> {
    widget
        .extra
        .get("view")
        .and_then(Value::as_str)
        .filter(|view| !view.is_empty())
}

/// Effective type: explicit tag, then named view, then linked entity, else
/// `container`.
#[must_use]
pub fn resolve_kind(widget: &Widget) -> &str {
    if let Some(kind) = widget.kind.as_deref().filter(|kind| !kind.is_empty()) {
        return kind;
    }
    if let Some(view) = view_name(widget) {
        return view;
    }
    [
        LinkedEntity::Group,
        LinkedEntity::Post,
        LinkedEntity::User,
        LinkedEntity::Chat,
        LinkedEntity::CustomView,
    ]
    .into_iter()
    .find(|entity| links_to(widget, *entity))
    .map_or("container", LinkedEntity::type_tag)
}

/// Label shown to people editing the menu.
#[must_use]
pub fn human_readable_type(kind: &str) -> &'static str {
    match kind {
        "group" | "viewGroup" => "group",
        "post" | "viewPost" => "post",
        "user" | "viewUser" => "member",
        "chat" | "viewChat" => "chat",
        "customView" | "customview" => "custom view",
        _ => "container",
    }
}

fn is_placeholder(widget: &Widget) -> bool {
    widget
        .id
        .as_text()
        .is_some_and(|id| id.starts_with(PLACEHOLDER_ID_PREFIX))
}

/// Whether the widget may be picked up and moved at all.
#[must_use]
pub fn is_droppable(widget: &Widget, rules: &HomeSlotRules) -> bool {
    !rules.is_home(widget) && !is_placeholder(widget)
}

/// Whether `child` may be placed directly under `parent`.
#[must_use]
pub fn is_valid_child(child: &Widget, parent: &Widget, rules: &HomeSlotRules) -> bool {
    let parent_links = [
        LinkedEntity::Group,
        LinkedEntity::User,
        LinkedEntity::Post,
        LinkedEntity::Chat,
        LinkedEntity::CustomView,
    ];
    if parent_links
        .into_iter()
        .any(|entity| links_to(parent, entity))
    {
        return false;
    }
    if parent.is_kind("members") || parent.is_kind("setup") {
        return false;
    }
    if rules.is_chats(parent) && !links_to(child, LinkedEntity::Chat) {
        return false;
    }
    if parent.is_kind("custom-views") && !links_to(child, LinkedEntity::CustomView) {
        return false;
    }
    if rules.is_home(child) || is_placeholder(child) {
        return false;
    }
    child.id != parent.id
}

/// Whether the widget can be shown as a group's landing view.
#[must_use]
pub fn is_valid_home_widget(widget: &Widget) -> bool {
    [
        LinkedEntity::Chat,
        LinkedEntity::Track,
        LinkedEntity::FundingRound,
        LinkedEntity::CustomView,
    ]
    .into_iter()
    .any(|entity| links_to(widget, entity))
        || view_name(widget).is_some()
}
