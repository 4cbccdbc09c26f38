//! Widget records: the flat, JSON-shaped rows the engine reorders.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque widget identifier.
///
/// Persisted widgets carry numeric ids; placeholders created on the client
/// carry string ids (`fake-id-...`). Both round-trip in their JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetId {
    Num(i64),
    Text(String),
}

impl WidgetId {
    /// Text content of a string id, `None` for numeric ids.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Num(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for WidgetId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl From<i32> for WidgetId {
    fn from(value: i32) -> Self {
        Self::Num(i64::from(value))
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for WidgetId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Command-line ids: anything that parses as an integer is numeric.
impl FromStr for WidgetId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Num))
    }
}

/// A node in a navigation-menu tree.
///
/// Only `order` and `parentId` are ever rewritten by the engine (plus `id`
/// for a widget placed with an explicit id override). Unknown fields live in
/// `extra` and are serialized back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: WidgetId,
    /// Position among siblings; `None` means detached from any ordered menu.
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default, alias = "parent_id")]
    pub parent_id: Option<WidgetId>,
    /// Free-form type tag (`home`, `chats`, `chat`, `viewChat`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Widget {
    /// Detached, untyped widget with no extra fields.
    #[must_use]
    pub fn new(id: impl Into<WidgetId>) -> Self {
        Self {
            id: id.into(),
            order: None,
            parent_id: None,
            kind: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<WidgetId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether the widget occupies a slot in some ordered menu.
    #[must_use]
    pub fn is_positioned(&self) -> bool {
        self.order.is_some()
    }

    /// Whether this widget's type tag equals `kind`.
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Whether `parent` is this widget's direct parent (`None` = top level).
    #[must_use]
    pub fn is_child_of(&self, parent: Option<&WidgetId>) -> bool {
        self.parent_id.as_ref() == parent
    }

    /// Copy placed at `order` under `parent_id`.
    #[must_use]
    pub fn placed(&self, order: u32, parent_id: Option<WidgetId>) -> Self {
        Self {
            order: Some(order),
            parent_id,
            ..self.clone()
        }
    }

    /// Copy removed from every ordered menu.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            order: None,
            parent_id: None,
            ..self.clone()
        }
    }
}

/// Find a widget by id.
pub fn find<'a>(widgets: &'a [Widget], id: &WidgetId) -> Option<&'a Widget> {
    widgets.iter().find(|widget| widget.id == *id)
}
