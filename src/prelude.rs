//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use context_widgets::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, WidgetError};

// Engine
pub use crate::engine::changeset::{WidgetUpdate, plan_updates};
pub use crate::engine::home::{
    HomeSlotRules, find_home_child, replace_home_widget, replace_home_widget_with,
};
pub use crate::engine::invariants::{OrderViolation, check_sibling_orders, duplicate_ids};
pub use crate::engine::merge::{Patch, merge_by_id};
pub use crate::engine::reorder::{NewWidgetPosition, reorder_tree};
pub use crate::engine::widget::{Widget, WidgetId};

// Logger
pub use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
