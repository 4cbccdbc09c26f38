#![forbid(unsafe_code)]

//! Context widgets: menu tree reordering for group context menus.
//!
//! A context's menu is a flat list of widgets. Each widget carries a
//! sibling-relative `order` and an optional `parentId`, and each sibling
//! group is numbered densely from 1. The engine takes a full snapshot of that
//! list and returns the full updated list:
//! 1. **Reorder**: move a widget in front of another, to the end of a group,
//!    or out of the menu entirely
//! 2. **Home slot**: swap the view shown as a context's landing page
//!
//! # Library usage
//!
//! ```rust,no_run
//! use context_widgets::prelude::*;
//!
//! # fn demo(widgets: &[Widget]) -> Result<()> {
//! let moved = reorder_tree(&WidgetId::from(3), &NewWidgetPosition::in_front_of(1), widgets)?;
//! let updates = plan_updates(widgets, &moved)?;
//! # let _ = updates;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod core;
pub mod engine;
pub mod logger;
