//! Persistence changeset: which rows a store must rewrite after an operation.

#![allow(missing_docs)]

use serde::Serialize;

use super::widget::{Widget, WidgetId};
use crate::core::errors::{Result, WidgetError};

/// One row update for the widget table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetUpdate {
    pub id: WidgetId,
    /// Id the row had before, when the operation assigned a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<WidgetId>,
    pub order: Option<u32>,
    pub parent_id: Option<WidgetId>,
    /// Placed rows are flagged so later automatic menu population skips them.
    pub mark_auto_added: bool,
}

/// Compare an engine result with its input, row by row.
///
/// Both operations return the input rows in input order, so rows are paired
/// by position rather than by id (an id override would otherwise look like a
/// delete plus an insert).
///
/// # Errors
///
/// [`WidgetError::InvalidState`] when the lists have different lengths.
pub fn plan_updates(before: &[Widget], after: &[Widget]) -> Result<Vec<WidgetUpdate>> {
    if before.len() != after.len() {
        return Err(WidgetError::invalid_state(format!(
            "cannot diff widget lists of different lengths ({} before, {} after)",
            before.len(),
            after.len()
        )));
    }

    Ok(before
        .iter()
        .zip(after)
        .filter(|(old, new)| {
            old.id != new.id || old.order != new.order || old.parent_id != new.parent_id
        })
        .map(|(old, new)| WidgetUpdate {
            id: new.id.clone(),
            previous_id: (old.id != new.id).then(|| old.id.clone()),
            order: new.order,
            parent_id: new.parent_id.clone(),
            mark_auto_added: new.order.is_some(),
        })
        .collect())
}
