//! Sibling-order audits: every positioned group should read exactly `1..=N`.

#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::widget::{Widget, WidgetId};

/// One way a sibling group departs from a dense `1..=N` ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderViolation {
    /// Order `0` is never a valid slot.
    ZeroOrder {
        parent: Option<WidgetId>,
        widget: WidgetId,
    },
    /// Two or more siblings share an order.
    Duplicate {
        parent: Option<WidgetId>,
        order: u32,
        widgets: Vec<WidgetId>,
    },
    /// No sibling occupies `missing`, yet a later slot is taken.
    Gap {
        parent: Option<WidgetId>,
        missing: u32,
    },
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = |parent: &Option<WidgetId>| {
            parent
                .as_ref()
                .map_or_else(|| "top level".to_string(), |id| format!("children of {id}"))
        };
        match self {
            Self::ZeroOrder { parent, widget } => {
                write!(f, "{}: widget {widget} has order 0", scope(parent))
            }
            Self::Duplicate {
                parent,
                order,
                widgets,
            } => {
                let ids: Vec<String> = widgets.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "{}: order {order} shared by {}",
                    scope(parent),
                    ids.join(", ")
                )
            }
            Self::Gap { parent, missing } => {
                write!(f, "{}: no widget at order {missing}", scope(parent))
            }
        }
    }
}

/// Audit every positioned sibling group. Empty result means all groups are dense.
#[must_use]
pub fn check_sibling_orders(widgets: &[Widget]) -> Vec<OrderViolation> {
    let mut groups: BTreeMap<Option<&WidgetId>, BTreeMap<u32, Vec<WidgetId>>> = BTreeMap::new();
    for widget in widgets {
        if let Some(order) = widget.order {
            groups
                .entry(widget.parent_id.as_ref())
                .or_default()
                .entry(order)
                .or_default()
                .push(widget.id.clone());
        }
    }

    let mut violations = Vec::new();
    for (parent, slots) in groups {
        let parent = parent.cloned();
        let mut highest = 0;
        for (order, ids) in &slots {
            if *order == 0 {
                violations.extend(ids.iter().map(|id| OrderViolation::ZeroOrder {
                    parent: parent.clone(),
                    widget: id.clone(),
                }));
                continue;
            }
            if ids.len() > 1 {
                violations.push(OrderViolation::Duplicate {
                    parent: parent.clone(),
                    order: *order,
                    widgets: ids.clone(),
                });
            }
            highest = *order;
        }
        for missing in 1..highest {
            if !slots.contains_key(&missing) {
                violations.push(OrderViolation::Gap {
                    parent: parent.clone(),
                    missing,
                });
            }
        }
    }
    violations
}

/// Ids that appear on more than one row.
#[must_use]
pub fn duplicate_ids(widgets: &[Widget]) -> Vec<WidgetId> {
    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for widget in widgets {
        if !seen.insert(&widget.id) {
            repeated.insert(widget.id.clone());
        }
    }
    repeated.into_iter().collect()
}
