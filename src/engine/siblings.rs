//! Sibling groups: gap closing after a removal, slot opening before an insert.

use super::merge::Patch;
use super::widget::{Widget, WidgetId};
use crate::core::errors::{Result, WidgetError};

fn one_past(order: u32) -> Result<u32> {
    order.checked_add(1).ok_or_else(|| {
        WidgetError::invalid_state(format!("sibling order {order} leaves no room after it"))
    })
}

/// Positioned widgets directly under `parent` (`None` = top level), sorted by
/// ascending order. Detached widgets never belong to a sibling group.
#[must_use]
pub fn sibling_group<'a>(widgets: &'a [Widget], parent: Option<&WidgetId>) -> Vec<&'a Widget> {
    let mut group: Vec<&Widget> = widgets
        .iter()
        .filter(|widget| widget.is_positioned() && widget.is_child_of(parent))
        .collect();
    group.sort_by_key(|widget| widget.order);
    group
}

/// Close the gap left by a widget removed from `parent`'s group at
/// `removed_order`: every sibling above it moves down by one.
#[must_use]
pub fn settle_after_removal(
    widgets: &[Widget],
    parent: Option<&WidgetId>,
    removed_order: u32,
) -> Patch {
    let mut settled = Patch::new();
    for sibling in sibling_group(widgets, parent) {
        if let Some(order) = sibling.order
            && order > removed_order
        {
            settled.insert(sibling.placed(order - 1, sibling.parent_id.clone()));
        }
    }
    settled
}

/// Open a slot at `at_order` in `parent`'s group: every sibling at or above
/// it moves up by one.
///
/// # Errors
///
/// [`WidgetError::InvalidState`] when a sibling already sits at `u32::MAX`.
pub fn open_slot(widgets: &[Widget], parent: Option<&WidgetId>, at_order: u32) -> Result<Patch> {
    let mut shifted = Patch::new();
    for sibling in sibling_group(widgets, parent) {
        if let Some(order) = sibling.order
            && order >= at_order
        {
            shifted.insert(sibling.placed(one_past(order)?, sibling.parent_id.clone()));
        }
    }
    Ok(shifted)
}

/// Order one past the last positioned sibling under `parent` (1 when empty).
///
/// # Errors
///
/// [`WidgetError::InvalidState`] when the last sibling sits at `u32::MAX`.
pub fn next_order(widgets: &[Widget], parent: Option<&WidgetId>) -> Result<u32> {
    let last = sibling_group(widgets, parent)
        .iter()
        .filter_map(|widget| widget.order)
        .max()
        .unwrap_or(0);
    one_past(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::merge::merge_by_id;

    fn tree() -> Vec<Widget> {
        vec![
            Widget::new(1).with_order(1),
            Widget::new(2).with_order(3),
            Widget::new(3).with_order(2),
            Widget::new(4).with_order(1).with_parent(1),
            Widget::new(5).with_order(2).with_parent(1),
            Widget::new(10),
        ]
    }

    fn ids(group: &[&Widget]) -> Vec<WidgetId> {
        group.iter().map(|w| w.id.clone()).collect()
    }

    #[test]
    fn top_level_group_skips_detached_widgets() {
        let widgets = tree();
        let group = sibling_group(&widgets, None);
        assert_eq!(
            ids(&group),
            vec![WidgetId::from(1), WidgetId::from(3), WidgetId::from(2)]
        );
    }

    #[test]
    fn child_group_only_holds_direct_children() {
        let widgets = tree();
        let parent = WidgetId::from(1);
        let group = sibling_group(&widgets, Some(&parent));
        assert_eq!(ids(&group), vec![WidgetId::from(4), WidgetId::from(5)]);
    }

    #[test]
    fn settle_decrements_only_siblings_above_the_gap() {
        let widgets: Vec<Widget> = tree().into_iter().filter(|w| w.id != WidgetId::from(3)).collect();
        let settled = settle_after_removal(&widgets, None, 2);
        assert_eq!(settled.len(), 1);
        assert_eq!(settled.get(&WidgetId::from(2)).unwrap().order, Some(2));
    }

    #[test]
    fn open_slot_shifts_the_target_and_everything_after() {
        let widgets = tree();
        let shifted = open_slot(&widgets, None, 2).unwrap();
        let merged = merge_by_id(&widgets, &[&shifted]);
        let orders: Vec<Option<u32>> = merged.iter().map(|w| w.order).collect();
        assert_eq!(
            orders,
            vec![Some(1), Some(4), Some(3), Some(1), Some(2), None]
        );
    }

    #[test]
    fn next_order_starts_at_one_for_empty_groups() {
        let widgets = tree();
        assert_eq!(next_order(&widgets, None).unwrap(), 4);
        assert_eq!(next_order(&widgets, Some(&WidgetId::from(5))).unwrap(), 1);
    }

    #[test]
    fn orders_at_the_top_of_the_range_cannot_grow() {
        let widgets = vec![Widget::new(1).with_order(u32::MAX), Widget::new(2).with_order(1)];
        let err = next_order(&widgets, None).unwrap_err();
        assert_eq!(err.code(), "CTXW-2002");
        assert!(open_slot(&widgets, None, 1).is_err());
        assert!(open_slot(&widgets, None, u32::MAX).is_err());
    }
}
