//! Property-based tests for the reordering engine.
//!
//! Random dense menus are pushed through single moves and home swaps; every
//! result must stay dense, conserve its rows, and keep unrelated widgets in
//! their relative order.

use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest::sample::Index;

use super::home::{HomeSlotRules, replace_home_widget};
use super::invariants::check_sibling_orders;
use super::reorder::{NewWidgetPosition, reorder_tree};
use super::widget::{Widget, WidgetId, find};

// ──────────────────── strategies ────────────────────

fn ord(index: usize) -> u32 {
    u32::try_from(index + 1).expect("small index")
}

/// Dense menu: top-level ids `1..`, their children from `100`, detached
/// widgets from `500`, listed in shuffled order.
fn arb_menu() -> impl Strategy<Value = Vec<Widget>> {
    (prop::collection::vec(0usize..4, 1..6), 0usize..3)
        .prop_map(|(child_counts, detached)| {
            let mut widgets = Vec::new();
            let mut next_child = 100i64;
            for (index, count) in child_counts.iter().enumerate() {
                let parent = i64::try_from(index + 1).expect("small index");
                widgets.push(Widget::new(parent).with_order(ord(index)));
                for child in 0..*count {
                    widgets.push(Widget::new(next_child).with_order(ord(child)).with_parent(parent));
                    next_child += 1;
                }
            }
            for extra in 0..detached {
                widgets.push(Widget::new(500 + i64::try_from(extra).expect("small index")));
            }
            widgets
        })
        .prop_shuffle()
}

#[derive(Debug, Clone, Copy)]
enum Move {
    InFrontOf,
    EndOfTargetGroup,
    EndOfTopLevel,
    Detach,
}

fn arb_move() -> impl Strategy<Value = Move> {
    prop_oneof![
        Just(Move::InFrontOf),
        Just(Move::EndOfTargetGroup),
        Just(Move::EndOfTopLevel),
        Just(Move::Detach),
    ]
}

fn position_for(kind: Move, target: &Widget) -> NewWidgetPosition {
    match kind {
        Move::InFrontOf => NewWidgetPosition::in_front_of(target.id.clone()),
        Move::EndOfTargetGroup => NewWidgetPosition::at_end(target.parent_id.clone()),
        Move::EndOfTopLevel => NewWidgetPosition::at_end(None),
        Move::Detach => NewWidgetPosition::detach(),
    }
}

/// Whether the move would put `moved` under one of its own children.
fn lands_inside(kind: Move, moved: &Widget, target: &Widget) -> bool {
    matches!(kind, Move::InFrontOf | Move::EndOfTargetGroup)
        && target.parent_id.as_ref() == Some(&moved.id)
}

/// Ids of each positioned sibling group, in ascending order.
fn groups(widgets: &[Widget]) -> BTreeMap<Option<WidgetId>, Vec<WidgetId>> {
    let mut by_parent: BTreeMap<Option<WidgetId>, Vec<(u32, WidgetId)>> = BTreeMap::new();
    for widget in widgets {
        if let Some(order) = widget.order {
            by_parent
                .entry(widget.parent_id.clone())
                .or_default()
                .push((order, widget.id.clone()));
        }
    }
    by_parent
        .into_iter()
        .map(|(parent, mut members)| {
            members.sort();
            (parent, members.into_iter().map(|(_, id)| id).collect())
        })
        .collect()
}

/// The literal index-matching settle: sort, then pull down every item whose
/// order no longer matches its position.
fn settle_by_index(mut orders: Vec<u32>) -> Vec<u32> {
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .map(|(index, order)| if *order == ord(index) { *order } else { order - 1 })
        .collect()
}

fn settle_by_decrement(orders: &[u32], removed: u32) -> Vec<u32> {
    let mut settled: Vec<u32> = orders
        .iter()
        .map(|order| if *order > removed { order - 1 } else { *order })
        .collect();
    settled.sort_unstable();
    settled
}

// ──────────────────── properties ────────────────────

proptest! {
    #[test]
    fn every_move_keeps_sibling_groups_dense(
        menu in arb_menu(),
        moved in any::<Index>(),
        target in any::<Index>(),
        kind in arb_move(),
    ) {
        let moved = menu[moved.index(menu.len())].clone();
        let target = menu[target.index(menu.len())].clone();
        prop_assume!(!lands_inside(kind, &moved, &target));
        let result = reorder_tree(&moved.id, &position_for(kind, &target), &menu).unwrap();
        let violations = check_sibling_orders(&result);
        prop_assert!(violations.is_empty(), "violations: {:?}", violations);
    }

    #[test]
    fn moves_only_touch_order_and_parent(
        menu in arb_menu(),
        moved in any::<Index>(),
        target in any::<Index>(),
        kind in arb_move(),
    ) {
        let moved = menu[moved.index(menu.len())].clone();
        let target = menu[target.index(menu.len())].clone();
        prop_assume!(!lands_inside(kind, &moved, &target));
        let result = reorder_tree(&moved.id, &position_for(kind, &target), &menu).unwrap();
        prop_assert_eq!(result.len(), menu.len());
        for (before, after) in menu.iter().zip(&result) {
            prop_assert_eq!(&before.id, &after.id);
            prop_assert_eq!(&before.kind, &after.kind);
            prop_assert_eq!(&before.extra, &after.extra);
        }
    }

    #[test]
    fn insert_lands_immediately_in_front_of_the_target(
        menu in arb_menu(),
        moved in any::<Index>(),
        target in any::<Index>(),
    ) {
        let moved = menu[moved.index(menu.len())].clone();
        let target = menu[target.index(menu.len())].clone();
        prop_assume!(moved.id != target.id && target.order.is_some());
        prop_assume!(!lands_inside(Move::InFrontOf, &moved, &target));

        let result = reorder_tree(&moved.id, &NewWidgetPosition::in_front_of(target.id.clone()), &menu).unwrap();
        let placed = find(&result, &moved.id).unwrap();
        let shifted = find(&result, &target.id).unwrap();
        prop_assert_eq!(&placed.parent_id, &shifted.parent_id);
        prop_assert_eq!(placed.order.map(|o| o + 1), shifted.order);
    }

    #[test]
    fn unrelated_siblings_keep_their_relative_order(
        menu in arb_menu(),
        moved in any::<Index>(),
        target in any::<Index>(),
        kind in arb_move(),
    ) {
        let moved = menu[moved.index(menu.len())].clone();
        let target = menu[target.index(menu.len())].clone();
        prop_assume!(!lands_inside(kind, &moved, &target));
        let result = reorder_tree(&moved.id, &position_for(kind, &target), &menu).unwrap();

        let before = groups(&menu);
        let after = groups(&result);
        for (parent, members) in before {
            if parent.as_ref() == Some(&moved.id) {
                continue;
            }
            let survivors: Vec<&WidgetId> = members.iter().filter(|id| **id != moved.id).collect();
            let now: Vec<&WidgetId> = after
                .get(&parent)
                .map(|ids| ids.iter().filter(|id| **id != moved.id).collect())
                .unwrap_or_default();
            prop_assert_eq!(survivors, now);
        }
    }

    #[test]
    fn cross_parent_moves_shrink_one_group_and_grow_another(
        menu in arb_menu(),
        moved in any::<Index>(),
        target in any::<Index>(),
    ) {
        let moved = menu[moved.index(menu.len())].clone();
        let target = menu[target.index(menu.len())].clone();
        prop_assume!(moved.order.is_some() && target.order.is_some());
        prop_assume!(moved.id != target.id && moved.parent_id != target.parent_id);
        prop_assume!(!lands_inside(Move::InFrontOf, &moved, &target));

        let result = reorder_tree(&moved.id, &NewWidgetPosition::in_front_of(target.id.clone()), &menu).unwrap();
        let (before, after) = (groups(&menu), groups(&result));
        let size = |g: &BTreeMap<Option<WidgetId>, Vec<WidgetId>>, p: &Option<WidgetId>| g.get(p).map_or(0, Vec::len);
        prop_assert_eq!(size(&after, &moved.parent_id) + 1, size(&before, &moved.parent_id));
        prop_assert_eq!(size(&after, &target.parent_id), size(&before, &target.parent_id) + 1);
    }

    #[test]
    fn moves_into_own_children_are_rejected(
        menu in arb_menu(),
        pick in any::<Index>(),
        append in any::<bool>(),
    ) {
        let children: Vec<&Widget> = menu.iter().filter(|w| w.parent_id.is_some()).collect();
        prop_assume!(!children.is_empty());
        let target = children[pick.index(children.len())];
        let parent = target.parent_id.clone().unwrap();
        let kind = if append { Move::EndOfTargetGroup } else { Move::InFrontOf };
        let err = reorder_tree(&parent, &position_for(kind, target), &menu).unwrap_err();
        prop_assert_eq!(err.code(), "CTXW-2002");
    }

    #[test]
    fn moving_the_last_sibling_to_the_end_is_a_no_op(menu in arb_menu(), pick in any::<Index>()) {
        let positioned: Vec<&Widget> = menu.iter().filter(|w| w.order.is_some()).collect();
        let candidate = positioned[pick.index(positioned.len())];
        let last = menu
            .iter()
            .filter(|w| w.order.is_some() && w.parent_id == candidate.parent_id)
            .max_by_key(|w| w.order)
            .unwrap();

        let position = NewWidgetPosition::at_end(last.parent_id.clone());
        let result = reorder_tree(&last.id, &position, &menu).unwrap();
        prop_assert_eq!(result, menu);
    }

    #[test]
    fn settle_formulas_agree(size in 1usize..12, removed in any::<Index>()) {
        let orders: Vec<u32> = (0..size).map(ord).collect();
        let removed = orders[removed.index(size)];
        let remaining: Vec<u32> = orders.iter().copied().filter(|o| *o != removed).collect();
        prop_assert_eq!(settle_by_index(remaining.clone()), settle_by_decrement(&remaining, removed));
    }

    #[test]
    fn home_swaps_keep_groups_dense_and_the_slot_single(
        menu in arb_menu(),
        chats in 0usize..4,
        occupant_is_chat in any::<bool>(),
        pick in any::<Index>(),
    ) {
        let rules = HomeSlotRules::default();
        let mut widgets = menu;
        let top = widgets.iter().filter(|w| w.order.is_some() && w.parent_id.is_none()).count();
        widgets.push(Widget::new(900).with_order(ord(top)).with_kind("home"));
        widgets.push(Widget::new(901).with_order(ord(top + 1)).with_kind("chats"));
        let occupant_kind = if occupant_is_chat { "chat" } else { "view" };
        widgets.push(Widget::new(902).with_order(1).with_parent(900).with_kind(occupant_kind));
        for index in 0..chats {
            let id = 950 + i64::try_from(index).expect("small index");
            widgets.push(Widget::new(id).with_order(ord(index)).with_parent(901).with_kind("viewChat"));
        }

        let candidates: Vec<&Widget> = widgets
            .iter()
            .filter(|w| !rules.is_home(w) && !rules.is_chats(w))
            .collect();
        let incoming = candidates[pick.index(candidates.len())].id.clone();
        let result = replace_home_widget(&widgets, &incoming).unwrap();

        prop_assert!(check_sibling_orders(&result).is_empty());
        prop_assert_eq!(result.len(), widgets.len());
        let home_children: Vec<&WidgetId> = result
            .iter()
            .filter(|w| w.parent_id == Some(WidgetId::from(900)))
            .map(|w| &w.id)
            .collect();
        prop_assert_eq!(home_children, vec![&incoming]);
    }
}
