// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selected items and the primary item used for property inspection.

use crate::item::ItemId;
use crate::observer::{Observers, SubscriptionId};
use indexmap::IndexSet;

/// Something that stores per-item selection flags
pub trait SelectionTarget {
    /// Set the selection flag of an item; unknown items are ignored
    fn set_item_selected(&mut self, item: ItemId, selected: bool);
}

/// Selection change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// The selected set changed
    ItemsChanged,
    /// The primary item changed
    PrimaryChanged(Option<ItemId>),
}

/// Ordered selection with a primary item.
///
/// The primary item is always a member of the selection, and is `None` only
/// when the selection is empty.
#[derive(Debug, Default)]
pub struct Selection {
    items: IndexSet<ItemId>,
    primary: Option<ItemId>,
    observers: Observers<SelectionEvent>,
}

impl Selection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to selection changes
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&SelectionEvent) + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    /// Remove a subscription
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Primary item
    pub fn primary(&self) -> Option<ItemId> {
        self.primary
    }

    /// Selected items in selection order
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    /// Whether an item is selected
    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    /// Number of selected items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item. It becomes primary only if the selection was empty.
    pub fn add(&mut self, target: &mut dyn SelectionTarget, item: ItemId) -> bool {
        if !self.items.insert(item) {
            return false;
        }
        target.set_item_selected(item, true);
        self.observers.notify(&SelectionEvent::ItemsChanged);
        if self.primary.is_none() {
            self.set_primary(Some(item));
        }
        true
    }

    /// Remove an item, promoting the first remaining item if it was primary
    pub fn remove(&mut self, target: &mut dyn SelectionTarget, item: ItemId) -> bool {
        if !self.items.shift_remove(&item) {
            return false;
        }
        target.set_item_selected(item, false);
        self.observers.notify(&SelectionEvent::ItemsChanged);
        if self.primary == Some(item) {
            let promoted = self.items.first().copied();
            self.set_primary(promoted);
        }
        true
    }

    /// Add the item if missing, remove it otherwise
    pub fn toggle(&mut self, target: &mut dyn SelectionTarget, item: ItemId) {
        if self.contains(item) {
            self.remove(target, item);
        } else {
            self.add(target, item);
        }
    }

    /// Select exactly one item
    pub fn set(&mut self, target: &mut dyn SelectionTarget, item: ItemId) {
        self.set_range(target, [item]);
    }

    /// Select exactly the given items; the first becomes primary
    pub fn set_range(
        &mut self,
        target: &mut dyn SelectionTarget,
        items: impl IntoIterator<Item = ItemId>,
    ) {
        let next: IndexSet<ItemId> = items.into_iter().collect();
        let items_changed = !self.items.iter().eq(next.iter());

        for item in self.items.drain(..) {
            target.set_item_selected(item, false);
        }
        for item in &next {
            target.set_item_selected(*item, true);
        }
        let primary = next.first().copied();
        self.items = next;

        if items_changed {
            self.observers.notify(&SelectionEvent::ItemsChanged);
        }
        self.set_primary(primary);
    }

    /// Deselect everything
    pub fn clear(&mut self, target: &mut dyn SelectionTarget) {
        self.set_range(target, std::iter::empty());
    }

    fn set_primary(&mut self, primary: Option<ItemId>) {
        if self.primary != primary {
            self.primary = primary;
            self.observers.notify(&SelectionEvent::PrimaryChanged(primary));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct Flags(HashMap<ItemId, bool>);

    impl SelectionTarget for Flags {
        fn set_item_selected(&mut self, item: ItemId, selected: bool) {
            self.0.insert(item, selected);
        }
    }

    impl Flags {
        fn is_set(&self, item: ItemId) -> bool {
            self.0.get(&item).copied().unwrap_or(false)
        }
    }

    fn items() -> (ItemId, ItemId, ItemId) {
        (
            ItemId::Node(NodeId::new()),
            ItemId::Node(NodeId::new()),
            ItemId::Node(NodeId::new()),
        )
    }

    #[test]
    fn test_add_sets_primary_only_when_empty() {
        let (a, b, _) = items();
        let mut flags = Flags::default();
        let mut selection = Selection::new();

        assert!(selection.add(&mut flags, a));
        assert!(selection.add(&mut flags, b));
        assert!(!selection.add(&mut flags, b));

        assert_eq!(selection.primary(), Some(a));
        assert_eq!(selection.len(), 2);
        assert!(flags.is_set(a) && flags.is_set(b));
    }

    #[test]
    fn test_removing_primary_promotes_next() {
        let (a, b, c) = items();
        let mut flags = Flags::default();
        let mut selection = Selection::new();
        selection.set_range(&mut flags, [a, b, c]);
        assert_eq!(selection.primary(), Some(a));

        selection.remove(&mut flags, a);

        assert_eq!(selection.primary(), Some(b));
        assert!(!flags.is_set(a));
    }

    #[test]
    fn test_removing_last_item_unsets_primary() {
        let (a, _, _) = items();
        let mut flags = Flags::default();
        let mut selection = Selection::new();
        selection.set(&mut flags, a);
        selection.remove(&mut flags, a);
        assert_eq!(selection.primary(), None);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_set_range_replaces_and_deselects() {
        let (a, b, c) = items();
        let mut flags = Flags::default();
        let mut selection = Selection::new();
        selection.set_range(&mut flags, [a, b]);

        selection.set_range(&mut flags, [c, b]);

        assert_eq!(selection.primary(), Some(c));
        assert_eq!(selection.items().collect::<Vec<_>>(), vec![c, b]);
        assert!(!flags.is_set(a));
        assert!(flags.is_set(b) && flags.is_set(c));
    }

    #[test]
    fn test_clear() {
        let (a, b, _) = items();
        let mut flags = Flags::default();
        let mut selection = Selection::new();
        selection.set_range(&mut flags, [a, b]);
        selection.clear(&mut flags);
        assert!(selection.is_empty());
        assert_eq!(selection.primary(), None);
        assert!(!flags.is_set(a) && !flags.is_set(b));
    }

    #[test]
    fn test_events_report_items_and_primary() {
        let (a, b, _) = items();
        let mut flags = Flags::default();
        let mut selection = Selection::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        selection.subscribe(move |e| sink.borrow_mut().push(*e));

        selection.add(&mut flags, a);
        selection.add(&mut flags, b);
        selection.remove(&mut flags, a);

        assert_eq!(
            *events.borrow(),
            vec![
                SelectionEvent::ItemsChanged,
                SelectionEvent::PrimaryChanged(Some(a)),
                SelectionEvent::ItemsChanged,
                SelectionEvent::ItemsChanged,
                SelectionEvent::PrimaryChanged(Some(b)),
            ]
        );
    }
}
