//! The concrete hierarchical model.
//!
//! [`ColumnTreeModel`] owns a node arena behind a `RwLock` and implements
//! every capability trait. Each mutation does its work in a scoped lock and
//! emits notifications only after the guard is dropped, so listeners can
//! query the model (or even mutate unrelated parts of it) from inside a
//! notification.

use std::cmp::Ordering;

use parking_lot::RwLock;
use treeline_core::logging::{PerfSpan, span_names, targets};
use treeline_core::Signal;

use super::events::ModelEvent;
use super::item::{Item, ItemFlags, ItemId, RowData};
use super::node::NodeArena;
use super::traits::{
    SortComparator, SortableTreeModel, TreeModel, VisibilityTreeModel, WritableTreeModel,
};
use crate::error::{ModelError, ModelResult};

/// A writable, sortable, expandable tree of [`Item`]s.
///
/// # Example
///
/// ```
/// use treeline::model::{ColumnTreeModel, Item, TreeModel, WritableTreeModel};
///
/// let model = ColumnTreeModel::<String>::new();
/// let docs = model.add_sub_item(None, Item::new("docs".to_string()), None).unwrap();
/// model.add_sub_item(Some(docs), Item::new("readme.md".to_string()), None).unwrap();
///
/// assert_eq!(model.count_items(), 2);
/// assert_eq!(model.count_visible_items(), 1); // "docs" is collapsed
/// ```
pub struct ColumnTreeModel<T> {
    storage: RwLock<NodeArena<T>>,
    comparator: RwLock<Option<SortComparator<T>>>,
    events: Signal<ModelEvent>,
}

impl<T: RowData> Default for ColumnTreeModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RowData> ColumnTreeModel<T> {
    /// Create an empty, unsorted model.
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(NodeArena::new()),
            comparator: RwLock::new(None),
            events: Signal::new(),
        }
    }

    /// Create an empty model with an active comparator.
    pub fn with_comparator(comparator: SortComparator<T>) -> Self {
        let model = Self::new();
        *model.comparator.write() = Some(comparator);
        model
    }

    /// Run `f` with a shared borrow of the item.
    pub fn with_item<F, R>(&self, item: ItemId, f: F) -> Option<R>
    where
        F: FnOnce(&Item<T>) -> R,
    {
        let storage = self.storage.read();
        storage.node(item).map(|node| f(&node.item))
    }

    /// Clone the item's data.
    pub fn item_data(&self, item: ItemId) -> Option<T>
    where
        T: Clone,
    {
        self.with_item(item, |item| item.data().clone())
    }

    /// Mutate the item's data and fire `ItemChanged`.
    ///
    /// With an active comparator, an item whose new data puts it out of order
    /// is moved to its sorted slot among its siblings and `ItemsSorted`
    /// follows. The item keeps its flags, so a selected item stays selected.
    pub fn modify_item<F, R>(&self, item: ItemId, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let comparator = self.comparator.read().clone();
        let (result, moved) = {
            let mut storage = self.storage.write();
            let node = storage.node_mut(item)?;
            let result = f(node.item.data_mut());
            let moved = match &comparator {
                Some(cmp) if !Self::in_sorted_position(&storage, item, cmp) => {
                    storage.reposition_sorted(item, cmp.as_ref())
                }
                _ => false,
            };
            (result, moved)
        };

        self.events.emit(ModelEvent::ItemChanged(item));
        if moved {
            tracing::debug!(target: targets::MODEL, ?item, "modified item resorted");
            self.events.emit(ModelEvent::ItemsSorted);
        }
        Some(result)
    }

    fn in_sorted_position(storage: &NodeArena<T>, item: ItemId, cmp: &SortComparator<T>) -> bool {
        let Some(node) = storage.node(item) else {
            return true;
        };
        let Some(siblings) = storage.children(node.parent) else {
            return true;
        };
        let Some(position) = siblings.iter().position(|&s| s == item) else {
            return true;
        };
        let data = node.item.data();
        let data_of = |id: ItemId| storage.node(id).map(|n| n.item.data());

        let after_prev = position == 0
            || data_of(siblings[position - 1]).is_none_or(|prev| cmp(prev, data) != Ordering::Greater);
        let before_next = siblings
            .get(position + 1)
            .and_then(|&next| data_of(next))
            .is_none_or(|next| cmp(data, next) != Ordering::Greater);
        after_prev && before_next
    }

    fn emit_hide(&self, span: Option<(usize, usize)>, before: bool) {
        if let Some((index, count)) = span {
            self.events.emit(ModelEvent::ItemsHidden {
                index,
                count,
                before,
            });
        }
    }
}

impl<T: RowData> TreeModel<T> for ColumnTreeModel<T> {
    fn count_items(&self) -> usize {
        self.storage.read().len()
    }

    fn count_sub_items(&self, parent: Option<ItemId>) -> usize {
        self.storage.read().children(parent).map_or(0, <[ItemId]>::len)
    }

    fn sub_item_at(&self, parent: Option<ItemId>, index: usize) -> Option<ItemId> {
        self.storage.read().children(parent)?.get(index).copied()
    }

    fn sub_item_index_of(&self, item: ItemId) -> Option<usize> {
        self.storage.read().index_in_parent(item)
    }

    fn super_item_of(&self, item: ItemId) -> ModelResult<Option<ItemId>> {
        self.storage
            .read()
            .node(item)
            .map(|n| n.parent)
            .ok_or(ModelError::InvalidItem)
    }

    fn level_of(&self, item: ItemId) -> Option<usize> {
        self.storage.read().node(item).map(|n| n.level)
    }

    fn contains(&self, item: ItemId) -> bool {
        self.storage.read().contains(item)
    }

    fn count_visible_items(&self) -> usize {
        self.storage.read().count_visible()
    }

    fn visible_item_at(&self, index: usize) -> Option<ItemId> {
        self.storage.read().visible_item_at(index)
    }

    fn visible_index_of(&self, item: ItemId) -> Option<usize> {
        self.storage.read().visible_index_of(item)
    }

    fn visible_items(&self) -> Vec<ItemId> {
        self.storage.read().visible_items()
    }

    fn item_flags(&self, item: ItemId) -> Option<ItemFlags> {
        self.storage.read().node(item).map(|n| n.item.flags())
    }

    fn item_height(&self, item: ItemId) -> Option<f32> {
        self.storage.read().node(item).map(|n| n.item.height())
    }

    fn item_offset(&self, item: ItemId) -> Option<f32> {
        self.storage.read().node(item).map(|n| n.item.offset())
    }

    fn set_item_offset(&self, item: ItemId, offset: f32) -> bool {
        match self.storage.write().node_mut(item) {
            Some(node) => {
                node.item.set_offset(offset);
                true
            }
            None => false,
        }
    }

    fn set_item_selected(&self, item: ItemId, selected: bool) -> bool {
        match self.storage.write().node_mut(item) {
            Some(node) => {
                node.item.set_flag(ItemFlags::SELECTED, selected);
                true
            }
            None => false,
        }
    }

    fn set_item_caller_flags(&self, item: ItemId, flags: ItemFlags, on: bool) -> bool {
        match self.storage.write().node_mut(item) {
            Some(node) => {
                node.item.set_caller_flags(flags, on);
                true
            }
            None => false,
        }
    }

    fn cell_text(&self, item: ItemId, column: usize) -> Option<String> {
        self.storage
            .read()
            .node(item)
            .map(|n| n.item.data().column_text(column))
    }

    fn events(&self) -> &Signal<ModelEvent> {
        &self.events
    }

    fn as_writable(&self) -> Option<&dyn WritableTreeModel<T>> {
        Some(self)
    }

    fn as_sortable(&self) -> Option<&dyn SortableTreeModel<T>> {
        Some(self)
    }

    fn as_visibility(&self) -> Option<&dyn VisibilityTreeModel<T>> {
        Some(self)
    }
}

impl<T: RowData> WritableTreeModel<T> for ColumnTreeModel<T> {
    fn add_sub_item(
        &self,
        parent: Option<ItemId>,
        item: Item<T>,
        index: Option<usize>,
    ) -> ModelResult<ItemId> {
        let comparator = self.comparator.read().clone();
        let (id, index, shown) = {
            let mut storage = self.storage.write();
            let len = storage.children(parent).ok_or(ModelError::InvalidItem)?.len();
            let index = match &comparator {
                Some(cmp) => storage.sorted_insertion_point(parent, item.data(), cmp.as_ref()),
                None => index.unwrap_or(len),
            };
            let id = storage.insert(parent, index, item)?;
            let shown = storage
                .visible_index_of(id)
                .map(|visible| (visible, storage.projected_rows(id)));
            (id, index, shown)
        };

        tracing::debug!(target: targets::MODEL, ?parent, index, ?id, "item added");
        self.events.emit(ModelEvent::ItemsAdded {
            parent,
            index,
            count: 1,
        });
        if let Some((index, count)) = shown {
            self.events.emit(ModelEvent::ItemsShown { index, count });
        }
        Ok(id)
    }

    fn remove_sub_items(
        &self,
        parent: Option<ItemId>,
        index: usize,
        count: usize,
    ) -> ModelResult<Vec<Item<T>>> {
        let span = {
            let storage = self.storage.read();
            let len = storage.children(parent).ok_or(ModelError::InvalidItem)?.len();
            if index.checked_add(count).is_none_or(|end| end > len) {
                tracing::debug!(target: targets::MODEL, ?parent, index, count, len, "remove rejected");
                return Err(ModelError::IndexOutOfRange { index, len });
            }
            if count == 0 {
                return Ok(Vec::new());
            }
            storage.visible_span(parent, index, count)
        };

        let removed_event = |before| ModelEvent::ItemsRemoved {
            parent,
            index,
            count,
            before,
        };
        self.emit_hide(span, true);
        self.events.emit(removed_event(true));

        let removed = self.storage.write().remove_range(parent, index, count)?;
        tracing::debug!(target: targets::MODEL, ?parent, index, count, "items removed");

        self.emit_hide(span, false);
        self.events.emit(removed_event(false));
        Ok(removed)
    }

    fn move_item(
        &self,
        item: ItemId,
        parent: Option<ItemId>,
        index: Option<usize>,
    ) -> ModelResult<()> {
        let comparator = self.comparator.read().clone();
        let (old_parent, old_index, span) = {
            let storage = self.storage.read();
            let node = storage.node(item).ok_or(ModelError::InvalidItem)?;
            if let Some(target) = parent {
                if !storage.contains(target) {
                    return Err(ModelError::InvalidItem);
                }
                if storage.is_same_or_descendant(target, item) {
                    tracing::debug!(target: targets::MODEL, ?item, ?target, "move rejected: cycle");
                    return Err(ModelError::CycleDetected);
                }
            }
            let old_parent = node.parent;
            let old_index = storage.index_in_parent(item).ok_or(ModelError::InvalidItem)?;
            let mut len = storage.children(parent).map_or(0, <[ItemId]>::len);
            if parent == old_parent {
                len -= 1;
            }
            if let Some(index) = index
                && comparator.is_none()
                && index > len
            {
                return Err(ModelError::IndexOutOfRange { index, len });
            }
            (old_parent, old_index, storage.visible_span(old_parent, old_index, 1))
        };

        let removed_event = |before| ModelEvent::ItemsRemoved {
            parent: old_parent,
            index: old_index,
            count: 1,
            before,
        };
        self.emit_hide(span, true);
        self.events.emit(removed_event(true));
        let detached = self.storage.write().detach(item).is_some();
        self.emit_hide(span, false);
        self.events.emit(removed_event(false));
        if !detached {
            return Err(ModelError::InvalidItem);
        }

        let (index, shown) = {
            let mut storage = self.storage.write();
            let len = storage.children(parent).map_or(0, <[ItemId]>::len);
            let index = match &comparator {
                Some(cmp) => {
                    // The node is detached, so it is not among the siblings searched.
                    let arena: &NodeArena<T> = &storage;
                    let data = arena.node(item).ok_or(ModelError::InvalidItem)?.item.data();
                    arena.sorted_insertion_point(parent, data, cmp.as_ref())
                }
                None => index.unwrap_or(len).min(len),
            };
            // Parent may have vanished from under a re-entrant listener.
            if !storage.attach(item, parent, index) {
                storage.attach(item, old_parent, old_index);
                return Err(ModelError::InvalidItem);
            }
            let shown = storage
                .visible_index_of(item)
                .map(|visible| (visible, storage.projected_rows(item)));
            (index, shown)
        };

        tracing::debug!(target: targets::MODEL, ?item, ?parent, index, "item moved");
        self.events.emit(ModelEvent::ItemsAdded {
            parent,
            index,
            count: 1,
        });
        if let Some((index, count)) = shown {
            self.events.emit(ModelEvent::ItemsShown { index, count });
        }
        Ok(())
    }

    fn clear(&self) {
        let count = self.count_sub_items(None);
        if let Err(error) = self.remove_sub_items(None, 0, count) {
            tracing::debug!(target: targets::MODEL, %error, "clear failed");
        }
    }
}

impl<T: RowData> SortableTreeModel<T> for ColumnTreeModel<T> {
    fn set_sort_compare_function(&self, comparator: Option<SortComparator<T>>) {
        let Some(cmp) = comparator else {
            *self.comparator.write() = None;
            return;
        };
        *self.comparator.write() = Some(cmp.clone());
        {
            let _span = PerfSpan::new(span_names::RESORT);
            self.storage.write().sort_all(cmp.as_ref());
        }
        tracing::debug!(target: targets::MODEL, "model resorted");
        self.events.emit(ModelEvent::ItemsSorted);
    }

    fn has_sort_compare_function(&self) -> bool {
        self.comparator.read().is_some()
    }
}

impl<T: RowData> VisibilityTreeModel<T> for ColumnTreeModel<T> {
    fn expand_item(&self, item: ItemId) -> bool {
        let shown = {
            let mut storage = self.storage.write();
            let Some(node) = storage.node_mut(item) else {
                return false;
            };
            if !node.item.is_visible() || node.item.is_expanded() {
                return false;
            }
            node.item.set_flag(ItemFlags::EXPANDED, true);
            match storage.visible_index_of(item) {
                Some(visible) => {
                    let count = storage.count_visible_descendants(item);
                    (count > 0).then_some((visible + 1, count))
                }
                None => None,
            }
        };

        tracing::debug!(target: targets::MODEL, ?item, ?shown, "item expanded");
        if let Some((index, count)) = shown {
            self.events.emit(ModelEvent::ItemsShown { index, count });
        }
        self.events.emit(ModelEvent::ItemExpanded(item));
        true
    }

    fn collapse_item(&self, item: ItemId) -> bool {
        let hidden = {
            let storage = self.storage.read();
            let Some(node) = storage.node(item) else {
                return false;
            };
            if !node.item.is_visible() || !node.item.is_expanded() {
                return false;
            }
            match storage.visible_index_of(item) {
                Some(visible) => {
                    let count = storage.count_visible_descendants(item);
                    (count > 0).then_some((visible + 1, count))
                }
                None => None,
            }
        };

        self.emit_hide(hidden, true);
        let flipped = match self.storage.write().node_mut(item) {
            Some(node) => {
                node.item.set_flag(ItemFlags::EXPANDED, false);
                true
            }
            None => false,
        };
        self.emit_hide(hidden, false);
        if flipped {
            tracing::debug!(target: targets::MODEL, ?item, ?hidden, "item collapsed");
            self.events.emit(ModelEvent::ItemCollapsed(item));
        }
        flipped
    }

    fn set_item_visible(&self, item: ItemId, visible: bool) -> bool {
        if visible {
            let shown = {
                let mut storage = self.storage.write();
                let Some(node) = storage.node_mut(item) else {
                    return false;
                };
                if node.item.is_visible() {
                    return false;
                }
                node.item.set_flag(ItemFlags::VISIBLE, true);
                storage
                    .visible_index_of(item)
                    .map(|index| (index, storage.projected_rows(item)))
            };
            if let Some((index, count)) = shown {
                self.events.emit(ModelEvent::ItemsShown { index, count });
            }
            return true;
        }

        let hidden = {
            let storage = self.storage.read();
            match storage.node(item) {
                Some(node) if node.item.is_visible() => storage
                    .visible_index_of(item)
                    .map(|index| (index, storage.projected_rows(item))),
                _ => return false,
            }
        };
        self.emit_hide(hidden, true);
        let flipped = match self.storage.write().node_mut(item) {
            Some(node) => {
                node.item.set_flag(ItemFlags::VISIBLE, false);
                true
            }
            None => false,
        };
        self.emit_hide(hidden, false);
        flipped
    }

    fn expand_all(&self) -> usize {
        let candidates = self.storage.read().all_items();
        candidates
            .into_iter()
            .filter(|&id| self.has_sub_items(id) && self.expand_item(id))
            .count()
    }

    fn collapse_all(&self) -> usize {
        let candidates = self.storage.read().all_items();
        candidates
            .into_iter()
            .filter(|&id| self.collapse_item(id))
            .count()
    }
}

static_assertions::assert_impl_all!(ColumnTreeModel<String>: Send, Sync);
