//! The tree model contract.
//!
//! A model is split into one required read-only trait and optional capability
//! traits. Views ask for a capability with the `as_*` methods instead of
//! checking flags, so "this model cannot be written" is simply a `None`.
//!
//! | Trait | Capability |
//! |---|---|
//! | [`TreeModel`] | structural and projection queries, flag bookkeeping, notifications |
//! | [`WritableTreeModel`] | insert, remove, move |
//! | [`SortableTreeModel`] | active sort comparator |
//! | [`VisibilityTreeModel`] | expand, collapse, show, hide |

use std::cmp::Ordering;
use std::sync::Arc;

use treeline_core::Signal;

use super::events::ModelEvent;
use super::item::{Item, ItemFlags, ItemId};
use crate::error::{ModelError, ModelResult};

/// A comparator over item data, used as a strict weak ordering.
pub type SortComparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Read-only access to a hierarchical model.
///
/// `parent == None` denotes the top level throughout. Structural queries see
/// the full tree; the `visible_*` queries see only the visible projection: the
/// in-order sequence of visible items whose every ancestor is both visible and
/// expanded.
pub trait TreeModel<T>: Send + Sync {
    // ===== Structure =====

    /// Total number of attached items (the sentinel root is not counted).
    fn count_items(&self) -> usize;

    /// Number of children under `parent`; 0 for a stale handle.
    fn count_sub_items(&self, parent: Option<ItemId>) -> usize;

    /// The `index`th child of `parent`.
    fn sub_item_at(&self, parent: Option<ItemId>, index: usize) -> Option<ItemId>;

    /// Position of `item` among its siblings.
    fn sub_item_index_of(&self, item: ItemId) -> Option<usize>;

    /// Parent of `item`. `Ok(None)` for a top-level item.
    fn super_item_of(&self, item: ItemId) -> ModelResult<Option<ItemId>>;

    /// Depth of `item`; top-level items are at level 0.
    fn level_of(&self, item: ItemId) -> Option<usize>;

    /// Whether `item` is attached to this model.
    fn contains(&self, item: ItemId) -> bool;

    // ===== Visible projection =====

    fn count_visible_items(&self) -> usize;

    fn visible_item_at(&self, index: usize) -> Option<ItemId>;

    fn visible_index_of(&self, item: ItemId) -> Option<usize>;

    /// The whole projection in order.
    fn visible_items(&self) -> Vec<ItemId> {
        (0..self.count_visible_items())
            .filter_map(|index| self.visible_item_at(index))
            .collect()
    }

    // ===== Item state =====

    fn item_flags(&self, item: ItemId) -> Option<ItemFlags>;

    fn item_height(&self, item: ItemId) -> Option<f32>;

    fn item_offset(&self, item: ItemId) -> Option<f32>;

    /// Store the view's cached vertical offset for `item`.
    fn set_item_offset(&self, item: ItemId, offset: f32) -> bool;

    /// Set or clear the `SELECTED` flag. Fires no structural notification.
    fn set_item_selected(&self, item: ItemId, selected: bool) -> bool;

    /// Set or clear caller-reserved flag bits.
    fn set_item_caller_flags(&self, item: ItemId, flags: ItemFlags, on: bool) -> bool;

    /// Display text of `item` in `column`.
    fn cell_text(&self, item: ItemId, column: usize) -> Option<String>;

    // ===== Notifications =====

    /// Structural change notifications. Connect to listen, disconnect to stop.
    fn events(&self) -> &Signal<ModelEvent>;

    // ===== Capabilities =====

    fn as_writable(&self) -> Option<&dyn WritableTreeModel<T>> {
        None
    }

    fn as_sortable(&self) -> Option<&dyn SortableTreeModel<T>> {
        None
    }

    fn as_visibility(&self) -> Option<&dyn VisibilityTreeModel<T>> {
        None
    }

    fn has_sub_items(&self, item: ItemId) -> bool {
        self.count_sub_items(Some(item)) > 0
    }
}

/// Insertion, removal and reparenting.
pub trait WritableTreeModel<T>: TreeModel<T> {
    /// Insert `item` under `parent` at `index` (default: append).
    ///
    /// With an active sort comparator, `index` is ignored and the item goes
    /// after every sibling the comparator does not rank greater. Fires
    /// `ItemsAdded`, then `ItemsShown` if the new row is in the projection.
    fn add_sub_item(
        &self,
        parent: Option<ItemId>,
        item: Item<T>,
        index: Option<usize>,
    ) -> ModelResult<ItemId>;

    /// Remove `count` children of `parent` starting at `index`, with their
    /// subtrees. Returns the removed top items, detached.
    fn remove_sub_items(
        &self,
        parent: Option<ItemId>,
        index: usize,
        count: usize,
    ) -> ModelResult<Vec<Item<T>>>;

    /// Remove a single child.
    fn remove_sub_item(&self, parent: Option<ItemId>, index: usize) -> ModelResult<Item<T>> {
        self.remove_sub_items(parent, index, 1)?
            .pop()
            .ok_or(ModelError::IndexOutOfRange {
                index,
                len: self.count_sub_items(parent),
            })
    }

    /// Move `item` (and its subtree) under `parent` at `index` (default:
    /// append). Rejected with [`ModelError::CycleDetected`] when `parent` is
    /// `item` or one of its descendants.
    fn move_item(
        &self,
        item: ItemId,
        parent: Option<ItemId>,
        index: Option<usize>,
    ) -> ModelResult<()>;

    /// Remove every item.
    fn clear(&self);
}

/// An optional sort order over siblings.
pub trait SortableTreeModel<T>: TreeModel<T> {
    /// Install or clear the comparator.
    ///
    /// Installing one resorts the whole tree (stable) and fires `ItemsSorted`
    /// once. Clearing it leaves the current order in place.
    fn set_sort_compare_function(&self, comparator: Option<SortComparator<T>>);

    fn has_sort_compare_function(&self) -> bool;
}

/// Expand/collapse and per-item visibility.
pub trait VisibilityTreeModel<T>: TreeModel<T> {
    /// Expand a visible, collapsed item. Returns `false` for a no-op.
    fn expand_item(&self, item: ItemId) -> bool;

    /// Collapse a visible, expanded item. Returns `false` for a no-op.
    fn collapse_item(&self, item: ItemId) -> bool;

    /// Show or hide `item` and, with it, its projected descendants.
    fn set_item_visible(&self, item: ItemId, visible: bool) -> bool;

    /// Expand every item that has children. Returns the number expanded.
    fn expand_all(&self) -> usize;

    /// Collapse every expanded item. Returns the number collapsed.
    fn collapse_all(&self) -> usize;
}
