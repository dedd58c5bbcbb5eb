//! A read-only facade over another model.

use std::marker::PhantomData;
use std::sync::Arc;

use treeline_core::Signal;

use super::events::ModelEvent;
use super::item::{ItemFlags, ItemId};
use super::traits::TreeModel;
use crate::error::ModelResult;

/// Wraps a model and hides its capabilities.
///
/// Queries, flag bookkeeping and notifications are forwarded. The `as_*`
/// accessors all return `None`, so a view bound to a `ReadOnlyModel` cannot
/// insert, remove, reorder, sort or expand anything.
pub struct ReadOnlyModel<T, M: ?Sized> {
    inner: Arc<M>,
    _data: PhantomData<fn() -> T>,
}

impl<T, M: TreeModel<T> + ?Sized> ReadOnlyModel<T, M> {
    pub fn new(inner: Arc<M>) -> Self {
        Self {
            inner,
            _data: PhantomData,
        }
    }

    pub fn inner(&self) -> &Arc<M> {
        &self.inner
    }
}

impl<T, M: TreeModel<T> + ?Sized> TreeModel<T> for ReadOnlyModel<T, M> {
    fn count_items(&self) -> usize {
        self.inner.count_items()
    }

    fn count_sub_items(&self, parent: Option<ItemId>) -> usize {
        self.inner.count_sub_items(parent)
    }

    fn sub_item_at(&self, parent: Option<ItemId>, index: usize) -> Option<ItemId> {
        self.inner.sub_item_at(parent, index)
    }

    fn sub_item_index_of(&self, item: ItemId) -> Option<usize> {
        self.inner.sub_item_index_of(item)
    }

    fn super_item_of(&self, item: ItemId) -> ModelResult<Option<ItemId>> {
        self.inner.super_item_of(item)
    }

    fn level_of(&self, item: ItemId) -> Option<usize> {
        self.inner.level_of(item)
    }

    fn contains(&self, item: ItemId) -> bool {
        self.inner.contains(item)
    }

    fn count_visible_items(&self) -> usize {
        self.inner.count_visible_items()
    }

    fn visible_item_at(&self, index: usize) -> Option<ItemId> {
        self.inner.visible_item_at(index)
    }

    fn visible_index_of(&self, item: ItemId) -> Option<usize> {
        self.inner.visible_index_of(item)
    }

    fn visible_items(&self) -> Vec<ItemId> {
        self.inner.visible_items()
    }

    fn item_flags(&self, item: ItemId) -> Option<ItemFlags> {
        self.inner.item_flags(item)
    }

    fn item_height(&self, item: ItemId) -> Option<f32> {
        self.inner.item_height(item)
    }

    fn item_offset(&self, item: ItemId) -> Option<f32> {
        self.inner.item_offset(item)
    }

    fn set_item_offset(&self, item: ItemId, offset: f32) -> bool {
        self.inner.set_item_offset(item, offset)
    }

    fn set_item_selected(&self, item: ItemId, selected: bool) -> bool {
        self.inner.set_item_selected(item, selected)
    }

    fn set_item_caller_flags(&self, item: ItemId, flags: ItemFlags, on: bool) -> bool {
        self.inner.set_item_caller_flags(item, flags, on)
    }

    fn cell_text(&self, item: ItemId, column: usize) -> Option<String> {
        self.inner.cell_text(item, column)
    }

    fn events(&self) -> &Signal<ModelEvent> {
        self.inner.events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnTreeModel, Item, WritableTreeModel};

    #[test]
    fn test_read_only_hides_capabilities() {
        let model = Arc::new(ColumnTreeModel::<String>::new());
        model
            .add_sub_item(None, Item::new("a".to_string()), None)
            .unwrap();

        let facade = ReadOnlyModel::new(model.clone());
        assert_eq!(facade.count_items(), 1);
        assert_eq!(facade.count_visible_items(), 1);
        assert!(facade.as_writable().is_none());
        assert!(facade.as_sortable().is_none());
        assert!(facade.as_visibility().is_none());

        // Notifications still come from the wrapped model.
        model
            .add_sub_item(None, Item::new("b".to_string()), None)
            .unwrap();
        assert_eq!(facade.count_sub_items(None), 2);
        assert_eq!(facade.events().connection_count(), 0);
    }
}
