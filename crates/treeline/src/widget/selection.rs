//! Selection bookkeeping for a view.
//!
//! The tracker keeps the selected rows as a strictly ascending list of
//! projection indices and mirrors every change onto the items' `SELECTED`
//! flags, so the two never diverge. Structural notifications from the model
//! are fed in through the `on_items_*` methods, which shift or drop entries
//! to keep the indices pointing at the same items.
//!
//! The tracker never emits anything itself. Changes set a pending flag that
//! the owner collects with [`SelectionTracker::take_notification`] once it
//! has released its locks; while a batch is open the flag is held back, so a
//! compound operation produces one notification.

use std::ops::RangeInclusive;

use treeline_core::logging::targets;

use crate::error::{ModelError, ModelResult};
use crate::model::{ItemFlags, ItemId, TreeModel};

#[derive(Debug, Default)]
pub struct SelectionTracker {
    indices: Vec<usize>,
    batch_depth: usize,
    pending: bool,
    dirty: Option<(usize, usize)>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected projection indices, ascending.
    pub fn selected_indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    // ===== Batching =====

    /// Open a batch. Notifications are held until the matching `end_batch`.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    pub fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Whether a selection-changed notification is due. Clears the flag.
    /// Always `false` while a batch is open.
    pub fn take_notification(&mut self) -> bool {
        if self.in_batch() {
            return false;
        }
        std::mem::take(&mut self.pending)
    }

    /// Rows whose selection state changed since the last call, as an
    /// inclusive range.
    pub fn take_dirty(&mut self) -> Option<RangeInclusive<usize>> {
        self.dirty.take().map(|(first, last)| first..=last)
    }

    fn mark(&mut self, first: usize, last: usize) {
        self.pending = true;
        self.dirty = Some(match self.dirty {
            Some((a, b)) => (a.min(first), b.max(last)),
            None => (first, last),
        });
    }

    // ===== Selection operations =====

    /// Select the row at `index`. Without `extend`, everything else is
    /// deselected first. Returns `false` for an index outside the projection.
    pub fn select<T>(&mut self, model: &dyn TreeModel<T>, index: usize, extend: bool) -> bool {
        let Some(item) = model.visible_item_at(index) else {
            tracing::debug!(target: targets::SELECTION, index, "select rejected: no such row");
            return false;
        };

        self.begin_batch();
        if !extend {
            self.deselect_except(model, index, index);
        }
        if let Err(position) = self.indices.binary_search(&index) {
            self.indices.insert(position, index);
            model.set_item_selected(item, true);
            self.mark(index, index);
            tracing::trace!(target: targets::SELECTION, index, extend, "row selected");
        }
        self.end_batch();
        true
    }

    /// Select every row in `first..=last`. Without `extend`, rows outside the
    /// range are deselected first.
    pub fn select_range<T>(
        &mut self,
        model: &dyn TreeModel<T>,
        first: usize,
        last: usize,
        extend: bool,
    ) -> ModelResult<()> {
        let count = model.count_visible_items();
        if first > last || last >= count {
            tracing::debug!(target: targets::SELECTION, first, last, count, "range select rejected");
            return Err(ModelError::InvalidRange { first, last, count });
        }

        self.begin_batch();
        if !extend {
            self.deselect_except(model, first, last);
        }
        let rows = model.visible_items();
        let mut merged = Vec::with_capacity(self.indices.len() + (last - first + 1));
        let mut existing = self.indices.iter().copied().peekable();
        for index in first..=last {
            while let Some(&below) = existing.peek().filter(|&&i| i < index) {
                merged.push(below);
                existing.next();
            }
            if existing.peek() == Some(&index) {
                existing.next();
            } else if let Some(&item) = rows.get(index) {
                model.set_item_selected(item, true);
            }
            merged.push(index);
        }
        merged.extend(existing);
        self.indices = merged;
        self.mark(first, last);
        self.end_batch();

        tracing::debug!(target: targets::SELECTION, first, last, extend, "range selected");
        Ok(())
    }

    /// Flip the selection state of `index`.
    pub fn toggle<T>(&mut self, model: &dyn TreeModel<T>, index: usize) -> bool {
        if self.is_selected(index) {
            self.deselect(model, index)
        } else {
            self.select(model, index, true)
        }
    }

    pub fn deselect<T>(&mut self, model: &dyn TreeModel<T>, index: usize) -> bool {
        let Ok(position) = self.indices.binary_search(&index) else {
            return false;
        };
        self.indices.remove(position);
        if let Some(item) = model.visible_item_at(index) {
            model.set_item_selected(item, false);
        }
        self.mark(index, index);
        true
    }

    pub fn deselect_all<T>(&mut self, model: &dyn TreeModel<T>) {
        let (Some(&first), Some(&last)) = (self.indices.first(), self.indices.last()) else {
            return;
        };
        let removed = std::mem::take(&mut self.indices);
        self.clear_flags(model, &removed);
        self.mark(first, last);
        tracing::trace!(target: targets::SELECTION, count = removed.len(), "selection cleared");
    }

    /// Deselect every row outside `first..=last`; rows inside keep their state.
    pub fn deselect_except<T>(&mut self, model: &dyn TreeModel<T>, first: usize, last: usize) {
        let (keep, drop): (Vec<usize>, Vec<usize>) = self
            .indices
            .iter()
            .partition(|&&index| (first..=last).contains(&index));
        let (Some(&low), Some(&high)) = (drop.first(), drop.last()) else {
            return;
        };
        self.indices = keep;
        self.clear_flags(model, &drop);
        self.mark(low, high);
    }

    fn clear_flags<T>(&self, model: &dyn TreeModel<T>, rows: &[usize]) {
        match rows {
            [] => {}
            [index] => {
                if let Some(item) = model.visible_item_at(*index) {
                    model.set_item_selected(item, false);
                }
            }
            _ => {
                let items = model.visible_items();
                for item in rows.iter().filter_map(|&i| items.get(i)) {
                    model.set_item_selected(*item, false);
                }
            }
        }
    }

    // ===== Structural reindexing =====

    /// `count` rows entered the projection at `index`.
    pub fn on_items_shown(&mut self, index: usize, count: usize) {
        let start = self.indices.partition_point(|&i| i < index);
        for entry in &mut self.indices[start..] {
            *entry += count;
        }
    }

    /// `count` rows starting at `index` are leaving (`before`) or have left
    /// the projection.
    pub fn on_items_hidden<T>(&mut self, model: &dyn TreeModel<T>, index: usize, count: usize, before: bool) {
        let end = index + count;
        if before {
            let start = self.indices.partition_point(|&i| i < index);
            let stop = self.indices.partition_point(|&i| i < end);
            if start == stop {
                return;
            }
            let gone: Vec<usize> = self.indices.drain(start..stop).collect();
            self.clear_flags(model, &gone);
            self.pending = true;
            tracing::trace!(target: targets::SELECTION, index, count, dropped = gone.len(), "selection hidden");
        } else {
            let start = self.indices.partition_point(|&i| i < end);
            for entry in &mut self.indices[start..] {
                *entry -= count;
            }
        }
    }

    /// Rebuild from the items' `SELECTED` flags after a resort.
    pub fn rebuild<T>(&mut self, model: &dyn TreeModel<T>) {
        let rows = model.visible_items();
        let rebuilt: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, item)| is_flagged(model, **item))
            .map(|(index, _)| index)
            .collect();
        if rebuilt != self.indices {
            let low = rebuilt.first().into_iter().chain(self.indices.first()).min().copied();
            let high = rebuilt.last().into_iter().chain(self.indices.last()).max().copied();
            self.indices = rebuilt;
            if let (Some(low), Some(high)) = (low, high) {
                self.mark(low, high);
            }
        }
        tracing::debug!(target: targets::SELECTION, count = self.indices.len(), "selection rebuilt");
    }
}

fn is_flagged<T>(model: &dyn TreeModel<T>, item: ItemId) -> bool {
    model
        .item_flags(item)
        .is_some_and(|flags| flags.contains(ItemFlags::SELECTED))
}
