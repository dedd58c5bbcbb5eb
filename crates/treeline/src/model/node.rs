//! Node arena backing [`ColumnTreeModel`](super::ColumnTreeModel).
//!
//! Every attached item lives in exactly one [`Node`], stored in a slotmap and
//! addressed by its [`ItemId`]. Parent links are plain handles, never owning.
//! The sentinel root is not a node: its children are kept in `top_level`, and
//! its children are always visible.

use std::cmp::Ordering;

use slotmap::SlotMap;

use super::item::{Item, ItemFlags, ItemId};
use crate::error::{ModelError, ModelResult};

pub(crate) struct Node<T> {
    pub(crate) item: Item<T>,
    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    pub(crate) level: usize,
}

pub(crate) struct NodeArena<T> {
    nodes: SlotMap<ItemId, Node<T>>,
    top_level: Vec<ItemId>,
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            top_level: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn contains(&self, id: ItemId) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn node(&self, id: ItemId) -> Option<&Node<T>> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: ItemId) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id)
    }

    /// Children of `parent` (`None` is the top level). `None` for a stale parent.
    pub(crate) fn children(&self, parent: Option<ItemId>) -> Option<&[ItemId]> {
        match parent {
            None => Some(&self.top_level),
            Some(id) => self.nodes.get(id).map(|n| n.children.as_slice()),
        }
    }

    fn children_mut(&mut self, parent: Option<ItemId>) -> Option<&mut Vec<ItemId>> {
        match parent {
            None => Some(&mut self.top_level),
            Some(id) => self.nodes.get_mut(id).map(|n| &mut n.children),
        }
    }

    pub(crate) fn index_in_parent(&self, id: ItemId) -> Option<usize> {
        let parent = self.nodes.get(id)?.parent;
        self.children(parent)?.iter().position(|&c| c == id)
    }

    /// True if `id` is `ancestor` or lies anywhere below it.
    pub(crate) fn is_same_or_descendant(&self, id: ItemId, ancestor: ItemId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current).and_then(|n| n.parent);
        }
        false
    }

    // ===== Visible projection =====

    /// Whether the children of `parent` are part of the projection: every node
    /// from `parent` up to the root is visible and expanded.
    pub(crate) fn chain_holds(&self, parent: Option<ItemId>) -> bool {
        let mut cursor = parent;
        while let Some(id) = cursor {
            match self.nodes.get(id) {
                Some(node) if node.item.are_children_visible() => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Whether `id` itself appears in the visible projection.
    pub(crate) fn is_in_projection(&self, id: ItemId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.item.is_visible() && self.chain_holds(n.parent))
    }

    /// Projection rows contributed by the subtree at `id`: 1 for the node
    /// (if visible) plus its visible descendants.
    pub(crate) fn projected_rows(&self, id: ItemId) -> usize {
        match self.nodes.get(id) {
            Some(node) if node.item.is_visible() => 1 + self.count_visible_descendants(id),
            _ => 0,
        }
    }

    /// Visible descendants of `id`, assuming `id`'s own chain holds.
    pub(crate) fn count_visible_descendants(&self, id: ItemId) -> usize {
        match self.nodes.get(id) {
            Some(node) if node.item.are_children_visible() => node
                .children
                .iter()
                .map(|&child| self.projected_rows(child))
                .sum(),
            _ => 0,
        }
    }

    pub(crate) fn count_visible(&self) -> usize {
        self.top_level.iter().map(|&id| self.projected_rows(id)).sum()
    }

    /// Projection index of `id`, or `None` if it is not in the projection.
    pub(crate) fn visible_index_of(&self, id: ItemId) -> Option<usize> {
        if !self.is_in_projection(id) {
            return None;
        }
        let mut index = 0;
        let mut cursor = id;
        loop {
            let node = self.nodes.get(cursor)?;
            let siblings = self.children(node.parent)?;
            let position = siblings.iter().position(|&c| c == cursor)?;
            index += siblings[..position]
                .iter()
                .map(|&s| self.projected_rows(s))
                .sum::<usize>();
            match node.parent {
                Some(parent) => {
                    // The parent row itself precedes its children.
                    index += 1;
                    cursor = parent;
                }
                None => return Some(index),
            }
        }
    }

    /// Item at projection index `index`.
    pub(crate) fn visible_item_at(&self, mut index: usize) -> Option<ItemId> {
        let mut siblings: &[ItemId] = &self.top_level;
        'descend: loop {
            for &id in siblings {
                let rows = self.projected_rows(id);
                if index < rows {
                    if index == 0 {
                        return Some(id);
                    }
                    index -= 1;
                    siblings = &self.nodes.get(id)?.children;
                    continue 'descend;
                }
                index -= rows;
            }
            return None;
        }
    }

    /// The whole projection, in order.
    pub(crate) fn visible_items(&self) -> Vec<ItemId> {
        let mut out = Vec::new();
        self.collect_visible(&self.top_level, &mut out);
        out
    }

    fn collect_visible(&self, siblings: &[ItemId], out: &mut Vec<ItemId>) {
        for &id in siblings {
            if let Some(node) = self.nodes.get(id)
                && node.item.is_visible()
            {
                out.push(id);
                if node.item.are_children_visible() {
                    self.collect_visible(&node.children, out);
                }
            }
        }
    }

    /// Projection index and row count of siblings `[index, index + count)`
    /// under `parent`. `None` when none of them is currently in the projection.
    pub(crate) fn visible_span(
        &self,
        parent: Option<ItemId>,
        index: usize,
        count: usize,
    ) -> Option<(usize, usize)> {
        if !self.chain_holds(parent) {
            return None;
        }
        let siblings = self.children(parent)?.get(index..index + count)?;
        let first = *siblings.iter().find(|&&id| self.projected_rows(id) > 0)?;
        let rows: usize = siblings.iter().map(|&id| self.projected_rows(id)).sum();
        Some((self.visible_index_of(first)?, rows))
    }

    // ===== Structure =====

    /// Upper-bound binary search: the first sibling the comparator ranks
    /// strictly greater than `data`.
    pub(crate) fn sorted_insertion_point(
        &self,
        parent: Option<ItemId>,
        data: &T,
        compare: &dyn Fn(&T, &T) -> Ordering,
    ) -> usize {
        self.children(parent).map_or(0, |siblings| {
            siblings.partition_point(|&sibling| {
                self.nodes
                    .get(sibling)
                    .is_some_and(|n| compare(n.item.data(), data) != Ordering::Greater)
            })
        })
    }

    /// Insert `item` under `parent` at `index`. Nothing is modified on error.
    pub(crate) fn insert(
        &mut self,
        parent: Option<ItemId>,
        index: usize,
        mut item: Item<T>,
    ) -> ModelResult<ItemId> {
        let level = match parent {
            None => 0,
            Some(id) => self.nodes.get(id).ok_or(ModelError::InvalidItem)?.level + 1,
        };
        let siblings = self.children_mut(parent).ok_or(ModelError::InvalidItem)?;
        if index > siblings.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: siblings.len(),
            });
        }
        siblings
            .try_reserve(1)
            .map_err(|_| ModelError::AllocationFailed)?;

        item.set_flag(ItemFlags::SELECTED, false);
        let id = self.nodes.insert_with_key(|key| {
            item.attach(key);
            Node {
                item,
                parent,
                children: Vec::new(),
                level,
            }
        });
        if let Some(siblings) = self.children_mut(parent) {
            siblings.insert(index, id);
        }
        Ok(id)
    }

    /// Unlink `id` from its parent without destroying its subtree.
    pub(crate) fn detach(&mut self, id: ItemId) -> Option<(Option<ItemId>, usize)> {
        let parent = self.nodes.get(id)?.parent;
        let siblings = self.children_mut(parent)?;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.remove(index);
        Some((parent, index))
    }

    /// Link a detached node under `parent` at `index` and fix cached levels.
    pub(crate) fn attach(&mut self, id: ItemId, parent: Option<ItemId>, index: usize) -> bool {
        let level = match parent {
            None => 0,
            Some(p) => match self.nodes.get(p) {
                Some(node) => node.level + 1,
                None => return false,
            },
        };
        let Some(siblings) = self.children_mut(parent) else {
            return false;
        };
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
        self.set_level(id, level);
        true
    }

    /// Move `id` to its sorted slot among its current siblings. Flags and the
    /// subtree are untouched.
    pub(crate) fn reposition_sorted(&mut self, id: ItemId, compare: &dyn Fn(&T, &T) -> Ordering) -> bool {
        let Some((parent, old_index)) = self.detach(id) else {
            return false;
        };
        let index = match self.nodes.get(id) {
            Some(node) => self.sorted_insertion_point(parent, node.item.data(), compare),
            None => old_index,
        };
        if let Some(siblings) = self.children_mut(parent) {
            siblings.insert(index.min(siblings.len()), id);
        }
        index != old_index
    }

    fn set_level(&mut self, id: ItemId, level: usize) {
        let mut stack = vec![(id, level)];
        while let Some((current, level)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.level = level;
                stack.extend(node.children.iter().map(|&c| (c, level + 1)));
            }
        }
    }

    /// Remove siblings `[index, index + count)` of `parent` with their
    /// subtrees, returning the removed top items (detached).
    pub(crate) fn remove_range(
        &mut self,
        parent: Option<ItemId>,
        index: usize,
        count: usize,
    ) -> ModelResult<Vec<Item<T>>> {
        let siblings = self.children_mut(parent).ok_or(ModelError::InvalidItem)?;
        let len = siblings.len();
        if index.checked_add(count).is_none_or(|end| end > len) {
            return Err(ModelError::IndexOutOfRange { index, len });
        }
        let removed: Vec<ItemId> = siblings.drain(index..index + count).collect();

        let mut items = Vec::with_capacity(removed.len());
        for id in removed {
            if let Some(item) = self.destroy_subtree(id) {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Free `id` and everything below it. Descendant items are dropped.
    fn destroy_subtree(&mut self, id: ItemId) -> Option<Item<T>> {
        let node = self.nodes.remove(id)?;
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(mut descendant) = self.nodes.remove(child) {
                descendant.item.detach();
                stack.append(&mut descendant.children);
            }
        }
        let mut item = node.item;
        item.detach();
        Some(item)
    }

    /// Stable-sort every sibling list with `compare`.
    pub(crate) fn sort_all(&mut self, compare: &dyn Fn(&T, &T) -> Ordering) {
        let mut pending = vec![None];
        while let Some(parent) = pending.pop() {
            let Some(mut siblings) = self.children_mut(parent).map(std::mem::take) else {
                continue;
            };
            siblings.sort_by(|&a, &b| match (self.nodes.get(a), self.nodes.get(b)) {
                (Some(a), Some(b)) => compare(a.item.data(), b.item.data()),
                _ => Ordering::Equal,
            });
            pending.extend(siblings.iter().map(|&id| Some(id)));
            if let Some(slot) = self.children_mut(parent) {
                *slot = siblings;
            }
        }
    }

    /// All attached handles, depth-first in sibling order.
    pub(crate) fn all_items(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ItemId> = self.top_level.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}
