//! Drag and drop: payloads, drop targets and drag previews.
//!
//! A row drag produces a [`DragPayload`] carrying the dragged [`ItemId`]s
//! under [`keys::ITEMS`], plus a rendered preview that the view hands to the
//! host with [`ViewHost::begin_drag`](super::ViewHost::begin_drag). On the
//! receiving side the view classifies the pointer position into a
//! [`DropTarget`], asks the host for an [`InsertionPoint`] and then moves the
//! items there.
//!
//! ```
//! use treeline::widget::{DragPayload, DropAction};
//!
//! let mut payload = DragPayload::new().with_supported_actions(DropAction::MOVE);
//! payload.set("text/plain", String::from("two rows"));
//! assert_eq!(payload.get::<String>("text/plain").map(String::as_str), Some("two rows"));
//! assert!(payload.get::<u32>("text/plain").is_none());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use treeline_core::logging::{PerfSpan, span_names, targets};
use treeline_render::ImageBuffer;

use crate::config::ViewConfig;
use crate::model::{ItemFlags, ItemId, TreeModel};

/// Well-known payload keys.
pub mod keys {
    /// `Vec<ItemId>`: the rows being dragged, in projection order.
    pub const ITEMS: &str = "treeline/items";
    /// `String`: a plain-text rendering of the dragged rows.
    pub const TEXT: &str = "text/plain";
}

/// Identity of a view, used to tell internal drops from foreign ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Drop action flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DropAction(u8);

impl DropAction {
    /// No action (drop not allowed).
    pub const NONE: Self = Self(0);
    /// Copy the data.
    pub const COPY: Self = Self(1 << 0);
    /// Move the data; the source gives up the original.
    pub const MOVE: Self = Self(1 << 1);
    /// Link to the data.
    pub const LINK: Self = Self(1 << 2);
    /// All standard actions.
    pub const ALL: Self = Self(Self::COPY.0 | Self::MOVE.0 | Self::LINK.0);

    pub fn can_copy(self) -> bool {
        self.contains(Self::COPY)
    }

    pub fn can_move(self) -> bool {
        self.contains(Self::MOVE)
    }

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for DropAction {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for DropAction {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

/// A bag of typed values travelling with a drag.
///
/// Values are looked up by key and downcast to the requested type; a lookup
/// with the wrong type simply misses.
#[derive(Clone)]
pub struct DragPayload {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
    source: Option<ViewId>,
    supported_actions: DropAction,
}

impl Default for DragPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl DragPayload {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            source: None,
            supported_actions: DropAction::MOVE,
        }
    }

    pub fn with_supported_actions(mut self, actions: DropAction) -> Self {
        self.supported_actions = actions;
        self
    }

    pub fn supported_actions(&self) -> DropAction {
        self.supported_actions
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// The value under `key`, if present and of type `V`.
    pub fn get<V: Any + Send + Sync>(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(|value| value.downcast_ref::<V>())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dragged rows, if the payload carries any.
    pub fn items(&self) -> Option<&[ItemId]> {
        self.get::<Vec<ItemId>>(keys::ITEMS).map(Vec::as_slice)
    }

    pub fn source(&self) -> Option<ViewId> {
        self.source
    }

    pub(crate) fn set_source(&mut self, source: ViewId) {
        self.source = Some(source);
    }

    /// Whether the payload was produced by `view`.
    pub fn is_from(&self, view: ViewId) -> bool {
        self.source == Some(view)
    }
}

impl fmt::Debug for DragPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("DragPayload")
            .field("keys", &keys)
            .field("source", &self.source)
            .field("supported_actions", &self.supported_actions)
            .finish()
    }
}

/// Where, relative to a row, a drop would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Between this row and the one above.
    Above,
    /// Between this row and the one below.
    Below,
    /// Onto the row, making the dropped items its children.
    OnItem,
    /// Below the last row.
    Viewport,
}

impl DropPosition {
    /// Classify a pointer `offset` within a row of `height`: the upper quarter
    /// is above, the lower quarter is below, the rest is onto the item.
    pub fn from_row_offset(offset: f32, height: f32) -> Self {
        let quarter = height / 4.0;
        if offset < quarter {
            Self::Above
        } else if offset >= height - quarter {
            Self::Below
        } else {
            Self::OnItem
        }
    }
}

/// A classified drop location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    /// Row under the pointer; `None` for [`DropPosition::Viewport`].
    pub item: Option<ItemId>,
    /// Projection index of `item`.
    pub row: Option<usize>,
    pub position: DropPosition,
}

impl DropTarget {
    pub fn viewport() -> Self {
        Self {
            item: None,
            row: None,
            position: DropPosition::Viewport,
        }
    }
}

/// A concrete insertion location in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    pub parent: Option<ItemId>,
    /// Child index under `parent`; `None` appends. Counted before any of the
    /// dragged items are taken out.
    pub index: Option<usize>,
}

/// The conventional mapping from a drop target to an insertion point.
///
/// Above/below a row inserts next to it among its siblings, except that
/// "below" an expanded row with children inserts as its first child. Onto a
/// row appends to its children; the viewport appends at the top level.
pub fn default_insertion_point<T>(model: &dyn TreeModel<T>, target: &DropTarget) -> Option<InsertionPoint> {
    let Some(item) = target.item else {
        return Some(InsertionPoint {
            parent: None,
            index: None,
        });
    };

    let parent = model.super_item_of(item).ok()?;
    let index = model.sub_item_index_of(item)?;
    let point = match target.position {
        DropPosition::Viewport => InsertionPoint {
            parent: None,
            index: None,
        },
        DropPosition::OnItem => InsertionPoint {
            parent: Some(item),
            index: None,
        },
        DropPosition::Above => InsertionPoint {
            parent,
            index: Some(index),
        },
        DropPosition::Below => {
            let opens_below = model
                .item_flags(item)
                .is_some_and(|flags| flags.contains(ItemFlags::EXPANDED | ItemFlags::VISIBLE))
                && model.has_sub_items(item);
            if opens_below {
                InsertionPoint {
                    parent: Some(item),
                    index: Some(0),
                }
            } else {
                InsertionPoint {
                    parent,
                    index: Some(index + 1),
                }
            }
        }
    };
    Some(point)
}

/// Crop an oversized row snapshot and fade its bottom edge.
///
/// `content_height` is the height of every dragged row stacked together; the
/// snapshot itself may already have been cut short of it. Content no taller
/// than `max_drag_preview_height` is returned unchanged.
pub fn compose_drag_preview(snapshot: ImageBuffer, content_height: u32, config: &ViewConfig) -> ImageBuffer {
    let max = config.max_drag_preview_height;
    if content_height <= max && snapshot.height() <= max {
        return snapshot;
    }
    let _span = PerfSpan::new(span_names::DRAG_PREVIEW);
    tracing::trace!(
        target: targets::DRAG,
        content_height,
        snapshot_height = snapshot.height(),
        max,
        "cropping drag preview"
    );
    let mut preview = if snapshot.height() > max {
        snapshot.crop(0, 0, snapshot.width(), max)
    } else {
        snapshot
    };
    preview.apply_vertical_fade(config.drag_preview_fade_height);
    preview
}
