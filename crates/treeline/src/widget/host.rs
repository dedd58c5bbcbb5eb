//! The services a view needs from its host.

use std::sync::Arc;
use std::time::Duration;

use treeline_render::{ImageBuffer, Rect};

use super::drag_drop::{DragPayload, DropTarget, InsertionPoint, default_insertion_point};
use crate::model::TreeModel;

/// Host environment of a [`ColumnTreeView`](super::ColumnTreeView).
///
/// The view calls these synchronously from inside its event handlers. None of
/// them may call back into the view.
pub trait ViewHost<T>: Send + Sync {
    /// Monotonic current time.
    fn now(&self) -> Duration;

    /// The platform double-click interval. `None` falls back to
    /// [`ViewConfig::double_click_interval_ms`](crate::ViewConfig::double_click_interval_ms).
    fn double_click_interval(&self) -> Option<Duration> {
        None
    }

    /// Mark `rect` (view-local coordinates) as needing a repaint.
    fn invalidate(&self, rect: Rect);

    /// Start a host-level drag. Returns `false` if the host refused.
    fn begin_drag(&self, payload: Arc<DragPayload>, preview: ImageBuffer) -> bool;

    /// Where a drop on `target` should insert, or `None` to refuse the drop.
    fn compute_insertion_point(
        &self,
        model: &dyn TreeModel<T>,
        payload: &DragPayload,
        target: &DropTarget,
    ) -> Option<InsertionPoint> {
        let _ = payload;
        default_insertion_point(model, target)
    }
}
