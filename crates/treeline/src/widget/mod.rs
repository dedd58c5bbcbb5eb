//! The view side of Treeline.
//!
//! [`ColumnTreeView`] renders a [`TreeModel`](crate::model::TreeModel) as
//! rows under a header strip and turns host input into selection, expansion,
//! column and drag-and-drop operations. Everything a host needs to drive it
//! lives here:
//!
//! - [`events`]: pointer and key events fed in by the host
//! - [`ViewHost`]: the callbacks the view makes back into the host
//! - [`ColumnLayout`]: column widths, order, header merging and sort indicator
//! - [`SelectionTracker`]: selected rows as projection indices
//! - [`InteractionState`]: the per-area pointer state machine
//! - [`DragPayload`] and friends: drag-and-drop data and drop classification
//!
//! Drag payloads are typed maps keyed by MIME-like strings:
//!
//! ```
//! use treeline::widget::{DragPayload, DropAction};
//!
//! let mut payload = DragPayload::new().with_supported_actions(DropAction::MOVE);
//! payload.set("text/plain", String::from("hello"));
//! assert_eq!(payload.get::<String>("text/plain").map(String::as_str), Some("hello"));
//! assert!(payload.supported_actions().can_move());
//! ```

mod column_tree_view;
mod columns;
mod drag_drop;
pub mod events;
mod host;
mod interaction;
mod mouse;
mod selection;

pub use column_tree_view::{ColumnTreeView, ExternalDrop, ViewSignals};
pub use columns::{Column, ColumnJoin, ColumnLayout, HeaderSpan, SortOrder};
pub use drag_drop::{
    DragPayload, DropAction, DropPosition, DropTarget, InsertionPoint, ViewId,
    compose_drag_preview, default_insertion_point, keys,
};
pub use events::{
    Key, KeyEvent, KeyboardModifiers, MouseButton, MouseButtons, PointerEvent, PointerEventKind,
    Transit,
};
pub use host::ViewHost;
pub use interaction::{
    DragState, HoverZone, InteractionState, InteractionTarget, PressState, ResizeState,
};
pub use mouse::{ClickKind, ClickTracker, DEFAULT_DOUBLE_CLICK_TIME_MS};
pub use selection::SelectionTracker;
