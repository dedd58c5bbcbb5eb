//! Treeline - a hierarchical multi-column tree control.
//!
//! The crate is split into a model and a view:
//!
//! - [`model`]: a forest of items behind stable [`ItemId`](model::ItemId)
//!   handles, with a visible projection of expanded rows and structural
//!   change notifications. [`ColumnTreeModel`](model::ColumnTreeModel) is the
//!   stock implementation; any type implementing
//!   [`TreeModel`](model::TreeModel) can back a view.
//! - [`widget`]: [`ColumnTreeView`](widget::ColumnTreeView), which paints a
//!   model through a [`Painter`](render::Painter) and reacts to pointer and
//!   key events supplied by the host.
//!
//! Treeline owns no window, event loop or GPU state. The host forwards input,
//! implements [`ViewHost`](widget::ViewHost) for repaint requests and drag
//! sessions, and paints dirty regions when asked.
//!
//! # Logging
//!
//! Instrumentation goes through `tracing` under the targets listed in
//! [`logging::targets`]; install any subscriber to see it.

pub mod config;
pub mod error;
pub mod model;
pub mod widget;

pub use config::{ViewConfig, ViewStyle};
pub use error::{ModelError, ModelResult, ViewError, ViewResult};
pub use treeline_core::{ConnectionGuard, ConnectionId, Signal, logging};

/// Drawing types and painters.
pub mod render {
    pub use treeline_render::*;
}
