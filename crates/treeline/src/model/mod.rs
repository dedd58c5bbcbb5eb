//! Hierarchical item model.
//!
//! A model owns a forest of [`Item`]s addressed by stable [`ItemId`] handles
//! and reports every structural change through its [`ModelEvent`] signal.
//!
//! Besides the full tree, every model exposes a *visible projection*: the
//! in-order list of visible items whose ancestors are all visible and
//! expanded. Views address rows by their index in that projection.
//!
//! # Capabilities
//!
//! [`TreeModel`] is the read-only contract. Writing, sorting and
//! expand/collapse are optional traits reached through
//! [`TreeModel::as_writable`], [`TreeModel::as_sortable`] and
//! [`TreeModel::as_visibility`]. [`ColumnTreeModel`] implements all of them;
//! [`ReadOnlyModel`] wraps any model and implements none.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use treeline::model::{
//!     ColumnTreeModel, Item, SortableTreeModel, TreeModel, WritableTreeModel,
//! };
//!
//! let model = ColumnTreeModel::<String>::new();
//! for name in ["pear", "apple", "fig"] {
//!     model.add_sub_item(None, Item::new(name.to_string()), None).unwrap();
//! }
//! model.set_sort_compare_function(Some(Arc::new(|a: &String, b: &String| a.cmp(b))));
//!
//! let first = model.visible_item_at(0).unwrap();
//! assert_eq!(model.cell_text(first, 0).as_deref(), Some("apple"));
//! ```

mod debug;
mod events;
mod item;
mod node;
mod read_only;
mod traits;
mod tree_model;

pub use debug::{TreeDump, TreeDumpOptions, TreeStyle};
pub use events::ModelEvent;
pub use item::{CALLER_FLAG_COUNT, DEFAULT_ITEM_HEIGHT, Item, ItemFlags, ItemId, RowData};
pub use read_only::ReadOnlyModel;
pub use traits::{
    SortComparator, SortableTreeModel, TreeModel, VisibilityTreeModel, WritableTreeModel,
};
pub use tree_model::ColumnTreeModel;
