//! The column tree view.
//!
//! [`ColumnTreeView`] shows a [`TreeModel`] as indented rows under a strip of
//! column headers. It owns the selection, the current row, the column layout
//! and one interaction state machine per area (header strip and rows). The
//! host feeds it pointer and key events, gives it a viewport size, and calls
//! [`paint`](ColumnTreeView::paint) when a region needs drawing.
//!
//! # Model notifications
//!
//! The view listens to the model's [`ModelEvent`]s to keep selection indices,
//! the current row and the row cache consistent, and to request repaints of
//! the affected region. The listener shares the view's state through a mutex
//! that the view never holds while calling a mutating model operation, so a
//! model notification can always get in.
//!
//! # Signals
//!
//! - `selection_changed()`: once per user-visible selection change
//! - `item_invoked(ItemId)`: double click or Enter
//! - `current_changed(Option<ItemId>)`: the keyboard focus row moved
//! - `header_clicked(usize)`: a header was clicked (logical label column)
//! - `column_resized((usize, f32, f32))`: column, old width, new width
//! - `column_moved((usize, usize, usize))`: column, old visual, new visual
//! - `sort_changed((usize, SortOrder))`: the sort column or direction changed
//! - `external_drop(ExternalDrop)`: a payload from elsewhere was dropped

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use treeline_core::logging::{PerfSpan, span_names, targets};
use treeline_core::{ConnectionId, Signal};
use treeline_render::{
    HorizontalAlign, ImageBuffer, Painter, Point, RasterPainter, Rect, Size, Stroke, TextStyle,
};

use super::columns::{Column, ColumnJoin, ColumnLayout, SortOrder};
use super::drag_drop::{
    DragPayload, DropPosition, DropTarget, InsertionPoint, ViewId, compose_drag_preview, keys,
};
use super::events::{Key, KeyEvent, KeyboardModifiers, PointerEvent, PointerEventKind, Transit};
use super::host::ViewHost;
use super::interaction::{DragState, HoverZone, InteractionState, InteractionTarget, PressState};
use super::mouse::{ClickKind, ClickTracker};
use super::selection::SelectionTracker;
use crate::config::{ViewConfig, ViewStyle};
use crate::error::{ModelError, ViewError, ViewResult};
use crate::model::{
    ItemFlags, ItemId, ModelEvent, RowData, SortComparator, TreeModel, WritableTreeModel,
};

/// A payload from another source dropped on the view.
#[derive(Debug, Clone)]
pub struct ExternalDrop {
    pub payload: Arc<DragPayload>,
    pub target: DropTarget,
    /// Where the host decided the drop should go.
    pub point: InsertionPoint,
}

/// Notifications a view sends to its consumers.
#[derive(Debug, Default)]
pub struct ViewSignals {
    pub selection_changed: Signal<()>,
    pub item_invoked: Signal<ItemId>,
    pub current_changed: Signal<Option<ItemId>>,
    pub header_clicked: Signal<usize>,
    pub column_resized: Signal<(usize, f32, f32)>,
    pub column_moved: Signal<(usize, usize, usize)>,
    pub sort_changed: Signal<(usize, SortOrder)>,
    pub external_drop: Signal<ExternalDrop>,
}

static_assertions::assert_impl_all!(ViewSignals: Send, Sync);

/// One row of the cached projection.
#[derive(Debug, Clone, Copy)]
struct RowEntry {
    item: ItemId,
    /// Offset from the top of the content.
    top: f32,
    height: f32,
    level: usize,
}

/// State shared between the view and its model listener.
#[derive(Debug)]
struct ViewState {
    selection: SelectionTracker,
    rows: Vec<RowEntry>,
    rows_dirty: bool,
    /// Height of rows whose item reports none.
    row_height: f32,
    content_height: f32,
    scroll_y: f32,
    viewport: Size,
    header_height: f32,
    current: Option<ItemId>,
    anchor: Option<ItemId>,
    hover_row: Option<usize>,
    header_hover: Option<usize>,
    header_pressed: Option<usize>,
    drop_target: Option<DropTarget>,
}

/// What the model listener needs to do once the state lock is released.
#[derive(Debug, Default)]
struct ListenerOutcome {
    invalid: Option<Rect>,
    selection_changed: bool,
    current_lost: bool,
}

impl ViewState {
    fn new(header_height: f32, row_height: f32) -> Self {
        Self {
            selection: SelectionTracker::new(),
            rows: Vec::new(),
            rows_dirty: true,
            row_height,
            content_height: 0.0,
            scroll_y: 0.0,
            viewport: Size::ZERO,
            header_height,
            current: None,
            anchor: None,
            hover_row: None,
            header_hover: None,
            header_pressed: None,
            drop_target: None,
        }
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height)
    }

    fn header_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.width, self.header_height.min(self.viewport.height))
    }

    fn rows_rect(&self) -> Rect {
        Rect::new(
            0.0,
            self.header_height,
            self.viewport.width,
            (self.viewport.height - self.header_height).max(0.0),
        )
    }

    fn max_scroll(&self) -> f32 {
        (self.content_height - self.rows_rect().height()).max(0.0)
    }

    /// Row `index` in view coordinates.
    fn row_rect(&self, index: usize) -> Option<Rect> {
        let row = self.rows.get(index)?;
        Some(Rect::new(
            0.0,
            self.header_height + row.top - self.scroll_y,
            self.viewport.width,
            row.height,
        ))
    }

    /// Everything from row `index` to the bottom of the viewport.
    fn rows_from(&self, index: usize) -> Option<Rect> {
        let top = self.rows.get(index).map_or(self.content_height, |row| row.top);
        let y = (self.header_height + top - self.scroll_y).max(self.header_height);
        let height = self.viewport.height - y;
        (height > 0.0 && self.viewport.width > 0.0).then(|| Rect::new(0.0, y, self.viewport.width, height))
    }

    fn row_at_content_y(&self, y: f32) -> Option<usize> {
        let index = self.rows.partition_point(|row| row.top + row.height <= y);
        self.rows.get(index).filter(|row| y >= row.top).map(|_| index)
    }

    fn rebuild_rows<T>(&mut self, model: &dyn TreeModel<T>) {
        let fallback_height = self.row_height;
        let _span = PerfSpan::new(span_names::ROW_CACHE);
        let mut top = 0.0;
        self.rows = model
            .visible_items()
            .into_iter()
            .map(|item| {
                let height = model
                    .item_height(item)
                    .filter(|height| *height > 0.0)
                    .unwrap_or(fallback_height);
                model.set_item_offset(item, top);
                let row = RowEntry {
                    item,
                    top,
                    height,
                    level: model.level_of(item).unwrap_or(0),
                };
                top += height;
                row
            })
            .collect();
        self.content_height = top;
        self.scroll_y = self.scroll_y.clamp(0.0, self.max_scroll());
        self.rows_dirty = false;
        tracing::trace!(target: targets::LAYOUT, rows = self.rows.len(), height = top, "row cache rebuilt");
    }

    /// Rebuild the row cache if the projection moved since the last build.
    fn fresh_rows<T>(&mut self, model: &dyn TreeModel<T>) {
        if self.rows_dirty {
            self.rebuild_rows(model);
        }
    }

    fn projection_changed(&mut self) {
        self.rows_dirty = true;
        self.hover_row = None;
        self.drop_target = None;
    }

    /// Repaint rects are measured against a row cache rebuilt for the model's
    /// current projection.
    fn apply_model_event<T>(&mut self, event: &ModelEvent, model: &dyn TreeModel<T>) -> ListenerOutcome {
        let mut outcome = ListenerOutcome::default();
        match *event {
            ModelEvent::ItemsShown { index, count } => {
                self.selection.on_items_shown(index, count);
                self.projection_changed();
                self.fresh_rows(model);
                outcome.invalid = self.rows_from(index);
            }
            ModelEvent::ItemsHidden {
                index,
                count,
                before: true,
            } => {
                self.fresh_rows(model);
                outcome.invalid = self.rows_from(index);
                let leaving = |item: Option<ItemId>| {
                    item.and_then(|item| model.visible_index_of(item))
                        .is_some_and(|row| (index..index + count).contains(&row))
                };
                if leaving(self.current) {
                    self.current = None;
                    outcome.current_lost = true;
                }
                if leaving(self.anchor) {
                    self.anchor = None;
                }
                self.selection.on_items_hidden(model, index, count, true);
            }
            ModelEvent::ItemsHidden {
                index,
                count,
                before: false,
            } => {
                self.selection.on_items_hidden(model, index, count, false);
                self.projection_changed();
            }
            ModelEvent::ItemsSorted => {
                self.projection_changed();
                self.selection.rebuild(model);
                self.fresh_rows(model);
                outcome.invalid = self.rows_from(0);
            }
            ModelEvent::ItemExpanded(item) | ModelEvent::ItemCollapsed(item) => {
                self.rows_dirty = true;
                self.fresh_rows(model);
                outcome.invalid = model
                    .visible_index_of(item)
                    .and_then(|row| self.row_rect(row));
            }
            ModelEvent::ItemChanged(item) => {
                self.fresh_rows(model);
                outcome.invalid = model
                    .visible_index_of(item)
                    .and_then(|row| self.row_rect(row));
            }
            ModelEvent::ItemsAdded { .. } | ModelEvent::ItemsRemoved { .. } => {}
        }

        outcome.selection_changed = self.selection.take_notification();
        if let Some(range) = self.selection.take_dirty() {
            self.fresh_rows(model);
            let rows = self.rows_union(range);
            outcome.invalid = match (outcome.invalid, rows) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            };
        }
        outcome
    }

    fn rows_union(&self, range: RangeInclusive<usize>) -> Option<Rect> {
        let first = self.row_rect(*range.start());
        let last = self
            .row_rect(*range.end())
            .or_else(|| self.rows.len().checked_sub(1).and_then(|i| self.row_rect(i)));
        let rect = match (first, last) {
            (Some(a), Some(b)) => a.union(&b),
            (a, b) => a.or(b)?,
        };
        rect.intersect(&self.rows_rect())
    }
}

/// Which part of the view the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Area {
    Header,
    Rows,
}

#[derive(Debug, Default)]
struct TypeAhead {
    buffer: String,
    last: Option<Duration>,
}

/// Per-row paint decorations.
#[derive(Debug, Clone, Copy, Default)]
struct RowDecor {
    selected: bool,
    hovered: bool,
    current: bool,
}

/// A multi-column tree view over a shared model.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use treeline::model::{ColumnTreeModel, Item, WritableTreeModel};
/// use treeline::render::{ImageBuffer, Rect, Size};
/// use treeline::widget::{Column, ColumnTreeView, DragPayload, ViewHost};
/// use treeline::ViewConfig;
///
/// struct Host;
///
/// impl ViewHost<String> for Host {
///     fn now(&self) -> Duration {
///         Duration::ZERO
///     }
///     fn invalidate(&self, _rect: Rect) {}
///     fn begin_drag(&self, _payload: Arc<DragPayload>, _preview: ImageBuffer) -> bool {
///         false
///     }
/// }
///
/// let model = Arc::new(ColumnTreeModel::<String>::new());
/// model.add_sub_item(None, Item::new("readme".to_string()), None).unwrap();
///
/// let mut view = ColumnTreeView::new(model, Arc::new(Host), ViewConfig::default()).unwrap();
/// view.add_column(Column::new("Name", 200.0));
/// view.set_viewport_size(Size::new(300.0, 200.0));
/// assert!(view.select(0, false));
/// assert_eq!(view.selected_indices(), vec![0]);
/// ```
pub struct ColumnTreeView<T: RowData> {
    id: ViewId,
    model: Arc<dyn TreeModel<T>>,
    host: Arc<dyn ViewHost<T>>,
    config: ViewConfig,
    style: ViewStyle,
    columns: ColumnLayout,
    state: Arc<Mutex<ViewState>>,
    signals: Arc<ViewSignals>,
    connection: ConnectionId,
    clicks: ClickTracker,
    type_ahead: TypeAhead,
    row_interaction: InteractionState,
    header_interaction: InteractionState,
    pointer_area: Option<Area>,
    last_pointer: Point,
}

impl<T: RowData> ColumnTreeView<T> {
    /// Create a view over `model`. Fails if `config` does not validate.
    pub fn new(model: Arc<dyn TreeModel<T>>, host: Arc<dyn ViewHost<T>>, config: ViewConfig) -> ViewResult<Self> {
        config.validate()?;
        let state = Arc::new(Mutex::new(ViewState::new(config.header_height, config.row_height)));
        let signals = Arc::new(ViewSignals::default());
        let connection = Self::connect_model(&model, &state, &host, &signals);
        {
            let mut state = state.lock();
            state.selection.rebuild(model.as_ref());
            state.selection.take_notification();
            state.selection.take_dirty();
        }

        let id = ViewId::next();
        tracing::debug!(target: targets::VIEW, ?id, "view created");
        Ok(Self {
            id,
            model,
            host,
            columns: ColumnLayout::new(config.min_column_width),
            config,
            style: ViewStyle::default(),
            state,
            signals,
            connection,
            clicks: ClickTracker::new(),
            type_ahead: TypeAhead::default(),
            row_interaction: InteractionState::Outside,
            header_interaction: InteractionState::Outside,
            pointer_area: None,
            last_pointer: Point::ZERO,
        })
    }

    fn connect_model(
        model: &Arc<dyn TreeModel<T>>,
        state: &Arc<Mutex<ViewState>>,
        host: &Arc<dyn ViewHost<T>>,
        signals: &Arc<ViewSignals>,
    ) -> ConnectionId {
        let weak = Arc::downgrade(model);
        let state = Arc::clone(state);
        let host = Arc::clone(host);
        let signals = Arc::clone(signals);
        model.events().connect(move |event| {
            let Some(model) = weak.upgrade() else {
                return;
            };
            let outcome = state.lock().apply_model_event(event, model.as_ref());
            if let Some(rect) = outcome.invalid {
                host.invalidate(rect);
            }
            if outcome.current_lost {
                signals.current_changed.emit(None);
            }
            if outcome.selection_changed {
                signals.selection_changed.emit(());
            }
        })
    }

    /// Show a different model. Selection and the current row start over from
    /// the new model's flags.
    pub fn set_model(&mut self, model: Arc<dyn TreeModel<T>>) {
        self.model.events().disconnect(self.connection);
        self.row_interaction = InteractionState::Outside;
        self.header_interaction = InteractionState::Outside;
        self.pointer_area = None;
        {
            let mut state = self.state.lock();
            let (viewport, header_height) = (state.viewport, state.header_height);
            *state = ViewState::new(header_height, self.config.row_height);
            state.viewport = viewport;
            state.selection.rebuild(model.as_ref());
            state.selection.take_notification();
            state.selection.take_dirty();
        }
        self.connection = Self::connect_model(&model, &self.state, &self.host, &self.signals);
        self.model = model;
        tracing::debug!(target: targets::VIEW, id = ?self.id, "model replaced");
        self.invalidate_all();
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn model(&self) -> &Arc<dyn TreeModel<T>> {
        &self.model
    }

    pub fn signals(&self) -> &ViewSignals {
        &self.signals
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn style(&self) -> &ViewStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: ViewStyle) {
        self.style = style;
        self.invalidate_all();
    }

    pub fn row_interaction(&self) -> &InteractionState {
        &self.row_interaction
    }

    pub fn header_interaction(&self) -> &InteractionState {
        &self.header_interaction
    }

    /// The drop target under an active drag, if any.
    pub fn drop_target(&self) -> Option<DropTarget> {
        self.state.lock().drop_target
    }

    // =========================================================================
    // Geometry and scrolling
    // =========================================================================

    pub fn viewport_size(&self) -> Size {
        self.state.lock().viewport
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        {
            let mut state = self.state.lock();
            if state.viewport == size {
                return;
            }
            state.viewport = size;
            state.scroll_y = state.scroll_y.clamp(0.0, state.max_scroll());
        }
        tracing::trace!(target: targets::LAYOUT, width = size.width, height = size.height, "viewport resized");
        self.invalidate_all();
    }

    fn ensure_rows(&self) {
        let mut state = self.state.lock();
        if state.rows_dirty {
            state.rebuild_rows(self.model.as_ref());
        }
    }

    /// Total height of all rows.
    pub fn content_height(&self) -> f32 {
        self.ensure_rows();
        self.state.lock().content_height
    }

    pub fn scroll_offset(&self) -> f32 {
        self.state.lock().scroll_y
    }

    /// Scroll so that content offset `offset` is at the top of the row area.
    /// Returns `false` if the clamped offset did not change.
    pub fn scroll_to(&self, offset: f32) -> bool {
        self.ensure_rows();
        let changed = {
            let mut state = self.state.lock();
            let clamped = offset.clamp(0.0, state.max_scroll());
            let changed = clamped != state.scroll_y;
            state.scroll_y = clamped;
            changed
        };
        if changed {
            tracing::trace!(target: targets::VIEW, offset, "scrolled");
            self.invalidate_all();
        }
        changed
    }

    pub fn scroll_by(&self, delta: f32) -> bool {
        self.scroll_to(self.scroll_offset() + delta)
    }

    /// Scroll the least amount that brings row `index` fully into view.
    pub fn ensure_visible(&self, index: usize) -> bool {
        self.ensure_rows();
        let target = {
            let state = self.state.lock();
            let Some(row) = state.rows.get(index) else {
                return false;
            };
            let visible = state.rows_rect().height();
            if row.top < state.scroll_y {
                row.top
            } else if row.top + row.height > state.scroll_y + visible {
                row.top + row.height - visible
            } else {
                return false;
            }
        };
        self.scroll_to(target)
    }

    /// Projection index of the row under `position`.
    pub fn row_at(&self, position: Point) -> Option<usize> {
        self.ensure_rows();
        let state = self.state.lock();
        if !state.rows_rect().contains(position) {
            return None;
        }
        state.row_at_content_y(position.y - state.header_height + state.scroll_y)
    }

    /// Row `index` in view coordinates.
    pub fn row_rect(&self, index: usize) -> Option<Rect> {
        self.ensure_rows();
        self.state.lock().row_rect(index)
    }

    fn area_at(&self, position: Point) -> Option<Area> {
        let state = self.state.lock();
        if !state.bounds().contains(position) {
            None
        } else if position.y < state.header_height {
            Some(Area::Header)
        } else {
            Some(Area::Rows)
        }
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    fn invalidate(&self, rect: Option<Rect>) {
        if let Some(rect) = rect.filter(|rect| !rect.is_empty()) {
            self.host.invalidate(rect);
        }
    }

    fn invalidate_all(&self) {
        let bounds = self.state.lock().bounds();
        self.invalidate(Some(bounds));
    }

    fn invalidate_header(&self) {
        let rect = self.state.lock().header_rect();
        self.invalidate(Some(rect));
    }

    fn invalidate_rows(&self, range: RangeInclusive<usize>) {
        let rect = self.state.lock().rows_union(range);
        self.invalidate(rect);
    }

    fn invalidate_item(&self, item: Option<ItemId>) {
        if let Some(row) = item.and_then(|item| self.model.visible_index_of(item)) {
            self.invalidate_rows(row..=row);
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Run a tracker operation, then repaint and notify outside the lock.
    fn with_selection<R>(&self, op: impl FnOnce(&mut SelectionTracker, &dyn TreeModel<T>) -> R) -> R {
        let (result, notify, dirty) = {
            let mut state = self.state.lock();
            let result = op(&mut state.selection, self.model.as_ref());
            (result, state.selection.take_notification(), state.selection.take_dirty())
        };
        if let Some(range) = dirty {
            self.ensure_rows();
            self.invalidate_rows(range);
        }
        if notify {
            self.signals.selection_changed.emit(());
        }
        result
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.state.lock().selection.selected_indices().to_vec()
    }

    pub fn selected_items(&self) -> Vec<ItemId> {
        let indices = self.selected_indices();
        indices
            .into_iter()
            .filter_map(|index| self.model.visible_item_at(index))
            .collect()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.state.lock().selection.is_selected(index)
    }

    pub fn select(&self, index: usize, extend: bool) -> bool {
        self.with_selection(|selection, model| selection.select(model, index, extend))
    }

    pub fn select_range(&self, first: usize, last: usize, extend: bool) -> ViewResult<()> {
        self.with_selection(|selection, model| selection.select_range(model, first, last, extend))?;
        Ok(())
    }

    pub fn select_all(&self) -> bool {
        match self.model.count_visible_items().checked_sub(1) {
            Some(last) => self.select_range(0, last, false).is_ok(),
            None => false,
        }
    }

    pub fn toggle_selection(&self, index: usize) -> bool {
        self.with_selection(|selection, model| selection.toggle(model, index))
    }

    pub fn deselect(&self, index: usize) -> bool {
        self.with_selection(|selection, model| selection.deselect(model, index))
    }

    pub fn deselect_all(&self) {
        self.with_selection(|selection, model| selection.deselect_all(model));
    }

    pub fn deselect_except(&self, first: usize, last: usize) {
        self.with_selection(|selection, model| selection.deselect_except(model, first, last));
    }

    // =========================================================================
    // Current row
    // =========================================================================

    pub fn current_item(&self) -> Option<ItemId> {
        self.state.lock().current
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_item().and_then(|item| self.model.visible_index_of(item))
    }

    /// Make row `index` current without touching the selection.
    pub fn set_current_index(&self, index: usize) -> bool {
        match self.model.visible_item_at(index) {
            Some(item) => {
                self.set_current(Some(item));
                true
            }
            None => false,
        }
    }

    fn set_current(&self, item: Option<ItemId>) {
        let previous = std::mem::replace(&mut self.state.lock().current, item);
        if previous == item {
            return;
        }
        self.ensure_rows();
        self.invalidate_item(previous);
        self.invalidate_item(item);
        tracing::trace!(target: targets::VIEW, ?item, "current row changed");
        self.signals.current_changed.emit(item);
    }

    fn set_anchor(&self, item: Option<ItemId>) {
        self.state.lock().anchor = item;
    }

    fn anchor_index(&self) -> Option<usize> {
        let anchor = self.state.lock().anchor;
        anchor.and_then(|item| self.model.visible_index_of(item))
    }

    fn invoke(&self, index: usize) {
        if let Some(item) = self.model.visible_item_at(index) {
            tracing::debug!(target: targets::VIEW, index, "item invoked");
            self.signals.item_invoked.emit(item);
        }
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    pub fn expand(&self, index: usize) -> bool {
        let Some(item) = self.model.visible_item_at(index) else {
            return false;
        };
        match self.model.as_visibility() {
            Some(visibility) => visibility.expand_item(item),
            None => {
                tracing::debug!(target: targets::VIEW, index, "expand ignored: model has no visibility control");
                false
            }
        }
    }

    pub fn collapse(&self, index: usize) -> bool {
        let Some(item) = self.model.visible_item_at(index) else {
            return false;
        };
        match self.model.as_visibility() {
            Some(visibility) => visibility.collapse_item(item),
            None => {
                tracing::debug!(target: targets::VIEW, index, "collapse ignored: model has no visibility control");
                false
            }
        }
    }

    pub fn toggle_expanded(&self, index: usize) -> bool {
        if self.is_expanded(index) {
            self.collapse(index)
        } else {
            self.expand(index)
        }
    }

    fn is_expanded(&self, index: usize) -> bool {
        self.model
            .visible_item_at(index)
            .and_then(|item| self.model.item_flags(item))
            .is_some_and(|flags| flags.contains(ItemFlags::EXPANDED))
    }

    // =========================================================================
    // Columns
    // =========================================================================

    pub fn columns(&self) -> &ColumnLayout {
        &self.columns
    }

    fn columns_changed(&self) {
        tracing::trace!(
            target: targets::LAYOUT,
            columns = self.columns.len(),
            width = self.columns.total_width(),
            "column layout changed"
        );
        self.invalidate_all();
    }

    pub fn add_column(&mut self, column: Column) -> usize {
        let index = self.columns.add_column(column);
        self.columns_changed();
        index
    }

    /// Append a column of the configured default width.
    pub fn add_column_titled(&mut self, title: impl Into<String>) -> usize {
        self.add_column(Column::new(title, self.config.default_column_width))
    }

    pub fn insert_column(&mut self, visual: usize, column: Column) -> usize {
        let index = self.columns.insert_column(visual, column);
        self.columns_changed();
        index
    }

    pub fn remove_column(&mut self, logical: usize) -> Option<Column> {
        let removed = self.columns.remove_column(logical)?;
        self.columns_changed();
        Some(removed)
    }

    /// Move the column at visual position `from` to visual position `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        let Some(logical) = self.columns.logical_index(from) else {
            return false;
        };
        if !self.columns.move_column(from, to) {
            return false;
        }
        self.columns_changed();
        self.signals.column_moved.emit((logical, from, to));
        true
    }

    /// Swap two columns by logical index.
    pub fn swap_columns(&mut self, first: usize, second: usize) -> bool {
        let (Some(from), Some(to)) = (self.columns.visual_index(first), self.columns.visual_index(second)) else {
            return false;
        };
        if !self.columns.swap_columns(first, second) {
            return false;
        }
        self.columns_changed();
        self.signals.column_moved.emit((first, from, to));
        self.signals.column_moved.emit((second, to, from));
        true
    }

    /// Resize a column, clamped to its minimum width.
    pub fn set_column_width(&mut self, logical: usize, width: f32) -> bool {
        match self.columns.set_width(logical, width) {
            Some((old, new)) if old != new => {
                self.columns_changed();
                self.signals.column_resized.emit((logical, old, new));
                true
            }
            _ => false,
        }
    }

    pub fn set_column_visible(&mut self, logical: usize, visible: bool) -> bool {
        let changed = self.columns.set_visible(logical, visible);
        if changed {
            self.columns_changed();
        }
        changed
    }

    pub fn set_column_join(&mut self, logical: usize, join: ColumnJoin) -> bool {
        let changed = self.columns.set_join(logical, join);
        if changed {
            self.columns_changed();
        }
        changed
    }

    pub fn set_column_title(&mut self, logical: usize, title: impl Into<String>) -> bool {
        let changed = self.columns.set_title(logical, title);
        if changed {
            self.invalidate_header();
        }
        changed
    }

    /// The column that carries indentation and expanders.
    fn tree_column(&self) -> Option<usize> {
        self.columns.visible_columns().next()
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Sort the model by `column`. Needs a sortable column and a model with
    /// the sorting capability.
    pub fn sort_by_column(&mut self, column: usize, order: SortOrder) -> bool {
        if !self.columns.column(column).is_some_and(|c| c.sortable) {
            tracing::debug!(target: targets::VIEW, column, "sort ignored: column not sortable");
            return false;
        }
        let Some(sortable) = self.model.as_sortable() else {
            tracing::debug!(target: targets::VIEW, column, "sort ignored: model is not sortable");
            return false;
        };
        let comparator: SortComparator<T> = match order {
            SortOrder::Ascending => Arc::new(move |a: &T, b: &T| a.compare_column(b, column)),
            SortOrder::Descending => Arc::new(move |a: &T, b: &T| b.compare_column(a, column)),
        };
        self.columns.set_sort_indicator(Some((column, order)));
        sortable.set_sort_compare_function(Some(comparator));
        tracing::debug!(target: targets::VIEW, column, ?order, "sorted by column");
        self.invalidate_header();
        self.signals.sort_changed.emit((column, order));
        true
    }

    /// Drop the sort comparator, keeping the current order.
    pub fn clear_sort(&mut self) {
        if let Some(sortable) = self.model.as_sortable() {
            sortable.set_sort_compare_function(None);
        }
        if self.columns.sort_indicator().is_some() {
            self.columns.set_sort_indicator(None);
            self.invalidate_header();
        }
    }

    fn sort_by_header(&mut self, header: usize) {
        let Some(label) = self.columns.headers().get(header).map(|span| span.label) else {
            return;
        };
        let order = match self.columns.sort_indicator() {
            Some((column, order)) if column == label => order.reversed(),
            _ => SortOrder::Ascending,
        };
        self.sort_by_column(label, order);
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    /// Feed a pointer event. Returns `true` if the view used it.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        self.ensure_rows();
        if let PointerEventKind::Scroll { delta } = event.kind {
            return event.transit != Transit::Exited && self.scroll_by(delta);
        }
        self.last_pointer = event.position;

        let area_now = if event.transit == Transit::Exited {
            None
        } else {
            self.area_at(event.position)
        };

        if let Some(captured) = self.captured_area() {
            let transit = if event.transit == Transit::Exited {
                Transit::Exited
            } else {
                Transit::Inside
            };
            self.dispatch(captured, &event.clone().with_transit(transit));
            if !self.interaction(captured).is_captured() {
                if area_now != Some(captured)
                    && let Some(area) = area_now
                {
                    self.dispatch(area, &entering(event));
                }
                self.pointer_area = area_now;
            }
            return true;
        }

        if area_now != self.pointer_area {
            let was_inside = self.pointer_area.is_some();
            if let Some(old) = self.pointer_area {
                self.dispatch(old, &event.clone().with_transit(Transit::Exited));
            }
            self.pointer_area = area_now;
            if let Some(area) = area_now {
                self.dispatch(area, &entering(event));
                if event.kind != PointerEventKind::Move {
                    self.dispatch(area, &event.clone().with_transit(Transit::Inside));
                }
            }
            return was_inside || area_now.is_some();
        }

        match area_now {
            Some(area) => {
                self.dispatch(area, &event.clone().with_transit(Transit::Inside));
                true
            }
            None => false,
        }
    }

    fn interaction(&self, area: Area) -> &InteractionState {
        match area {
            Area::Header => &self.header_interaction,
            Area::Rows => &self.row_interaction,
        }
    }

    fn captured_area(&self) -> Option<Area> {
        [Area::Rows, Area::Header]
            .into_iter()
            .find(|&area| self.interaction(area).is_captured())
    }

    fn dispatch(&mut self, area: Area, event: &PointerEvent) {
        match area {
            Area::Rows => {
                let state = std::mem::take(&mut self.row_interaction);
                let next = state.handle(event, &mut RowArea { view: self });
                self.row_interaction = next;
            }
            Area::Header => {
                let state = std::mem::take(&mut self.header_interaction);
                let next = state.handle(event, &mut HeaderArea { view: self });
                self.header_interaction = next;
            }
        }
    }

    /// Abandon a drag or resize in progress. Returns `true` if there was one.
    pub fn cancel_interaction(&mut self) -> bool {
        let position = self.last_pointer;
        let mut cancelled = false;

        let state = std::mem::take(&mut self.row_interaction);
        cancelled |= matches!(state, InteractionState::Dragging(_) | InteractionState::Resizing(_));
        let next = state.cancel(position, &mut RowArea { view: self });
        self.row_interaction = next;

        let state = std::mem::take(&mut self.header_interaction);
        cancelled |= matches!(state, InteractionState::Dragging(_) | InteractionState::Resizing(_));
        let next = state.cancel(position, &mut HeaderArea { view: self });
        self.header_interaction = next;

        if cancelled {
            self.pointer_area = self.area_at(position);
        }
        cancelled
    }

    fn double_click_interval(&self) -> Duration {
        self.host
            .double_click_interval()
            .unwrap_or_else(|| self.config.double_click_interval())
    }

    /// Selection semantics of a click released on row `index`.
    fn click_row(&mut self, index: usize, press: &PressState) {
        let Some(item) = self.model.visible_item_at(index) else {
            return;
        };
        let modifiers = press.modifiers;

        if press.click == ClickKind::Double {
            self.select(index, false);
            self.set_anchor(Some(item));
            self.set_current(Some(item));
            self.invoke(index);
            return;
        }

        if modifiers.shift {
            let anchor = self.anchor_index().unwrap_or(index);
            if let Err(err) = self.select_range(anchor.min(index), anchor.max(index), modifiers.control) {
                tracing::debug!(target: targets::INTERACTION, %err, "shift-click range rejected");
            }
        } else if modifiers.control {
            self.toggle_selection(index);
            self.set_anchor(Some(item));
        } else if self.is_selected(index) && self.selected_indices().len() > 1 {
            self.deselect_except(index, index);
            self.set_anchor(Some(item));
        } else {
            self.select(index, false);
            self.set_anchor(Some(item));
        }
        self.set_current(Some(item));
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    /// Render the selected rows as a drag preview.
    ///
    /// Only the rows that fit under `max_drag_preview_height` are painted, so
    /// the snapshot never grows past that height however many rows are
    /// selected.
    pub fn drag_preview(&self) -> ImageBuffer {
        let _span = PerfSpan::new(span_names::DRAG_PREVIEW);
        self.ensure_rows();
        let max = self.config.max_drag_preview_height as f32;
        let (rows, content_height) = {
            let state = self.state.lock();
            let mut rows = Vec::new();
            let mut content_height = 0.0_f32;
            for row in state
                .selection
                .selected_indices()
                .iter()
                .filter_map(|&index| state.rows.get(index))
            {
                if content_height < max {
                    rows.push(*row);
                }
                content_height += row.height;
            }
            (rows, content_height)
        };
        let width = self.content_width();
        let height = content_height.min(max).ceil().max(1.0) as u32;
        let mut painter = RasterPainter::new(width.ceil().max(1.0) as u32, height);

        let decor = RowDecor {
            selected: true,
            ..Default::default()
        };
        let mut top = 0.0;
        for row in &rows {
            self.paint_row(&mut painter, row, top, width, decor);
            top += row.height;
        }
        compose_drag_preview(painter.into_image(), content_height.ceil() as u32, &self.config)
    }

    fn content_width(&self) -> f32 {
        let total = self.columns.total_width();
        if total > 0.0 { total } else { self.state.lock().viewport.width }
    }

    fn drag_payload(&self, rows: &[usize]) -> DragPayload {
        let items: Vec<ItemId> = rows
            .iter()
            .filter_map(|&index| self.model.visible_item_at(index))
            .collect();
        let column = self.tree_column().unwrap_or(0);
        let text = items
            .iter()
            .filter_map(|&item| self.model.cell_text(item, column))
            .collect::<Vec<_>>()
            .join("\n");

        let mut payload = DragPayload::new();
        payload.set(keys::ITEMS, items);
        payload.set(keys::TEXT, text);
        payload.set_source(self.id);
        payload
    }

    /// Where a drop at `position` would land, or `None` if it cannot.
    fn drop_target_at(&self, position: Point, payload: Option<&DragPayload>) -> Option<DropTarget> {
        let target = {
            let state = self.state.lock();
            if !state.rows_rect().contains(position) {
                return None;
            }
            let y = position.y - state.header_height + state.scroll_y;
            match state.row_at_content_y(y) {
                Some(index) => {
                    let row = state.rows[index];
                    DropTarget {
                        item: Some(row.item),
                        row: Some(index),
                        position: DropPosition::from_row_offset(y - row.top, row.height),
                    }
                }
                None => DropTarget::viewport(),
            }
        };

        let dragged = payload
            .filter(|payload| payload.is_from(self.id))
            .and_then(DragPayload::items);
        if let (Some(dragged), Some(item)) = (dragged, target.item)
            && self.is_within(item, dragged)
        {
            return None;
        }
        Some(target)
    }

    /// Whether `item` is one of `roots` or below one of them.
    fn is_within(&self, item: ItemId, roots: &[ItemId]) -> bool {
        let mut cursor = Some(item);
        while let Some(current) = cursor {
            if roots.contains(&current) {
                return true;
            }
            cursor = self.model.super_item_of(current).ok().flatten();
        }
        false
    }

    fn set_drop_target(&self, target: Option<DropTarget>) {
        let (old, new) = {
            let mut state = self.state.lock();
            let old = std::mem::replace(&mut state.drop_target, target);
            if old == target {
                return;
            }
            (
                old.and_then(|t| indicator_rect(&state, &t)),
                target.and_then(|t| indicator_rect(&state, &t)),
            )
        };
        self.invalidate(old);
        self.invalidate(new);
    }

    /// Move `items` to `point`, as a drop of rows from this view does.
    ///
    /// `point.index` counts siblings before any of the items are removed.
    /// Items below another moved item travel with it. The moved rows end up
    /// selected.
    pub fn move_items(&self, items: &[ItemId], point: InsertionPoint) -> ViewResult<()> {
        let writable = self.model.as_writable().ok_or(ModelError::NotWritable)?;
        let roots: Vec<ItemId> = items
            .iter()
            .copied()
            .filter(|&item| {
                self.model
                    .super_item_of(item)
                    .ok()
                    .flatten()
                    .is_none_or(|parent| !self.is_within(parent, items))
            })
            .collect();
        if let Some(parent) = point.parent
            && self.is_within(parent, &roots)
        {
            return Err(ModelError::CycleDetected.into());
        }

        let current = self.current_item();
        self.state.lock().selection.begin_batch();
        let moved = self.move_roots(writable, &roots, point);
        self.with_selection(|selection, model| {
            if moved.is_ok() {
                selection.deselect_all(model);
                for index in roots.iter().filter_map(|&item| model.visible_index_of(item)) {
                    selection.select(model, index, true);
                }
            }
            selection.end_batch();
        });
        moved?;
        if let Some(current) = current.filter(|&item| self.is_within(item, &roots)) {
            self.set_current(Some(current));
        }

        tracing::debug!(target: targets::DRAG, count = roots.len(), parent = ?point.parent, "items moved");
        Ok(())
    }

    fn move_roots(
        &self,
        writable: &dyn WritableTreeModel<T>,
        roots: &[ItemId],
        point: InsertionPoint,
    ) -> ViewResult<()> {
        let mut index = point.index;
        for &item in roots {
            let adjusted = index.map(|index| {
                let earlier_sibling = self.model.super_item_of(item).ok() == Some(point.parent)
                    && self.model.sub_item_index_of(item).is_some_and(|own| own < index);
                if earlier_sibling { index - 1 } else { index }
            });
            writable.move_item(item, point.parent, adjusted)?;
            index = adjusted.map(|index| index + 1);
        }
        Ok(())
    }

    fn finish_drop(&self, payload: Arc<DragPayload>, target: DropTarget) -> ViewResult<()> {
        let Some(point) = self
            .host
            .compute_insertion_point(self.model.as_ref(), &payload, &target)
        else {
            return Err(ViewError::DropRejected);
        };

        let internal = payload
            .is_from(self.id)
            .then(|| payload.items().map(<[ItemId]>::to_vec))
            .flatten();
        match internal {
            Some(items) => self.move_items(&items, point),
            None => {
                tracing::debug!(target: targets::DRAG, keys = ?payload.keys().collect::<Vec<_>>(), "external drop");
                self.signals.external_drop.emit(ExternalDrop { payload, target, point });
                Ok(())
            }
        }
    }

    // =========================================================================
    // Keyboard input
    // =========================================================================

    /// Feed a key press. Returns `true` if the view used it.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if event.key == Key::Escape {
            return self.cancel_interaction();
        }
        self.ensure_rows();
        let count = self.model.count_visible_items();
        if count == 0 {
            return false;
        }
        let last = count - 1;
        let current = self.current_index();
        let modifiers = event.modifiers;

        match event.key {
            Key::ArrowUp => self.move_current(current.map_or(0, |c| c.saturating_sub(1)), modifiers),
            Key::ArrowDown => self.move_current(current.map_or(0, |c| (c + 1).min(last)), modifiers),
            Key::Home => self.move_current(0, modifiers),
            Key::End => self.move_current(last, modifiers),
            Key::PageUp => {
                let page = self.rows_per_page();
                self.move_current(current.map_or(0, |c| c.saturating_sub(page)), modifiers);
            }
            Key::PageDown => {
                let page = self.rows_per_page();
                self.move_current(current.map_or(0, |c| (c + page).min(last)), modifiers);
            }
            Key::ArrowLeft => {
                let Some(index) = current else {
                    return false;
                };
                if self.is_expanded(index) && self.has_children(index) {
                    self.collapse(index);
                } else if let Some(parent_row) = self
                    .model
                    .visible_item_at(index)
                    .and_then(|item| self.model.super_item_of(item).ok().flatten())
                    .and_then(|parent| self.model.visible_index_of(parent))
                {
                    self.move_current(parent_row, modifiers);
                }
            }
            Key::ArrowRight => {
                let Some(index) = current else {
                    return false;
                };
                if !self.has_children(index) {
                    return true;
                }
                if self.is_expanded(index) {
                    self.move_current((index + 1).min(last), modifiers);
                } else {
                    self.expand(index);
                }
            }
            Key::Space => {
                let Some(index) = current else {
                    return false;
                };
                self.toggle_selection(index);
                self.set_anchor(self.model.visible_item_at(index));
            }
            Key::Enter => {
                let Some(index) = current else {
                    return false;
                };
                self.invoke(index);
            }
            Key::Char(c) if modifiers.control && c.eq_ignore_ascii_case(&'a') => {
                self.select_all();
            }
            Key::Char(c) if !modifiers.control && !modifiers.alt && !modifiers.meta => {
                return self.type_ahead(c);
            }
            Key::Char(_) | Key::Escape => return false,
        }
        true
    }

    fn has_children(&self, index: usize) -> bool {
        self.model
            .visible_item_at(index)
            .is_some_and(|item| self.model.has_sub_items(item))
    }

    fn rows_per_page(&self) -> usize {
        let visible = self.state.lock().rows_rect().height();
        ((visible / self.config.row_height).floor() as usize).max(1)
    }

    fn move_current(&mut self, index: usize, modifiers: KeyboardModifiers) {
        let Some(item) = self.model.visible_item_at(index) else {
            return;
        };
        if modifiers.shift {
            let anchor = self.anchor_index().unwrap_or(index);
            if let Err(err) = self.select_range(anchor.min(index), anchor.max(index), modifiers.control) {
                tracing::debug!(target: targets::VIEW, %err, "keyboard range select rejected");
            }
        } else if !modifiers.control {
            self.select(index, false);
            self.set_anchor(Some(item));
        }
        self.set_current(Some(item));
        self.ensure_visible(index);
    }

    /// Jump to the next row whose tree column starts with the typed prefix.
    fn type_ahead(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let now = self.host.now();
        let timeout = self.config.type_ahead_timeout();
        let expired = self
            .type_ahead
            .last
            .is_none_or(|last| now.saturating_sub(last) > timeout);
        if expired {
            self.type_ahead.buffer.clear();
        }
        self.type_ahead.buffer.push(ch);
        self.type_ahead.last = Some(now);

        let needle = self.type_ahead.buffer.to_lowercase();
        let column = self.tree_column().unwrap_or(0);
        let count = self.model.count_visible_items();
        let start = match self.current_index() {
            Some(current) if self.type_ahead.buffer.chars().count() == 1 => current + 1,
            Some(current) => current,
            None => 0,
        };

        let found = (0..count).map(|offset| (start + offset) % count).find(|&index| {
            self.model
                .visible_item_at(index)
                .and_then(|item| self.model.cell_text(item, column))
                .is_some_and(|text| text.to_lowercase().starts_with(&needle))
        });
        tracing::trace!(target: targets::VIEW, prefix = %needle, ?found, "type-ahead");
        match found {
            Some(index) => {
                self.move_current(index, KeyboardModifiers::NONE);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Painting
    // =========================================================================

    /// Paint the part of the view inside `dirty`.
    pub fn paint(&self, painter: &mut dyn Painter, dirty: Rect) {
        let _span = PerfSpan::new(span_names::PAINT);
        self.ensure_rows();
        let state = self.state.lock();
        let Some(dirty) = dirty.intersect(&state.bounds()) else {
            return;
        };

        painter.push_clip(dirty);
        painter.fill_rect(dirty, self.style.background);

        let header = state.header_rect();
        if header.height() > 0.0 && dirty.intersects(&header) {
            self.paint_header(painter, &state);
        }

        if let Some(clip) = dirty.intersect(&state.rows_rect()) {
            painter.push_clip(clip);
            let first_y = clip.top() - state.header_height + state.scroll_y;
            let last_y = clip.bottom() - state.header_height + state.scroll_y;
            let first = state.rows.partition_point(|row| row.top + row.height <= first_y);
            let width = state.viewport.width.max(self.columns.total_width());
            let current = state.current;

            for (index, row) in state.rows.iter().enumerate().skip(first) {
                if row.top >= last_y {
                    break;
                }
                let decor = RowDecor {
                    selected: state.selection.is_selected(index),
                    hovered: state.hover_row == Some(index),
                    current: current == Some(row.item),
                };
                let top = state.header_height + row.top - state.scroll_y;
                self.paint_row(painter, row, top, width, decor);
            }

            if let Some(target) = state.drop_target {
                self.paint_drop_indicator(painter, &state, &target);
            }
            painter.pop_clip();
        }
        painter.pop_clip();
    }

    fn paint_header(&self, painter: &mut dyn Painter, state: &ViewState) {
        let height = state.header_height;
        let grid = Stroke::new(self.style.grid_line, 1.0);
        painter.fill_rect(state.header_rect(), self.style.header_background);

        let sorted_header = self
            .columns
            .sort_indicator()
            .and_then(|(column, order)| Some((self.columns.header_of(column)?, order)));

        for (index, span) in self.columns.headers().iter().enumerate() {
            let rect = Rect::new(span.x, 0.0, span.width, height);
            if state.header_pressed == Some(index) {
                painter.fill_rect(rect, self.style.header_pressed);
            } else if state.header_hover == Some(index) {
                painter.fill_rect(rect, self.style.hover_background);
            }

            let Some(column) = self.columns.column(span.label) else {
                continue;
            };
            let mut text_rect = rect.deflate(4.0);
            if let Some((_, order)) = sorted_header.filter(|(header, _)| *header == index) {
                self.paint_sort_indicator(painter, rect, order);
                text_rect = Rect::new(text_rect.left(), text_rect.top(), (text_rect.width() - 12.0).max(0.0), text_rect.height());
            }
            painter.draw_text(
                &column.title,
                text_rect,
                &TextStyle {
                    color: self.style.header_text,
                    align: column.align,
                    size: self.style.text_size,
                },
            );
            painter.draw_line(
                Point::new(rect.right(), 0.0),
                Point::new(rect.right(), height),
                &grid,
            );
        }
        painter.draw_line(
            Point::new(0.0, height - 0.5),
            Point::new(state.viewport.width, height - 0.5),
            &grid,
        );
    }

    fn paint_sort_indicator(&self, painter: &mut dyn Painter, header: Rect, order: SortOrder) {
        let center_x = header.right() - 10.0;
        let center_y = header.top() + header.height() / 2.0;
        let size = 3.0;
        let stroke = Stroke::new(self.style.header_text, 1.0);
        let tip_y = match order {
            SortOrder::Ascending => center_y - size / 2.0,
            SortOrder::Descending => center_y + size / 2.0,
        };
        let base_y = match order {
            SortOrder::Ascending => center_y + size / 2.0,
            SortOrder::Descending => center_y - size / 2.0,
        };
        let tip = Point::new(center_x, tip_y);
        painter.draw_line(Point::new(center_x - size, base_y), tip, &stroke);
        painter.draw_line(tip, Point::new(center_x + size, base_y), &stroke);
    }

    /// Cells of a row: logical column, x, width, alignment.
    fn cells(&self, width: f32) -> Vec<(usize, f32, f32, HorizontalAlign)> {
        if self.columns.is_empty() {
            return vec![(0, 0.0, width, HorizontalAlign::Left)];
        }
        self.columns
            .visible_columns()
            .filter_map(|logical| {
                let column = self.columns.column(logical)?;
                Some((logical, self.columns.column_x(logical)?, column.width, column.align))
            })
            .collect()
    }

    fn expander_rect(&self, row: &RowEntry, top: f32) -> Rect {
        let x = self
            .tree_column()
            .and_then(|column| self.columns.column_x(column))
            .unwrap_or(0.0);
        Rect::new(
            x + row.level as f32 * self.config.indent_width,
            top,
            self.config.expander_width,
            row.height,
        )
    }

    fn paint_row(&self, painter: &mut dyn Painter, row: &RowEntry, top: f32, width: f32, decor: RowDecor) {
        let bounds = Rect::new(0.0, top, width, row.height);
        if decor.selected {
            painter.fill_rect(bounds, self.style.selected_background);
        } else if decor.hovered {
            painter.fill_rect(bounds, self.style.hover_background);
        }
        let text_style = TextStyle {
            color: if decor.selected { self.style.selected_text } else { self.style.text },
            align: HorizontalAlign::Left,
            size: self.style.text_size,
        };

        let tree_column = self.tree_column().unwrap_or(0);
        for (logical, x, cell_width, align) in self.cells(width) {
            let mut cell = Rect::new(x, top, cell_width, row.height);
            if logical == tree_column {
                let expander = self.expander_rect(row, top);
                if self.model.has_sub_items(row.item) {
                    let expanded = self
                        .model
                        .item_flags(row.item)
                        .is_some_and(|flags| flags.contains(ItemFlags::EXPANDED));
                    self.paint_expander(painter, expander, expanded);
                }
                let inset = expander.right() - x;
                cell = Rect::new(x + inset, top, (cell_width - inset).max(0.0), row.height);
            }
            let text = self.model.cell_text(row.item, logical).unwrap_or_default();
            if !text.is_empty() {
                painter.draw_text(&text, cell.deflate(2.0), &TextStyle { align, ..text_style });
            }
        }

        if decor.current {
            painter.stroke_rect(bounds.deflate(0.5), &Stroke::new(self.style.current_outline, 1.0));
        }
    }

    fn paint_expander(&self, painter: &mut dyn Painter, rect: Rect, expanded: bool) {
        let center = rect.center();
        let size = 3.5;
        let stroke = Stroke::new(self.style.expander, 1.5);
        if expanded {
            let left = Point::new(center.x - size, center.y - size / 2.0);
            let bottom = Point::new(center.x, center.y + size / 2.0);
            let right = Point::new(center.x + size, center.y - size / 2.0);
            painter.draw_line(left, bottom, &stroke);
            painter.draw_line(bottom, right, &stroke);
        } else {
            let top = Point::new(center.x - size / 2.0, center.y - size);
            let right = Point::new(center.x + size / 2.0, center.y);
            let bottom = Point::new(center.x - size / 2.0, center.y + size);
            painter.draw_line(top, right, &stroke);
            painter.draw_line(right, bottom, &stroke);
        }
    }

    fn paint_drop_indicator(&self, painter: &mut dyn Painter, state: &ViewState, target: &DropTarget) {
        let stroke = Stroke::new(self.style.drop_indicator, 2.0);
        let width = state.viewport.width;
        let row = target.row.and_then(|index| state.row_rect(index));
        match (target.position, row) {
            (DropPosition::OnItem, Some(rect)) => painter.stroke_rect(rect.deflate(1.0), &stroke),
            (DropPosition::Above, Some(rect)) => {
                painter.draw_line(Point::new(0.0, rect.top()), Point::new(width, rect.top()), &stroke);
            }
            (DropPosition::Below, Some(rect)) => {
                painter.draw_line(Point::new(0.0, rect.bottom()), Point::new(width, rect.bottom()), &stroke);
            }
            _ => {
                let y = state.header_height + state.content_height - state.scroll_y;
                painter.draw_line(Point::new(0.0, y), Point::new(width, y), &stroke);
            }
        }
    }
}

impl<T: RowData> Drop for ColumnTreeView<T> {
    fn drop(&mut self) {
        self.model.events().disconnect(self.connection);
    }
}

impl<T: RowData> std::fmt::Debug for ColumnTreeView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnTreeView")
            .field("id", &self.id)
            .field("columns", &self.columns.len())
            .field("row_interaction", &self.row_interaction.name())
            .field("header_interaction", &self.header_interaction.name())
            .finish_non_exhaustive()
    }
}

/// The event that enters an area, derived from the event that crossed into it.
fn entering(event: &PointerEvent) -> PointerEvent {
    let mut entered = event.clone().with_transit(Transit::Entered);
    if let PointerEventKind::Press(button) = event.kind {
        entered.buttons = entered.buttons.without(button);
    }
    entered.kind = PointerEventKind::Move;
    entered
}

/// Region to repaint when `target`'s indicator appears or disappears.
fn indicator_rect(state: &ViewState, target: &DropTarget) -> Option<Rect> {
    match target.row.and_then(|index| state.row_rect(index)) {
        Some(rect) => Some(Rect::new(rect.left(), rect.top() - 2.0, rect.width(), rect.height() + 4.0)),
        None => state.rows_from(state.rows.len().saturating_sub(1)),
    }
}

// =============================================================================
// Interaction targets
// =============================================================================

struct RowArea<'a, T: RowData> {
    view: &'a mut ColumnTreeView<T>,
}

impl<T: RowData> InteractionTarget for RowArea<'_, T> {
    fn hover_zone(&self, position: Point) -> HoverZone {
        let Some(index) = self.view.row_at(position) else {
            return HoverZone::None;
        };
        let row = {
            let state = self.view.state.lock();
            state.rows.get(index).copied()
        };
        let Some(row) = row else {
            return HoverZone::None;
        };
        if self.view.model.has_sub_items(row.item) {
            let expander = self.view.expander_rect(&row, position.y);
            if position.x >= expander.left() && position.x < expander.right() {
                return HoverZone::Expander(index);
            }
        }
        HoverZone::Item(index)
    }

    fn contains(&self, position: Point) -> bool {
        self.view.area_at(position) == Some(Area::Rows)
    }

    fn set_hover(&mut self, zone: HoverZone) {
        let hover = zone.index();
        let previous = std::mem::replace(&mut self.view.state.lock().hover_row, hover);
        if previous != hover {
            for row in [previous, hover].into_iter().flatten() {
                self.view.invalidate_rows(row..=row);
            }
        }
    }

    fn drag_threshold(&self) -> f32 {
        self.view.config.drag_threshold
    }

    fn accepts_payload(&self, payload: &DragPayload) -> bool {
        !payload.is_empty()
    }

    fn press(&mut self, zone: HoverZone, event: &PointerEvent) -> ClickKind {
        match zone {
            HoverZone::Item(index) => {
                let interval = self.view.double_click_interval();
                self.view.clicks.press(index, event.timestamp, interval)
            }
            _ => {
                self.view.clicks.reset();
                ClickKind::Single
            }
        }
    }

    fn click(&mut self, press: &PressState, event: &PointerEvent) {
        match press.zone {
            HoverZone::Expander(index) => {
                if self.hover_zone(event.position) == press.zone {
                    self.view.toggle_expanded(index);
                }
            }
            HoverZone::Item(index) => self.view.click_row(index, press),
            HoverZone::None => {
                if !press.modifiers.control && !press.modifiers.shift {
                    self.view.deselect_all();
                }
            }
            HoverZone::ResizeGrip(_) => {}
        }
    }

    fn begin_drag(&mut self, press: &PressState, _event: &PointerEvent) -> Option<DragState> {
        let HoverZone::Item(index) = press.zone else {
            return None;
        };
        if !self.view.is_selected(index) {
            self.view.select(index, press.modifiers.control);
            let item = self.view.model.visible_item_at(index);
            self.view.set_anchor(item);
            self.view.set_current(item);
        }

        let rows = self.view.selected_indices();
        let payload = Arc::new(self.view.drag_payload(&rows));
        let preview = self.view.drag_preview();
        if !self.view.host.begin_drag(Arc::clone(&payload), preview) {
            tracing::debug!(target: targets::DRAG, "host refused row drag");
            return None;
        }
        tracing::debug!(target: targets::DRAG, rows = rows.len(), "row drag started");
        Some(DragState {
            zone: press.zone,
            origin: press.origin,
            payload: Some(payload),
        })
    }

    fn drag_move(&mut self, drag: &mut DragState, event: &PointerEvent) {
        let target = self.view.drop_target_at(event.position, drag.payload.as_deref());
        self.view.set_drop_target(target);
    }

    fn complete_drop(&mut self, drag: &DragState, event: &PointerEvent) {
        let target = self.view.drop_target_at(event.position, drag.payload.as_deref());
        self.view.set_drop_target(None);
        let (Some(payload), Some(target)) = (drag.payload.clone(), target) else {
            tracing::debug!(target: targets::DRAG, "drop outside a valid target");
            return;
        };
        if let Err(err) = self.view.finish_drop(payload, target) {
            tracing::debug!(target: targets::DRAG, %err, "drop failed");
        }
    }

    fn drag_cancel(&mut self, _drag: &DragState) {
        self.view.set_drop_target(None);
    }
}

struct HeaderArea<'a, T: RowData> {
    view: &'a mut ColumnTreeView<T>,
}

impl<T: RowData> HeaderArea<'_, T> {
    fn set_pressed(&mut self, header: Option<usize>) {
        let previous = std::mem::replace(&mut self.view.state.lock().header_pressed, header);
        if previous != header {
            self.view.invalidate_header();
        }
    }
}

impl<T: RowData> InteractionTarget for HeaderArea<'_, T> {
    fn hover_zone(&self, position: Point) -> HoverZone {
        let columns = &self.view.columns;
        if let Some(column) = columns.resize_grip_at(position.x, self.view.config.resize_grip_width) {
            return HoverZone::ResizeGrip(column);
        }
        columns.header_at(position.x).map_or(HoverZone::None, HoverZone::Item)
    }

    fn contains(&self, position: Point) -> bool {
        self.view.area_at(position) == Some(Area::Header)
    }

    fn set_hover(&mut self, zone: HoverZone) {
        let hover = zone.index();
        let previous = std::mem::replace(&mut self.view.state.lock().header_hover, hover);
        if previous != hover {
            self.view.invalidate_header();
        }
    }

    fn drag_threshold(&self) -> f32 {
        self.view.config.drag_threshold
    }

    fn press(&mut self, zone: HoverZone, _event: &PointerEvent) -> ClickKind {
        self.set_pressed(zone.index());
        ClickKind::Single
    }

    fn click(&mut self, press: &PressState, event: &PointerEvent) {
        self.set_pressed(None);
        let HoverZone::Item(header) = press.zone else {
            return;
        };
        if self.hover_zone(event.position) != press.zone {
            return;
        }
        if let Some(label) = self.view.columns.headers().get(header).map(|span| span.label) {
            tracing::trace!(target: targets::INTERACTION, header, column = label, "header clicked");
            self.view.signals.header_clicked.emit(label);
            self.view.sort_by_header(header);
        }
    }

    fn begin_drag(&mut self, press: &PressState, _event: &PointerEvent) -> Option<DragState> {
        let HoverZone::Item(_) = press.zone else {
            return None;
        };
        Some(DragState {
            zone: press.zone,
            origin: press.origin,
            payload: None,
        })
    }

    fn drag_move(&mut self, drag: &mut DragState, event: &PointerEvent) {
        let HoverZone::Item(from) = drag.zone else {
            return;
        };
        let Some(over) = self.view.columns.header_at(event.position.x) else {
            return;
        };
        if over == from {
            return;
        }
        let Some(label) = self.view.columns.headers().get(from).map(|span| span.label) else {
            return;
        };
        let old_visual = self.view.columns.visual_index(label);
        let Some(moved_to) = self.view.columns.move_header(from, over) else {
            return;
        };
        drag.zone = HoverZone::Item(moved_to);
        self.set_pressed(Some(moved_to));
        self.view.columns_changed();
        if let (Some(old), Some(new)) = (old_visual, self.view.columns.visual_index(label)) {
            self.view.signals.column_moved.emit((label, old, new));
        }
    }

    fn complete_drop(&mut self, _drag: &DragState, _event: &PointerEvent) {
        self.set_pressed(None);
    }

    fn drag_cancel(&mut self, _drag: &DragState) {
        self.set_pressed(None);
    }

    fn column_width(&self, column: usize) -> Option<f32> {
        self.view.columns.column_width(column)
    }

    fn resize(&mut self, column: usize, width: f32) {
        self.view.set_column_width(column, width);
    }

    fn finish_resize(&mut self, column: usize) {
        tracing::debug!(
            target: targets::LAYOUT,
            column,
            width = self.view.columns.column_width(column),
            "column resized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnTreeModel, Item, WritableTreeModel};
    use crate::widget::events::MouseButton;
    use treeline_render::RecordingPainter;

    #[derive(Default)]
    struct TestHost {
        invalidated: Mutex<Vec<Rect>>,
        drags: Mutex<Vec<Arc<DragPayload>>>,
        refuse_drag: bool,
    }

    impl ViewHost<String> for TestHost {
        fn now(&self) -> Duration {
            Duration::ZERO
        }

        fn invalidate(&self, rect: Rect) {
            self.invalidated.lock().push(rect);
        }

        fn begin_drag(&self, payload: Arc<DragPayload>, _preview: ImageBuffer) -> bool {
            self.drags.lock().push(payload);
            !self.refuse_drag
        }
    }

    fn fixture(names: &[&str]) -> (Arc<ColumnTreeModel<String>>, Arc<TestHost>, ColumnTreeView<String>) {
        let model = Arc::new(ColumnTreeModel::new());
        for name in names {
            model
                .add_sub_item(None, Item::new(name.to_string()), None)
                .unwrap();
        }
        let host = Arc::new(TestHost::default());
        let mut view = ColumnTreeView::new(model.clone(), host.clone(), ViewConfig::default()).unwrap();
        view.add_column(Column::new("Name", 200.0));
        view.set_viewport_size(Size::new(300.0, 224.0));
        (model, host, view)
    }

    /// Center of row `index` with the default 24 px header and 20 px rows.
    fn row_point(index: usize) -> Point {
        Point::new(100.0, 24.0 + index as f32 * 20.0 + 10.0)
    }

    #[test]
    fn test_row_geometry() {
        let (_model, _host, view) = fixture(&["a", "b", "c"]);
        assert_eq!(view.content_height(), 60.0);
        assert_eq!(view.row_at(row_point(1)), Some(1));
        assert_eq!(view.row_at(Point::new(10.0, 10.0)), None);
        assert_eq!(view.row_rect(2), Some(Rect::new(0.0, 64.0, 300.0, 20.0)));
    }

    #[test]
    fn test_selection_follows_insertion() {
        let names: Vec<String> = (0..10).map(|i| format!("r{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (model, _host, view) = fixture(&refs);
        view.select(2, true);
        view.select(5, true);
        view.select(7, true);

        for offset in 0..3 {
            model
                .add_sub_item(None, Item::new(format!("new{offset}")), Some(4 + offset))
                .unwrap();
        }
        assert_eq!(view.selected_indices(), vec![2, 8, 10]);
    }

    #[test]
    fn test_ctrl_and_shift_clicks() {
        let (_model, _host, mut view) = fixture(&["a", "b", "c", "d"]);
        let t = Duration::from_secs(1);
        let click = |view: &mut ColumnTreeView<String>, index: usize, modifiers: KeyboardModifiers, t: Duration| {
            view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, row_point(index), t).with_modifiers(modifiers));
            view.handle_pointer(&PointerEvent::released(MouseButton::Left, row_point(index), t).with_modifiers(modifiers));
        };

        click(&mut view, 1, KeyboardModifiers::NONE, t);
        click(&mut view, 3, KeyboardModifiers::SHIFT, t + Duration::from_secs(1));
        assert_eq!(view.selected_indices(), vec![1, 2, 3]);

        click(&mut view, 2, KeyboardModifiers::CTRL, t + Duration::from_secs(2));
        assert_eq!(view.selected_indices(), vec![1, 3]);

        // A plain click on a member of a multi-selection collapses to it.
        click(&mut view, 3, KeyboardModifiers::NONE, t + Duration::from_secs(3));
        assert_eq!(view.selected_indices(), vec![3]);
    }

    #[test]
    fn test_dragging_unselected_row_selects_it() {
        let (_model, host, mut view) = fixture(&["a", "b", "c"]);
        view.select(0, false);
        let t = Duration::ZERO;
        view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, row_point(2), t));
        view.handle_pointer(&PointerEvent::moved(row_point(2).offset(0.0, 5.0), t));

        assert!(view.row_interaction().is_dragging());
        assert_eq!(view.selected_indices(), vec![2]);
        let drags = host.drags.lock();
        assert_eq!(drags.len(), 1);
        assert_eq!(drags[0].items().map(<[ItemId]>::len), Some(1));
        assert!(drags[0].is_from(view.id()));
    }

    #[test]
    fn test_internal_drop_moves_rows() {
        let (model, _host, mut view) = fixture(&["a", "b", "c", "d"]);
        let t = Duration::ZERO;
        view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, row_point(0), t));
        view.handle_pointer(&PointerEvent::moved(row_point(0).offset(0.0, 5.0), t));
        // Lower quarter of row 2: insert below it.
        let below_c = Point::new(100.0, 24.0 + 2.0 * 20.0 + 18.0);
        view.handle_pointer(&PointerEvent::moved(below_c, t));
        assert_eq!(view.drop_target().map(|t| t.position), Some(DropPosition::Below));
        view.handle_pointer(&PointerEvent::released(MouseButton::Left, below_c, t));

        let order: Vec<String> = (0..4)
            .filter_map(|i| model.sub_item_at(None, i))
            .filter_map(|id| model.item_data(id))
            .collect();
        assert_eq!(order, vec!["b", "c", "a", "d"]);
        assert_eq!(view.selected_indices(), vec![2]);
        assert!(view.drop_target().is_none());
    }

    #[test]
    fn test_escape_cancels_drag_without_drop() {
        let (model, _host, mut view) = fixture(&["a", "b", "c"]);
        let t = Duration::ZERO;
        view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, row_point(0), t));
        view.handle_pointer(&PointerEvent::moved(row_point(2), t));
        assert!(view.row_interaction().is_dragging());

        assert!(view.handle_key(&KeyEvent::plain(Key::Escape)));
        assert!(matches!(view.row_interaction(), InteractionState::Inside { .. }));
        assert_eq!(model.item_data(model.sub_item_at(None, 0).unwrap()).unwrap(), "a");
    }

    #[test]
    fn test_refused_drag_still_clicks() {
        let model = Arc::new(ColumnTreeModel::new());
        model.add_sub_item(None, Item::new("a".to_string()), None).unwrap();
        let host = Arc::new(TestHost {
            refuse_drag: true,
            ..Default::default()
        });
        let mut view = ColumnTreeView::new(model, host, ViewConfig::default()).unwrap();
        view.set_viewport_size(Size::new(300.0, 224.0));
        let t = Duration::ZERO;
        view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, row_point(0), t));
        view.handle_pointer(&PointerEvent::moved(row_point(0).offset(8.0, 0.0), t));
        view.handle_pointer(&PointerEvent::released(MouseButton::Left, row_point(0), t));
        assert_eq!(view.selected_indices(), vec![0]);
    }

    #[test]
    fn test_keyboard_navigation() {
        let (model, _host, mut view) = fixture(&["alpha", "beta", "gamma"]);
        let parent = model.sub_item_at(None, 1).unwrap();
        model
            .add_sub_item(Some(parent), Item::new("child".to_string()), None)
            .unwrap();

        view.handle_key(&KeyEvent::plain(Key::ArrowDown));
        assert_eq!(view.current_index(), Some(0));
        view.handle_key(&KeyEvent::plain(Key::ArrowDown));
        assert_eq!(view.current_index(), Some(1));
        assert_eq!(view.selected_indices(), vec![1]);

        view.handle_key(&KeyEvent::plain(Key::ArrowRight));
        assert_eq!(model.count_visible_items(), 4);
        view.handle_key(&KeyEvent::plain(Key::ArrowRight));
        assert_eq!(view.current_index(), Some(2));

        view.handle_key(&KeyEvent::plain(Key::ArrowLeft));
        assert_eq!(view.current_index(), Some(1));
        view.handle_key(&KeyEvent::plain(Key::ArrowLeft));
        assert_eq!(model.count_visible_items(), 3);

        view.handle_key(&KeyEvent::new(Key::End, KeyboardModifiers::SHIFT));
        assert_eq!(view.selected_indices(), vec![1, 2]);

        view.handle_key(&KeyEvent::new(Key::Char('a'), KeyboardModifiers::CTRL));
        assert_eq!(view.selected_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_type_ahead_finds_prefix() {
        let (_model, _host, mut view) = fixture(&["apple", "banana", "blueberry", "cherry"]);
        assert!(view.handle_key(&KeyEvent::plain(Key::Char('b'))));
        assert_eq!(view.current_index(), Some(1));
        assert!(view.handle_key(&KeyEvent::plain(Key::Char('l'))));
        assert_eq!(view.current_index(), Some(2));
        assert!(!view.handle_key(&KeyEvent::plain(Key::Char('z'))));
    }

    #[test]
    fn test_collapse_drops_hidden_selection() {
        let (model, _host, view) = fixture(&["a", "b"]);
        let a = model.sub_item_at(None, 0).unwrap();
        model
            .add_sub_item(Some(a), Item::new("a1".to_string()), None)
            .unwrap();
        assert!(view.expand(0));
        view.select(1, false);
        view.set_current_index(1);

        let changes = Arc::new(Mutex::new(0));
        let counter = changes.clone();
        view.signals().selection_changed.connect(move |_| *counter.lock() += 1);

        assert!(view.collapse(0));
        assert!(view.selected_indices().is_empty());
        assert_eq!(view.current_item(), None);
        assert_eq!(*changes.lock(), 1);
    }

    #[test]
    fn test_scrolling_is_clamped() {
        let names: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (_model, _host, view) = fixture(&refs);
        // 400 px of rows in a 200 px row area.
        assert!(view.scroll_to(1000.0));
        assert_eq!(view.scroll_offset(), 200.0);
        assert!(view.scroll_to(-5.0));
        assert_eq!(view.scroll_offset(), 0.0);

        assert!(view.ensure_visible(15));
        assert_eq!(view.scroll_offset(), 120.0);
        assert!(!view.ensure_visible(12));
    }

    #[test]
    fn test_header_click_sorts_and_toggles() {
        let (model, _host, mut view) = fixture(&["b", "c", "a"]);
        let sorts = Arc::new(Mutex::new(Vec::new()));
        let sink = sorts.clone();
        view.signals().sort_changed.connect(move |change| sink.lock().push(*change));

        let header = Point::new(50.0, 12.0);
        let t = Duration::ZERO;
        for _ in 0..2 {
            view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, header, t));
            view.handle_pointer(&PointerEvent::released(MouseButton::Left, header, t));
        }
        assert_eq!(*sorts.lock(), vec![(0, SortOrder::Ascending), (0, SortOrder::Descending)]);
        let first = model.sub_item_at(None, 0).and_then(|id| model.item_data(id));
        assert_eq!(first.as_deref(), Some("c"));
    }

    #[test]
    fn test_header_resize_emits_widths() {
        let (_model, _host, mut view) = fixture(&["a"]);
        let resized = Arc::new(Mutex::new(Vec::new()));
        let sink = resized.clone();
        view.signals().column_resized.connect(move |change| sink.lock().push(*change));

        let grip = Point::new(199.0, 12.0);
        let t = Duration::ZERO;
        view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, grip, t));
        assert!(matches!(view.header_interaction(), InteractionState::Resizing(_)));
        view.handle_pointer(&PointerEvent::moved(grip.offset(40.0, 0.0), t));
        view.handle_pointer(&PointerEvent::released(MouseButton::Left, grip.offset(40.0, 0.0), t));

        assert_eq!(view.columns().column_width(0), Some(240.0));
        assert_eq!(*resized.lock(), vec![(0, 200.0, 240.0)]);
    }

    #[test]
    fn test_paint_draws_header_and_visible_rows() {
        let (_model, _host, view) = fixture(&["a", "b", "c"]);
        view.select(1, false);
        let mut painter = RecordingPainter::new();
        view.paint(&mut painter, Rect::new(0.0, 0.0, 300.0, 224.0));
        assert_eq!(painter.texts(), vec!["Name", "a", "b", "c"]);
        assert!(painter.is_balanced());

        // Only the second row.
        let mut painter = RecordingPainter::new();
        view.paint(&mut painter, Rect::new(0.0, 44.0, 300.0, 20.0));
        assert_eq!(painter.texts(), vec!["b"]);
    }

    #[test]
    fn test_structural_change_invalidates_from_first_row() {
        let (model, host, view) = fixture(&["a", "b", "c"]);
        view.content_height();
        host.invalidated.lock().clear();
        model.add_sub_item(None, Item::new("d".to_string()), Some(1)).unwrap();
        let rects = host.invalidated.lock().clone();
        assert_eq!(rects, vec![Rect::new(0.0, 44.0, 300.0, 180.0)]);
    }

    #[test]
    fn test_drag_preview_height_is_bounded() {
        let (_model, _host, view) = fixture(&["a", "b", "c"]);
        view.select_range(0, 1, false).unwrap();
        let preview = view.drag_preview();
        assert_eq!((preview.width(), preview.height()), (200, 40));

        let names: Vec<String> = (0..5000).map(|i| format!("r{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (_model, _host, view) = fixture(&refs);
        assert!(view.select_all());
        let preview = view.drag_preview();
        assert_eq!((preview.width(), preview.height()), (200, 200));
    }

    #[test]
    fn test_invalidation_uses_current_row_heights() {
        let (model, host, view) = fixture(&[]);
        model
            .add_sub_item(None, Item::new("a".to_string()).with_height(40.0), None)
            .unwrap();
        for name in ["b", "c", "d"] {
            model.add_sub_item(None, Item::new(name.to_string()), None).unwrap();
        }
        assert_eq!(view.content_height(), 100.0);

        // Two changes back to back; the second is measured without the tall row.
        model.remove_sub_item(None, 0).unwrap();
        host.invalidated.lock().clear();
        model.add_sub_item(None, Item::new("x".to_string()), Some(2)).unwrap();
        assert_eq!(*host.invalidated.lock(), vec![Rect::new(0.0, 64.0, 300.0, 160.0)]);
        assert_eq!(view.row_rect(2), Some(Rect::new(0.0, 64.0, 300.0, 20.0)));
    }

    #[test]
    fn test_titled_column_uses_default_width() {
        let model = Arc::new(ColumnTreeModel::<String>::new());
        let config = ViewConfig {
            default_column_width: 64.0,
            ..Default::default()
        };
        let mut view = ColumnTreeView::new(model, Arc::new(TestHost::default()), config).unwrap();
        let index = view.add_column_titled("Size");
        assert_eq!(view.columns().column_width(index), Some(64.0));
        assert_eq!(view.columns().column(index).map(|c| c.title.as_str()), Some("Size"));
        assert_eq!(view.columns().total_width(), 64.0);
    }

    #[test]
    fn test_edited_row_keeps_selection_when_resorted() {
        let model = Arc::new(ColumnTreeModel::<String>::with_comparator(Arc::new(
            |a: &String, b: &String| a.cmp(b),
        )));
        for name in ["a", "b", "c"] {
            model.add_sub_item(None, Item::new(name.to_string()), None).unwrap();
        }
        let view = ColumnTreeView::new(model.clone(), Arc::new(TestHost::default()), ViewConfig::default()).unwrap();
        view.select(0, false);
        let a = model.visible_item_at(0).unwrap();

        let changes = Arc::new(Mutex::new(0));
        let counter = changes.clone();
        view.signals().selection_changed.connect(move |_| *counter.lock() += 1);

        model.modify_item(a, |name| *name = "z".to_string());
        assert_eq!(model.visible_index_of(a), Some(2));
        assert_eq!(view.selected_items(), vec![a]);
        assert_eq!(view.selected_indices(), vec![2]);
        // The row moved, so the index set changed once.
        assert_eq!(*changes.lock(), 1);
    }

    #[test]
    fn test_view_disconnects_on_drop() {
        let (model, _host, view) = fixture(&["a"]);
        assert_eq!(model.events().connection_count(), 1);
        drop(view);
        assert_eq!(model.events().connection_count(), 0);
    }
}
