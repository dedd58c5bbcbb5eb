//! Column and header layout.
//!
//! Columns are addressed by their *logical* index (position in insertion
//! order, which is also the `column` passed to [`RowData::column_text`]) and
//! displayed in a separate *visual* order. Hidden columns keep their place
//! in the visual order but take no width.
//!
//! Adjacent columns can share one visual header. A column marked
//! [`ColumnJoin::Right`] merges into the header on its right; a column marked
//! [`ColumnJoin::Left`] merges into the header on its left. Layout walks the
//! visual order once, accumulating join-right columns until a plain or
//! join-left column closes the run:
//!
//! ```text
//! columns:  | size>| <type | date | name | <ext |
//! headers:  |      type     | date |    name    |
//! ```
//!
//! [`RowData::column_text`]: crate::model::RowData::column_text

use treeline_core::logging::targets;
use treeline_render::HorizontalAlign;

/// Header merge directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnJoin {
    #[default]
    None,
    /// Share the header of the column to the left.
    Left,
    /// Share the header of the column to the right.
    Right,
}

/// Sort order shown by the header sort indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Ascending,
    /// Descending order (Z-A, 9-0).
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// One column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: String,
    pub width: f32,
    /// Per-column minimum; the layout minimum applies when this is smaller.
    pub min_width: f32,
    pub visible: bool,
    pub join: ColumnJoin,
    pub align: HorizontalAlign,
    /// Whether clicking the header sorts by this column.
    pub sortable: bool,
}

impl Column {
    pub fn new(title: impl Into<String>, width: f32) -> Self {
        Self {
            title: title.into(),
            width,
            min_width: 0.0,
            visible: true,
            join: ColumnJoin::None,
            align: HorizontalAlign::Left,
            sortable: true,
        }
    }

    pub fn with_min_width(mut self, min_width: f32) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_join(mut self, join: ColumnJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_align(mut self, align: HorizontalAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A visual header, possibly covering several columns.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSpan {
    pub x: f32,
    pub width: f32,
    /// Logical column whose title the header shows.
    pub label: usize,
    /// Logical columns under this header, in visual order.
    pub columns: Vec<usize>,
}

impl HeaderSpan {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x && x < self.right()
    }
}

/// Column geometry and header grouping.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    columns: Vec<Column>,
    /// Visual position → logical index.
    order: Vec<usize>,
    /// Per logical column.
    offsets: Vec<f32>,
    header_of: Vec<Option<usize>>,
    headers: Vec<HeaderSpan>,
    total_width: f32,
    min_width: f32,
    sort_indicator: Option<(usize, SortOrder)>,
}

impl ColumnLayout {
    /// Create an empty layout. No column can be narrower than `min_width`.
    pub fn new(min_width: f32) -> Self {
        Self {
            columns: Vec::new(),
            order: Vec::new(),
            offsets: Vec::new(),
            header_of: Vec::new(),
            headers: Vec::new(),
            total_width: 0.0,
            min_width: min_width.max(0.0),
            sort_indicator: None,
        }
    }

    // ===== Queries =====

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, logical: usize) -> Option<&Column> {
        self.columns.get(logical)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Logical indices in visual order.
    pub fn visual_order(&self) -> &[usize] {
        &self.order
    }

    /// Visible logical columns in visual order.
    pub fn visible_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied().filter(|&c| self.columns[c].visible)
    }

    pub fn logical_index(&self, visual: usize) -> Option<usize> {
        self.order.get(visual).copied()
    }

    pub fn visual_index(&self, logical: usize) -> Option<usize> {
        self.order.iter().position(|&c| c == logical)
    }

    /// Left edge of a column.
    pub fn column_x(&self, logical: usize) -> Option<f32> {
        self.offsets.get(logical).copied()
    }

    /// Effective on-screen width: zero for hidden columns.
    pub fn column_width(&self, logical: usize) -> Option<f32> {
        self.columns
            .get(logical)
            .map(|c| if c.visible { c.width } else { 0.0 })
    }

    pub fn total_width(&self) -> f32 {
        self.total_width
    }

    pub fn headers(&self) -> &[HeaderSpan] {
        &self.headers
    }

    /// Header index representing `logical`, or `None` for a hidden column.
    pub fn header_of(&self, logical: usize) -> Option<usize> {
        self.header_of.get(logical).copied().flatten()
    }

    /// Visible column containing `x`.
    pub fn index_of(&self, x: f32) -> Option<usize> {
        self.visible_columns().find(|&c| {
            let left = self.offsets[c];
            x >= left && x < left + self.columns[c].width
        })
    }

    /// Header containing `x`.
    pub fn header_at(&self, x: f32) -> Option<usize> {
        self.headers.iter().position(|h| h.contains_x(x))
    }

    /// Column whose right edge lies within `grip_width` of `x`.
    pub fn resize_grip_at(&self, x: f32, grip_width: f32) -> Option<usize> {
        self.visible_columns().find(|&c| {
            let right = self.offsets[c] + self.columns[c].width;
            (x - right).abs() < grip_width
        })
    }

    pub fn sort_indicator(&self) -> Option<(usize, SortOrder)> {
        self.sort_indicator
    }

    pub fn min_width(&self) -> f32 {
        self.min_width
    }

    // ===== Mutation =====

    /// Append a column at the end of the visual order. Returns its logical index.
    pub fn add_column(&mut self, column: Column) -> usize {
        let visual = self.order.len();
        self.insert_column(visual, column)
    }

    /// Insert a column at visual position `visual` (clamped). Returns its
    /// logical index, which is always the next free one.
    pub fn insert_column(&mut self, visual: usize, mut column: Column) -> usize {
        column.width = column.width.max(self.effective_min(&column));
        let logical = self.columns.len();
        self.columns.push(column);
        self.order.insert(visual.min(self.order.len()), logical);
        self.relayout();
        logical
    }

    /// Remove a column. Logical indices above it shift down by one.
    pub fn remove_column(&mut self, logical: usize) -> Option<Column> {
        if logical >= self.columns.len() {
            return None;
        }
        let column = self.columns.remove(logical);
        self.order.retain(|&c| c != logical);
        for c in &mut self.order {
            if *c > logical {
                *c -= 1;
            }
        }
        self.sort_indicator = match self.sort_indicator {
            Some((c, _)) if c == logical => None,
            Some((c, order)) if c > logical => Some((c - 1, order)),
            other => other,
        };
        self.relayout();
        Some(column)
    }

    /// Move the column at visual position `from` to visual position `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if from >= self.order.len() || to >= self.order.len() || from == to {
            return false;
        }
        let logical = self.order.remove(from);
        self.order.insert(to, logical);
        self.relayout();
        tracing::debug!(target: targets::LAYOUT, logical, from, to, "column moved");
        true
    }

    /// Swap the visual positions of two columns.
    pub fn swap_columns(&mut self, first: usize, second: usize) -> bool {
        let (Some(a), Some(b)) = (self.visual_index(first), self.visual_index(second)) else {
            return false;
        };
        if a == b {
            return false;
        }
        self.order.swap(a, b);
        self.relayout();
        true
    }

    /// Move the columns of header `from` to where header `to` is, as a block.
    /// Returns the dragged header's new index.
    pub fn move_header(&mut self, from: usize, to: usize) -> Option<usize> {
        if from == to {
            return Some(from);
        }
        let moving = self.headers.get(from)?.columns.clone();
        let target = self.headers.get(to)?.columns.clone();
        let first = self.visual_index(*moving.first()?)?;
        let last = self.visual_index(*moving.last()?)?;

        let block: Vec<usize> = self.order.drain(first..=last).collect();
        // Land before the target when moving left, after it when moving right.
        let anchor = if to < from { target.first() } else { target.last() };
        let anchor = self.visual_index(*anchor?)?;
        let at = if to < from { anchor } else { anchor + 1 };
        for (offset, logical) in block.into_iter().enumerate() {
            self.order.insert(at + offset, logical);
        }
        self.relayout();
        tracing::debug!(target: targets::LAYOUT, from, to, "header moved");
        self.header_of(*moving.first()?)
    }

    /// Set a column's width, clamped to its minimum. Returns `(old, new)` when
    /// the width changed.
    pub fn set_width(&mut self, logical: usize, width: f32) -> Option<(f32, f32)> {
        let min = self.effective_min(self.columns.get(logical)?);
        let column = &mut self.columns[logical];
        let width = width.max(min);
        let old = column.width;
        if old == width {
            return None;
        }
        column.width = width;
        self.relayout();
        Some((old, width))
    }

    pub fn set_visible(&mut self, logical: usize, visible: bool) -> bool {
        match self.columns.get_mut(logical) {
            Some(column) if column.visible != visible => {
                column.visible = visible;
                self.relayout();
                true
            }
            _ => false,
        }
    }

    pub fn set_join(&mut self, logical: usize, join: ColumnJoin) -> bool {
        match self.columns.get_mut(logical) {
            Some(column) if column.join != join => {
                column.join = join;
                self.relayout();
                true
            }
            _ => false,
        }
    }

    pub fn set_title(&mut self, logical: usize, title: impl Into<String>) -> bool {
        match self.columns.get_mut(logical) {
            Some(column) => {
                column.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn set_sort_indicator(&mut self, indicator: Option<(usize, SortOrder)>) {
        self.sort_indicator = indicator.filter(|&(c, _)| c < self.columns.len());
    }

    fn effective_min(&self, column: &Column) -> f32 {
        column.min_width.max(self.min_width)
    }

    /// Recompute offsets and header spans from the visual order.
    fn relayout(&mut self) {
        let count = self.columns.len();
        self.offsets = vec![0.0; count];
        self.header_of = vec![None; count];
        self.headers.clear();

        let mut x = 0.0;
        let mut pending: Vec<usize> = Vec::new();
        let mut pending_x = 0.0;
        let mut pending_width = 0.0;

        for &logical in &self.order {
            self.offsets[logical] = x;
            let column = &self.columns[logical];
            if !column.visible {
                continue;
            }
            let width = column.width;

            match column.join {
                ColumnJoin::Right => {
                    if pending.is_empty() {
                        pending_x = x;
                    }
                    pending.push(logical);
                    pending_width += width;
                }
                ColumnJoin::Left if pending.is_empty() && !self.headers.is_empty() => {
                    let index = self.headers.len() - 1;
                    let header = &mut self.headers[index];
                    header.width += width;
                    header.columns.push(logical);
                    self.header_of[logical] = Some(index);
                }
                _ => {
                    let start = if pending.is_empty() { x } else { pending_x };
                    let index = self.headers.len();
                    pending.push(logical);
                    for &member in &pending {
                        self.header_of[member] = Some(index);
                    }
                    self.headers.push(HeaderSpan {
                        x: start,
                        width: pending_width + width,
                        label: logical,
                        columns: std::mem::take(&mut pending),
                    });
                    pending_width = 0.0;
                }
            }
            x += width;
        }

        // A join-right run with nothing to its right stands on its own.
        if let Some(&label) = pending.first() {
            let index = self.headers.len();
            for &member in &pending {
                self.header_of[member] = Some(index);
            }
            self.headers.push(HeaderSpan {
                x: pending_x,
                width: pending_width,
                label,
                columns: pending,
            });
        }

        self.total_width = x;
        tracing::trace!(
            target: targets::LAYOUT,
            columns = count,
            headers = self.headers.len(),
            total_width = x,
            "columns laid out"
        );
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::new(0.0)
    }
}
