//! Items: the caller-visible unit of a row.

use std::cmp::Ordering;

use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to an item attached to a model.
    ///
    /// The handle stays valid while the item is attached. Once the item (or an
    /// ancestor) is removed, lookups with the old handle fail instead of
    /// reaching a different item.
    pub struct ItemId;
}

/// Height given to items created with [`Item::new`].
pub const DEFAULT_ITEM_HEIGHT: f32 = 20.0;

/// Number of flag bits reserved for callers.
pub const CALLER_FLAG_COUNT: u32 = 24;

const CALLER_FLAG_SHIFT: u32 = 8;

bitflags! {
    /// Per-item state bits.
    ///
    /// `SELECTED`, `VISIBLE` and `EXPANDED` are maintained by the model and
    /// the view. The upper 24 bits belong to the caller; see
    /// [`ItemFlags::caller`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u32 {
        const SELECTED = 1 << 0;
        const VISIBLE = 1 << 1;
        const EXPANDED = 1 << 2;

        const BUILTIN = Self::SELECTED.bits() | Self::VISIBLE.bits() | Self::EXPANDED.bits();
        const CALLER_MASK = 0xFFFF_FF00;
    }
}

impl ItemFlags {
    /// The `n`th caller-reserved bit, or `None` if `n >= CALLER_FLAG_COUNT`.
    pub fn caller(n: u32) -> Option<Self> {
        (n < CALLER_FLAG_COUNT).then(|| Self::from_bits_retain(1 << (CALLER_FLAG_SHIFT + n)))
    }
}

impl Default for ItemFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Domain data shown in a row.
///
/// `column_text` supplies the cell text for each column; `compare_column`
/// orders two rows by a column and is what header-click sorting uses.
pub trait RowData: Send + Sync + 'static {
    /// Text for `column`. Columns the data has nothing for return an empty string.
    fn column_text(&self, column: usize) -> String;

    /// Compare two rows by `column`. Defaults to comparing the column text.
    fn compare_column(&self, other: &Self, column: usize) -> Ordering {
        self.column_text(column).cmp(&other.column_text(column))
    }
}

impl RowData for String {
    fn column_text(&self, column: usize) -> String {
        if column == 0 { self.clone() } else { String::new() }
    }
}

impl RowData for &'static str {
    fn column_text(&self, column: usize) -> String {
        if column == 0 { (*self).to_owned() } else { String::new() }
    }
}

/// A single row: domain data plus selection/visibility/expansion state and
/// cached layout.
///
/// Items are created by the caller and handed to a model, which takes
/// ownership until they are removed again. The `VISIBLE` and `EXPANDED` flags
/// only mean something while the item is attached to a model.
#[derive(Debug, Clone)]
pub struct Item<T> {
    data: T,
    height: f32,
    flags: ItemFlags,
    offset: f32,
    handle: Option<ItemId>,
}

impl<T> Item<T> {
    /// Create a visible, collapsed item with the default height.
    pub fn new(data: T) -> Self {
        Self {
            data,
            height: DEFAULT_ITEM_HEIGHT,
            flags: ItemFlags::default(),
            offset: 0.0,
            handle: None,
        }
    }

    /// Set the row height (builder style).
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height.max(0.0);
        self
    }

    /// Start expanded (builder style).
    pub fn expanded(mut self) -> Self {
        self.flags.insert(ItemFlags::EXPANDED);
        self
    }

    /// Start hidden (builder style).
    pub fn hidden(mut self) -> Self {
        self.flags.remove(ItemFlags::VISIBLE);
        self
    }

    /// Set caller flags (builder style). Built-in bits in `flags` are ignored.
    pub fn with_caller_flags(mut self, flags: ItemFlags) -> Self {
        self.set_caller_flags(flags, true);
        self
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Consume the item, returning its data.
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn flags(&self) -> ItemFlags {
        self.flags
    }

    pub fn is_selected(&self) -> bool {
        self.flags.contains(ItemFlags::SELECTED)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(ItemFlags::VISIBLE)
    }

    pub fn is_expanded(&self) -> bool {
        self.flags.contains(ItemFlags::EXPANDED)
    }

    /// Whether this item's children take part in the visible projection,
    /// provided every ancestor's children do too.
    pub fn are_children_visible(&self) -> bool {
        self.flags.contains(ItemFlags::VISIBLE | ItemFlags::EXPANDED)
    }

    /// Cached vertical offset, maintained by the view.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// The handle this item is attached under, if any.
    pub fn handle(&self) -> Option<ItemId> {
        self.handle
    }

    /// Set or clear caller-reserved bits. Built-in bits are left untouched.
    pub fn set_caller_flags(&mut self, flags: ItemFlags, on: bool) {
        let flags = flags & ItemFlags::CALLER_MASK;
        self.flags.set(flags, on);
    }

    pub(crate) fn set_flag(&mut self, flag: ItemFlags, on: bool) {
        self.flags.set(flag, on);
    }

    pub(crate) fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    pub(crate) fn attach(&mut self, handle: ItemId) {
        self.handle = Some(handle);
    }

    pub(crate) fn detach(&mut self) {
        self.handle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_defaults() {
        let item = Item::new("row");
        assert!(item.is_visible());
        assert!(!item.is_expanded());
        assert!(!item.is_selected());
        assert!(!item.are_children_visible());
        assert_eq!(item.height(), DEFAULT_ITEM_HEIGHT);
        assert_eq!(item.handle(), None);
    }

    #[test]
    fn test_caller_flags_cannot_touch_builtins() {
        let marked = ItemFlags::caller(3).unwrap_or(ItemFlags::empty());
        let mut item = Item::new(1u32).with_caller_flags(marked | ItemFlags::SELECTED);
        assert!(item.flags().contains(marked));
        assert!(!item.is_selected());

        item.set_caller_flags(ItemFlags::all(), false);
        assert!(!item.flags().contains(marked));
        assert!(item.is_visible());
    }

    #[test]
    fn test_caller_bit_range() {
        assert!(ItemFlags::caller(0).is_some());
        assert!(ItemFlags::caller(CALLER_FLAG_COUNT - 1).is_some());
        assert_eq!(ItemFlags::caller(CALLER_FLAG_COUNT), None);
        assert!(ItemFlags::caller(0).is_some_and(|f| !f.intersects(ItemFlags::BUILTIN)));
    }

    #[test]
    fn test_builders() {
        let item = Item::new("x").with_height(-4.0).expanded().hidden();
        assert_eq!(item.height(), 0.0);
        assert!(item.is_expanded());
        assert!(!item.is_visible());
    }
}
