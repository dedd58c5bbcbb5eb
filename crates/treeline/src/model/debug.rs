//! Text dumps of a model's hierarchy for logs and test failures.
//!
//! ```
//! use treeline::model::{ColumnTreeModel, Item, TreeDump, WritableTreeModel};
//!
//! let model = ColumnTreeModel::<String>::new();
//! let src = model.add_sub_item(None, Item::new("src".into()).expanded(), None).unwrap();
//! model.add_sub_item(Some(src), Item::new("lib.rs".into()), None).unwrap();
//!
//! let dump = TreeDump::new().format(&model);
//! assert!(dump.contains("lib.rs"));
//! ```

use std::fmt::Write as FmtWrite;

use super::item::{ItemFlags, ItemId};
use super::traits::TreeModel;

/// Branch drawing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// `|`, `+--` and `\--`.
    Ascii,
    /// Box-drawing characters.
    #[default]
    Unicode,
}

/// Options for [`TreeDump`].
#[derive(Debug, Clone)]
pub struct TreeDumpOptions {
    pub style: TreeStyle,
    /// Append `[S]`, `[H]` and `[+]`/`[-]` markers for selected, hidden and
    /// expanded/collapsed items.
    pub show_flags: bool,
    /// Column whose text labels each line.
    pub column: usize,
    /// Deepest level to print (`None` for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeDumpOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_flags: true,
            column: 0,
            max_depth: None,
        }
    }
}

/// Formats the full tree, including collapsed and hidden items.
#[derive(Debug, Clone, Default)]
pub struct TreeDump {
    options: TreeDumpOptions,
}

impl TreeDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeDumpOptions) -> Self {
        Self { options }
    }

    /// Format every top-level item and its subtree.
    pub fn format<T>(&self, model: &dyn TreeModel<T>) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Tree ({} items):", model.count_items());
        let count = model.count_sub_items(None);
        if count == 0 {
            output.push_str("  (empty)\n");
        }
        for index in 0..count {
            if let Some(id) = model.sub_item_at(None, index) {
                self.format_into(model, id, &mut Vec::new(), index + 1 == count, &mut output);
            }
        }
        output
    }

    fn format_into<T>(
        &self,
        model: &dyn TreeModel<T>,
        id: ItemId,
        open: &mut Vec<bool>,
        is_last: bool,
        output: &mut String,
    ) {
        let depth = open.len();
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        let (pipe, tee, elbow) = match self.options.style {
            TreeStyle::Ascii => ("|   ", "+-- ", "\\-- "),
            TreeStyle::Unicode => ("\u{2502}   ", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
        };
        for &has_more in open.iter() {
            output.push_str(if has_more { pipe } else { "    " });
        }
        output.push_str(if is_last { elbow } else { tee });

        let text = model.cell_text(id, self.options.column).unwrap_or_default();
        output.push_str(if text.is_empty() { "(blank)" } else { &text });

        if self.options.show_flags
            && let Some(flags) = model.item_flags(id)
        {
            if model.has_sub_items(id) {
                output.push_str(if flags.contains(ItemFlags::EXPANDED) { " [-]" } else { " [+]" });
            }
            if flags.contains(ItemFlags::SELECTED) {
                output.push_str(" [S]");
            }
            if !flags.contains(ItemFlags::VISIBLE) {
                output.push_str(" [H]");
            }
        }
        output.push('\n');

        let count = model.count_sub_items(Some(id));
        open.push(!is_last);
        for index in 0..count {
            if let Some(child) = model.sub_item_at(Some(id), index) {
                self.format_into(model, child, open, index + 1 == count, output);
            }
        }
        open.pop();
    }
}
