//! Logging vocabulary for Treeline.
//!
//! Treeline uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("treeline=debug,treeline::interaction=trace")
//!         .init();
//! }
//! ```
//!
//! All events are emitted under one of the [`targets`], so a filter directive
//! can enable a single subsystem.

/// Span names used throughout Treeline for tracing.
pub mod span_names {
    /// Signal emission span.
    pub const SIGNAL: &str = "treeline::signal";
    /// Full model resort.
    pub const RESORT: &str = "treeline::model::resort";
    /// Row cache rebuild in the view.
    pub const ROW_CACHE: &str = "treeline::view::row_cache";
    /// Drag preview rendering.
    pub const DRAG_PREVIEW: &str = "treeline::drag::preview";
    /// View painting.
    pub const PAINT: &str = "treeline::view::paint";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "treeline_core::signal";
    /// Tree model mutations and queries.
    pub const MODEL: &str = "treeline::model";
    /// Selection tracker.
    pub const SELECTION: &str = "treeline::selection";
    /// Pointer interaction state machines.
    pub const INTERACTION: &str = "treeline::interaction";
    /// Column and header layout.
    pub const LAYOUT: &str = "treeline::layout";
    /// Drag and drop.
    pub const DRAG: &str = "treeline::drag";
    /// View glue (keyboard, scrolling, repaint requests).
    pub const VIEW: &str = "treeline::view";
    /// Software rasterization.
    pub const RENDER: &str = "treeline_render";
    /// Performance spans.
    pub const PERF: &str = "treeline::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for tracking the duration of expensive operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "treeline::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("treeline::perf=info")
            .with_test_writer()
            .try_init();
        let _span = PerfSpan::new(span_names::RESORT);
    }

    #[test]
    fn test_targets_share_crate_prefix() {
        for target in [
            targets::MODEL,
            targets::SELECTION,
            targets::INTERACTION,
            targets::LAYOUT,
            targets::DRAG,
            targets::VIEW,
        ] {
            assert!(target.starts_with("treeline::"), "{target}");
        }
    }
}
