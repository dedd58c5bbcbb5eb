//! The drawing boundary between Treeline and its host.
//!
//! A view paints itself by issuing primitive calls against a [`Painter`] from
//! inside the host's paint callback. Hosts implement the trait over whatever
//! backend they own; [`RasterPainter`](crate::RasterPainter) and
//! [`RecordingPainter`](crate::RecordingPainter) are the two implementations
//! shipped here.

use crate::image_buffer::ImageBuffer;
use crate::types::{Color, Point, Rect, Stroke, TextStyle};

/// Primitive drawing operations.
///
/// Coordinates are in the painter's own space. Clip rectangles nest: every
/// [`push_clip`](Painter::push_clip) must be balanced by a
/// [`pop_clip`](Painter::pop_clip), and the effective clip is the intersection
/// of all pushed rectangles.
pub trait Painter {
    /// Fill a rectangle with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Stroke the outline of a rectangle.
    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke);

    /// Draw a straight line segment.
    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke);

    /// Draw a single line of text inside `bounds`, clipped to them.
    fn draw_text(&mut self, text: &str, bounds: Rect, style: &TextStyle);

    /// Blit an image, scaled to `dest`.
    fn draw_image(&mut self, image: &ImageBuffer, dest: Rect);

    /// Push a clip rectangle.
    fn push_clip(&mut self, rect: Rect);

    /// Pop the most recently pushed clip rectangle.
    fn pop_clip(&mut self);

    /// Current effective clip, if any.
    fn clip_bounds(&self) -> Option<Rect>;
}

/// Clip bookkeeping shared by the bundled painters.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClipStack {
    stack: Vec<Rect>,
}

impl ClipStack {
    pub(crate) fn push(&mut self, rect: Rect) {
        let effective = match self.stack.last() {
            Some(current) => current.intersect(&rect).unwrap_or(Rect::ZERO),
            None => rect,
        };
        self.stack.push(effective);
    }

    pub(crate) fn pop(&mut self) {
        self.stack.pop();
    }

    pub(crate) fn current(&self) -> Option<Rect> {
        self.stack.last().copied()
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_stack_intersects() {
        let mut clips = ClipStack::default();
        assert_eq!(clips.current(), None);

        clips.push(Rect::new(0.0, 0.0, 100.0, 100.0));
        clips.push(Rect::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(clips.current(), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
        assert_eq!(clips.depth(), 2);

        clips.push(Rect::new(200.0, 200.0, 10.0, 10.0));
        assert!(clips.current().is_some_and(|r| r.is_empty()));

        clips.pop();
        clips.pop();
        assert_eq!(clips.current(), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    }
}
