//! Viewport-to-window math for fixed-size rows and grids.
//!
//! Pixel values are `f64` because grid cells derive their height from the content width and an
//! aspect ratio. Scroll offsets are measured from the top of the scroll container; the list
//! itself starts after `padding.top`.

use crate::Window;

/// How items are laid out along the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    /// One item per row, fixed row height.
    List { row_height: f64 },
    /// `column_count` items per row; cell height is `cell_width / aspect_ratio`.
    Grid {
        column_count: usize,
        aspect_ratio: f64,
    },
}

impl Layout {
    pub fn column_count(&self) -> usize {
        match *self {
            Self::List { .. } => 1,
            Self::Grid { column_count, .. } => column_count.max(1),
        }
    }

    /// Height of one row for the given content width. Zero when it cannot be determined.
    pub fn unit_height(&self, content_width: f64) -> f64 {
        let h = match *self {
            Self::List { row_height } => row_height,
            Self::Grid {
                column_count,
                aspect_ratio,
            } => {
                if aspect_ratio <= 0.0 {
                    return 0.0;
                }
                content_width / column_count.max(1) as f64 / aspect_ratio
            }
        };
        if h.is_finite() && h > 0.0 { h } else { 0.0 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            bottom: value,
        }
    }
}

/// Size of the visible content area of the scroll container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The rendered pixel span proposed for a scroll position, buffer included.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proposal {
    /// Distance from the list start to the first rendered pixel.
    pub offset_top: f64,
    pub offset_height: f64,
    /// Maximum scroll offset of the container.
    pub scroll_height: f64,
}

/// Fixed-unit layout geometry shared by the window controller and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub layout: Layout,
    pub padding: Padding,
    /// Rows rendered beyond each end of the viewport to mask fetch latency.
    pub buffer_rows: usize,
}

impl Geometry {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            padding: Padding::default(),
            buffer_rows: 0,
        }
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_buffer_rows(mut self, buffer_rows: usize) -> Self {
        self.buffer_rows = buffer_rows;
        self
    }

    pub fn column_count(&self) -> usize {
        self.layout.column_count()
    }

    /// Height of the list body (padding excluded).
    pub fn content_height(&self, viewport: Viewport, total: usize) -> f64 {
        let rows = total.div_ceil(self.column_count());
        rows as f64 * self.layout.unit_height(viewport.width)
    }

    pub fn max_scroll_top(&self, viewport: Viewport, total: usize) -> f64 {
        let full = self.padding.top + self.content_height(viewport, total) + self.padding.bottom;
        (full - viewport.height).max(0.0)
    }

    /// Computes the pixel span to render for `scroll_top`, extended by the buffer rows.
    ///
    /// While the total is unknown the span is not clamped at the bottom.
    pub fn propose(&self, viewport: Viewport, scroll_top: f64, total: Option<usize>) -> Proposal {
        let unit = self.layout.unit_height(viewport.width);
        let buffer = self.buffer_rows as f64 * unit;
        let top_in_list = scroll_top - self.padding.top;

        let offset_top = (top_in_list - buffer).max(0.0);
        let mut bottom = (top_in_list + viewport.height + buffer).max(0.0);
        let scroll_height = match total {
            Some(total) => {
                bottom = bottom.min(self.content_height(viewport, total));
                self.max_scroll_top(viewport, total)
            }
            None => 0.0,
        };
        Proposal {
            offset_top,
            offset_height: (bottom - offset_top).max(0.0),
            scroll_height,
        }
    }

    /// Converts a proposal into whole rows of items, clamped to the total.
    pub fn window_for(&self, viewport: Viewport, proposal: Proposal, total: Option<usize>) -> Window {
        let unit = self.layout.unit_height(viewport.width);
        if unit <= 0.0 {
            return Window::EMPTY;
        }
        let cols = self.column_count();
        let first_row = (proposal.offset_top / unit).floor() as usize;
        let end_row = ((proposal.offset_top + proposal.offset_height) / unit).ceil() as usize;
        let offset = first_row * cols;
        let end = end_row.max(first_row) * cols;
        let window = Window::new(offset, end - offset);
        match total {
            Some(total) => window.clamp(total),
            None => window,
        }
    }

    /// The window the user actually sees: rows whose midline is inside the viewport.
    pub fn visible(&self, viewport: Viewport, scroll_top: f64, total: usize) -> Window {
        let unit = self.layout.unit_height(viewport.width);
        if unit <= 0.0 {
            return Window::EMPTY;
        }
        let cols = self.column_count();
        let top_in_list = (scroll_top - self.padding.top).max(0.0);
        let first_row = (top_in_list / unit).round() as usize;
        let last_row = ((top_in_list + viewport.height) / unit).round() as usize;
        let offset = (first_row * cols).min(total);
        let end = (last_row * cols).min(total).max(offset);
        Window::new(offset, end - offset)
    }

    /// First item of the row that starts closest to the top of the viewport.
    pub fn first_visible_index(&self, viewport: Viewport, scroll_top: f64) -> usize {
        let unit = self.layout.unit_height(viewport.width);
        if unit <= 0.0 {
            return 0;
        }
        let top_in_list = (scroll_top - self.padding.top).max(0.0);
        (top_in_list / unit).round() as usize * self.column_count()
    }

    /// Scroll offset that puts the row of `index` at the top of the viewport.
    pub fn row_scroll_top(&self, viewport: Viewport, index: usize) -> f64 {
        let row = index / self.column_count();
        self.padding.top + row as f64 * self.layout.unit_height(viewport.width)
    }

    /// Minimal scroll that brings the row of `index` fully into view, or `None` when it already
    /// is.
    pub fn navigate_offset(
        &self,
        viewport: Viewport,
        scroll_top: f64,
        total: usize,
        index: usize,
    ) -> Option<f64> {
        let unit = self.layout.unit_height(viewport.width);
        if unit <= 0.0 || index >= total {
            return None;
        }
        let row_top = self.row_scroll_top(viewport, index);
        let row_bottom = row_top + unit;
        let target = if row_top < scroll_top {
            row_top
        } else if row_bottom > scroll_top + viewport.height {
            row_bottom - viewport.height
        } else {
            return None;
        };
        Some(target.clamp(0.0, self.max_scroll_top(viewport, total)))
    }
}
