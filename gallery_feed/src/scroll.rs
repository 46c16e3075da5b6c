//! Load-more trigger for scrolling lists

/// Start loading the next page this many viewport heights before the end
pub const PREFETCH_VIEWPORTS: f64 = 1.5;

/// Vertical scroll geometry of a list, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    pub offset_y: f64,
    pub content_height: f64,
    pub viewport_height: f64,
}

impl ScrollPosition {
    /// True when the viewport is within 1.5 viewport heights of the end
    pub fn near_end(&self) -> bool {
        self.offset_y > self.content_height - self.viewport_height * PREFETCH_VIEWPORTS
    }
}
