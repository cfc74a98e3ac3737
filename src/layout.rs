use glam::Vec3;

/// Radius of the clickable preview marker floating above each item.
pub const MARKER_RADIUS: f32 = 0.7;

/// How far the marker floats above the top edge of an item's panel.
const MARKER_CLEARANCE: f32 = 1.5;

/// Deterministic spatial arrangement of the showcase lane.
///
/// Item `i` sits at `i * (span + gap)` along the x axis. This formula is the
/// single source of spatial truth: item placement, marker placement and
/// camera targeting all read from here, so the camera always ends up centered
/// on the item it was asked to frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// World-space width of one display panel (one "viewport" of content).
    pub span: f32,
    /// Fixed spacing between neighbouring panels.
    pub gap: f32,
    /// World-space height of one display panel.
    pub view_height: f32,
}

impl Layout {
    /// Layout with an explicit span, assuming 16:9 panels. Mostly useful for
    /// tests and headless runs; interactive mode derives the span from the
    /// window via [`Layout::from_viewport`].
    pub fn new(span: f32, gap: f32) -> Self {
        Self {
            span,
            gap,
            view_height: span * 9.0 / 16.0,
        }
    }

    /// Derive the span from the actual viewport: the width of the view
    /// frustum at `focus_distance`, so a panel exactly fills the window when
    /// the camera settles in front of it.
    pub fn from_viewport(
        width: u32,
        height: u32,
        fovy_degrees: f32,
        focus_distance: f32,
        gap: f32,
    ) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        let view_height = 2.0 * focus_distance * (fovy_degrees.to_radians() / 2.0).tan();
        Self {
            span: view_height * aspect,
            gap,
            view_height,
        }
    }

    /// X offset of item `i`.
    pub fn offset_x(&self, index: usize) -> f32 {
        index as f32 * (self.span + self.gap)
    }

    /// Center of item `i`'s display panel.
    pub fn item_position(&self, index: usize) -> Vec3 {
        Vec3::new(self.offset_x(index), 0.0, 0.0)
    }

    /// Center of item `i`'s preview marker, floating above the panel.
    pub fn marker_position(&self, index: usize) -> Vec3 {
        Vec3::new(
            self.offset_x(index),
            self.view_height / 2.0 + MARKER_CLEARANCE,
            0.0,
        )
    }

    /// Midpoint of the spatial extent of `count` items; the overview camera
    /// looks here.
    pub fn overview_center(&self, count: usize) -> Vec3 {
        let last = count.saturating_sub(1);
        Vec3::new(self.offset_x(last) / 2.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_the_linear_formula() {
        // span=5, gap=1 -> 0, 6, 12
        let layout = Layout::new(5.0, 1.0);
        assert_eq!(layout.offset_x(0), 0.0);
        assert_eq!(layout.offset_x(1), 6.0);
        assert_eq!(layout.offset_x(2), 12.0);
    }

    #[test]
    fn placement_and_targeting_share_offsets() {
        let layout = Layout::new(7.5, 2.0);
        for i in 0..4 {
            assert_eq!(layout.item_position(i).x, layout.offset_x(i));
            assert_eq!(layout.marker_position(i).x, layout.offset_x(i));
        }
    }

    #[test]
    fn overview_center_is_the_midpoint() {
        let layout = Layout::new(5.0, 1.0);
        assert_eq!(layout.overview_center(3).x, 6.0);
        // A single item is its own midpoint.
        assert_eq!(layout.overview_center(1).x, 0.0);
        assert_eq!(layout.overview_center(0).x, 0.0);
    }

    #[test]
    fn span_matches_frustum_width_at_focus_distance() {
        // 90 degree fov at distance 1: frustum is 2 units tall.
        let layout = Layout::from_viewport(1600, 800, 90.0, 1.0, 0.5);
        assert!((layout.view_height - 2.0).abs() < 1e-5);
        assert!((layout.span - 4.0).abs() < 1e-5);
    }

    #[test]
    fn markers_clear_the_panel_top() {
        let layout = Layout::new(5.0, 1.0);
        assert!(layout.marker_position(0).y > layout.view_height / 2.0);
    }
}
