use std::sync::Arc;

use parking_lot::RwLock;

/// Provides the current viewport dimensions in physical pixels.
///
/// The layout reads these to derive the world-space span of a display panel,
/// which keeps camera targets and item placement in agreement with whatever
/// the window happens to measure.
pub trait ViewportProvider: Send + Sync {
    fn viewport_size(&self) -> (u32, u32);

    /// Width over height, guarded against a zero-height window.
    fn aspect(&self) -> f32 {
        let (width, height) = self.viewport_size();
        width as f32 / height.max(1) as f32
    }
}

/// Viewport that always reports the same resolution. Used by headless runs
/// and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewport {
    pub width: u32,
    pub height: u32,
}

impl StaticViewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ViewportProvider for StaticViewport {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Viewport backed by a live window, updated from resize events.
#[derive(Debug, Default)]
pub struct WindowViewport {
    size: RwLock<(u32, u32)>,
}

impl WindowViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: RwLock::new((width.max(1), height.max(1))),
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        *self.size.write() = (width.max(1), height.max(1));
    }
}

impl ViewportProvider for WindowViewport {
    fn viewport_size(&self) -> (u32, u32) {
        *self.size.read()
    }
}

impl<T> ViewportProvider for Arc<T>
where
    T: ViewportProvider + ?Sized,
{
    fn viewport_size(&self) -> (u32, u32) {
        (**self).viewport_size()
    }
}
