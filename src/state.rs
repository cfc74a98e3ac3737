use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ShowcaseError;

/// Point-in-time view of the selection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Currently active slide. Exactly one slide is current at any time.
    pub slide: usize,
    /// True while the camera shows the pulled-back overview of all items.
    pub home: bool,
    /// Bumped on every observable mutation; the choreographer polls this
    /// for change notification.
    pub revision: u64,
}

#[derive(Debug)]
struct Inner {
    slide: usize,
    home: bool,
    revision: u64,
    /// Click-driven selection waiting for the choreographer. Last write
    /// wins; the slide is only committed once the fly sequence resolves.
    pending_click: Option<usize>,
}

/// Thread-safe slide selection store shared between the event loop and the
/// choreographer. Cloning shares the same storage.
///
/// Redundant triggers are filtered here: selecting the already-focused slide
/// does not bump the revision, so no waypoint sequence replays downstream.
#[derive(Debug)]
pub struct ShowcaseState {
    len: usize,
    inner: Arc<RwLock<Inner>>,
}

impl Clone for ShowcaseState {
    fn clone(&self) -> Self {
        Self {
            len: self.len,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ShowcaseState {
    /// Startup state: slide 0, overview mode, revision untouched so the very
    /// first pose is a direct placement rather than a fly-to.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            inner: Arc::new(RwLock::new(Inner {
                slide: 0,
                home: true,
                revision: 0,
                pending_click: None,
            })),
        }
    }

    /// Number of slides in the showcase.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        Snapshot {
            slide: inner.slide,
            home: inner.home,
            revision: inner.revision,
        }
    }

    /// Focus slide `index`. No-op when that slide is already focused.
    pub fn select_slide(&self, index: usize) -> Result<(), ShowcaseError> {
        self.check_range(index)?;
        let mut inner = self.inner.write();
        if inner.slide == index && !inner.home {
            return Ok(());
        }
        inner.slide = index;
        inner.home = false;
        inner.revision += 1;
        Ok(())
    }

    /// Focus the slide after the current one, saturating at the end of the
    /// lane. Leaving the overview this way focuses the retained slide.
    pub fn select_next(&self) -> Result<(), ShowcaseError> {
        let current = self.snapshot();
        let next = (current.slide + 1).min(self.len.saturating_sub(1));
        if current.home {
            self.select_slide(current.slide)
        } else {
            self.select_slide(next)
        }
    }

    /// Focus the slide before the current one, saturating at slide 0.
    pub fn select_previous(&self) -> Result<(), ShowcaseError> {
        let current = self.snapshot();
        if current.home {
            self.select_slide(current.slide)
        } else {
            self.select_slide(current.slide.saturating_sub(1))
        }
    }

    /// Switch to the overview. The slide index is retained; it seeds the
    /// overview pan target and the next focus transition.
    pub fn go_home(&self) {
        let mut inner = self.inner.write();
        if inner.home {
            return;
        }
        inner.home = true;
        inner.revision += 1;
    }

    /// Record a marker click. The selection is not committed here: the
    /// choreographer commits it after the click fly sequence settles, so
    /// state and visible camera pose never desynchronize.
    pub fn request_click(&self, index: usize) -> Result<(), ShowcaseError> {
        self.check_range(index)?;
        let mut inner = self.inner.write();
        if inner.slide == index && !inner.home {
            // Clicking the marker of the slide already on screen.
            return Ok(());
        }
        inner.pending_click = Some(index);
        Ok(())
    }

    /// Consume the most recent pending click, if any.
    pub fn take_pending_click(&self) -> Option<usize> {
        self.inner.write().pending_click.take()
    }

    fn check_range(&self, index: usize) -> Result<(), ShowcaseError> {
        if index >= self.len {
            return Err(ShowcaseError::OutOfRangeIndex {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}
