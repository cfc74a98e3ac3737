//! Core modules for the Vitrine showcase viewer.
//!
//! The crate exposes the pieces of a scroll-free 3D product showcase: a
//! catalog of items laid out along a single lane, a selection store, and a
//! choreographer that glides the camera between an overview of the lane and
//! individual items. The choreography core is deliberately free of any GPU
//! or windowing types so it can be driven headless and unit tested with a
//! fake camera rig.

pub mod catalog;
pub mod choreographer;
pub mod easing;
pub mod error;
pub mod input;
pub mod layout;
pub mod picking;
pub mod render;
pub mod rig;
pub mod state;
pub mod viewport;

pub use catalog::{Catalog, ShowcaseItem};
pub use choreographer::{Choreographer, Waypoint, DEFAULT_SETTLE_DELAY};
pub use error::ShowcaseError;
pub use input::{nav_action, NavAction};
pub use layout::{Layout, MARKER_RADIUS};
pub use render::Renderer;
pub use rig::{CameraRig, GlideRig, Pose, FOV_Y_DEGREES};
pub use state::{ShowcaseState, Snapshot};
pub use viewport::{StaticViewport, ViewportProvider, WindowViewport};
