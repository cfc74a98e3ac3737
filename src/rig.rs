use std::time::{Duration, Instant};

use glam::Vec3;

use crate::easing::Easing;

/// Vertical field of view shared by the camera, the layout derivation and
/// picking. Keeping one constant avoids a mismatch between what the camera
/// sees and where clicks land.
pub const FOV_Y_DEGREES: f32 = 45.0;

/// Near and far clip planes, shared by the projection matrix and the
/// click-ray unprojection.
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 500.0;

/// A camera position plus the point it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub eye: Vec3,
    pub target: Vec3,
}

impl Pose {
    pub const fn new(eye: Vec3, target: Vec3) -> Self {
        Self { eye, target }
    }
}

/// The one operation the choreographer performs against a camera.
///
/// `fly_to` starts a move; `settled` reports whether the camera has
/// physically come to rest. The choreographer never issues a second animated
/// `fly_to` before the previous one settles, which is what keeps waypoint
/// playback from interleaving.
pub trait CameraRig {
    /// Begin moving toward `pose`. With `animated == false` the camera is
    /// placed there instantly.
    fn fly_to(&mut self, pose: Pose, animated: bool);

    /// Advance any in-flight move to `now`.
    fn update(&mut self, now: Instant);

    /// True when no move is in flight.
    fn settled(&self) -> bool;

    /// Current (possibly mid-glide) pose.
    fn pose(&self) -> Pose;
}

#[derive(Debug)]
enum GlideState {
    Idle,
    /// A glide that starts on the next `update` tick; `fly_to` has no clock.
    Pending { to: Pose },
    Gliding { from: Pose, to: Pose, elapsed: Duration },
}

/// Eased point-to-point camera glide.
///
/// Interpolates eye and look-at independently with an ease-out curve over a
/// fixed duration. Retargeting mid-glide departs from the current
/// interpolated pose, so a snap never teleports through an unrelated pose.
#[derive(Debug)]
pub struct GlideRig {
    current: Pose,
    state: GlideState,
    duration: Duration,
    easing: Easing,
    last_update: Option<Instant>,
}

impl GlideRig {
    pub const DEFAULT_GLIDE: Duration = Duration::from_millis(1200);

    pub fn new(initial: Pose) -> Self {
        Self::with_duration(initial, Self::DEFAULT_GLIDE)
    }

    pub fn with_duration(initial: Pose, duration: Duration) -> Self {
        Self {
            current: initial,
            state: GlideState::Idle,
            duration,
            easing: Easing::DEFAULT,
            last_update: None,
        }
    }
}

impl CameraRig for GlideRig {
    fn fly_to(&mut self, pose: Pose, animated: bool) {
        if animated && !self.duration.is_zero() {
            self.state = GlideState::Pending { to: pose };
        } else {
            self.current = pose;
            self.state = GlideState::Idle;
        }
    }

    fn update(&mut self, now: Instant) {
        let dt = match self.last_update {
            Some(previous) => now.saturating_duration_since(previous),
            None => Duration::ZERO,
        };
        self.last_update = Some(now);

        match &mut self.state {
            GlideState::Idle => {}
            GlideState::Pending { to } => {
                self.state = GlideState::Gliding {
                    from: self.current,
                    to: *to,
                    elapsed: Duration::ZERO,
                };
            }
            GlideState::Gliding { from, to, elapsed } => {
                *elapsed += dt;
                let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
                if t >= 1.0 {
                    self.current = *to;
                    self.state = GlideState::Idle;
                } else {
                    let k = self.easing.evaluate(t);
                    self.current = Pose {
                        eye: from.eye.lerp(to.eye, k),
                        target: from.target.lerp(to.target, k),
                    };
                }
            }
        }
    }

    fn settled(&self) -> bool {
        matches!(self.state, GlideState::Idle)
    }

    fn pose(&self) -> Pose {
        self.current
    }
}
