use std::collections::VecDeque;
use std::time::{Duration, Instant};

use glam::Vec3;
use log::debug;

use crate::error::ShowcaseError;
use crate::layout::Layout;
use crate::rig::{CameraRig, Pose};
use crate::state::ShowcaseState;

/// Camera distance while traveling between slides.
pub const DOLLY_DISTANCE: f32 = 10.0;
/// Camera distance once settled in front of a slide.
pub const SETTLE_DISTANCE: f32 = 5.0;
/// Camera distance for the pulled-back overview.
pub const OVERVIEW_DISTANCE: f32 = 30.0;
/// Height of the brief rise before traveling away from a slide.
const RISE_HEIGHT: f32 = 3.0;
/// Height of the traversal leg, between the rise and the arrival pose.
const TRAVERSE_HEIGHT: f32 = 1.0;

/// Delay before the first camera move after startup, absorbing layout jitter
/// while the viewport is still being measured.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// A single camera target: where to put the eye, what to look at, and
/// whether the move is smoothed or instantaneous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub pose: Pose,
    pub animated: bool,
}

impl Waypoint {
    fn animated(pose: Pose) -> Self {
        Self {
            pose,
            animated: true,
        }
    }
}

/// Arrival pose: straight in front of slide `index` at viewing distance.
pub fn focus_pose(layout: &Layout, index: usize) -> Pose {
    let x = layout.offset_x(index);
    Pose::new(
        Vec3::new(x, 0.0, SETTLE_DISTANCE),
        Vec3::new(x, 0.0, 0.0),
    )
}

/// Pulled-back pose above the midpoint of all `count` items.
pub fn overview_pose(layout: &Layout, count: usize) -> Pose {
    let center = layout.overview_center(count);
    Pose::new(
        Vec3::new(center.x, layout.view_height / 2.0, OVERVIEW_DISTANCE),
        center,
    )
}

/// Enter-overview transition: one animated waypoint to the overview pose.
pub fn plan_enter_overview(layout: &Layout, count: usize) -> Vec<Waypoint> {
    vec![Waypoint::animated(overview_pose(layout, count))]
}

/// Focus transition between two slides: rise above the previous slide,
/// traverse toward the target at intermediate height, settle in front of it.
///
/// Every x offset in here comes from [`Layout::offset_x`], the same formula
/// that placed the items, so the camera ends up centered on the item.
pub fn plan_focus(layout: &Layout, previous: usize, target: usize) -> Vec<Waypoint> {
    let from_x = layout.offset_x(previous);
    let to_x = layout.offset_x(target);
    // The traversal eye leads the look-at by one pitch so the camera sweeps
    // across intervening slides instead of strafing flatly.
    let lead_x = to_x + layout.span + layout.gap;
    vec![
        Waypoint::animated(Pose::new(
            Vec3::new(from_x, RISE_HEIGHT, DOLLY_DISTANCE),
            Vec3::new(from_x, 0.0, 0.0),
        )),
        Waypoint::animated(Pose::new(
            Vec3::new(lead_x, TRAVERSE_HEIGHT, DOLLY_DISTANCE),
            Vec3::new(to_x, 0.0, 0.0),
        )),
        Waypoint::animated(focus_pose(layout, target)),
    ]
}

/// Initial pan-in when the showcase starts focused: dolly straight in from
/// overview depth onto the retained slide.
pub fn plan_leave_overview(layout: &Layout, slide: usize) -> Vec<Waypoint> {
    let x = layout.offset_x(slide);
    vec![
        Waypoint::animated(Pose::new(
            Vec3::new(x, 0.0, OVERVIEW_DISTANCE),
            Vec3::new(x, 0.0, 0.0),
        )),
        Waypoint::animated(focus_pose(layout, slide)),
    ]
}

/// Click-driven selection: wide pan toward the clicked slide at elevated
/// height, then settle in front of it.
pub fn plan_click_select(layout: &Layout, index: usize) -> Vec<Waypoint> {
    let x = layout.offset_x(index);
    vec![
        Waypoint::animated(Pose::new(
            Vec3::new(x, layout.view_height / 2.0, DOLLY_DISTANCE),
            Vec3::new(x, 0.0, 0.0),
        )),
        Waypoint::animated(focus_pose(layout, index)),
    ]
}

#[derive(Debug, Clone, Copy)]
enum SettleTimer {
    Unarmed,
    Armed(Instant),
    Fired,
}

/// Sequences camera waypoints for slide transitions.
///
/// Exactly one sequence is in flight at a time: each waypoint fully settles
/// before the next is fed to the rig, and new requests that arrive mid-flight
/// are absorbed by the state layer and replayed (latest wins) once the
/// current sequence resolves. Waypoint playback never interleaves.
pub struct Choreographer {
    count: usize,
    rig: Option<Box<dyn CameraRig>>,
    sequence: VecDeque<Waypoint>,
    /// Slide committed to the state store once the click sequence settles.
    commit_on_settle: Option<usize>,
    last_slide: usize,
    last_home: bool,
    last_revision: u64,
    settle_delay: Duration,
    settle_timer: SettleTimer,
}

impl Choreographer {
    pub fn new(count: usize) -> Self {
        Self::with_settle_delay(count, DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(count: usize, settle_delay: Duration) -> Self {
        Self {
            count,
            rig: None,
            sequence: VecDeque::new(),
            commit_on_settle: None,
            last_slide: 0,
            last_home: true,
            last_revision: 0,
            settle_delay,
            settle_timer: SettleTimer::Unarmed,
        }
    }

    /// Attach the camera rig and place it directly at the pose matching the
    /// current state. The first pose is a placement, not a fly-to.
    pub fn attach_rig(
        &mut self,
        mut rig: Box<dyn CameraRig>,
        state: &ShowcaseState,
        layout: &Layout,
    ) {
        let snap = state.snapshot();
        let initial = if snap.home {
            overview_pose(layout, self.count)
        } else {
            focus_pose(layout, snap.slide)
        };
        rig.fly_to(initial, false);
        self.last_slide = snap.slide;
        self.last_home = snap.home;
        self.last_revision = snap.revision;
        self.rig = Some(rig);
    }

    pub fn rig_attached(&self) -> bool {
        self.rig.is_some()
    }

    /// Current camera pose, if a rig is attached.
    pub fn pose(&self) -> Option<Pose> {
        self.rig.as_ref().map(|rig| rig.pose())
    }

    /// Re-arm the initial settle timer. Called when the viewport changes
    /// before the showcase has committed to its first camera pose.
    pub fn restart_settle_timer(&mut self) {
        self.settle_timer = SettleTimer::Unarmed;
    }

    /// Advance the rig and the waypoint state machine by one frame.
    ///
    /// Returns [`ShowcaseError::RigNotReady`] when a transition was pending
    /// but no rig is attached; the pending work is dropped, not retried.
    pub fn update(
        &mut self,
        now: Instant,
        state: &ShowcaseState,
        layout: &Layout,
    ) -> Result<(), ShowcaseError> {
        let Some(rig) = self.rig.as_mut() else {
            let snap = state.snapshot();
            let dropped_click = state.take_pending_click().is_some();
            let dropped_change = snap.revision != self.last_revision;
            if dropped_click || dropped_change {
                self.last_slide = snap.slide;
                self.last_home = snap.home;
                self.last_revision = snap.revision;
                return Err(ShowcaseError::RigNotReady);
            }
            return Ok(());
        };

        rig.update(now);

        match self.settle_timer {
            SettleTimer::Unarmed => {
                self.settle_timer = SettleTimer::Armed(now + self.settle_delay);
            }
            SettleTimer::Armed(deadline) if now >= deadline => {
                self.settle_timer = SettleTimer::Fired;
                // A transition honored during the delay owns the camera;
                // its remaining legs are never discarded or replaced.
                if self.sequence.is_empty() && rig.settled() && self.commit_on_settle.is_none() {
                    let snap = state.snapshot();
                    let plan = if snap.home {
                        plan_enter_overview(layout, self.count)
                    } else {
                        plan_leave_overview(layout, snap.slide)
                    };
                    debug!(
                        "initial settle: {} ({} waypoints)",
                        if snap.home { "overview" } else { "focus" },
                        plan.len()
                    );
                    self.sequence = plan.into();
                    // The initial plan already reflects this snapshot; don't
                    // replay it as a revision change afterwards.
                    self.last_slide = snap.slide;
                    self.last_home = snap.home;
                    self.last_revision = snap.revision;
                }
            }
            _ => {}
        }

        // Each waypoint fully resolves before the next one starts.
        if !rig.settled() {
            return Ok(());
        }

        if let Some(waypoint) = self.sequence.pop_front() {
            rig.fly_to(waypoint.pose, waypoint.animated);
            return Ok(());
        }

        if let Some(index) = self.commit_on_settle.take() {
            // Commit only after the camera arrived, so state and visible
            // pose never disagree.
            state.select_slide(index)?;
            let snap = state.snapshot();
            self.last_slide = snap.slide;
            self.last_home = snap.home;
            self.last_revision = snap.revision;
        }

        // Idle: honor the latest pending request. Clicks carry explicit
        // intent and win over navigation changes from the same frame.
        if let Some(index) = state.take_pending_click() {
            let snap = state.snapshot();
            if snap.slide == index && !snap.home {
                // A repeat click on the slide that just settled; the state
                // guard could not filter it while the commit was pending.
                debug!("click on displayed slide {index} dropped");
            } else {
                debug!("click select -> slide {index}");
                self.settle_timer = SettleTimer::Fired;
                self.sequence = plan_click_select(layout, index).into();
                self.commit_on_settle = Some(index);
                return Ok(());
            }
        }

        let snap = state.snapshot();
        if snap.revision != self.last_revision {
            // User navigation supersedes the startup decision.
            self.settle_timer = SettleTimer::Fired;
            if snap.home && !self.last_home {
                debug!("enter overview");
                self.sequence = plan_enter_overview(layout, self.count).into();
            } else if !snap.home {
                debug!("focus {} -> {}", self.last_slide, snap.slide);
                self.sequence = plan_focus(layout, self.last_slide, snap.slide).into();
            }
            self.last_slide = snap.slide;
            self.last_home = snap.home;
            self.last_revision = snap.revision;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Rig double that settles instantly and records every flight.
    struct RecordingRig {
        flights: Arc<Mutex<Vec<Waypoint>>>,
        current: Pose,
    }

    impl RecordingRig {
        fn new() -> (Box<dyn CameraRig>, Arc<Mutex<Vec<Waypoint>>>) {
            let flights = Arc::new(Mutex::new(Vec::new()));
            let rig = Box::new(Self {
                flights: Arc::clone(&flights),
                current: Pose::new(Vec3::ZERO, Vec3::ZERO),
            });
            (rig, flights)
        }
    }

    impl CameraRig for RecordingRig {
        fn fly_to(&mut self, pose: Pose, animated: bool) {
            self.current = pose;
            self.flights.lock().push(Waypoint { pose, animated });
        }

        fn update(&mut self, _now: Instant) {}

        fn settled(&self) -> bool {
            true
        }

        fn pose(&self) -> Pose {
            self.current
        }
    }

    fn setup(count: usize) -> (Choreographer, ShowcaseState, Layout, Arc<Mutex<Vec<Waypoint>>>) {
        let state = ShowcaseState::new(count);
        let layout = Layout::new(5.0, 1.0);
        let mut chor = Choreographer::with_settle_delay(count, Duration::ZERO);
        let (rig, flights) = RecordingRig::new();
        chor.attach_rig(rig, &state, &layout);
        (chor, state, layout, flights)
    }

    fn run(chor: &mut Choreographer, state: &ShowcaseState, layout: &Layout) {
        let now = Instant::now();
        for _ in 0..16 {
            chor.update(now, state, layout).unwrap();
        }
    }

    #[test]
    fn attaching_places_the_camera_without_animation() {
        let (chor, _state, layout, flights) = setup(3);
        let flights = flights.lock();
        assert_eq!(flights.len(), 1);
        assert!(!flights[0].animated);
        assert_eq!(flights[0].pose, overview_pose(&layout, 3));
        assert_eq!(chor.pose(), Some(overview_pose(&layout, 3)));
    }

    #[test]
    fn select_from_startup_plays_three_legs_to_the_target_offset() {
        // span=5, gap=1, n=3 -> offsets [0, 6, 12]
        let (mut chor, state, layout, flights) = setup(3);
        run(&mut chor, &state, &layout); // settle timer fires, overview plays
        flights.lock().clear();

        state.select_slide(2).unwrap();
        run(&mut chor, &state, &layout);

        let flights = flights.lock();
        assert_eq!(flights.len(), 3);
        let last = flights.last().unwrap();
        assert_eq!(last.pose.target.x, 12.0);
        assert_eq!(last.pose.eye.z, SETTLE_DISTANCE);
    }

    #[test]
    fn duplicate_selection_replays_nothing() {
        let (mut chor, state, layout, flights) = setup(3);
        state.select_slide(1).unwrap();
        run(&mut chor, &state, &layout);
        flights.lock().clear();

        state.select_slide(1).unwrap();
        run(&mut chor, &state, &layout);
        assert!(flights.lock().is_empty());
    }

    #[test]
    fn home_then_select_ends_focused_on_the_target() {
        let (mut chor, state, layout, flights) = setup(3);
        state.select_slide(1).unwrap();
        run(&mut chor, &state, &layout);
        state.go_home();
        run(&mut chor, &state, &layout);
        state.select_slide(2).unwrap();
        run(&mut chor, &state, &layout);

        let last = *flights.lock().last().unwrap();
        assert_eq!(last.pose, focus_pose(&layout, 2));
        assert!(!state.snapshot().home);
    }

    #[test]
    fn click_commits_only_after_the_sequence_settles() {
        let (mut chor, state, layout, flights) = setup(3);
        run(&mut chor, &state, &layout);
        flights.lock().clear();

        state.request_click(2).unwrap();
        // Still home until the two-leg pan resolves.
        assert!(state.snapshot().home);
        run(&mut chor, &state, &layout);

        let snap = state.snapshot();
        assert_eq!(snap.slide, 2);
        assert!(!snap.home);
        let flights = flights.lock();
        assert_eq!(flights.len(), 2);
        assert_eq!(flights.last().unwrap().pose, focus_pose(&layout, 2));
    }

    #[test]
    fn click_on_the_displayed_slide_is_a_no_op() {
        let (mut chor, state, layout, flights) = setup(3);
        state.select_slide(1).unwrap();
        run(&mut chor, &state, &layout);
        flights.lock().clear();

        state.request_click(1).unwrap();
        run(&mut chor, &state, &layout);
        assert!(flights.lock().is_empty());
    }

    #[test]
    fn transitions_without_a_rig_are_dropped_with_an_error() {
        let state = ShowcaseState::new(3);
        let layout = Layout::new(5.0, 1.0);
        let mut chor = Choreographer::with_settle_delay(3, Duration::ZERO);

        state.request_click(2).unwrap();
        let err = chor.update(Instant::now(), &state, &layout);
        assert_eq!(err, Err(ShowcaseError::RigNotReady));
        // The click was dropped without committing the selection.
        assert_eq!(state.snapshot().slide, 0);
        assert!(state.snapshot().home);
        // Dropped means dropped: no retry on the next frame.
        assert_eq!(chor.update(Instant::now(), &state, &layout), Ok(()));

        state.select_slide(0).unwrap();
        let err = chor.update(Instant::now(), &state, &layout);
        assert_eq!(err, Err(ShowcaseError::RigNotReady));
        assert_eq!(state.snapshot().slide, 0);
    }

    #[test]
    fn later_request_supersedes_while_a_sequence_is_in_flight() {
        let (mut chor, state, layout, flights) = setup(3);
        run(&mut chor, &state, &layout);
        flights.lock().clear();

        // Two clicks before the choreographer gets a frame: latest wins.
        state.request_click(1).unwrap();
        state.request_click(2).unwrap();
        run(&mut chor, &state, &layout);

        assert_eq!(state.snapshot().slide, 2);
        assert_eq!(flights.lock().last().unwrap().pose, focus_pose(&layout, 2));
    }

    #[test]
    fn startup_timer_yields_to_navigation_issued_first() {
        let state = ShowcaseState::new(3);
        let layout = Layout::new(5.0, 1.0);
        let mut chor = Choreographer::with_settle_delay(3, Duration::from_millis(500));
        let (rig, flights) = RecordingRig::new();
        chor.attach_rig(rig, &state, &layout);
        flights.lock().clear();

        let start = Instant::now();
        chor.update(start, &state, &layout).unwrap();
        state.select_slide(2).unwrap();
        for ms in [10u64, 20, 30, 40] {
            chor.update(start + Duration::from_millis(ms), &state, &layout)
                .unwrap();
        }
        // Past the startup delay: the timer must not replace the focus
        // sequence or send the camera back out to overview depth.
        for ms in [600u64, 620, 640, 660] {
            chor.update(start + Duration::from_millis(ms), &state, &layout)
                .unwrap();
        }

        let flights = flights.lock();
        assert_eq!(flights.len(), 3);
        assert!(flights.iter().all(|leg| leg.pose.eye.z <= DOLLY_DISTANCE));
        assert_eq!(flights.last().unwrap().pose, focus_pose(&layout, 2));
    }

    #[test]
    fn rearmed_timer_does_not_discard_in_flight_legs() {
        let (mut chor, state, layout, flights) = setup(3);
        run(&mut chor, &state, &layout); // overview plays
        flights.lock().clear();

        state.select_slide(2).unwrap();
        let now = Instant::now();
        chor.update(now, &state, &layout).unwrap(); // plans the three legs
        chor.update(now, &state, &layout).unwrap(); // first leg in flight
        chor.restart_settle_timer(); // viewport changed mid-sequence
        run(&mut chor, &state, &layout);

        let flights = flights.lock();
        assert_eq!(flights.len(), 3);
        assert!(flights.iter().all(|leg| leg.pose.eye.z <= DOLLY_DISTANCE));
        assert_eq!(flights.last().unwrap().pose, focus_pose(&layout, 2));
    }

    #[test]
    fn repeated_click_before_settle_flies_once() {
        let (mut chor, state, layout, flights) = setup(3);
        run(&mut chor, &state, &layout);
        flights.lock().clear();

        state.request_click(2).unwrap();
        let now = Instant::now();
        chor.update(now, &state, &layout).unwrap(); // click sequence starts
        // Second click on the same marker while the first is still in
        // flight; the state guard passes because nothing is committed yet.
        state.request_click(2).unwrap();
        run(&mut chor, &state, &layout);

        let snap = state.snapshot();
        assert_eq!(snap.slide, 2);
        assert!(!snap.home);
        assert_eq!(flights.lock().len(), 2);
    }

    #[test]
    fn settle_timer_pans_in_when_starting_focused() {
        let state = ShowcaseState::new(3);
        state.select_slide(1).unwrap();
        let layout = Layout::new(5.0, 1.0);
        let mut chor = Choreographer::with_settle_delay(3, Duration::ZERO);
        let (rig, flights) = RecordingRig::new();
        chor.attach_rig(rig, &state, &layout);
        flights.lock().clear();

        run(&mut chor, &state, &layout);
        let flights = flights.lock();
        assert_eq!(flights.len(), 2);
        assert_eq!(flights.last().unwrap().pose, focus_pose(&layout, 1));
    }

    #[test]
    fn plan_offsets_match_item_placement() {
        let layout = Layout::new(5.0, 1.0);
        for target in 0..3 {
            let plan = plan_focus(&layout, 0, target);
            assert_eq!(plan.len(), 3);
            for leg in &plan[1..] {
                assert_eq!(leg.pose.target.x, layout.item_position(target).x);
            }
        }
    }
}
