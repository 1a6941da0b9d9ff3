//! Pointer stream to count conversion.
//!
//! One bead is active at a time. A gesture grabs it, drags it along the
//! string, and commits exactly one count when the bead crosses the counting
//! threshold. After a commit the bead is frozen until the pointer lifts.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, trace};

use crate::animation::{FadeOut, SpringReturn};
use crate::bead::BeadConfig;
use crate::geometry::{clamp, Path, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// Pointer sample in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self { kind, x, y }
    }

    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    pub fn cancel(x: f64, y: f64) -> Self {
        Self::new(PointerKind::Cancel, x, y)
    }

    pub fn at(kind: PointerKind, p: Point) -> Self {
        Self::new(kind, p.x, p.y)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Domain signals raised for external consumers (feedback, UI)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSignal {
    Count,
    TargetReached,
}

/// Receiver of committed counts. Returns true when the count completed a round.
pub trait CountSink {
    fn increment(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseAnimation {
    /// Counted bead fades out, then reappears at rest
    FadeOut(FadeOut),
    /// Uncounted bead springs back to rest
    SpringReturn(SpringReturn),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    /// Count committed for this gesture; the bead ignores further motion
    Committed,
    Releasing(ReleaseAnimation),
}

/// Snapshot of the active bead, read by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub active_t: f64,
    pub is_dragging: bool,
    pub has_counted_this_drag: bool,
    pub opacity: f64,
}

/// Single-writer cell holding the latest [`DragState`]. Readers always get a
/// whole snapshot, never a half-written one.
#[derive(Debug, Clone)]
pub struct DragCell {
    inner: Arc<RwLock<DragState>>,
}

impl DragCell {
    pub fn new(state: DragState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn snapshot(&self) -> DragState {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: DragState) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[derive(Debug, Clone, Copy)]
enum GestureInput {
    Pointer(PointerEvent),
    Tick(Duration),
}

#[derive(Debug)]
pub struct GestureController {
    path: Arc<Path>,
    beads: BeadConfig,
    phase: GesturePhase,
    active_t: f64,
    opacity: f64,
    has_counted_this_drag: bool,
    cell: DragCell,
}

impl GestureController {
    pub fn new(path: Arc<Path>, beads: BeadConfig) -> Self {
        let initial = DragState {
            active_t: beads.resting_start_t,
            is_dragging: false,
            has_counted_this_drag: false,
            opacity: 1.0,
        };
        Self {
            path,
            beads,
            phase: GesturePhase::Idle,
            active_t: beads.resting_start_t,
            opacity: 1.0,
            has_counted_this_drag: false,
            cell: DragCell::new(initial),
        }
    }

    pub fn path(&self) -> &Arc<Path> {
        &self.path
    }

    pub fn beads(&self) -> &BeadConfig {
        &self.beads
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == GesturePhase::Idle
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, GesturePhase::Releasing(_))
    }

    pub fn active_t(&self) -> f64 {
        self.active_t
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn active_point(&self) -> Point {
        self.path.point(self.active_t)
    }

    pub fn drag_state(&self) -> DragState {
        DragState {
            active_t: self.active_t,
            is_dragging: self.phase == GesturePhase::Dragging,
            has_counted_this_drag: self.has_counted_this_drag,
            opacity: self.opacity,
        }
    }

    /// Handle for the render side
    pub fn drag_cell(&self) -> DragCell {
        self.cell.clone()
    }

    /// Feed one pointer event. Commits go to `sink` synchronously, before this returns.
    pub fn handle<S: CountSink + ?Sized>(
        &mut self,
        event: PointerEvent,
        sink: &mut S,
    ) -> Vec<CounterSignal> {
        let commit = self.transition(GestureInput::Pointer(event));
        let mut signals = Vec::new();
        if commit {
            let reached = sink.increment();
            debug!(target_reached = reached, active_t = self.active_t, "count committed");
            signals.push(CounterSignal::Count);
            if reached {
                signals.push(CounterSignal::TargetReached);
            }
        }
        self.cell.publish(self.drag_state());
        signals
    }

    /// Advance release animations
    pub fn tick(&mut self, dt: Duration) {
        let committed = self.transition(GestureInput::Tick(dt));
        debug_assert!(!committed, "ticks never commit");
        self.cell.publish(self.drag_state());
    }

    /// Skip any running release animation and put the bead back at rest
    pub fn settle(&mut self) {
        if let GesturePhase::Releasing(_) = self.phase {
            self.enter(GesturePhase::Idle);
            self.active_t = self.beads.resting_start_t;
            self.opacity = 1.0;
            self.cell.publish(self.drag_state());
        }
    }

    /// Run a complete synthetic gesture that carries the bead just past the
    /// threshold. Does nothing while a real pointer holds the bead.
    pub fn pull<S: CountSink + ?Sized>(&mut self, sink: &mut S) -> Vec<CounterSignal> {
        if matches!(self.phase, GesturePhase::Dragging | GesturePhase::Committed) {
            return Vec::new();
        }
        self.settle();

        let from = self.active_point();
        let to = self
            .path
            .point((self.beads.counting_threshold_t + 1.0) / 2.0);
        let mut signals = self.handle(PointerEvent::at(PointerKind::Down, from), sink);
        signals.extend(self.handle(PointerEvent::at(PointerKind::Move, to), sink));
        signals.extend(self.handle(PointerEvent::at(PointerKind::Up, to), sink));
        signals
    }

    fn captures(&self, p: Point) -> bool {
        self.active_point().distance(p) < self.beads.capture_radius()
    }

    fn enter(&mut self, next: GesturePhase) {
        if std::mem::discriminant(&self.phase) != std::mem::discriminant(&next) {
            trace!(from = ?self.phase, to = ?next, "gesture transition");
        }
        self.phase = next;
    }

    /// The single transition function. Returns true when a count must be committed.
    fn transition(&mut self, input: GestureInput) -> bool {
        use GesturePhase::*;
        use PointerKind::*;

        let mut commit = false;
        let next = match (self.phase, input) {
            (phase, GestureInput::Pointer(ev)) if !ev.position().is_finite() => phase,

            (Idle | Releasing(ReleaseAnimation::SpringReturn(_)), GestureInput::Pointer(ev))
                if ev.kind == Down =>
            {
                if self.captures(ev.position()) {
                    self.has_counted_this_drag = false;
                    self.opacity = 1.0;
                    Dragging
                } else {
                    self.phase
                }
            }

            (Dragging, GestureInput::Pointer(ev)) => match ev.kind {
                Move => {
                    let t = self.path.closest_t(ev.x, ev.y);
                    self.active_t = clamp(t, self.beads.reset_position_t, 1.0);
                    if self.active_t >= self.beads.counting_threshold_t && !self.has_counted_this_drag {
                        self.has_counted_this_drag = true;
                        commit = true;
                        Committed
                    } else {
                        Dragging
                    }
                }
                Up | Cancel => Releasing(ReleaseAnimation::SpringReturn(SpringReturn::new(
                    self.beads.resting_start_t,
                ))),
                Down => Dragging,
            },

            (Committed, GestureInput::Pointer(ev)) => match ev.kind {
                Up | Cancel => Releasing(ReleaseAnimation::FadeOut(FadeOut::new())),
                Down | Move => Committed,
            },

            (Releasing(ReleaseAnimation::FadeOut(mut fade)), GestureInput::Tick(dt)) => {
                if fade.advance(dt) {
                    self.active_t = self.beads.resting_start_t;
                    self.opacity = 1.0;
                    Idle
                } else {
                    self.opacity = fade.opacity();
                    Releasing(ReleaseAnimation::FadeOut(fade))
                }
            }

            (Releasing(ReleaseAnimation::SpringReturn(mut spring)), GestureInput::Tick(dt)) => {
                if spring.advance(&mut self.active_t, dt) {
                    Idle
                } else {
                    Releasing(ReleaseAnimation::SpringReturn(spring))
                }
            }

            (phase, _) => phase,
        };

        self.enter(next);
        commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const FRAME: Duration = Duration::from_millis(16);

    /// Sink that completes a round every `target` counts
    struct RoundSink {
        calls: usize,
        target: usize,
    }

    impl RoundSink {
        fn new(target: usize) -> Self {
            Self { calls: 0, target }
        }
    }

    impl CountSink for RoundSink {
        fn increment(&mut self) -> bool {
            self.calls += 1;
            self.calls % self.target == 0
        }
    }

    fn controller() -> GestureController {
        GestureController::new(Arc::new(Path::tasbeeh_string()), BeadConfig::default())
    }

    fn at(path: &Path, kind: PointerKind, t: f64) -> PointerEvent {
        PointerEvent::at(kind, path.point(t))
    }

    fn drive(c: &mut GestureController, sink: &mut RoundSink, events: &[PointerEvent]) -> Vec<CounterSignal> {
        events.iter().flat_map(|ev| c.handle(*ev, sink)).collect()
    }

    fn run_until_idle(c: &mut GestureController) -> usize {
        let mut frames = 0;
        while !c.is_idle() && frames < 1000 {
            c.tick(FRAME);
            frames += 1;
        }
        frames
    }

    #[test]
    fn test_initial_state() {
        let c = controller();
        assert_eq!(c.phase(), GesturePhase::Idle);
        assert_eq!(c.active_t(), 0.10);
        assert_eq!(c.opacity(), 1.0);
        assert!(!c.drag_state().is_dragging);
    }

    #[test]
    fn test_down_on_bead_starts_drag() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        let ev = at(&path, PointerKind::Down, 0.10);
        assert!(c.handle(ev, &mut sink).is_empty());
        assert_eq!(c.phase(), GesturePhase::Dragging);
        assert!(c.drag_state().is_dragging);
        assert!(!c.drag_state().has_counted_this_drag);
    }

    #[test]
    fn test_down_away_from_bead_is_ignored() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        let far = at(&path, PointerKind::Down, 0.5);
        c.handle(far, &mut sink);
        assert_eq!(c.phase(), GesturePhase::Idle);

        // A move without a captured bead does nothing either
        c.handle(at(&path, PointerKind::Move, 0.95), &mut sink);
        assert_eq!(c.phase(), GesturePhase::Idle);
        assert_eq!(sink.calls, 0);
    }

    #[test]
    fn test_capture_radius_boundary() {
        let mut c = controller();
        let mut sink = RoundSink::new(33);
        let p = c.active_point();
        let r = c.beads().capture_radius();
        c.handle(PointerEvent::down(p.x + r + 0.5, p.y), &mut sink);
        assert_eq!(c.phase(), GesturePhase::Idle);
        c.handle(PointerEvent::down(p.x + r - 0.5, p.y), &mut sink);
        assert_eq!(c.phase(), GesturePhase::Dragging);
    }

    #[test]
    fn test_move_follows_pointer() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[at(&path, PointerKind::Down, 0.10), at(&path, PointerKind::Move, 0.5)],
        );
        assert!((c.active_t() - 0.5).abs() < 1e-4);
        assert!((c.cell.snapshot().active_t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_backward_floor() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[at(&path, PointerKind::Down, 0.10), at(&path, PointerKind::Move, 0.0)],
        );
        assert_eq!(c.active_t(), c.beads().reset_position_t);
    }

    #[test]
    fn test_crossing_threshold_counts_once() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        let events = [
            at(&path, PointerKind::Down, 0.10),
            at(&path, PointerKind::Move, 0.50),
            at(&path, PointerKind::Move, 0.95),
            at(&path, PointerKind::Move, 0.05),
            at(&path, PointerKind::Move, 0.95),
            at(&path, PointerKind::Move, 0.05),
            at(&path, PointerKind::Move, 0.99),
            at(&path, PointerKind::Up, 0.99),
        ];
        let signals = drive(&mut c, &mut sink, &events);
        assert_eq!(signals, vec![CounterSignal::Count]);
        assert_eq!(sink.calls, 1);
    }

    #[test]
    fn test_commit_freezes_bead() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[at(&path, PointerKind::Down, 0.10), at(&path, PointerKind::Move, 0.95)],
        );
        assert_eq!(c.phase(), GesturePhase::Committed);
        let frozen = c.active_t();
        assert!((frozen - 0.95).abs() < 1e-4);

        c.handle(at(&path, PointerKind::Move, 0.3), &mut sink);
        assert_eq!(c.active_t(), frozen);
        assert!(!c.drag_state().is_dragging);
        assert!(c.drag_state().has_counted_this_drag);
    }

    #[test]
    fn test_exactly_at_threshold_commits() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        let signals = drive(
            &mut c,
            &mut sink,
            &[at(&path, PointerKind::Down, 0.10), at(&path, PointerKind::Move, 0.9)],
        );
        // closest_t may land a hair either side of 0.9; nudge if it fell short
        if signals.is_empty() {
            let more = c.handle(at(&path, PointerKind::Move, 0.9001), &mut sink);
            assert_eq!(more, vec![CounterSignal::Count]);
        } else {
            assert_eq!(signals, vec![CounterSignal::Count]);
        }
    }

    #[test]
    fn test_target_reached_signal() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(1);
        let signals = drive(
            &mut c,
            &mut sink,
            &[at(&path, PointerKind::Down, 0.10), at(&path, PointerKind::Move, 0.95)],
        );
        assert_eq!(signals, vec![CounterSignal::Count, CounterSignal::TargetReached]);
    }

    #[test]
    fn test_release_after_commit_fades() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[
                at(&path, PointerKind::Down, 0.10),
                at(&path, PointerKind::Move, 0.95),
                at(&path, PointerKind::Up, 0.95),
            ],
        );
        assert_matches!(c.phase(), GesturePhase::Releasing(ReleaseAnimation::FadeOut(_)));

        let frozen = c.active_t();
        c.tick(FRAME);
        assert!(c.opacity() < 1.0);
        // Fade does not slide the bead back
        assert_eq!(c.active_t(), frozen);

        run_until_idle(&mut c);
        assert!(c.is_idle());
        assert_eq!(c.active_t(), c.beads().resting_start_t);
        assert_eq!(c.opacity(), 1.0);
    }

    #[test]
    fn test_release_without_commit_springs_back() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[
                at(&path, PointerKind::Down, 0.10),
                at(&path, PointerKind::Move, 0.6),
                at(&path, PointerKind::Up, 0.6),
            ],
        );
        assert_matches!(c.phase(), GesturePhase::Releasing(ReleaseAnimation::SpringReturn(_)));

        let mut frames = 0;
        while !c.is_idle() && frames < 1000 {
            c.tick(FRAME);
            assert_eq!(c.opacity(), 1.0);
            frames += 1;
        }
        assert!(c.is_idle());
        assert_eq!(c.active_t(), c.beads().resting_start_t);
        assert_eq!(sink.calls, 0);
    }

    #[test]
    fn test_cancel_behaves_like_up() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[
                at(&path, PointerKind::Down, 0.10),
                at(&path, PointerKind::Move, 0.95),
                at(&path, PointerKind::Cancel, 0.95),
            ],
        );
        assert_matches!(c.phase(), GesturePhase::Releasing(ReleaseAnimation::FadeOut(_)));
        run_until_idle(&mut c);
        assert!(c.is_idle());

        drive(
            &mut c,
            &mut sink,
            &[
                at(&path, PointerKind::Down, 0.10),
                at(&path, PointerKind::Move, 0.4),
                at(&path, PointerKind::Cancel, 0.4),
            ],
        );
        assert_matches!(c.phase(), GesturePhase::Releasing(ReleaseAnimation::SpringReturn(_)));
        run_until_idle(&mut c);
        assert!(c.is_idle());
        assert_eq!(sink.calls, 1);
    }

    #[test]
    fn test_down_during_fade_is_ignored() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[
                at(&path, PointerKind::Down, 0.10),
                at(&path, PointerKind::Move, 0.95),
                at(&path, PointerKind::Up, 0.95),
            ],
        );
        let grab = PointerEvent::at(PointerKind::Down, c.active_point());
        c.handle(grab, &mut sink);
        assert_matches!(c.phase(), GesturePhase::Releasing(ReleaseAnimation::FadeOut(_)));
        c.handle(at(&path, PointerKind::Move, 0.97), &mut sink);
        assert_eq!(sink.calls, 1);
    }

    #[test]
    fn test_down_during_spring_recaptures() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        drive(
            &mut c,
            &mut sink,
            &[
                at(&path, PointerKind::Down, 0.10),
                at(&path, PointerKind::Move, 0.6),
                at(&path, PointerKind::Up, 0.6),
            ],
        );
        c.tick(FRAME);
        let grab = PointerEvent::at(PointerKind::Down, c.active_point());
        c.handle(grab, &mut sink);
        assert_eq!(c.phase(), GesturePhase::Dragging);

        let signals = c.handle(at(&path, PointerKind::Move, 0.95), &mut sink);
        assert_eq!(signals, vec![CounterSignal::Count]);
    }

    #[test]
    fn test_each_gesture_counts_once() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(3);
        let mut all = Vec::new();
        for _ in 0..3 {
            all.extend(drive(
                &mut c,
                &mut sink,
                &[
                    at(&path, PointerKind::Down, 0.10),
                    at(&path, PointerKind::Move, 0.95),
                    at(&path, PointerKind::Up, 0.95),
                ],
            ));
            run_until_idle(&mut c);
        }
        assert_eq!(
            all,
            vec![
                CounterSignal::Count,
                CounterSignal::Count,
                CounterSignal::Count,
                CounterSignal::TargetReached
            ]
        );
    }

    #[test]
    fn test_non_finite_events_dropped() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        c.handle(at(&path, PointerKind::Down, 0.10), &mut sink);
        c.handle(PointerEvent::moved(f64::NAN, 10.0), &mut sink);
        assert_eq!(c.phase(), GesturePhase::Dragging);
        c.handle(PointerEvent::up(f64::INFINITY, 0.0), &mut sink);
        assert_eq!(c.phase(), GesturePhase::Dragging);
        assert!((c.active_t() - 0.10).abs() < 1e-4);
    }

    #[test]
    fn test_up_while_idle_is_ignored() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        c.handle(at(&path, PointerKind::Up, 0.10), &mut sink);
        c.handle(at(&path, PointerKind::Cancel, 0.10), &mut sink);
        assert!(c.is_idle());
    }

    #[test]
    fn test_pull_counts_once() {
        let mut c = controller();
        let mut sink = RoundSink::new(33);
        assert_eq!(c.pull(&mut sink), vec![CounterSignal::Count]);
        // Second pull while the first is still fading settles it first
        assert_eq!(c.pull(&mut sink), vec![CounterSignal::Count]);
        assert_eq!(sink.calls, 2);
    }

    #[test]
    fn test_pull_ignored_while_dragging() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        c.handle(at(&path, PointerKind::Down, 0.10), &mut sink);
        assert!(c.pull(&mut sink).is_empty());
        assert_eq!(c.phase(), GesturePhase::Dragging);
    }

    #[test]
    fn test_drag_cell_readable_from_other_thread() {
        let mut c = controller();
        let path = c.path().clone();
        let mut sink = RoundSink::new(33);
        let cell = c.drag_cell();
        drive(
            &mut c,
            &mut sink,
            &[at(&path, PointerKind::Down, 0.10), at(&path, PointerKind::Move, 0.4)],
        );
        let snapshot = std::thread::spawn(move || cell.snapshot()).join().unwrap();
        assert!(snapshot.is_dragging);
        assert!((snapshot.active_t - 0.4).abs() < 1e-4);
        assert_eq!(snapshot.opacity, 1.0);
    }
}
