//! Turns raw pointer streams into semantic gestures.
//!
//! The recognizer is an explicit state machine. Each call to
//! [`GestureRecognizer::handle`] or [`GestureRecognizer::tick`] is a
//! transition that returns the gestures it produced. Time only advances
//! through event timestamps and `tick`, so every sequence can be replayed
//! deterministically in tests.
//!
//! ```text
//! Idle ──down──▶ Single ──move > threshold──▶ drag
//!                  │  └──long-press timer──▶ long-press
//!                  │  └──up──▶ tap / double-tap
//!                  └──second down──▶ Two ──move──▶ pinch + two-finger pan
//!                                     └──timer, no move──▶ two-finger tap
//! ```
//!
//! Timers live in [`GestureState`] as cancellable handles. A timer that
//! fires after the state it was armed for has changed is ignored.

use crate::config::GestureTiming;
use crate::input::{Modifiers, PointerButton, PointerEvent, PointerId, PointerKind, PointerSample, WheelSample};
use crate::viewport::{PinchBaseline, Viewport};
use kurbo::{Point, Vec2};
use std::time::Duration;

/// A recognized gesture. Points are in container-relative screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// A single tap that was not followed by a second one in time.
    Tap {
        point: Point,
        kind: PointerKind,
        modifiers: Modifiers,
    },
    DoubleTap {
        point: Point,
        kind: PointerKind,
        modifiers: Modifiers,
    },
    /// A contact held still past the long-press delay.
    LongPress {
        point: Point,
        kind: PointerKind,
        modifiers: Modifiers,
    },
    /// Platform feedback (vibration) should be triggered.
    HapticFeedback,
    /// A secondary-button press.
    SecondaryPress { point: Point, modifiers: Modifiers },
    /// A single contact moved past the threshold.
    DragStart {
        origin: Point,
        kind: PointerKind,
        button: PointerButton,
        /// The contact was long-pressed before it started moving.
        after_long_press: bool,
        modifiers: Modifiers,
    },
    DragMove { point: Point, modifiers: Modifiers },
    /// The drag ended. `cancelled` drags left the canvas or were interrupted
    /// by a second contact; they end the same way.
    DragEnd {
        point: Point,
        cancelled: bool,
        modifiers: Modifiers,
    },
    /// Two contacts held still past the two-finger-tap delay.
    TwoFingerTap { center: Point, modifiers: Modifiers },
    /// One frame of a pinch combined with two-finger pan.
    Pinch {
        baseline: PinchBaseline,
        distance: f64,
        center: Point,
    },
    PinchEnd,
    Wheel {
        point: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}

/// Handle to a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    LongPress,
    SingleTap,
    TwoFingerTap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    handle: TimerHandle,
    kind: TimerKind,
    deadline: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Contact {
    id: PointerId,
    kind: PointerKind,
    button: PointerButton,
    start: Point,
    position: Point,
    modifiers: Modifiers,
}

impl Contact {
    fn from_sample(sample: &PointerSample) -> Self {
        Self {
            id: sample.id,
            kind: sample.kind,
            button: sample.button,
            start: sample.position,
            position: sample.position,
            modifiers: sample.modifiers,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SingleContact {
    contact: Contact,
    long_press: Option<TimerHandle>,
    /// Moved past the threshold; the contact is a drag.
    moved: bool,
    long_pressed: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct TwoContact {
    contacts: [Contact; 2],
    baseline: PinchBaseline,
    tap_timer: Option<TimerHandle>,
    moved: bool,
}

impl TwoContact {
    fn center(&self) -> Point {
        self.contacts[0].position.midpoint(self.contacts[1].position)
    }

    fn distance(&self) -> f64 {
        self.contacts[0].position.distance(self.contacts[1].position)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
enum Phase {
    #[default]
    Idle,
    Single(SingleContact),
    Two(TwoContact),
    /// The interaction is over but contacts are still down; everything is
    /// ignored until they all lift.
    Draining,
}

/// A released tap waiting to see whether a second tap follows.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTap {
    point: Point,
    released: Duration,
    kind: PointerKind,
    modifiers: Modifiers,
    timer: TimerHandle,
}

/// Per-session interaction state owned by the recognizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureState {
    phase: Phase,
    /// Every contact currently down, in press order.
    active: Vec<PointerId>,
    timers: Vec<Timer>,
    next_timer: u64,
    pending_tap: Option<PendingTap>,
}

impl GestureState {
    fn arm(&mut self, kind: TimerKind, deadline: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_timer);
        self.next_timer += 1;
        self.timers.push(Timer { handle, kind, deadline });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }

    /// Remove and return the earliest timer due at `now`.
    fn pop_due(&mut self, now: Duration) -> Option<Timer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.handle.0))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(index))
    }

    /// Whether a timer is still pending.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    /// Number of pending timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Number of contacts currently down.
    pub fn active_contacts(&self) -> usize {
        self.active.len()
    }

    /// True when no contact is down and nothing is pending.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle) && self.timers.is_empty()
    }
}

/// The gesture state machine.
#[derive(Debug, Clone, Default)]
pub struct GestureRecognizer {
    timing: GestureTiming,
    state: GestureState,
}

impl GestureRecognizer {
    pub fn new(timing: GestureTiming) -> Self {
        Self {
            timing,
            state: GestureState::default(),
        }
    }

    pub fn timing(&self) -> &GestureTiming {
        &self.timing
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Earliest pending timer deadline. The host should call
    /// [`tick`](Self::tick) no later than this.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.timers.iter().map(|t| t.deadline).min()
    }

    /// Fire every timer due at `now`.
    pub fn tick(&mut self, now: Duration) -> Vec<Gesture> {
        let mut out = Vec::new();
        self.fire_due(now, &mut out);
        out
    }

    /// Feed one event. Timers due at or before the event fire first.
    ///
    /// Positions must already be container-relative. `viewport` supplies
    /// the pinch baseline when a second contact lands.
    pub fn handle(&mut self, event: &PointerEvent, viewport: &Viewport) -> Vec<Gesture> {
        let mut out = Vec::new();
        self.fire_due(event.time(), &mut out);
        match event {
            PointerEvent::Down(sample) => self.on_down(sample, viewport, &mut out),
            PointerEvent::Move(sample) => self.on_move(sample, &mut out),
            PointerEvent::Up(sample) => self.on_release(sample, false, &mut out),
            PointerEvent::Cancel(sample) => self.on_release(sample, true, &mut out),
            PointerEvent::Wheel(wheel) => self.on_wheel(wheel, &mut out),
        }
        out
    }

    /// Abandon everything: cancel all timers and drop all contacts.
    ///
    /// An in-flight drag or pinch gets its end gesture so callers can clear
    /// their own state. A pending single tap is dropped.
    pub fn reset(&mut self) -> Vec<Gesture> {
        let mut out = Vec::new();
        match std::mem::take(&mut self.state.phase) {
            Phase::Single(single) if single.moved => out.push(Gesture::DragEnd {
                point: single.contact.position,
                cancelled: true,
                modifiers: single.contact.modifiers,
            }),
            Phase::Two(two) if two.moved => out.push(Gesture::PinchEnd),
            _ => {}
        }
        self.state.active.clear();
        self.state.timers.clear();
        self.state.pending_tap = None;
        out
    }

    fn fire_due(&mut self, now: Duration, out: &mut Vec<Gesture>) {
        while let Some(timer) = self.state.pop_due(now) {
            self.fire(timer, out);
        }
    }

    fn fire(&mut self, timer: Timer, out: &mut Vec<Gesture>) {
        match timer.kind {
            TimerKind::LongPress => {
                let contact = match &mut self.state.phase {
                    Phase::Single(single)
                        if single.long_press == Some(timer.handle) && !single.moved && !single.long_pressed =>
                    {
                        single.long_press = None;
                        single.long_pressed = true;
                        single.contact
                    }
                    _ => {
                        log::trace!("gesture: stale long-press timer {:?}", timer.handle);
                        return;
                    }
                };
                self.flush_pending_tap(out);
                log::debug!("gesture: long-press at {:?}", contact.start);
                out.push(Gesture::LongPress {
                    point: contact.start,
                    kind: contact.kind,
                    modifiers: contact.modifiers,
                });
                out.push(Gesture::HapticFeedback);
            }
            TimerKind::SingleTap => match self.state.pending_tap {
                Some(tap) if tap.timer == timer.handle => {
                    self.state.pending_tap = None;
                    out.push(Gesture::Tap {
                        point: tap.point,
                        kind: tap.kind,
                        modifiers: tap.modifiers,
                    });
                }
                _ => log::trace!("gesture: stale tap timer {:?}", timer.handle),
            },
            TimerKind::TwoFingerTap => match &mut self.state.phase {
                Phase::Two(two) if two.tap_timer == Some(timer.handle) && !two.moved => {
                    two.tap_timer = None;
                    out.push(Gesture::TwoFingerTap {
                        center: two.center(),
                        modifiers: two.contacts[1].modifiers,
                    });
                }
                _ => log::trace!("gesture: stale two-finger-tap timer {:?}", timer.handle),
            },
        }
    }

    /// Emit the pending single tap right away.
    fn flush_pending_tap(&mut self, out: &mut Vec<Gesture>) {
        if let Some(tap) = self.state.pending_tap.take() {
            self.state.cancel(tap.timer);
            out.push(Gesture::Tap {
                point: tap.point,
                kind: tap.kind,
                modifiers: tap.modifiers,
            });
        }
    }

    fn on_down(&mut self, sample: &PointerSample, viewport: &Viewport, out: &mut Vec<Gesture>) {
        if self.state.active.contains(&sample.id) {
            log::warn!("gesture: duplicate down for pointer {:?}", sample.id);
            return;
        }
        self.state.active.push(sample.id);

        self.state.phase = match std::mem::take(&mut self.state.phase) {
            Phase::Idle => {
                let far_from_pending = self
                    .state
                    .pending_tap
                    .is_some_and(|tap| tap.point.distance(sample.position) > self.timing.move_threshold);
                if far_from_pending {
                    self.flush_pending_tap(out);
                }
                self.begin_single(sample, out)
            }
            Phase::Single(single) => self.begin_two(single, sample, viewport, out),
            // A third contact, or a new one while the rest drain, is ignored.
            phase => phase,
        };
    }

    fn begin_single(&mut self, sample: &PointerSample, out: &mut Vec<Gesture>) -> Phase {
        match sample.button {
            PointerButton::Secondary => {
                self.flush_pending_tap(out);
                out.push(Gesture::SecondaryPress {
                    point: sample.position,
                    modifiers: sample.modifiers,
                });
                Phase::Draining
            }
            PointerButton::Primary | PointerButton::Middle => {
                // Mice get context menus from the secondary button instead.
                let long_press = (sample.kind != PointerKind::Mouse && sample.button == PointerButton::Primary)
                    .then(|| self.state.arm(TimerKind::LongPress, sample.time + self.timing.long_press));
                Phase::Single(SingleContact {
                    contact: Contact::from_sample(sample),
                    long_press,
                    moved: false,
                    long_pressed: false,
                })
            }
        }
    }

    fn begin_two(
        &mut self,
        single: SingleContact,
        sample: &PointerSample,
        viewport: &Viewport,
        out: &mut Vec<Gesture>,
    ) -> Phase {
        if let Some(timer) = single.long_press {
            self.state.cancel(timer);
        }
        if single.moved {
            out.push(Gesture::DragEnd {
                point: single.contact.position,
                cancelled: true,
                modifiers: single.contact.modifiers,
            });
        }
        self.flush_pending_tap(out);

        let second = Contact::from_sample(sample);
        let baseline = viewport.pinch_baseline(single.contact.position, second.position);
        let tap_timer = self.state.arm(TimerKind::TwoFingerTap, sample.time + self.timing.two_finger_tap);
        log::debug!("gesture: two contacts, distance {:.1}", baseline.initial_distance);
        Phase::Two(TwoContact {
            contacts: [single.contact, second],
            baseline,
            tap_timer: Some(tap_timer),
            moved: false,
        })
    }

    fn on_move(&mut self, sample: &PointerSample, out: &mut Vec<Gesture>) {
        let threshold = self.timing.move_threshold;
        let mut cancel = None;
        let mut flush = false;

        match &mut self.state.phase {
            Phase::Single(single) if single.contact.id == sample.id => {
                let contact = &mut single.contact;
                contact.position = sample.position;
                contact.modifiers = sample.modifiers;
                if single.moved {
                    out.push(Gesture::DragMove {
                        point: sample.position,
                        modifiers: sample.modifiers,
                    });
                } else if contact.start.distance(sample.position) > threshold {
                    single.moved = true;
                    cancel = single.long_press.take();
                    flush = true;
                }
            }
            Phase::Two(two) => {
                let Some(contact) = two.contacts.iter_mut().find(|c| c.id == sample.id) else {
                    return;
                };
                contact.position = sample.position;
                contact.modifiers = sample.modifiers;
                if !two.moved && two.contacts.iter().any(|c| c.start.distance(c.position) > threshold) {
                    two.moved = true;
                    cancel = two.tap_timer.take();
                }
                if two.moved {
                    out.push(Gesture::Pinch {
                        baseline: two.baseline,
                        distance: two.distance(),
                        center: two.center(),
                    });
                }
            }
            _ => {}
        }

        if let Some(timer) = cancel {
            self.state.cancel(timer);
        }
        if flush {
            self.flush_pending_tap(out);
            if let Phase::Single(single) = &self.state.phase {
                let contact = single.contact;
                out.push(Gesture::DragStart {
                    origin: contact.start,
                    kind: contact.kind,
                    button: contact.button,
                    after_long_press: single.long_pressed,
                    modifiers: contact.modifiers,
                });
                out.push(Gesture::DragMove {
                    point: contact.position,
                    modifiers: contact.modifiers,
                });
            }
        }
    }

    fn on_release(&mut self, sample: &PointerSample, cancelled: bool, out: &mut Vec<Gesture>) {
        let Some(index) = self.state.active.iter().position(|id| *id == sample.id) else {
            return;
        };
        self.state.active.remove(index);
        let all_lifted = self.state.active.is_empty();

        self.state.phase = match std::mem::take(&mut self.state.phase) {
            Phase::Single(single) if single.contact.id == sample.id => {
                if let Some(timer) = single.long_press {
                    self.state.cancel(timer);
                }
                if single.moved {
                    out.push(Gesture::DragEnd {
                        point: sample.position,
                        cancelled,
                        modifiers: sample.modifiers,
                    });
                } else if !cancelled && !single.long_pressed && single.contact.button == PointerButton::Primary {
                    self.classify_tap(sample, out);
                }
                if all_lifted { Phase::Idle } else { Phase::Draining }
            }
            Phase::Two(two) if two.contacts.iter().any(|c| c.id == sample.id) => {
                if let Some(timer) = two.tap_timer {
                    self.state.cancel(timer);
                }
                if two.moved {
                    out.push(Gesture::PinchEnd);
                }
                if all_lifted { Phase::Idle } else { Phase::Draining }
            }
            Phase::Draining if all_lifted => Phase::Idle,
            phase => phase,
        };
    }

    /// Decide between double-tap and a delayed single tap.
    fn classify_tap(&mut self, sample: &PointerSample, out: &mut Vec<Gesture>) {
        if let Some(previous) = self.state.pending_tap {
            let within_time = sample.time.saturating_sub(previous.released) <= self.timing.double_tap;
            let within_distance = previous.point.distance(sample.position) <= self.timing.move_threshold;
            if within_time && within_distance {
                self.state.pending_tap = None;
                self.state.cancel(previous.timer);
                log::debug!("gesture: double-tap at {:?}", sample.position);
                out.push(Gesture::DoubleTap {
                    point: sample.position,
                    kind: sample.kind,
                    modifiers: sample.modifiers,
                });
                return;
            }
            self.flush_pending_tap(out);
        }

        let timer = self.state.arm(TimerKind::SingleTap, sample.time + self.timing.double_tap);
        self.state.pending_tap = Some(PendingTap {
            point: sample.position,
            released: sample.time,
            kind: sample.kind,
            modifiers: sample.modifiers,
            timer,
        });
    }

    fn on_wheel(&mut self, wheel: &WheelSample, out: &mut Vec<Gesture>) {
        out.push(Gesture::Wheel {
            point: wheel.position,
            delta: wheel.delta,
            modifiers: wheel.modifiers,
        });
    }
}
