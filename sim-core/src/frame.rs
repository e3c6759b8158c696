//! Frame scheduling and wall-clock time.
//!
//! The engine never loops on its own. At the end of a tick it asks a
//! [`TickScheduler`] for the next one and the host calls
//! [`crate::engine::Engine::tick`] when that frame comes due. Interaction
//! sessions measure elapsed time through a [`Clock`], so their duration is
//! independent of the frame rate.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Instant,
};

/// Handle for a requested, not yet delivered tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Request-next-frame / cancel-pending-frame capability.
pub trait TickScheduler {
    fn request_tick(&mut self) -> TickHandle;
    fn cancel_tick(&mut self, handle: TickHandle);
}

/// Seconds elapsed since some fixed origin.
pub trait Clock {
    fn now(&self) -> f64;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A hand-advanced clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    pending: Option<TickHandle>,
    requested: u64,
    cancelled: u64,
}

/// A [`TickScheduler`] whose pending tick is polled by the host.
///
/// Clones share the same queue: hand one to the engine and keep one to ask
/// [`TickQueue::take_due`] once per host frame.
#[derive(Clone, Debug, Default)]
pub struct TickQueue {
    state: Rc<RefCell<QueueState>>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the pending tick, returning whether there was one.
    pub fn take_due(&self) -> bool {
        self.state.borrow_mut().pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    /// Total number of ticks ever requested.
    pub fn requested(&self) -> u64 {
        self.state.borrow().requested
    }

    /// Total number of cancellations that hit a pending tick.
    pub fn cancelled(&self) -> u64 {
        self.state.borrow().cancelled
    }
}

impl TickScheduler for TickQueue {
    fn request_tick(&mut self) -> TickHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.requested += 1;
        let handle = TickHandle(state.next_id);
        state.pending = Some(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        let mut state = self.state.borrow_mut();
        if state.pending == Some(handle) {
            state.pending = None;
            state.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_keeps_a_single_pending_tick() {
        let host = TickQueue::new();
        let mut engine_side = host.clone();

        let first = engine_side.request_tick();
        let second = engine_side.request_tick();
        assert_ne!(first, second);
        assert_eq!(host.requested(), 2);

        assert!(host.take_due());
        assert!(!host.take_due());
    }

    #[test]
    fn cancel_only_hits_the_matching_handle() {
        let host = TickQueue::new();
        let mut engine_side = host.clone();

        let stale = engine_side.request_tick();
        let live = engine_side.request_tick();

        engine_side.cancel_tick(stale);
        assert!(host.is_pending());
        assert_eq!(host.cancelled(), 0);

        engine_side.cancel_tick(live);
        assert!(!host.is_pending());
        assert_eq!(host.cancelled(), 1);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let view = clock.clone();
        clock.set(1.5);
        clock.advance(0.25);
        assert_eq!(view.now(), 1.75);
    }
}
