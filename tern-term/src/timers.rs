//! Software timers driven by the event loop: text blink and key repeat
//!
//! Both expose `timeout` (how long the loop may sleep for them) and `poll`
//! (fire if due). Time is passed in so the loop controls the clock.

use std::time::{Duration, Instant};

/// Blink phase for text with the blink attribute
#[derive(Debug, Clone)]
pub struct Blink {
    period: Duration,
    /// Some cell on screen blinks
    active: bool,
    /// Blinking text is hidden in this phase
    phase: bool,
    last: Instant,
}

impl Blink {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            active: false,
            phase: false,
            last: now,
        }
    }

    /// Called after every read from the child; with nothing blinking the
    /// phase goes back to visible
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.phase = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> bool {
        self.phase
    }

    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        self.active
            .then(|| self.period.saturating_sub(now.saturating_duration_since(self.last)))
    }

    /// Toggle the phase if a period has passed; true when it toggled
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.active || now.saturating_duration_since(self.last) < self.period {
            return false;
        }
        self.phase = !self.phase;
        self.last = now;
        true
    }
}

#[derive(Debug, Clone)]
struct Held {
    bytes: Vec<u8>,
    key: u32,
    started: bool,
    last: Instant,
}

/// Auto-repeat of the one key being held
#[derive(Debug, Clone)]
pub struct KeyRepeat {
    delay: Duration,
    interval: Duration,
    held: Option<Held>,
}

impl KeyRepeat {
    pub fn new(delay: Duration, interval: Duration) -> Self {
        Self {
            delay,
            interval,
            held: None,
        }
    }

    pub fn set_timing(&mut self, delay: Duration, interval: Duration) {
        self.delay = delay;
        self.interval = interval;
    }

    /// A key was pressed and sent; it replaces any key already held
    pub fn press(&mut self, bytes: Vec<u8>, key: u32, now: Instant) {
        self.held = Some(Held {
            bytes,
            key,
            started: false,
            last: now,
        });
    }

    /// Release of the held key stops repeating, whatever the modifiers
    pub fn release(&mut self, key: u32) {
        if self.held.as_ref().is_some_and(|h| h.key == key) {
            self.held = None;
        }
    }

    pub fn cancel(&mut self) {
        self.held = None;
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    fn wait(&self, held: &Held) -> Duration {
        if held.started {
            self.interval
        } else {
            self.delay
        }
    }

    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        let held = self.held.as_ref()?;
        Some(self.wait(held).saturating_sub(now.saturating_duration_since(held.last)))
    }

    /// Bytes to send again if the next repeat is due
    pub fn poll(&mut self, now: Instant) -> Option<Vec<u8>> {
        let wait = self.wait(self.held.as_ref()?);
        let held = self.held.as_mut()?;
        if now.saturating_duration_since(held.last) < wait {
            return None;
        }
        held.started = true;
        held.last = now;
        Some(held.bytes.clone())
    }
}

/// The sooner of two optional deadlines
pub fn earliest(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
