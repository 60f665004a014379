/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, time::Duration};

use crate::{Color, DEFAULT_CLOCK_TIME};

/// A two-sided countdown chess clock.
///
/// Only the side passed to [`Clock::tick`] loses time, and only while the clock is running.
/// The clock starts itself on the first completed move of the game; before that, the starting time may be changed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Clock {
    /// Time each side is given when the clock is (re)set.
    initial: Duration,

    /// Time left for each side, indexed by [`Color`].
    remaining: [Duration; Color::COUNT],

    running: bool,
    started: bool,
}

impl Clock {
    /// Creates a stopped clock with `initial` time on both sides.
    #[inline(always)]
    pub const fn new(initial: Duration) -> Self {
        Self {
            initial,
            remaining: [initial; Color::COUNT],
            running: false,
            started: false,
        }
    }

    /// Creates a clock that continues a game already in progress.
    ///
    /// The clock counts as started, but is paused until [`Clock::resume`] is called.
    pub const fn restored(initial: Duration, white: Duration, black: Duration) -> Self {
        Self {
            initial,
            remaining: [white, black],
            running: false,
            started: true,
        }
    }

    /// The time each side receives when the clock is reset.
    #[inline(always)]
    pub const fn initial(&self) -> Duration {
        self.initial
    }

    /// Time left on `color`'s side of the clock.
    #[inline(always)]
    pub const fn remaining(&self, color: Color) -> Duration {
        self.remaining[color.index()]
    }

    #[inline(always)]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `true` once the first move of the game has been made.
    #[inline(always)]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Returns `true` if either side has run out of time.
    #[inline(always)]
    pub fn is_flagged(&self) -> bool {
        self.remaining.iter().any(Duration::is_zero)
    }

    /// Removes `elapsed` from `active`'s time, if the clock is running.
    ///
    /// Returns `Some(active)` on the tick that brings `active`'s time to zero. That tick also stops the clock,
    /// so expiry is only ever reported once.
    ///
    /// # Example
    /// ```
    /// # use dropchess::{Clock, Color};
    /// # use std::time::Duration;
    /// let mut clock = Clock::new(Duration::from_millis(150));
    /// clock.start();
    ///
    /// assert_eq!(clock.tick(Color::White, Duration::from_millis(100)), None);
    /// assert_eq!(clock.tick(Color::White, Duration::from_millis(100)), Some(Color::White));
    /// assert_eq!(clock.remaining(Color::White), Duration::ZERO);
    /// assert!(!clock.is_running());
    ///
    /// // Further ticks have no effect
    /// assert_eq!(clock.tick(Color::White, Duration::from_millis(100)), None);
    /// ```
    pub fn tick(&mut self, active: Color, elapsed: Duration) -> Option<Color> {
        if !self.running {
            return None;
        }

        let remaining = &mut self.remaining[active.index()];
        if remaining.is_zero() {
            return None;
        }

        *remaining = remaining.saturating_sub(elapsed);
        if remaining.is_zero() {
            self.running = false;
            return Some(active);
        }

        None
    }

    /// Marks the game as started and sets the clock running.
    pub fn start(&mut self) {
        self.started = true;
        self.running = !self.is_flagged();
    }

    /// Stops the clock without affecting either side's time.
    #[inline(always)]
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Sets a paused clock running again.
    ///
    /// Has no effect before the game has started, or once a side has run out of time.
    pub fn resume(&mut self) {
        if self.started && !self.is_flagged() {
            self.running = true;
        }
    }

    /// Returns both sides to the starting time and stops the clock, as though no move had been made.
    pub fn reset(&mut self) {
        *self = Self::new(self.initial);
    }

    /// Changes the starting time for both sides.
    ///
    /// Only allowed before the game has started. Returns `true` if the change was applied.
    pub fn configure(&mut self, initial: Duration) -> bool {
        if self.started {
            return false;
        }

        *self = Self::new(initial);
        true
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_TIME)
    }
}

/// Formats a duration as `mm:ss`, rounding partial seconds down.
pub fn format_clock_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match (self.started, self.running) {
            (false, _) => "waiting for White's first move",
            (true, true) => "running",
            (true, false) => "paused",
        };

        write!(
            f,
            "White {} | Black {} ({status})",
            format_clock_time(self.remaining(Color::White)),
            format_clock_time(self.remaining(Color::Black)),
        )
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("initial", &self.initial)
            .field("white", &self.remaining(Color::White))
            .field("black", &self.remaining(Color::Black))
            .field("running", &self.running)
            .field("started", &self.started)
            .finish()
    }
}
