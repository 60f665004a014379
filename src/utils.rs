/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use anyhow::{anyhow, Result};

/// Piece placements of the standard starting position.
pub const PLACEMENTS_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

/// Starting time on each side of the clock, in minutes.
pub const DEFAULT_CLOCK_MINUTES: u64 = 10;

/// Starting time on each side of the clock.
pub const DEFAULT_CLOCK_TIME: Duration = Duration::from_secs(DEFAULT_CLOCK_MINUTES * 60);

/// How often the clock is ticked, in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 100;

/// Name of the statistics file kept alongside saved games.
pub const STATS_FILE_NAME: &str = "stats.json";

/// Converts a clock setting in minutes to a [`Duration`], failing if it is too large to represent.
pub fn minutes_to_duration(minutes: u64) -> Result<Duration> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("Clock time of {minutes} minutes is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_to_duration() {
        assert_eq!(minutes_to_duration(DEFAULT_CLOCK_MINUTES).unwrap(), DEFAULT_CLOCK_TIME);
        assert_eq!(minutes_to_duration(0).unwrap(), Duration::ZERO);
        assert!(minutes_to_duration(u64::MAX / 60).is_ok());
        assert!(minutes_to_duration(u64::MAX / 60 + 1).is_err());
    }
}
