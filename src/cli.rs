/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{cmp::max, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::{
    Clock, Color, GameId, KingRuleset, MateDetection, PieceKind, RuleConfig, Square,
    minutes_to_duration, DEFAULT_CLOCK_MINUTES, DEFAULT_TICK_MS,
};

/// Startup options for the `dropchess` binary.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Starting time on each side of the clock, in minutes.
    #[arg(short, long, default_value_t = DEFAULT_CLOCK_MINUTES)]
    pub minutes: u64,

    /// How the King moves: `simple` (one square) or `extended` (up to two squares, with castling).
    #[arg(short, long, default_value_t = KingRuleset::Simple)]
    pub king_rules: KingRuleset,

    /// Detect check, checkmate, and stalemate after every move and drop.
    ///
    /// Off by default, in which case games only end by timeout or agreement.
    #[arg(long, default_value = "false")]
    pub mate_detection: bool,

    /// Directory to save games and statistics in. Games are kept in memory if not set.
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Sign in as this user on startup.
    #[arg(short, long)]
    pub user: Option<String>,

    /// The color the signed-in user plays, used when recording wins and losses.
    #[arg(short, long, default_value_t = Color::White)]
    pub play_as: Color,

    /// Milliseconds between clock ticks.
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,

    /// Minimum level of log messages written to stderr.
    #[arg(long, default_value_t = LevelFilter::Warn)]
    pub log_level: LevelFilter,

    /// Enable debug logging, including timestamps and source locations.
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Cli {
    /// The rule configuration selected by these options.
    pub fn rules(&self) -> RuleConfig {
        RuleConfig {
            king_rules: self.king_rules,
            mate_detection: if self.mate_detection {
                MateDetection::Enabled
            } else {
                MateDetection::Disabled
            },
        }
    }

    /// A fresh clock with the configured starting time.
    pub fn clock(&self) -> Result<Clock> {
        Ok(Clock::new(minutes_to_duration(self.minutes)?))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// The effective log level; `--debug` raises it to at least `debug`.
    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            max(LevelFilter::Debug, self.log_level)
        } else {
            self.log_level
        }
    }
}

/// A command typed into the interactive shell.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<COMMAND> [ARGS]")
)]
pub enum EngineCommand {
    /// Click on a square: select a piece, move the selected piece, or place an armed drop.
    #[command(aliases = ["s", "click"])]
    Select { square: Square },

    /// Move a piece directly from one square to another.
    #[command(aliases = ["m", "mv"])]
    Move { from: Square, to: Square },

    /// Arm a self-captured piece for dropping, and optionally place it right away.
    Drop {
        /// The kind of piece to drop, such as `n` or `knight`.
        piece: PieceKind,

        /// The empty square to drop onto.
        square: Option<Square>,
    },

    /// Cancel an armed drop.
    Cancel,

    /// Show every square the piece on `square` can move to.
    Moves { square: Square },

    /// Print the board, the side to move, and the clock.
    #[command(alias = "d")]
    Display,

    /// Print captured and self-captured pieces for both sides.
    #[command(alias = "r")]
    Reserves,

    /// Print the time left on both sides of the clock.
    #[command(alias = "c")]
    Clock,

    /// Pause the clock.
    Pause,

    /// Resume a paused clock.
    Resume,

    /// Put both sides back to the starting time and wait for White's first move.
    #[command(name = "reset-clock")]
    ResetClock,

    /// Change the starting time, in minutes. Only possible before the first move.
    Time { minutes: u64 },

    /// Abandon the current game and start a new one.
    New,

    /// End the game as a draw by agreement.
    Draw,

    /// Sign in, which is required for saving and loading.
    Login { user: String },

    /// Sign out.
    Logout,

    /// Save the current game. Saves over the previous save of this game, if there is one.
    Save {
        /// Always create a new save instead of updating the last one.
        #[arg(short, long, default_value = "false")]
        new: bool,
    },

    /// Load a saved game by id. The clock is paused after loading.
    Load { id: GameId },

    /// List your saved games, most recent first.
    #[command(alias = "list")]
    Games,

    /// Delete a saved game by id.
    Delete { id: GameId },

    /// Show your win/loss/draw totals.
    Stats,

    /// Print the current game as a JSON record.
    Record,

    /// Quit.
    #[command(aliases = ["quit", "q"])]
    Exit,

    /// Advance the clock. Sent internally; never parsed from input.
    #[command(skip)]
    Tick { elapsed: Duration },
}

impl FromStr for EngineCommand {
    type Err = clap::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse_from(s.split_ascii_whitespace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let e2 = Square::new(6, 4).unwrap();
        let e4 = Square::new(4, 4).unwrap();

        assert_eq!(
            "move e2 e4".parse::<EngineCommand>().unwrap(),
            EngineCommand::Move { from: e2, to: e4 }
        );
        assert_eq!(
            "s 6,4".parse::<EngineCommand>().unwrap(),
            EngineCommand::Select { square: e2 }
        );
        assert_eq!(
            "drop knight".parse::<EngineCommand>().unwrap(),
            EngineCommand::Drop {
                piece: PieceKind::Knight,
                square: None
            }
        );
        assert_eq!(
            "reset-clock".parse::<EngineCommand>().unwrap(),
            EngineCommand::ResetClock
        );
        assert_eq!(
            "save --new".parse::<EngineCommand>().unwrap(),
            EngineCommand::Save { new: true }
        );
    }

    #[test]
    fn test_reject_bad_commands() {
        assert!("move e2".parse::<EngineCommand>().is_err());
        assert!("select z9".parse::<EngineCommand>().is_err());
        assert!("tick".parse::<EngineCommand>().is_err());
        assert!("fly".parse::<EngineCommand>().is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["dropchess"]).unwrap();
        assert_eq!(cli.rules(), RuleConfig::default());
        assert_eq!(cli.clock().unwrap(), Clock::default());
        assert_eq!(cli.log_level(), LevelFilter::Warn);
        assert_eq!(cli.play_as, Color::White);

        let cli = Cli::try_parse_from([
            "dropchess",
            "--king-rules",
            "extended",
            "--mate-detection",
            "--minutes",
            "5",
            "--play-as",
            "black",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.rules().king_rules, KingRuleset::ExtendedWithCastling);
        assert_eq!(cli.rules().mate_detection, MateDetection::Enabled);
        assert_eq!(cli.clock().unwrap().remaining(Color::White), Duration::from_secs(300));

        let minutes = (u64::MAX / 60 + 1).to_string();
        let cli = Cli::try_parse_from(["dropchess", "--minutes", &minutes]).unwrap();
        assert!(cli.clock().is_err());
        assert_eq!(cli.play_as, Color::Black);
        assert_eq!(cli.log_level(), LevelFilter::Debug);
    }
}
