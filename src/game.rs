/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr, time::Duration};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{
    apply_move, detect_terminal, end_turn, is_in_check, is_legal, legal_destinations, place_drop,
    Board, Clock, Color, DropState, KingRuleset, MateDetection, Piece, PieceKind, Reserves,
    RuleConfig, Square, TerminalFlags,
};

/// The coarse status of a game.
///
/// [`GameState::Playing`] and [`GameState::Check`] are in progress; every other state is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    #[default]
    Playing,
    Check,
    Checkmate,
    Stalemate,
    Draw,
    Timeout,
}

impl GameState {
    /// Returns `true` if no further moves, drops, or clock ticks are accepted in this state.
    #[inline(always)]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Checkmate | Self::Stalemate | Self::Draw | Self::Timeout
        )
    }

    #[inline(always)]
    pub const fn is_in_progress(&self) -> bool {
        !self.is_terminal()
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Check => "check",
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::Draw => "draw",
            Self::Timeout => "timeout",
        }
    }
}

impl FromStr for GameState {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "playing" => Ok(Self::Playing),
            "check" => Ok(Self::Check),
            "checkmate" => Ok(Self::Checkmate),
            "stalemate" => Ok(Self::Stalemate),
            "draw" => Ok(Self::Draw),
            "timeout" => Ok(Self::Timeout),
            _ => bail!("Invalid game state {s:?}"),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// A single input to the game, processed to completion by [`Game::apply_event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A click on a square: selects, moves, reselects, deselects, or places an armed drop.
    Select(Square),

    /// Moves the piece on `from` to `to` in one step, bypassing selection.
    ///
    /// Ignored while a drop is armed.
    Move { from: Square, to: Square },

    /// Stages one of the side to move's self-captured pieces for dropping.
    ArmDrop(PieceKind),

    /// Abandons a staged drop.
    CancelDrop,

    /// Time has passed on the clock.
    Tick(Duration),

    PauseClock,
    ResumeClock,
    ResetClock,

    /// Changes both sides' starting time. Only accepted before the clock has started.
    SetClock(Duration),

    /// Both players agree to a draw.
    AgreeDraw,

    /// Discards the current game and starts over with the same rules and starting time.
    NewGame,
}

/// Something observable that happened while processing an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Selected(Square),
    Deselected,

    Moved {
        from: Square,
        to: Square,
        piece: Piece,
        captured: Option<Piece>,
        self_captured: bool,
        castled_rook: Option<(Square, Square)>,
    },

    DropArmed(PieceKind),
    DropCancelled,
    Dropped {
        piece: Piece,
        to: Square,
    },

    /// The given side is in check after the last move or drop.
    Check(Color),

    ClockStarted,
    ClockPaused,
    ClockResumed,
    ClockReset,
    ClockSet(Duration),

    /// The given side ran out of time.
    TimeExpired(Color),

    /// The game entered a terminal state. `winner` is `None` for stalemates and draws.
    GameOver {
        state: GameState,
        winner: Option<Color>,
    },

    NewGame,
}

/// A complete snapshot of a game in progress.
///
/// Snapshots are never mutated by event processing; [`Game::apply_event`] returns a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    reserves: Reserves,
    side_to_move: Color,
    state: GameState,
    clock: Clock,

    /// Square of the piece the side to move has picked up, if any.
    selected: Option<Square>,

    drop: DropState,
    rules: RuleConfig,
}

impl Game {
    /// Starts a new game from the standard position.
    pub fn new(rules: RuleConfig, clock: Clock) -> Self {
        Self {
            board: Board::startpos(),
            reserves: Reserves::new(),
            side_to_move: Color::White,
            state: GameState::Playing,
            clock,
            selected: None,
            drop: DropState::Idle,
            rules,
        }
    }

    /// Starts a game from an arbitrary placement string, with empty reserves and a fresh clock.
    ///
    /// # Example
    /// ```
    /// # use dropchess::*;
    /// let game = Game::from_placements("8/8/8/8/8/8/4P3/8", Color::White, RuleConfig::default()).unwrap();
    /// let from = Square::new(6, 4).unwrap();
    /// let (game, _) = game.apply_event(Event::Move { from, to: Square::new(5, 5).unwrap() });
    /// assert_eq!(game.side_to_move(), Color::Black);
    /// assert!(game.clock().is_started());
    /// ```
    pub fn from_placements(placements: &str, side_to_move: Color, rules: RuleConfig) -> Result<Self> {
        Ok(Self {
            board: Board::from_placements(placements)?,
            side_to_move,
            ..Self::new(rules, Clock::default())
        })
    }

    /// Assembles a game from previously saved parts. Selection and drop state start idle.
    pub(crate) fn from_parts(
        board: Board,
        reserves: Reserves,
        side_to_move: Color,
        state: GameState,
        clock: Clock,
        rules: RuleConfig,
    ) -> Self {
        Self {
            board,
            reserves,
            side_to_move,
            state,
            clock,
            selected: None,
            drop: DropState::Idle,
            rules,
        }
    }

    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[inline(always)]
    pub const fn reserves(&self) -> &Reserves {
        &self.reserves
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn state(&self) -> GameState {
        self.state
    }

    #[inline(always)]
    pub const fn clock(&self) -> &Clock {
        &self.clock
    }

    #[inline(always)]
    pub const fn selected(&self) -> Option<Square> {
        self.selected
    }

    #[inline(always)]
    pub const fn drop_state(&self) -> DropState {
        self.drop
    }

    #[inline(always)]
    pub const fn rules(&self) -> RuleConfig {
        self.rules
    }

    /// The side that won, if the game ended decisively.
    ///
    /// A checkmating move does not pass the turn, so the side to move is the winner. On a timeout,
    /// the side to move is the one whose time ran out.
    pub const fn winner(&self) -> Option<Color> {
        match self.state {
            GameState::Checkmate => Some(self.side_to_move),
            GameState::Timeout => Some(self.side_to_move.opponent()),
            _ => None,
        }
    }

    /// Every square the piece on `from` could move to right now.
    ///
    /// Empty if the game is over or `from` does not hold a piece of the side to move.
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        legal_destinations(&self.board, from, self.side_to_move, self.rules.king_rules)
    }

    /// Processes a single [`Event`], returning the resulting snapshot and everything that happened.
    ///
    /// Rejected actions leave the board, reserves, turn, and clock untouched. Once the game has reached a
    /// terminal state, every event other than [`Event::NewGame`] is ignored.
    pub fn apply_event(&self, event: Event) -> (Self, Vec<Effect>) {
        let mut next = self.clone();
        let mut effects = Vec::new();

        if self.state.is_terminal() && event != Event::NewGame {
            return (next, effects);
        }

        match event {
            Event::Select(square) => next.select(square, &mut effects),

            Event::Move { from, to } => {
                if !next.drop.is_armed() && !next.play_move(from, to, &mut effects) {
                    next.deselect(&mut effects);
                }
            }

            Event::ArmDrop(kind) => {
                let armed = next
                    .drop
                    .arm(kind, &next.reserves, next.side_to_move, next.state.is_in_progress());

                if armed == DropState::Armed(kind) {
                    next.drop = armed;
                    next.deselect(&mut effects);
                    effects.push(Effect::DropArmed(kind));
                }
            }

            Event::CancelDrop => {
                if next.drop.is_armed() {
                    next.drop = next.drop.cancel();
                    effects.push(Effect::DropCancelled);
                }
            }

            Event::Tick(elapsed) => {
                if let Some(flagged) = next.clock.tick(next.side_to_move, elapsed) {
                    effects.push(Effect::TimeExpired(flagged));
                    next.finish(GameState::Timeout, &mut effects);
                }
            }

            Event::PauseClock => {
                if next.clock.is_running() {
                    next.clock.pause();
                    effects.push(Effect::ClockPaused);
                }
            }

            Event::ResumeClock => {
                if !next.clock.is_running() {
                    next.clock.resume();
                    if next.clock.is_running() {
                        effects.push(Effect::ClockResumed);
                    }
                }
            }

            Event::ResetClock => {
                next.clock.reset();
                effects.push(Effect::ClockReset);
            }

            Event::SetClock(initial) => {
                if next.clock.configure(initial) {
                    effects.push(Effect::ClockSet(initial));
                }
            }

            Event::AgreeDraw => next.finish(GameState::Draw, &mut effects),

            Event::NewGame => {
                next = Self::new(self.rules, Clock::new(self.clock.initial()));
                effects.push(Effect::NewGame);
            }
        }

        (next, effects)
    }

    /// Handles a click on `square`.
    fn select(&mut self, square: Square, effects: &mut Vec<Effect>) {
        if let Some(kind) = self.drop.armed() {
            self.drop_piece(kind, square, effects);
            return;
        }

        let owns_square = self.board.color_at(square) == Some(self.side_to_move);

        let Some(from) = self.selected else {
            if owns_square {
                self.selected = Some(square);
                effects.push(Effect::Selected(square));
            }
            return;
        };

        if self.play_move(from, square, effects) {
            return;
        }

        if owns_square {
            self.selected = Some(square);
            effects.push(Effect::Selected(square));
        } else {
            self.deselect(effects);
        }
    }

    fn deselect(&mut self, effects: &mut Vec<Effect>) {
        if self.selected.take().is_some() {
            effects.push(Effect::Deselected);
        }
    }

    /// Attempts to move the side to move's piece from `from` to `to`. Returns `false` if the move is illegal.
    fn play_move(&mut self, from: Square, to: Square, effects: &mut Vec<Effect>) -> bool {
        let mover = self.side_to_move;
        let Some(piece) = self.board.piece_at(from) else {
            return false;
        };

        if !is_legal(&self.board, from, to, mover, piece, self.rules.king_rules) {
            return false;
        }

        let Some(outcome) = apply_move(&self.board, from, to, &self.reserves, mover, self.rules) else {
            return false;
        };

        self.board = outcome.board;
        self.reserves = outcome.reserves;
        self.selected = None;

        effects.push(Effect::Moved {
            from,
            to,
            piece: outcome.moved,
            captured: outcome.captured,
            self_captured: outcome.self_captured,
            castled_rook: outcome.castled_rook,
        });

        if mover.is_white() && !self.clock.is_started() {
            self.clock.start();
            effects.push(Effect::ClockStarted);
        }

        self.advance_turn(outcome.terminal, effects);
        true
    }

    /// Drops the first self-captured `kind` onto `to`. Occupied squares leave the drop armed.
    fn drop_piece(&mut self, kind: PieceKind, to: Square, effects: &mut Vec<Effect>) {
        let mover = self.side_to_move;
        let Some(outcome) = place_drop(&self.board, &self.reserves, mover, kind, to) else {
            return;
        };

        self.board = outcome.board;
        self.reserves = outcome.reserves;
        self.drop = self.drop.cancel();
        effects.push(Effect::Dropped {
            piece: outcome.piece,
            to,
        });

        if self.rules.king_rules == KingRuleset::ExtendedWithCastling {
            end_turn(&mut self.board, mover);
        }

        let terminal = detect_terminal(&self.board, &self.reserves, mover, self.rules);
        self.advance_turn(terminal, effects);
    }

    /// Passes the turn after a completed move or drop, unless it ended the game.
    fn advance_turn(&mut self, terminal: TerminalFlags, effects: &mut Vec<Effect>) {
        if terminal.checkmate {
            self.finish(GameState::Checkmate, effects);
            return;
        }
        if terminal.stalemate {
            self.finish(GameState::Stalemate, effects);
            return;
        }

        self.side_to_move = self.side_to_move.opponent();
        self.state = GameState::Playing;

        if self.rules.mate_detection == MateDetection::Enabled
            && is_in_check(&self.board, self.side_to_move, self.rules.king_rules)
        {
            self.state = GameState::Check;
            effects.push(Effect::Check(self.side_to_move));
        }
    }

    /// Enters the terminal `state` and stops the clock.
    fn finish(&mut self, state: GameState, effects: &mut Vec<Effect>) {
        self.state = state;
        self.clock.pause();
        self.selected = None;
        self.drop = self.drop.cancel();

        effects.push(Effect::GameOver {
            state,
            winner: self.winner(),
        });
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(RuleConfig::default(), Clock::default())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        writeln!(f)?;
        writeln!(f, "To move: {}", self.side_to_move)?;
        writeln!(f, "State  : {}", self.state)?;
        writeln!(f, "Clock  : {}", self.clock)?;
        if let Some(square) = self.selected {
            writeln!(f, "Selected: {square}")?;
        }
        if self.drop.is_armed() {
            writeln!(f, "Drop   : {}", self.drop)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("board", &self.board)
            .field("reserves", &self.reserves)
            .field("side_to_move", &self.side_to_move)
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("selected", &self.selected)
            .field("drop", &self.drop)
            .field("rules", &self.rules)
            .finish()
    }
}
