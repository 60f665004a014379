/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{Board, Clock, Color, Game, GameState, Piece, PieceKind, Reserves, RuleConfig, Square};

/// A single piece as it is stored in a [`GameRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceRecord {
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub owner: Color,
    pub has_moved: bool,
}

impl From<Piece> for PieceRecord {
    fn from(piece: Piece) -> Self {
        Self {
            kind: piece.kind(),
            owner: piece.color(),
            has_moved: piece.has_moved(),
        }
    }
}

impl From<PieceRecord> for Piece {
    fn from(record: PieceRecord) -> Self {
        Piece::new(record.owner, record.kind).with_moved(record.has_moved)
    }
}

/// The four reserve lists of a [`GameRecord`].
///
/// `white` and `black` hold the enemy pieces captured *by* that side; `white_self` and `black_self`
/// hold that side's own self-captured pieces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedPiecesRecord {
    pub white: Vec<PieceRecord>,
    pub black: Vec<PieceRecord>,
    pub white_self: Vec<PieceRecord>,
    pub black_self: Vec<PieceRecord>,
}

/// A serializable snapshot of a game, suitable for saving and loading.
///
/// Selection, armed drops, and the rule configuration are not part of a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Row-major 8x8 grid, starting with Black's back rank.
    pub board: Vec<Vec<Option<PieceRecord>>>,
    pub current_player: Color,
    pub captured_pieces: CapturedPiecesRecord,
    pub white_time_left_ms: u64,
    pub black_time_left_ms: u64,
    pub game_state: GameState,
}

impl GameRecord {
    /// Encodes this record as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode game record")
    }

    /// Decodes a record from JSON. The result has not yet been validated; see [`Game::from_record`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to decode game record")
    }
}

impl Game {
    /// Captures everything about this game that is persisted.
    pub fn to_record(&self) -> GameRecord {
        let board = (0..Square::SIZE)
            .map(|row| {
                (0..Square::SIZE)
                    .map(|col| {
                        self.board()
                            .piece_at(Square::new_unchecked(row, col))
                            .map(PieceRecord::from)
                    })
                    .collect()
            })
            .collect();

        let list = |pieces: &[Piece]| pieces.iter().copied().map(PieceRecord::from).collect();
        let reserves = self.reserves();

        GameRecord {
            board,
            current_player: self.side_to_move(),
            captured_pieces: CapturedPiecesRecord {
                white: list(reserves.captured_by(Color::White)),
                black: list(reserves.captured_by(Color::Black)),
                white_self: list(reserves.self_captured(Color::White)),
                black_self: list(reserves.self_captured(Color::Black)),
            },
            white_time_left_ms: millis(self.clock().remaining(Color::White)),
            black_time_left_ms: millis(self.clock().remaining(Color::Black)),
            game_state: self.state(),
        }
    }

    /// Rebuilds a game from a saved record.
    ///
    /// The restored clock counts as started but is paused. `initial` is the time the clock returns to on reset.
    ///
    /// Fails without side effects if the record is malformed: a board that is not 8x8, a reserve piece
    /// stored in the wrong side's list, a King among self-captured pieces, or an expired clock on a game that is still in progress.
    pub fn from_record(record: &GameRecord, rules: RuleConfig, initial: Duration) -> Result<Self> {
        if record.board.len() != Square::SIZE as usize {
            bail!(
                "Game record must have 8 rows. Got {}",
                record.board.len()
            );
        }

        let mut board = Board::new();
        for (row, cells) in record.board.iter().enumerate() {
            if cells.len() != Square::SIZE as usize {
                bail!(
                    "Row {row} of game record must have 8 columns. Got {}",
                    cells.len()
                );
            }

            for (col, cell) in cells.iter().enumerate() {
                if let Some(piece) = cell {
                    board.place((*piece).into(), Square::new(row as u8, col as u8)?);
                }
            }
        }

        let captured = &record.captured_pieces;
        let mut reserves = Reserves::new();
        for (pieces, holder, owner, is_self) in [
            (&captured.white, Color::White, Color::Black, false),
            (&captured.black, Color::Black, Color::White, false),
            (&captured.white_self, Color::White, Color::White, true),
            (&captured.black_self, Color::Black, Color::Black, true),
        ] {
            for &piece in pieces {
                if piece.owner != owner {
                    bail!(
                        "Reserve of {holder} holds a {} {} that belongs in another list",
                        piece.owner,
                        piece.kind
                    );
                }

                if is_self && piece.kind == PieceKind::King {
                    bail!("Reserve of {holder} holds its own King, which can never be self-captured");
                }

                if is_self {
                    reserves.push_self_captured(holder, piece.into());
                } else {
                    reserves.push_captured(holder, piece.into());
                }
            }
        }

        let white = Duration::from_millis(record.white_time_left_ms);
        let black = Duration::from_millis(record.black_time_left_ms);
        let clock = Clock::restored(initial, white, black);

        if record.game_state.is_in_progress() && clock.is_flagged() {
            bail!(
                "Game record is {} but a clock has run out",
                record.game_state
            );
        }

        Ok(Self::from_parts(
            board,
            reserves,
            record.current_player,
            record.game_state,
            clock,
            rules,
        ))
    }
}

fn millis(time: Duration) -> u64 {
    u64::try_from(time.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Event;

    const TEN_MINUTES: Duration = Duration::from_secs(600);

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_json_field_names() {
        let json = Game::default().to_record().to_json().unwrap();
        for field in [
            "\"board\"",
            "\"currentPlayer\":\"white\"",
            "\"capturedPieces\"",
            "\"whiteSelf\"",
            "\"blackSelf\"",
            "\"whiteTimeLeftMs\":600000",
            "\"blackTimeLeftMs\":600000",
            "\"gameState\":\"playing\"",
            "\"type\":\"rook\"",
            "\"hasMoved\":false",
        ] {
            assert!(json.contains(field), "{field} missing from {json}");
        }
    }

    #[test]
    fn test_restores_game_paused() {
        let game = Game::from_placements("4k3/8/8/8/4Q1P1/8/8/4K3", Color::White, RuleConfig::default()).unwrap();
        let (game, _) = game.apply_event(Event::Move { from: sq("e4"), to: sq("g4") });
        let (game, _) = game.apply_event(Event::Tick(Duration::from_millis(1500)));

        let record = GameRecord::from_json(&game.to_record().to_json().unwrap()).unwrap();
        let restored = Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).unwrap();

        assert_eq!(restored.board(), game.board());
        assert_eq!(restored.reserves(), game.reserves());
        assert_eq!(restored.side_to_move(), Color::Black);
        assert_eq!(restored.clock().remaining(Color::Black), TEN_MINUTES - Duration::from_millis(1500));
        assert!(restored.clock().is_started());
        assert!(!restored.clock().is_running());
        assert!(restored.board().piece_at(sq("g4")).unwrap().has_moved());
    }

    #[test]
    fn test_rejects_malformed_board() {
        let mut record = Game::default().to_record();
        record.board.pop();
        assert!(Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).is_err());

        let mut record = Game::default().to_record();
        record.board[3].push(None);
        assert!(Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).is_err());
    }

    #[test]
    fn test_rejects_misplaced_reserve_piece() {
        let mut record = Game::default().to_record();
        record.captured_pieces.white.push(PieceRecord {
            kind: PieceKind::Knight,
            owner: Color::White,
            has_moved: false,
        });
        assert!(Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).is_err());
    }

    #[test]
    fn test_rejects_self_captured_king() {
        let mut record = Game::default().to_record();
        record.captured_pieces.white_self.push(PieceRecord {
            kind: PieceKind::King,
            owner: Color::White,
            has_moved: true,
        });
        assert!(Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).is_err());

        // Any other piece of the right color is fine
        record.captured_pieces.white_self[0].kind = PieceKind::Queen;
        let game = Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).unwrap();
        assert_eq!(game.reserves().self_captured(Color::White).len(), 1);
    }

    #[test]
    fn test_rejects_expired_clock_in_progress() {
        let mut record = Game::default().to_record();
        record.white_time_left_ms = 0;
        assert!(Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).is_err());

        record.game_state = GameState::Timeout;
        assert!(Game::from_record(&record, RuleConfig::default(), TEN_MINUTES).is_ok());
    }

    #[test]
    fn test_rejects_unknown_values() {
        let json = Game::default().to_record().to_json().unwrap();
        assert!(GameRecord::from_json(&json.replace("\"white\"", "\"green\"")).is_err());
        assert!(GameRecord::from_json(&json.replace("600000", "-1")).is_err());
        assert!(GameRecord::from_json("{}").is_err());
    }
}
