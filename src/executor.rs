/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{
    castling_rook, is_attacked, is_legal, Board, Color, KingRuleset, MateDetection, Piece,
    Reserves, RuleConfig, Square,
};

/// Whether a move or drop ended the game for the side that must respond to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminalFlags {
    pub checkmate: bool,
    pub stalemate: bool,
}

impl TerminalFlags {
    /// Returns `true` if either flag is set.
    #[inline(always)]
    pub const fn is_terminal(&self) -> bool {
        self.checkmate || self.stalemate
    }
}

/// Everything that results from executing a single move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The board after the move.
    pub board: Board,

    /// The reserves after the move.
    pub reserves: Reserves,

    /// The piece that moved, as it now stands on the destination square.
    pub moved: Piece,

    /// The piece that was on the destination square, if any.
    pub captured: Option<Piece>,

    /// `true` if `captured` belonged to the mover and went to its self-capture reserve.
    pub self_captured: bool,

    /// The `(from, to)` squares of the Rook that castled alongside the King, if this move was a castle.
    pub castled_rook: Option<(Square, Square)>,

    pub terminal: TerminalFlags,
}

/// Executes the move `from -> to` for `mover`, returning new copies of the board and reserves.
///
/// The move must already have been accepted by [`is_legal`]; no legality checks are performed here.
/// Returns `None` if `from` is empty.
///
/// # Example
/// ```
/// # use dropchess::*;
/// // A Queen capturing its own pawn puts the pawn in White's drop reserve
/// let board = Board::from_placements("8/8/8/8/4Q1P1/8/8/8").unwrap();
/// let from = Square::new(4, 4).unwrap();
/// let to = Square::new(4, 6).unwrap();
///
/// let outcome = apply_move(&board, from, to, &Reserves::new(), Color::White, RuleConfig::default()).unwrap();
/// assert!(outcome.self_captured);
/// assert_eq!(outcome.reserves.self_captured(Color::White).len(), 1);
/// assert!(outcome.reserves.captured_by(Color::White).is_empty());
/// ```
pub fn apply_move(
    board: &Board,
    from: Square,
    to: Square,
    reserves: &Reserves,
    mover: Color,
    rules: RuleConfig,
) -> Option<MoveOutcome> {
    let mut new_board = *board;
    let mut new_reserves = reserves.clone();

    let piece = new_board.take(from)?;

    let extended = rules.king_rules == KingRuleset::ExtendedWithCastling && piece.is_king();

    // Castling depends on the King being unmoved, so it must be checked before anything changes
    let castled_rook = if extended {
        castling_rook(board, from, to)
    } else {
        None
    };

    let captured = new_board.take(to);
    let mut self_captured = false;
    if let Some(victim) = captured {
        if victim.color() == mover {
            self_captured = true;
            new_reserves.push_self_captured(mover, victim);
        } else {
            new_reserves.push_captured(mover, victim);
        }
    }

    let moved = piece.with_moved(true).with_moved_this_turn(extended);
    new_board.place(moved, to);

    if let Some((rook_from, rook_to)) = castled_rook {
        if let Some(rook) = new_board.take(rook_from) {
            new_board.place(rook.with_moved(true), rook_to);
        }
    }

    if rules.king_rules == KingRuleset::ExtendedWithCastling {
        end_turn(&mut new_board, mover);
    }

    let terminal = detect_terminal(&new_board, &new_reserves, mover, rules);

    Some(MoveOutcome {
        board: new_board,
        reserves: new_reserves,
        moved,
        captured,
        self_captured,
        castled_rook,
        terminal,
    })
}

/// End-of-turn bookkeeping for the extended King ruleset.
///
/// Clears the "moved this turn" flag on every piece belonging to `mover`'s opponent, so that the flag
/// only ever marks a King that moved during its owner's latest turn.
pub fn end_turn(board: &mut Board, mover: Color) {
    let flagged = board
        .iter_color(mover.opponent())
        .filter(|(_, piece)| piece.moved_this_turn())
        .collect::<Vec<_>>();

    for (square, piece) in flagged {
        board.place(piece.with_moved_this_turn(false), square);
    }
}

/// Determines whether `mover`'s opponent has been checkmated or stalemated.
///
/// Always reports no mate when [`MateDetection::Disabled`].
///
/// Otherwise, the opponent is in check if any of `mover`'s pieces could legally move onto its King.
/// The opponent can respond if some legal move of theirs, or some drop from their self-capture reserve,
/// leaves their King on a square `mover` cannot reach. An opponent whose King is already gone is checkmated.
pub fn detect_terminal(
    board: &Board,
    reserves: &Reserves,
    mover: Color,
    rules: RuleConfig,
) -> TerminalFlags {
    if rules.mate_detection == MateDetection::Disabled {
        return TerminalFlags::default();
    }

    let defender = mover.opponent();
    let Some(king_square) = board.king_square(defender) else {
        return TerminalFlags {
            checkmate: true,
            stalemate: false,
        };
    };

    let in_check = is_attacked(board, king_square, mover, rules.king_rules);
    let can_respond = has_move_response(board, reserves, defender, rules)
        || has_drop_response(board, reserves, defender, rules);

    TerminalFlags {
        checkmate: in_check && !can_respond,
        stalemate: !in_check && !can_respond,
    }
}

/// Returns `true` if `defender`'s King is on the board and one of the opponent's pieces could move onto it.
pub fn is_in_check(board: &Board, defender: Color, king_rules: KingRuleset) -> bool {
    board
        .king_square(defender)
        .is_some_and(|king| is_attacked(board, king, defender.opponent(), king_rules))
}

/// Returns `true` if `defender`'s King cannot be reached by the opponent on `board`.
fn is_king_safe(board: &Board, defender: Color, king_rules: KingRuleset) -> bool {
    board
        .king_square(defender)
        .is_some_and(|king| !is_attacked(board, king, defender.opponent(), king_rules))
}

fn has_move_response(board: &Board, reserves: &Reserves, defender: Color, rules: RuleConfig) -> bool {
    // Responses are played out without looking further ahead
    let shallow = RuleConfig {
        mate_detection: MateDetection::Disabled,
        ..rules
    };

    board.iter_color(defender).any(|(from, piece)| {
        Square::iter()
            .filter(|&to| is_legal(board, from, to, defender, piece, rules.king_rules))
            .filter_map(|to| apply_move(board, from, to, reserves, defender, shallow))
            .any(|outcome| is_king_safe(&outcome.board, defender, rules.king_rules))
    })
}

fn has_drop_response(board: &Board, reserves: &Reserves, defender: Color, rules: RuleConfig) -> bool {
    let mut kinds = reserves
        .self_captured(defender)
        .iter()
        .map(|piece| piece.kind())
        .collect::<Vec<_>>();
    kinds.sort();
    kinds.dedup();

    kinds.into_iter().any(|kind| {
        board.empty_squares().any(|to| {
            let mut dropped = *board;
            dropped.place(Piece::new(defender, kind), to);
            is_king_safe(&dropped, defender, rules.king_rules)
        })
    })
}
