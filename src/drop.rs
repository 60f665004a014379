/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Board, Color, Piece, PieceKind, Reserves, Square};

/// Whether the player to move is about to drop a self-captured piece back onto the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DropState {
    /// No drop is pending; clicks select and move pieces.
    #[default]
    Idle,

    /// The next click on an empty square places a piece of this kind.
    Armed(PieceKind),
}

impl DropState {
    /// Arms a drop of `kind` for `owner`.
    ///
    /// Arming only succeeds if `owner` holds a self-captured piece of `kind` and the game is still in progress.
    /// Any previously armed kind is replaced. On failure, the current state is returned unchanged.
    ///
    /// # Example
    /// ```
    /// # use dropchess::*;
    /// let mut reserves = Reserves::new();
    /// reserves.push_self_captured(Color::White, Piece::new(Color::White, PieceKind::Knight));
    ///
    /// let state = DropState::Idle.arm(PieceKind::Knight, &reserves, Color::White, true);
    /// assert_eq!(state, DropState::Armed(PieceKind::Knight));
    ///
    /// // Black has nothing to drop
    /// assert_eq!(DropState::Idle.arm(PieceKind::Knight, &reserves, Color::Black, true), DropState::Idle);
    /// ```
    pub fn arm(self, kind: PieceKind, reserves: &Reserves, owner: Color, in_progress: bool) -> Self {
        if in_progress && reserves.has_self_captured(owner, kind) {
            Self::Armed(kind)
        } else {
            self
        }
    }

    /// Abandons any pending drop.
    #[inline(always)]
    pub const fn cancel(self) -> Self {
        Self::Idle
    }

    /// The kind of piece waiting to be dropped, if any.
    #[inline(always)]
    pub const fn armed(&self) -> Option<PieceKind> {
        match self {
            Self::Idle => None,
            Self::Armed(kind) => Some(*kind),
        }
    }

    #[inline(always)]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Armed(_))
    }
}

impl fmt::Display for DropState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Armed(kind) => write!(f, "dropping {kind}"),
        }
    }
}

/// The board and reserves after a piece has been dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropOutcome {
    pub board: Board,
    pub reserves: Reserves,

    /// The piece that was placed, exactly as it was stored in the reserve.
    pub piece: Piece,
}

/// Drops `owner`'s first self-captured piece of `kind` onto `to`.
///
/// Returns `None` if `to` is occupied or `owner` holds no such piece. Otherwise the reserve entry is removed
/// and placed unchanged, keeping its moved flag.
pub fn place_drop(
    board: &Board,
    reserves: &Reserves,
    owner: Color,
    kind: PieceKind,
    to: Square,
) -> Option<DropOutcome> {
    if board.has(to) {
        return None;
    }

    let mut reserves = reserves.clone();
    let piece = reserves.take_self_captured(owner, kind)?;

    let mut board = *board;
    board.place(piece, to);

    Some(DropOutcome {
        board,
        reserves,
        piece,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserves_with(pieces: &[Piece]) -> Reserves {
        let mut reserves = Reserves::new();
        for &piece in pieces {
            reserves.push_self_captured(piece.color(), piece);
        }
        reserves
    }

    #[test]
    fn test_arm_requires_reserve_and_live_game() {
        let reserves = reserves_with(&[Piece::new(Color::Black, PieceKind::Bishop)]);

        let armed = DropState::Idle.arm(PieceKind::Bishop, &reserves, Color::Black, true);
        assert_eq!(armed.armed(), Some(PieceKind::Bishop));

        assert_eq!(
            DropState::Idle.arm(PieceKind::Rook, &reserves, Color::Black, true),
            DropState::Idle
        );
        assert_eq!(
            DropState::Idle.arm(PieceKind::Bishop, &reserves, Color::Black, false),
            DropState::Idle
        );
    }

    #[test]
    fn test_rearming_replaces_kind() {
        let reserves = reserves_with(&[
            Piece::new(Color::White, PieceKind::Pawn),
            Piece::new(Color::White, PieceKind::Knight),
        ]);

        let state = DropState::Idle
            .arm(PieceKind::Pawn, &reserves, Color::White, true)
            .arm(PieceKind::Knight, &reserves, Color::White, true);
        assert_eq!(state, DropState::Armed(PieceKind::Knight));
        assert_eq!(state.cancel(), DropState::Idle);
    }

    #[test]
    fn test_place_drop_on_empty_square() {
        let board = Board::new();
        let moved_pawn = Piece::new(Color::White, PieceKind::Pawn).with_moved(true);
        let reserves = reserves_with(&[moved_pawn, Piece::new(Color::White, PieceKind::Pawn)]);
        let to = Square::new(3, 3).unwrap();

        let outcome = place_drop(&board, &reserves, Color::White, PieceKind::Pawn, to).unwrap();
        assert_eq!(outcome.piece, moved_pawn);
        assert_eq!(outcome.board.piece_at(to), Some(moved_pawn));
        assert_eq!(outcome.reserves.self_captured(Color::White).len(), 1);
        assert!(!outcome.reserves.self_captured(Color::White)[0].has_moved());
    }

    #[test]
    fn test_place_drop_rejects_occupied_square() {
        let board = Board::startpos();
        let reserves = reserves_with(&[Piece::new(Color::White, PieceKind::Pawn)]);
        let occupied = Square::new(6, 0).unwrap();

        assert!(place_drop(&board, &reserves, Color::White, PieceKind::Pawn, occupied).is_none());
        assert!(place_drop(&board, &reserves, Color::Black, PieceKind::Pawn, Square::new(4, 0).unwrap()).is_none());
    }
}
