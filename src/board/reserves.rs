/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{Color, Piece, PieceKind};

/// Every piece that has left the board, grouped by who removed it and how.
///
/// * `captured[color]` holds enemy pieces that `color` captured. They never return.
/// * `self_captured[color]` holds `color`'s own pieces that one of its Rooks or Queens removed.
///   They can be dropped back onto the board by `color`.
///
/// Both lists keep the order in which pieces were removed.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Reserves {
    captured: [Vec<Piece>; Color::COUNT],
    self_captured: [Vec<Piece>; Color::COUNT],
}

impl Reserves {
    /// Creates a new set of empty reserves.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enemy pieces captured by `color`.
    #[inline(always)]
    pub fn captured_by(&self, color: Color) -> &[Piece] {
        &self.captured[color]
    }

    /// `color`'s own pieces taken off the board by self-capture, available to drop.
    #[inline(always)]
    pub fn self_captured(&self, color: Color) -> &[Piece] {
        &self.self_captured[color]
    }

    /// Returns `true` if `color` has anything to drop.
    #[inline(always)]
    pub fn can_drop(&self, color: Color) -> bool {
        !self.self_captured[color].is_empty()
    }

    /// Returns `true` if `color` has a self-captured piece of `kind`.
    #[inline(always)]
    pub fn has_self_captured(&self, color: Color, kind: PieceKind) -> bool {
        self.self_captured[color].iter().any(|piece| piece.kind() == kind)
    }

    /// Records that `captor` captured the enemy piece `victim`.
    #[inline(always)]
    pub fn push_captured(&mut self, captor: Color, victim: Piece) {
        self.captured[captor].push(victim);
    }

    /// Records that `owner` removed its own piece `piece` through self-capture.
    #[inline(always)]
    pub fn push_self_captured(&mut self, owner: Color, piece: Piece) {
        self.self_captured[owner].push(piece);
    }

    /// Removes and returns the first self-captured piece of `kind` belonging to `owner`.
    ///
    /// All other entries are left in their original order.
    pub fn take_self_captured(&mut self, owner: Color, kind: PieceKind) -> Option<Piece> {
        let reserve = &mut self.self_captured[owner];
        let index = reserve.iter().position(|piece| piece.kind() == kind)?;
        Some(reserve.remove(index))
    }
}

impl fmt::Display for Reserves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |pieces: &[Piece]| {
            if pieces.is_empty() {
                String::from("(none)")
            } else {
                pieces
                    .iter()
                    .map(|piece| piece.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        };

        for color in Color::all() {
            writeln!(f, "{color} captured     : {}", list(self.captured_by(color)))?;
            writeln!(f, "{color} self-captured: {}", list(self.self_captured(color)))?;
        }

        Ok(())
    }
}

impl fmt::Debug for Reserves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_self_captured_removes_first_match_only() {
        let mut reserves = Reserves::new();
        let pawn = Piece::new(Color::White, PieceKind::Pawn);
        let knight = Piece::new(Color::White, PieceKind::Knight);
        let moved_pawn = pawn.with_moved(true);

        reserves.push_self_captured(Color::White, pawn);
        reserves.push_self_captured(Color::White, knight);
        reserves.push_self_captured(Color::White, moved_pawn);

        assert_eq!(reserves.take_self_captured(Color::White, PieceKind::Pawn), Some(pawn));
        assert_eq!(reserves.self_captured(Color::White), [knight, moved_pawn]);

        assert_eq!(reserves.take_self_captured(Color::White, PieceKind::Rook), None);
        assert_eq!(reserves.take_self_captured(Color::Black, PieceKind::Knight), None);
        assert_eq!(reserves.self_captured(Color::White).len(), 2);
    }

    #[test]
    fn test_buckets_are_separate() {
        let mut reserves = Reserves::new();
        reserves.push_captured(Color::Black, Piece::new(Color::White, PieceKind::Bishop));

        assert_eq!(reserves.captured_by(Color::Black).len(), 1);
        assert!(reserves.captured_by(Color::White).is_empty());
        assert!(!reserves.can_drop(Color::Black));
        assert!(!reserves.has_self_captured(Color::Black, PieceKind::Bishop));
    }
}
