/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::bail;

use crate::{Board, Color, Piece, PieceKind, Square};

/// Which set of movement rules the King follows.
///
/// The two rule sets are mutually exclusive, so the choice is made once per game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KingRuleset {
    /// The King moves a single square in any direction.
    #[default]
    Simple,

    /// The King may move one square in any direction, or two squares along a row, column, or diagonal
    /// when the square in between is empty. It may also castle.
    ///
    /// Castling is a two-square move along the back row toward an unmoved Rook of the same color,
    /// with every square between the King and that Rook empty. The Rook lands on the square the King crossed.
    ExtendedWithCastling,
}

impl FromStr for KingRuleset {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "extended" | "castling" | "extended-with-castling" => Ok(Self::ExtendedWithCastling),
            _ => bail!("Invalid King ruleset {s:?}: expected `simple` or `extended`"),
        }
    }
}

impl fmt::Display for KingRuleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::ExtendedWithCastling => write!(f, "extended"),
        }
    }
}

/// Whether moves and drops are checked for checkmate and stalemate.
///
/// When disabled, both are always reported as `false` and games only end by timeout or agreement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MateDetection {
    #[default]
    Disabled,
    Enabled,
}

/// The configurable parts of the rules, fixed for the lifetime of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RuleConfig {
    pub king_rules: KingRuleset,
    pub mate_detection: MateDetection,
}

/// Returns `true` if `piece`, standing on `from` and owned by `mover`, may move to `to`.
///
/// This is a total function: every in-range input gets a definite answer.
/// A piece that does not belong to `mover`, or a move to the same square, is never legal.
///
/// Capturing a piece of one's own color is illegal, except that a Rook or Queen may capture
/// any friendly piece other than the King.
///
/// # Example
/// ```
/// # use dropchess::*;
/// let board = Board::from_placements("8/8/8/8/8/8/4P3/8").unwrap();
/// let from = Square::new(6, 4).unwrap();
/// let pawn = board.piece_at(from).unwrap();
///
/// // An unmoved pawn may step diagonally onto an empty square
/// let to = Square::new(5, 5).unwrap();
/// assert!(is_legal(&board, from, to, Color::White, pawn, KingRuleset::Simple));
/// assert!(!is_legal(&board, from, to, Color::White, pawn.with_moved(true), KingRuleset::Simple));
/// ```
pub fn is_legal(
    board: &Board,
    from: Square,
    to: Square,
    mover: Color,
    piece: Piece,
    king_rules: KingRuleset,
) -> bool {
    if from == to || piece.color() != mover {
        return false;
    }

    // Friendly targets are only available to self-capturing pieces, and never the King
    if let Some(target) = board.piece_at(to) {
        if target.color() == mover && (!piece.kind().can_self_capture() || target.is_king()) {
            return false;
        }
    }

    match piece.kind() {
        PieceKind::Pawn => is_legal_pawn_move(board, from, to, mover, piece),
        PieceKind::Knight => is_legal_knight_move(board, from, to),
        PieceKind::Bishop => is_legal_bishop_move(board, from, to, mover),
        PieceKind::Rook => is_legal_rook_move(board, from, to),
        PieceKind::Queen => {
            is_legal_rook_move(board, from, to) || is_legal_bishop_move(board, from, to, mover)
        }
        PieceKind::King => is_legal_king_move(board, from, to, king_rules),
    }
}

/// Returns every square that the piece on `from` may legally move to on `mover`'s turn.
///
/// Returns an empty list if `from` is empty or holds an enemy piece.
pub fn legal_destinations(
    board: &Board,
    from: Square,
    mover: Color,
    king_rules: KingRuleset,
) -> Vec<Square> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };

    Square::iter()
        .filter(|&to| is_legal(board, from, to, mover, piece, king_rules))
        .collect()
}

/// Returns `true` if any piece belonging to `attacker` could legally move onto `target`.
pub fn is_attacked(board: &Board, target: Square, attacker: Color, king_rules: KingRuleset) -> bool {
    board
        .iter_color(attacker)
        .any(|(from, piece)| is_legal(board, from, target, attacker, piece, king_rules))
}

/// If moving the King on `from` to `to` is a castle, returns the `(from, to)` squares of the Rook that travels with it.
///
/// Only meaningful under [`KingRuleset::ExtendedWithCastling`]. Castling requires:
/// * the King and the Rook in the corner it moves toward both unmoved and on the King's row
/// * a move of exactly two columns along that row
/// * every square between the King and the Rook empty
pub fn castling_rook(board: &Board, from: Square, to: Square) -> Option<(Square, Square)> {
    let king = board.piece_at(from).filter(|piece| piece.is_king() && !piece.has_moved())?;

    let (dr, dc) = from.delta(to);
    if dr != 0 || dc.abs() != 2 {
        return None;
    }

    let rook_col = if dc > 0 { Square::SIZE - 1 } else { 0 };
    let rook_from = Square::new_unchecked(from.row(), rook_col);
    board
        .piece_at(rook_from)
        .filter(|rook| rook.is_rook() && rook.color() == king.color() && !rook.has_moved())?;

    let mut between = from.ray_between(rook_from)?;
    if between.any(|square| board.has(square)) {
        return None;
    }

    // The Rook lands on the square the King passed over
    let rook_to = from.offset(0, dc.signum())?;
    Some((rook_from, rook_to))
}

/// Returns `true` if every square strictly between `from` and `to` is empty.
///
/// The squares must share a row, column, or diagonal.
fn is_path_clear(board: &Board, from: Square, to: Square) -> bool {
    from.ray_between(to)
        .is_some_and(|mut between| between.all(|square| !board.has(square)))
}

fn is_legal_pawn_move(board: &Board, from: Square, to: Square, mover: Color, piece: Piece) -> bool {
    let forward = mover.forward();
    let (dr, dc) = from.delta(to);
    let target = board.piece_at(to);

    // Single push
    if dc == 0 && dr == forward {
        return target.is_none();
    }

    // Double push from the starting row, through two empty squares
    if dc == 0 && dr == 2 * forward {
        return from.row() == mover.pawn_row() && target.is_none() && is_path_clear(board, from, to);
    }

    if dr == forward && dc.abs() == 1 {
        return match target {
            // Diagonal capture
            Some(victim) => victim.color() != mover,

            // An unmoved pawn may also step diagonally onto an empty square
            None => !piece.has_moved(),
        };
    }

    false
}

fn is_legal_knight_move(board: &Board, from: Square, to: Square) -> bool {
    let (dr, dc) = from.delta(to);
    let (dr, dc) = (dr.abs(), dc.abs());

    // Knights jump, so nothing can block an L-shape
    if (dr == 2 && dc == 1) || (dr == 1 && dc == 2) {
        return true;
    }

    // Otherwise they may slide like a Queen, but not through anything
    is_path_clear(board, from, to)
}

fn is_legal_bishop_move(board: &Board, from: Square, to: Square, mover: Color) -> bool {
    // Any single step is allowed, orthogonal or not
    if from.distance_chebyshev(to) == 1 {
        return true;
    }

    if !from.is_diagonal_to(to) {
        return false;
    }

    // Friendly pieces do not block a diagonal slide; enemy pieces do
    from.ray_between(to).is_some_and(|mut between| {
        between.all(|square| board.color_at(square).map_or(true, |color| color == mover))
    })
}

fn is_legal_rook_move(board: &Board, from: Square, to: Square) -> bool {
    from.is_orthogonal_to(to) && is_path_clear(board, from, to)
}

fn is_legal_king_move(board: &Board, from: Square, to: Square, king_rules: KingRuleset) -> bool {
    match (king_rules, from.distance_chebyshev(to)) {
        (_, 1) => true,
        // Two squares only along a straight line, over an empty square
        (KingRuleset::ExtendedWithCastling, 2) => is_path_clear(board, from, to),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn check(placements: &str, from: &str, to: &str) -> bool {
        check_with(placements, from, to, KingRuleset::Simple)
    }

    fn check_with(placements: &str, from: &str, to: &str, king_rules: KingRuleset) -> bool {
        let board = Board::from_placements(placements).unwrap();
        let from = sq(from);
        let piece = board.piece_at(from).unwrap();
        is_legal(&board, from, sq(to), piece.color(), piece, king_rules)
    }

    #[test]
    fn test_wrong_owner_and_null_moves_are_illegal() {
        let board = Board::startpos();
        let from = sq("e2");
        let pawn = board.piece_at(from).unwrap();
        assert!(!is_legal(&board, from, sq("e3"), Color::Black, pawn, KingRuleset::Simple));
        assert!(!is_legal(&board, from, from, Color::White, pawn, KingRuleset::Simple));
    }

    #[test]
    fn test_pawn_pushes() {
        assert!(check("8/8/8/8/8/8/4P3/8", "e2", "e3"));
        assert!(check("8/8/8/8/8/8/4P3/8", "e2", "e4"));
        assert!(!check("8/8/8/8/8/8/4P3/8", "e2", "e5"));
        assert!(!check("8/8/8/8/8/8/4P3/8", "e2", "e1"));

        // Blocked pushes
        assert!(!check("8/8/8/8/8/4p3/4P3/8", "e2", "e3"));
        assert!(!check("8/8/8/8/8/4p3/4P3/8", "e2", "e4"));
        assert!(!check("8/8/8/8/4p3/8/4P3/8", "e2", "e4"));

        // Double push only from the starting row
        assert!(!check("8/8/8/8/8/4P3/8/8", "e3", "e5"));
        assert!(check("8/4p3/8/8/8/8/8/8", "e7", "e5"));
    }

    #[test]
    fn test_pawn_captures() {
        assert!(check("8/8/8/8/8/3p4/4P3/8", "e2", "d3"));
        assert!(!check("8/8/8/8/8/3P4/4P3/8", "e2", "d3"));
        assert!(check("8/4p3/5P2/8/8/8/8/8", "e7", "f6"));
    }

    #[test]
    fn test_pawn_diagonal_debut() {
        let board = Board::from_placements("8/8/8/8/8/8/4P3/8").unwrap();
        let from = sq("e2");
        let pawn = board.piece_at(from).unwrap();

        assert!(is_legal(&board, from, sq("f3"), Color::White, pawn, KingRuleset::Simple));
        assert!(is_legal(&board, from, sq("d3"), Color::White, pawn, KingRuleset::Simple));

        let moved = pawn.with_moved(true);
        assert!(!is_legal(&board, from, sq("f3"), Color::White, moved, KingRuleset::Simple));
        assert!(!is_legal(&board, from, sq("d3"), Color::White, moved, KingRuleset::Simple));
    }

    #[test]
    fn test_knight_jumps_and_slides() {
        // Jumps ignore blockers
        assert!(check("8/8/8/8/8/PPP5/PNP5/PPP5", "b2", "c4"));
        assert!(check("8/8/8/8/8/PPP5/PNP5/PPP5", "b2", "d3"));

        // Queen-like slides need a clear path
        assert!(check("8/8/8/8/8/8/1N6/8", "b2", "b8"));
        assert!(check("8/8/8/8/8/8/1N6/8", "b2", "h8"));
        assert!(!check("8/8/8/8/8/1P6/1N6/8", "b2", "b8"));
        assert!(!check("8/8/8/8/8/2p5/1N6/8", "b2", "h8"));

        // Sliding onto an enemy piece captures it
        assert!(check("8/1p6/8/8/8/8/1N6/8", "b2", "b7"));

        // Neither an L-shape nor a line
        assert!(!check("8/8/8/8/8/8/1N6/8", "b2", "e3"));
    }

    #[test]
    fn test_bishop_slides_through_friends() {
        assert!(check("8/8/8/8/8/8/1B6/8", "b2", "g7"));
        assert!(check("8/8/8/8/8/2P5/1B6/8", "b2", "g7"));
        assert!(!check("8/8/8/8/8/2p5/1B6/8", "b2", "g7"));

        // The destination itself may hold an enemy
        assert!(check("8/6p1/8/8/8/8/1B6/8", "b2", "g7"));

        // But never a friend, even adjacent
        assert!(!check("8/6P1/8/8/8/8/1B6/8", "b2", "g7"));
        assert!(!check("8/8/8/8/8/8/1BP5/8", "b2", "c2"));
    }

    #[test]
    fn test_bishop_adjacent_steps() {
        assert!(check("8/8/8/8/8/8/1B6/8", "b2", "b3"));
        assert!(check("8/8/8/8/8/8/1B6/8", "b2", "c2"));
        assert!(check("8/8/8/8/8/8/1Bp5/8", "b2", "c2"));
        assert!(!check("8/8/8/8/8/8/1B6/8", "b2", "b4"));
    }

    #[test]
    fn test_rook_moves() {
        assert!(check("8/8/8/8/8/8/8/R7", "a1", "a8"));
        assert!(check("8/8/8/8/8/8/8/R7", "a1", "h1"));
        assert!(!check("8/8/8/8/8/8/8/R7", "a1", "b2"));
        assert!(!check("8/8/8/8/p7/8/8/R7", "a1", "a8"));
        assert!(check("8/8/8/8/p7/8/8/R7", "a1", "a4"));
    }

    #[test]
    fn test_rook_self_capture() {
        assert!(check("8/8/8/8/P7/8/8/R7", "a1", "a4"));
        assert!(!check("8/8/8/8/K7/8/8/R7", "a1", "a4"));
        assert!(!check("8/8/8/8/P7/8/8/R7", "a1", "a5"));
    }

    #[test]
    fn test_queen_moves() {
        assert!(check("8/8/8/8/4Q3/8/8/8", "e4", "e8"));
        assert!(check("8/8/8/8/4Q3/8/8/8", "e4", "h7"));
        assert!(!check("8/8/8/8/4Q3/8/8/8", "e4", "f6"));

        // Orthogonal slides need a clear path, diagonal ones only stop at enemies
        assert!(!check("8/8/8/4P3/4Q3/8/8/8", "e4", "e8"));
        assert!(check("8/8/8/5P2/4Q3/8/8/8", "e4", "g6"));
        assert!(!check("8/8/8/5p2/4Q3/8/8/8", "e4", "g6"));
    }

    #[test]
    fn test_queen_self_capture() {
        assert!(check("8/8/8/8/4Q1P1/8/8/8", "e4", "g4"));
        assert!(!check("8/8/8/8/4Q1K1/8/8/8", "e4", "g4"));
        assert!(!check("8/8/8/8/4QPP1/8/8/8", "e4", "g4"));
    }

    #[test]
    fn test_simple_king() {
        assert!(check("8/8/8/8/4K3/8/8/8", "e4", "e5"));
        assert!(check("8/8/8/8/4K3/8/8/8", "e4", "d3"));
        assert!(!check("8/8/8/8/4K3/8/8/8", "e4", "e6"));
        assert!(!check("8/8/8/8/4KP2/8/8/8", "e4", "f4"));
    }

    #[test]
    fn test_extended_king() {
        let extended = KingRuleset::ExtendedWithCastling;
        assert!(check_with("8/8/8/8/4K3/8/8/8", "e4", "e6", extended));
        assert!(check_with("8/8/8/8/4K3/8/8/8", "e4", "c2", extended));
        assert!(check_with("8/8/8/8/4K3/8/8/8", "e4", "f5", extended));
        assert!(!check_with("8/8/8/8/4K3/8/8/8", "e4", "e7", extended));

        // No knight-shaped steps
        assert!(!check_with("8/8/8/8/4K3/8/8/8", "e4", "f6", extended));
        assert!(!check_with("8/8/8/8/8/8/8/4K3", "e1", "f3", extended));

        // Cannot jump over a piece of either color
        assert!(!check_with("8/8/8/8/8/8/4P3/4K3", "e1", "e3", extended));
        assert!(!check_with("8/8/8/8/8/8/4p3/4K3", "e1", "e3", extended));
        assert!(check_with("8/8/8/8/8/8/4P3/4K3", "e1", "f2", extended));
    }

    #[test]
    fn test_castling_rook() {
        let board = Board::from_placements("8/8/8/8/8/8/8/R3K2R").unwrap();
        assert_eq!(castling_rook(&board, sq("e1"), sq("c1")), Some((sq("a1"), sq("d1"))));
        assert_eq!(castling_rook(&board, sq("e1"), sq("g1")), Some((sq("h1"), sq("f1"))));
        assert_eq!(castling_rook(&board, sq("e1"), sq("e3")), None);

        // Blocked between the King and the Rook
        let board = Board::from_placements("8/8/8/8/8/8/8/RN2K2R").unwrap();
        assert_eq!(castling_rook(&board, sq("e1"), sq("c1")), None);

        // A moved Rook cannot castle
        let mut board = Board::from_placements("8/8/8/8/8/8/8/R3K3").unwrap();
        let rook = board.take(sq("a1")).unwrap();
        board.place(rook.with_moved(true), sq("a1"));
        assert_eq!(castling_rook(&board, sq("e1"), sq("c1")), None);
    }

    #[test]
    fn test_is_attacked() {
        let board = Board::from_placements("4k3/8/8/8/8/8/8/4R3").unwrap();
        assert!(is_attacked(&board, sq("e8"), Color::White, KingRuleset::Simple));
        assert!(!is_attacked(&board, sq("d8"), Color::White, KingRuleset::Simple));
    }

    #[test]
    fn test_legal_destinations() {
        let board = Board::from_placements("8/8/8/8/8/8/4P3/8").unwrap();
        let mut moves = legal_destinations(&board, sq("e2"), Color::White, KingRuleset::Simple)
            .into_iter()
            .map(|sq| sq.to_string())
            .collect::<Vec<_>>();
        moves.sort();
        assert_eq!(moves, ["d3", "e3", "e4", "f3"]);

        assert!(legal_destinations(&board, sq("e3"), Color::White, KingRuleset::Simple).is_empty());
        assert!(legal_destinations(&board, sq("e2"), Color::Black, KingRuleset::Simple).is_empty());
    }
}
