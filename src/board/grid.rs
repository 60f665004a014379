/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{Color, Piece, PieceKind, Square};
use crate::PLACEMENTS_STARTPOS;

/// Represents all pieces and their locations on the 8x8 board.
///
/// Has no knowledge of turns, reserves, or clocks. It is plain data; the rules live in [`crate::is_legal`]
/// and [`crate::apply_move`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    /// One slot per square, indexed by [`Square::index`].
    mailbox: [Option<Piece>; Square::COUNT],
}

impl Board {
    /// Creates a new, empty [`Board`] containing no pieces.
    ///
    /// # Example
    /// ```
    /// # use dropchess::Board;
    /// let board = Board::new();
    /// assert_eq!(board.to_placements(), "8/8/8/8/8/8/8/8");
    /// ```
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            mailbox: [None; Square::COUNT],
        }
    }

    /// Creates the standard starting arrangement, with every piece unmoved.
    pub fn startpos() -> Self {
        let mut board = Self::new();
        let back_row = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for color in Color::all() {
            for (col, kind) in back_row.into_iter().enumerate() {
                let col = col as u8;
                board.place(
                    Piece::new(color, kind),
                    Square::new_unchecked(color.back_row(), col),
                );
                board.place(
                    Piece::new(color, PieceKind::Pawn),
                    Square::new_unchecked(color.pawn_row(), col),
                );
            }
        }

        board
    }

    /// Constructs a [`Board`] from the piece-placement field of a FEN string.
    ///
    /// The first `/`-separated segment is row `0` (Black's back rank). All parsed pieces are unmoved.
    ///
    /// # Example
    /// ```
    /// # use dropchess::{Board, Square};
    /// let board = Board::from_placements("8/8/8/8/8/8/4P3/8").unwrap();
    /// assert!(board.piece_at(Square::new(6, 4).unwrap()).unwrap().is_pawn());
    /// ```
    pub fn from_placements(placements: &str) -> Result<Self> {
        let mut board = Self::new();

        // Ignore anything beyond the placement field
        let placements = placements.split(' ').next().unwrap_or_default();

        if placements.matches('/').count() != 7 {
            bail!("Placements must have pieces for all 8 rows. Got {placements:?}");
        }

        for (row, pieces) in placements.split('/').enumerate() {
            let mut col = 0u8;

            for piece_char in pieces.chars() {
                if col >= Square::SIZE {
                    bail!("Row {row} of {placements:?} describes more than 8 squares");
                }

                if let Ok(piece) = Piece::from_uci(piece_char) {
                    board.place(piece, Square::new_unchecked(row as u8, col));
                    col += 1;
                } else {
                    let Some(empty) = piece_char.to_digit(10) else {
                        bail!("Placements must contain piece chars or digits. Got {piece_char:?}");
                    };
                    col += empty as u8;
                }
            }

            if col != Square::SIZE {
                bail!("Row {row} of {placements:?} describes {col} squares instead of 8");
            }
        }

        Ok(board)
    }

    /// Generates the FEN piece-placement field for this board.
    pub fn to_placements(&self) -> String {
        let mut placements = String::with_capacity(71);

        for row in 0..Square::SIZE {
            let mut empty = 0;

            for col in 0..Square::SIZE {
                if let Some(piece) = self.piece_at(Square::new_unchecked(row, col)) {
                    if empty != 0 {
                        placements += &empty.to_string();
                        empty = 0;
                    }
                    placements.push(piece.to_uci());
                } else {
                    empty += 1;
                }
            }

            if empty != 0 {
                placements += &empty.to_string();
            }

            if row != Square::SIZE - 1 {
                placements.push('/');
            }
        }

        placements
    }

    /// Returns `true` if there is a piece at the given [`Square`], else `false`.
    #[inline(always)]
    pub const fn has(&self, square: Square) -> bool {
        self.mailbox[square.index()].is_some()
    }

    /// Fetches the [`Piece`] at the provided [`Square`], if there is one.
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    /// Fetches the [`Color`] of the piece at the provided [`Square`], if there is one.
    #[inline(always)]
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.piece_at(square).map(|piece| piece.color())
    }

    /// Places the provided [`Piece`] on the supplied [`Square`], replacing any occupant.
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, square: Square) {
        self.mailbox[square.index()] = Some(piece);
    }

    /// Takes the [`Piece`] from a given [`Square`], if there is one present.
    ///
    /// # Example
    /// ```
    /// # use dropchess::{Board, Square};
    /// let mut board = Board::from_placements("k7/8/8/8/2N5/8/8/7K").unwrap();
    /// let taken = board.take("c4".parse().unwrap());
    /// assert_eq!(board.to_placements(), "k7/8/8/8/8/8/8/7K");
    /// assert!(taken.is_some());
    /// ```
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()].take()
    }

    /// An iterator over every occupied square and its piece.
    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(|square| self.piece_at(square).map(|piece| (square, piece)))
    }

    /// An iterator over every square occupied by a piece of `color`.
    pub fn iter_color(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.iter().filter(move |(_, piece)| piece.color() == color)
    }

    /// An iterator over every empty square.
    pub fn empty_squares(&self) -> impl Iterator<Item = Square> + '_ {
        Square::iter().filter(|&square| !self.has(square))
    }

    /// Finds the square of `color`'s King, if it is on the board.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.iter_color(color)
            .find(|(_, piece)| piece.is_king())
            .map(|(square, _)| square)
    }
}

impl Default for Board {
    /// The default board is the starting position.
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board = String::with_capacity(198);

        for row in 0..Square::SIZE {
            board += &format!("{}| ", Square::SIZE - row);

            for col in 0..Square::SIZE {
                let occupant = self
                    .piece_at(Square::new_unchecked(row, col))
                    .map_or('.', |piece| piece.to_uci());
                board.push(occupant);
                board.push(' ');
            }

            board += "\n";
        }

        board += " +";
        for _ in 0..Square::SIZE {
            board += "--";
        }
        board += "\n   ";
        for col in 0..Square::SIZE {
            board.push((b'a' + col) as char);
            board.push(' ');
        }

        write!(f, "{board}")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_placements())
    }
}
