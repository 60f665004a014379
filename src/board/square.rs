/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};

/// Represents a single square on an 8x8 board, addressed by `(row, col)`.
///
/// Row `0` is Black's back rank and row `7` is White's, so the algebraic square `a8` is `(0, 0)`
/// and `h1` is `(7, 7)`.
///
/// A [`Square`] can only be constructed in range, which makes every rule function that takes one total.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Number of squares on the board.
    pub const COUNT: usize = 64;

    /// Number of rows (and columns) on the board.
    pub const SIZE: u8 = 8;

    /// Creates a new [`Square`], returning an error if either coordinate is outside `[0,7]`.
    ///
    /// # Example
    /// ```
    /// # use dropchess::Square;
    /// let e2 = Square::new(6, 4).unwrap();
    /// assert_eq!(e2.to_string(), "e2");
    /// assert!(Square::new(8, 0).is_err());
    /// ```
    #[inline(always)]
    pub fn new(row: u8, col: u8) -> Result<Self> {
        if row >= Self::SIZE || col >= Self::SIZE {
            bail!("Square coordinates must be within [0,7]. Got ({row}, {col})");
        }
        Ok(Self { row, col })
    }

    /// Creates a new [`Square`] without bounds checking.
    ///
    /// # Panics
    /// If either coordinate is outside `[0,7]` and debug assertions are enabled.
    #[inline(always)]
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        debug_assert!(row < Self::SIZE && col < Self::SIZE);
        Self { row, col }
    }

    /// Fetches the row of this square, where `0` is Black's back rank.
    #[inline(always)]
    pub const fn row(&self) -> u8 {
        self.row
    }

    /// Fetches the column of this square, where `0` is the a-file.
    #[inline(always)]
    pub const fn col(&self) -> u8 {
        self.col
    }

    /// Returns this square as an index into a 64-element list.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.row as usize * Self::SIZE as usize + self.col as usize
    }

    /// An iterator over all 64 squares, row by row starting at `a8`.
    #[inline(always)]
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::SIZE).flat_map(|row| (0..Self::SIZE).map(move |col| Self { row, col }))
    }

    /// Returns the square `rows` rows and `cols` columns away from this one, if it is on the board.
    #[inline(always)]
    pub fn offset(&self, rows: i8, cols: i8) -> Option<Self> {
        let row = self.row as i8 + rows;
        let col = self.col as i8 + cols;
        let range = 0..Self::SIZE as i8;
        (range.contains(&row) && range.contains(&col)).then(|| Self::new_unchecked(row as u8, col as u8))
    }

    /// Signed `(row, col)` distance from `self` to `to`.
    #[inline(always)]
    pub const fn delta(&self, to: Self) -> (i8, i8) {
        (
            to.row as i8 - self.row as i8,
            to.col as i8 - self.col as i8,
        )
    }

    /// Returns `true` if `self` and `to` share a row or a column (and are distinct).
    #[inline(always)]
    pub const fn is_orthogonal_to(&self, to: Self) -> bool {
        (self.row == to.row) != (self.col == to.col)
    }

    /// Returns `true` if `self` and `to` lie on a common diagonal (and are distinct).
    #[inline(always)]
    pub const fn is_diagonal_to(&self, to: Self) -> bool {
        let (dr, dc) = self.delta(to);
        dr != 0 && dr.abs() == dc.abs()
    }

    /// The larger of the row and column distance between two squares.
    ///
    /// # Example
    /// ```
    /// # use dropchess::Square;
    /// let a8 = Square::new(0, 0).unwrap();
    /// let c7 = Square::new(1, 2).unwrap();
    /// assert_eq!(a8.distance_chebyshev(c7), 2);
    /// ```
    #[inline(always)]
    pub const fn distance_chebyshev(&self, to: Self) -> u8 {
        let (dr, dc) = self.delta(to);
        let (dr, dc) = (dr.unsigned_abs(), dc.unsigned_abs());
        if dr > dc {
            dr
        } else {
            dc
        }
    }

    /// Returns every square strictly between `self` and `to`, if they are on a common row, column, or diagonal.
    ///
    /// Returns `None` if the two squares are not aligned (or are the same square).
    ///
    /// # Example
    /// ```
    /// # use dropchess::Square;
    /// let a1: Square = "a1".parse().unwrap();
    /// let d4: Square = "d4".parse().unwrap();
    /// let between = a1.ray_between(d4).unwrap().map(|sq| sq.to_string()).collect::<Vec<_>>();
    /// assert_eq!(between, ["b2", "c3"]);
    /// assert!(a1.ray_between("b3".parse().unwrap()).is_none());
    /// ```
    pub fn ray_between(&self, to: Self) -> Option<impl Iterator<Item = Self>> {
        if !self.is_orthogonal_to(to) && !self.is_diagonal_to(to) {
            return None;
        }

        let (dr, dc) = self.delta(to);
        let (step_r, step_c) = (dr.signum(), dc.signum());
        let steps = self.distance_chebyshev(to) as i8;
        let from = *self;

        Some((1..steps).filter_map(move |i| from.offset(step_r * i, step_c * i)))
    }

    /// Parses a square from algebraic notation, such as `e2`.
    #[inline(always)]
    pub fn from_uci(square: &str) -> Result<Self> {
        let bytes = square.as_bytes();
        if bytes.len() != 2 {
            bail!("Invalid Square string: String must contain exactly 2 characters. Got {square}")
        }

        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) {
            bail!("Invalid file in {square:?}: must be within [a,h]");
        }
        if !(b'1'..=b'8').contains(&rank) {
            bail!("Invalid rank in {square:?}: must be within [1,8]");
        }

        Ok(Self::new_unchecked(b'8' - rank, file - b'a'))
    }

    /// Converts this [`Square`] to algebraic notation.
    #[inline(always)]
    pub fn to_uci(self) -> String {
        format!("{}{}", (b'a' + self.col) as char, Self::SIZE - self.row)
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    /// Parses either algebraic notation (`e2`) or a `row,col` pair (`6,4`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((row, col)) = s.split_once(',') else {
            return Self::from_uci(s);
        };

        let row = row
            .trim()
            .parse()
            .with_context(|| format!("Invalid row in {s:?}"))?;
        let col = col
            .trim()
            .parse()
            .with_context(|| format!("Invalid column in {s:?}"))?;
        Self::new(row, col)
    }
}

impl fmt::Display for Square {
    /// Calls [`Square::to_uci`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_uci().fmt(f)
    }
}

impl fmt::Debug for Square {
    /// Displays the algebraic name as well as the `(row, col)` pair.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.to_uci(), self.row, self.col)
    }
}
