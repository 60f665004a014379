/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// The 8x8 grid of pieces.
mod grid;

/// Colors, piece kinds, and pieces.
mod piece;

/// Pieces that have been taken off the board.
mod reserves;

/// Board coordinates.
mod square;

pub use grid::*;
pub use piece::*;
pub use reserves::*;
pub use square::*;
