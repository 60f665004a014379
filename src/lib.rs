/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Pieces, squares, the board, and the capture reserves.
mod board;

/// The countdown chess clock.
mod clock;

/// Command-line options and interactive commands.
mod cli;

/// Staging and placing self-captured pieces.
mod drop;

/// The interactive shell that drives a game from user input and the clock.
mod engine;

/// Applying legal moves to the board.
mod executor;

/// Turn order, game status, and the event reducer.
mod game;

/// Saved-game records.
mod record;

/// Move legality for every piece kind.
mod rules;

/// Persistence, identity, and statistics collaborators.
mod store;

/// Misc constants.
mod utils;

pub use board::*;
pub use clock::*;
pub use cli::*;
pub use drop::*;
pub use engine::*;
pub use executor::*;
pub use game::*;
pub use record::*;
pub use rules::*;
pub use store::*;
pub use utils::*;
