/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io,
    sync::mpsc::{channel, Receiver, Sender},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::{
    format_clock_time, minutes_to_duration, Cli, Color, Effect, EngineCommand, Event, Game, GameId, GameResult,
    GameStore, JsonDirStore, MemoryStats, MemoryStore, OutcomeEvent, Session, StatsSink,
    DEFAULT_TICK_MS, STATS_FILE_NAME,
};

/// The interactive game shell.
///
/// Owns the current [`Game`] snapshot and the persistence, identity, and statistics collaborators.
/// Every input, typed or timed, arrives through one channel and is handled to completion before the next.
pub struct Engine {
    /// The latest snapshot. Replaced wholesale after every event.
    game: Game,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    store: Box<dyn GameStore>,
    stats: Box<dyn StatsSink>,
    session: Session,

    /// Color the signed-in user is playing, for statistics.
    play_as: Color,

    tick_interval: Duration,

    /// The save that the current game was last written to or read from.
    current_save: Option<GameId>,
}

impl Engine {
    /// Constructs a new [`Engine`] around `game`, to be executed with [`Engine::run`].
    pub fn new(game: Game, store: Box<dyn GameStore>, stats: Box<dyn StatsSink>) -> Self {
        let (sender, receiver) = channel();

        Self {
            game,
            sender,
            receiver,
            store,
            stats,
            session: Session::default(),
            play_as: Color::White,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            current_save: None,
        }
    }

    /// Builds an engine from the binary's startup options.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let game = Game::new(cli.rules(), cli.clock()?);

        let (store, stats): (Box<dyn GameStore>, Box<dyn StatsSink>) = match &cli.store {
            Some(dir) => {
                let store = JsonDirStore::open(dir)?;
                let stats = MemoryStats::with_file(dir.join(STATS_FILE_NAME))?;
                (Box::new(store), Box::new(stats))
            }
            None => (Box::new(MemoryStore::new()), Box::new(MemoryStats::new())),
        };

        let mut engine = Self::new(game, store, stats)
            .with_play_as(cli.play_as)
            .with_tick_interval(cli.tick_interval());

        if let Some(user) = &cli.user {
            engine.session.login(user)?;
        }

        log::debug!("Engine configured with {:?}", engine.game.rules());
        Ok(engine)
    }

    pub fn with_play_as(mut self, color: Color) -> Self {
        self.play_as = color;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Returns a string of the engine's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    #[inline(always)]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline(always)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Execute the main event loop for the engine.
    ///
    /// This function spawns a thread to handle input from `stdin` and another to tick the clock,
    /// and handles their commands one at a time.
    pub fn run(&mut self) -> Result<()> {
        println!("{} (type `help` for a list of commands)", self.name());
        println!("{}", self.game);

        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                log::debug!("Input handler thread stopping: {err}");
            }
        });

        let sender = self.sender.clone();
        let interval = self.tick_interval;
        thread::spawn(move || clock_ticker(sender, interval));

        while let Ok(cmd) = self.receiver.recv() {
            if cmd == EngineCommand::Exit {
                break;
            }

            // Keep running, even on error
            if let Err(err) = self.execute(cmd) {
                eprintln!("Error: {err:#}");
            }
        }

        Ok(())
    }

    /// Executes a single [`EngineCommand`].
    pub fn execute(&mut self, cmd: EngineCommand) -> Result<()> {
        log::trace!("Executing {cmd:?}");

        match cmd {
            EngineCommand::Select { square } => {
                let effects = self.dispatch(Event::Select(square));
                if effects.is_empty() {
                    self.explain_ignored();
                }
            }

            EngineCommand::Move { from, to } => {
                let effects = self.dispatch(Event::Move { from, to });
                if !effects.iter().any(|e| matches!(e, Effect::Moved { .. })) {
                    if self.game.drop_state().is_armed() {
                        println!("A drop is armed. Place it or `cancel` first");
                    } else if self.game.state().is_terminal() {
                        self.explain_ignored();
                    } else {
                        println!("Illegal move: {from} -> {to}");
                    }
                }
            }

            EngineCommand::Drop { piece, square } => {
                self.dispatch(Event::ArmDrop(piece));
                if self.game.drop_state().armed() != Some(piece) {
                    println!(
                        "{} has no self-captured {piece} to drop",
                        self.game.side_to_move()
                    );
                    return Ok(());
                }

                if let Some(square) = square {
                    self.dispatch(Event::Select(square));
                    if self.game.drop_state().is_armed() {
                        println!("Cannot drop onto {square}: it is occupied");
                    }
                }
            }

            EngineCommand::Cancel => {
                if self.dispatch(Event::CancelDrop).is_empty() {
                    println!("No drop is armed");
                }
            }

            EngineCommand::Moves { square } => {
                let moves = self.game.legal_destinations(square);

                // If there are none, print "(none)"
                let moves_string = if moves.is_empty() {
                    String::from("(none)")
                } else {
                    moves
                        .into_iter()
                        .map(|sq| sq.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                println!("{moves_string}");
            }

            EngineCommand::Display => println!("{}", self.game),

            EngineCommand::Reserves => print!("{}", self.game.reserves()),

            EngineCommand::Clock => println!("{}", self.game.clock()),

            EngineCommand::Pause => {
                self.dispatch(Event::PauseClock);
            }

            EngineCommand::Resume => {
                if self.dispatch(Event::ResumeClock).is_empty() && !self.game.clock().is_running() {
                    println!("The clock cannot be resumed right now");
                }
            }

            EngineCommand::ResetClock => {
                self.dispatch(Event::ResetClock);
            }

            EngineCommand::Time { minutes } => {
                let initial = minutes_to_duration(minutes)?;
                if self.dispatch(Event::SetClock(initial)).is_empty() {
                    println!("The clock can only be changed before the first move");
                }
            }

            EngineCommand::New => {
                self.dispatch(Event::NewGame);
            }

            EngineCommand::Draw => {
                self.dispatch(Event::AgreeDraw);
            }

            EngineCommand::Login { user } => {
                self.session.login(&user)?;
                println!("Signed in as {user}");
            }

            EngineCommand::Logout => match self.session.logout() {
                Some(user) => println!("Signed out {user}"),
                None => println!("Nobody is signed in"),
            },

            EngineCommand::Save { new } => {
                let id = self.save(new)?;
                println!("Saved game {id}");
            }

            EngineCommand::Load { id } => {
                self.load(id)?;
                println!("{}", self.game);
                println!("Loaded game {id}. The clock is paused; `resume` to continue");
            }

            EngineCommand::Games => self.list_games()?,

            EngineCommand::Delete { id } => {
                self.delete(id)?;
                println!("Deleted game {id}");
            }

            EngineCommand::Stats => {
                let user = self.session.require_user()?;
                println!("{user}: {}", self.stats.stats(user)?);
            }

            EngineCommand::Record => println!("{}", self.game.to_record().to_json()?),

            EngineCommand::Tick { elapsed } => {
                self.dispatch(Event::Tick(elapsed));
            }

            EngineCommand::Exit => {}
        }

        Ok(())
    }

    /// Runs `event` through the game, replacing the current snapshot and reporting what happened.
    fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let (next, effects) = self.game.apply_event(event);
        self.game = next;

        for effect in &effects {
            self.handle_effect(*effect);
        }

        effects
    }

    fn handle_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Selected(square) => {
                if let Some(piece) = self.game.board().piece_at(square) {
                    println!("Selected {} on {square}", piece.kind());
                }
            }

            Effect::Deselected => println!("Selection cleared"),

            Effect::Moved {
                from,
                to,
                piece,
                captured,
                self_captured,
                castled_rook,
            } => {
                let mut line = format!("{} {} {from} -> {to}", piece.color(), piece.kind());
                if let Some(victim) = captured {
                    if self_captured {
                        line += &format!(", self-capturing its own {}", victim.kind());
                    } else {
                        line += &format!(", capturing {}", victim.name());
                    }
                }
                if let Some((rook_from, rook_to)) = castled_rook {
                    line += &format!(", castling the rook {rook_from} -> {rook_to}");
                }
                println!("{line}");
                println!("{}", self.game);
            }

            Effect::DropArmed(kind) => println!("Dropping a {kind}: choose an empty square"),

            Effect::DropCancelled => println!("Drop cancelled"),

            Effect::Dropped { piece, to } => {
                println!("{} dropped a {} on {to}", piece.color(), piece.kind());
                println!("{}", self.game);
            }

            Effect::Check(color) => println!("{color} is in check"),

            Effect::ClockStarted => log::debug!("Clock started"),

            Effect::ClockPaused => println!("Clock paused"),

            Effect::ClockResumed => println!("Clock resumed"),

            Effect::ClockReset => println!("{}", self.game.clock()),

            Effect::ClockSet(initial) => {
                println!("Both sides now start with {}", format_clock_time(initial))
            }

            Effect::TimeExpired(color) => println!("{color} ran out of time"),

            Effect::GameOver { state, winner } => {
                match winner {
                    Some(winner) => println!("Game over by {state}: {winner} wins"),
                    None => println!("Game over by {state}: nobody wins"),
                }

                if let Err(err) = self.report_outcome(winner) {
                    log::error!("Failed to record result: {err:#}");
                }
            }

            Effect::NewGame => {
                self.current_save = None;
                println!("{}", self.game);
            }
        }
    }

    fn explain_ignored(&self) {
        if self.game.state().is_terminal() {
            println!("The game is over. Use `new` to start again");
        }
    }

    /// Sends the finished game's result to the statistics collaborator, if anyone is signed in.
    fn report_outcome(&mut self, winner: Option<Color>) -> Result<()> {
        let Some(user) = self.session.user() else {
            log::debug!("Nobody signed in; result not recorded");
            return Ok(());
        };

        let event = OutcomeEvent {
            user_id: user.to_string(),
            result: GameResult::for_player(self.play_as, winner),
        };
        self.stats.report(event)
    }

    /// Saves the current game, updating the last save of it unless `new` is set.
    ///
    /// Requires a signed-in user. The in-memory game is unchanged whether or not this succeeds.
    pub fn save(&mut self, new: bool) -> Result<GameId> {
        let user = self.session.require_user()?.to_string();
        let record = self.game.to_record();

        let existing = self
            .current_save
            .filter(|_| !new)
            .filter(|&id| self.store.read(id).is_ok_and(|game| game.user_id == user));

        let id = match existing {
            Some(id) => {
                self.store
                    .update(id, record)
                    .with_context(|| format!("Failed to save game {id}"))?;
                id
            }
            None => self
                .store
                .create(&user, record)
                .context("Failed to save game")?,
        };

        self.current_save = Some(id);
        Ok(id)
    }

    /// Replaces the current game with the saved game `id`.
    ///
    /// Requires a signed-in user who owns the save. On any failure, the current game is left as it was.
    pub fn load(&mut self, id: GameId) -> Result<()> {
        let user = self.session.require_user()?;
        let stored = self
            .store
            .read(id)
            .with_context(|| format!("Failed to load game {id}"))?;

        if stored.user_id != user {
            bail!("Game {id} belongs to another user");
        }

        let game = Game::from_record(&stored.record, self.game.rules(), self.game.clock().initial())
            .with_context(|| format!("Saved game {id} is invalid"))?;

        log::info!("Loaded game {id} for {user}");
        self.game = game;
        self.current_save = Some(id);
        Ok(())
    }

    fn list_games(&self) -> Result<()> {
        let user = self.session.require_user()?;
        let games = self.store.list(user)?;

        if games.is_empty() {
            println!("(none)");
        }

        for (id, game) in games {
            let record = &game.record;
            println!(
                "{id:>4}: {} | {} to move | White {} Black {} | updated {}",
                record.game_state,
                record.current_player,
                format_clock_time(Duration::from_millis(record.white_time_left_ms)),
                format_clock_time(Duration::from_millis(record.black_time_left_ms)),
                game.updated_at,
            );
        }

        Ok(())
    }

    fn delete(&mut self, id: GameId) -> Result<()> {
        let user = self.session.require_user()?;
        let stored = self.store.read(id)?;
        if stored.user_id != user {
            bail!("Game {id} belongs to another user");
        }

        self.store.delete(id)?;
        if self.current_save == Some(id) {
            self.current_save = None;
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(
            Game::default(),
            Box::new(MemoryStore::new()),
            Box::new(MemoryStats::new()),
        )
    }
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(256);

    loop {
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line from stdin")?;

        // For ctrl + d
        if 0 == bytes {
            sender
                .send(EngineCommand::Exit)
                .context("Failed to send 'exit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        let buf = buffer.trim();
        if buf.is_empty() {
            continue;
        }

        match EngineCommand::try_parse_from(buf.split_ascii_whitespace()) {
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to engine")?,

            // Includes `help`, which clap reports as an error
            Err(err) => eprintln!("{err}"),
        }
    }
}

/// Sends a clock tick through `sender` every `interval`, until the engine stops listening.
fn clock_ticker(sender: Sender<EngineCommand>, interval: Duration) {
    let mut last = Instant::now();

    loop {
        thread::sleep(interval);
        let now = Instant::now();

        let tick = EngineCommand::Tick {
            elapsed: now - last,
        };
        if sender.send(tick).is_err() {
            break;
        }

        last = now;
    }
}
