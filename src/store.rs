/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    collections::{BTreeMap, HashMap},
    fmt, fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{Color, GameRecord};

/// Identifies a saved game within a [`GameStore`].
pub type GameId = u64;

/// A saved game along with who saved it and when.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGame {
    pub user_id: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub record: GameRecord,
}

/// Somewhere games can be saved to and loaded from.
pub trait GameStore {
    /// Saves a new game for `user_id`, returning its id.
    fn create(&mut self, user_id: &str, record: GameRecord) -> Result<GameId>;

    /// Overwrites the record of an existing game, bumping its `updated_at`.
    fn update(&mut self, id: GameId, record: GameRecord) -> Result<()>;

    fn read(&self, id: GameId) -> Result<StoredGame>;

    fn delete(&mut self, id: GameId) -> Result<()>;

    /// Every game saved by `user_id`, most recently updated first.
    fn list(&self, user_id: &str) -> Result<Vec<(GameId, StoredGame)>>;
}

/// Milliseconds since the Unix epoch, strictly greater than `last`.
///
/// Keeps `updated_at` ordering meaningful for saves made within the same millisecond.
fn next_timestamp(last: &mut u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default();

    *last = now.max(*last + 1);
    *last
}

fn sort_by_recency(games: &mut [(GameId, StoredGame)]) {
    games.sort_by(|(a_id, a), (b_id, b)| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b_id.cmp(a_id))
    });
}

/// A [`GameStore`] that keeps everything in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: BTreeMap<GameId, StoredGame>,
    next_id: GameId,
    last_timestamp: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    fn create(&mut self, user_id: &str, record: GameRecord) -> Result<GameId> {
        self.next_id += 1;
        let now = next_timestamp(&mut self.last_timestamp);

        self.games.insert(
            self.next_id,
            StoredGame {
                user_id: user_id.to_string(),
                created_at: now,
                updated_at: now,
                record,
            },
        );

        Ok(self.next_id)
    }

    fn update(&mut self, id: GameId, record: GameRecord) -> Result<()> {
        let game = self
            .games
            .get_mut(&id)
            .ok_or_else(|| anyhow!("No saved game with id {id}"))?;

        game.updated_at = next_timestamp(&mut self.last_timestamp);
        game.record = record;
        Ok(())
    }

    fn read(&self, id: GameId) -> Result<StoredGame> {
        self.games
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("No saved game with id {id}"))
    }

    fn delete(&mut self, id: GameId) -> Result<()> {
        if self.games.remove(&id).is_none() {
            bail!("No saved game with id {id}");
        }
        Ok(())
    }

    fn list(&self, user_id: &str) -> Result<Vec<(GameId, StoredGame)>> {
        let mut games = self
            .games
            .iter()
            .filter(|(_, game)| game.user_id == user_id)
            .map(|(&id, game)| (id, game.clone()))
            .collect::<Vec<_>>();

        sort_by_recency(&mut games);
        Ok(games)
    }
}

/// A [`GameStore`] that writes each game to its own `<id>.json` file in a directory.
#[derive(Debug)]
pub struct JsonDirStore {
    dir: PathBuf,
    last_timestamp: u64,
}

impl JsonDirStore {
    /// Opens (creating if necessary) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create game directory {}", dir.display()))?;

        log::debug!("Using game directory {}", dir.display());
        Ok(Self {
            dir,
            last_timestamp: 0,
        })
    }

    fn path(&self, id: GameId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Ids of every game file in the directory, in no particular order.
    fn ids(&self) -> Result<Vec<GameId>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read game directory {}", self.dir.display()))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse().ok())
                {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }

    fn write(&self, id: GameId, game: &StoredGame) -> Result<()> {
        let json = serde_json::to_string_pretty(game).context("Failed to encode saved game")?;
        fs::write(self.path(id), json).with_context(|| format!("Failed to write game {id}"))
    }
}

impl GameStore for JsonDirStore {
    fn create(&mut self, user_id: &str, record: GameRecord) -> Result<GameId> {
        let id = self.ids()?.into_iter().max().unwrap_or_default() + 1;
        let now = next_timestamp(&mut self.last_timestamp);

        self.write(
            id,
            &StoredGame {
                user_id: user_id.to_string(),
                created_at: now,
                updated_at: now,
                record,
            },
        )?;

        log::info!("Created game {id} for {user_id}");
        Ok(id)
    }

    fn update(&mut self, id: GameId, record: GameRecord) -> Result<()> {
        let mut game = self.read(id)?;
        game.updated_at = next_timestamp(&mut self.last_timestamp);
        game.record = record;
        self.write(id, &game)?;

        log::info!("Updated game {id}");
        Ok(())
    }

    fn read(&self, id: GameId) -> Result<StoredGame> {
        let json = fs::read_to_string(self.path(id))
            .with_context(|| format!("No saved game with id {id}"))?;
        serde_json::from_str(&json).with_context(|| format!("Saved game {id} is corrupt"))
    }

    fn delete(&mut self, id: GameId) -> Result<()> {
        fs::remove_file(self.path(id)).with_context(|| format!("No saved game with id {id}"))?;
        log::info!("Deleted game {id}");
        Ok(())
    }

    fn list(&self, user_id: &str) -> Result<Vec<(GameId, StoredGame)>> {
        let mut games = Vec::new();
        for id in self.ids()? {
            match self.read(id) {
                Ok(game) if game.user_id == user_id => games.push((id, game)),
                Ok(_) => {}
                Err(err) => log::warn!("Skipping game {id}: {err:#}"),
            }
        }

        sort_by_recency(&mut games);
        Ok(games)
    }
}

/// Who is currently signed in, if anyone.
///
/// Saving and loading are refused outright while signed out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<String>,
}

impl Session {
    pub fn new(user: Option<String>) -> Self {
        Self { user }
    }

    pub fn login(&mut self, user: &str) -> Result<()> {
        let user = user.trim();
        if user.is_empty() {
            bail!("User id cannot be empty");
        }

        self.user = Some(user.to_string());
        Ok(())
    }

    /// Signs out, returning who was signed in.
    pub fn logout(&mut self) -> Option<String> {
        self.user.take()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The signed-in user, or an error if nobody is.
    pub fn require_user(&self) -> Result<&str> {
        self.user()
            .ok_or_else(|| anyhow!("You must be signed in to do that. Use `login <user>` first"))
    }
}

/// The result of a finished game from one user's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    /// The result for whoever played `player`, given the game's `winner`.
    pub fn for_player(player: Color, winner: Option<Color>) -> Self {
        match winner {
            None => Self::Draw,
            Some(winner) if winner == player => Self::Win,
            Some(_) => Self::Loss,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        };
        name.fmt(f)
    }
}

/// Reported once per finished game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub user_id: String,
    pub result: GameResult,
}

/// Running totals for a single user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_drawn: u32,
}

impl UserStats {
    fn record(&mut self, result: GameResult) {
        self.games_played += 1;
        match result {
            GameResult::Win => self.games_won += 1,
            GameResult::Loss => self.games_lost += 1,
            GameResult::Draw => self.games_drawn += 1,
        }
    }
}

impl fmt::Display for UserStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "played {} | won {} | lost {} | drawn {}",
            self.games_played, self.games_won, self.games_lost, self.games_drawn
        )
    }
}

/// Receives game outcomes and aggregates them per user.
pub trait StatsSink {
    fn report(&mut self, event: OutcomeEvent) -> Result<()>;

    /// Totals for `user_id`; all zero if they have never finished a game.
    fn stats(&self, user_id: &str) -> Result<UserStats>;
}

/// A [`StatsSink`] that keeps totals in memory, optionally mirroring them to a JSON file.
#[derive(Debug, Default)]
pub struct MemoryStats {
    users: HashMap<String, UserStats>,
    file: Option<PathBuf>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads totals from `path` if it exists, and writes them back after every report.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let users = if path.exists() {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read statistics from {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Statistics in {} are corrupt", path.display()))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            users,
            file: Some(path),
        })
    }
}

impl StatsSink for MemoryStats {
    fn report(&mut self, event: OutcomeEvent) -> Result<()> {
        self.users
            .entry(event.user_id.clone())
            .or_default()
            .record(event.result);
        log::info!("Recorded a {} for {}", event.result, event.user_id);

        if let Some(path) = &self.file {
            let json = serde_json::to_string_pretty(&self.users)
                .context("Failed to encode statistics")?;
            fs::write(path, json)
                .with_context(|| format!("Failed to write statistics to {}", path.display()))?;
        }

        Ok(())
    }

    fn stats(&self, user_id: &str) -> Result<UserStats> {
        Ok(self.users.get(user_id).copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Game;

    #[test]
    fn test_memory_store_lifecycle() {
        let mut store = MemoryStore::new();
        let record = Game::default().to_record();

        let first = store.create("alice", record.clone()).unwrap();
        let second = store.create("alice", record.clone()).unwrap();
        store.create("bob", record.clone()).unwrap();
        assert_ne!(first, second);

        let listed = store.list("alice").unwrap();
        assert_eq!(listed.iter().map(|(id, _)| *id).collect::<Vec<_>>(), [second, first]);

        store.update(first, record.clone()).unwrap();
        let listed = store.list("alice").unwrap();
        assert_eq!(listed[0].0, first);
        assert!(listed[0].1.updated_at > listed[0].1.created_at);

        store.delete(second).unwrap();
        assert_eq!(store.list("alice").unwrap().len(), 1);
        assert!(store.read(second).is_err());
        assert!(store.delete(second).is_err());
        assert!(store.update(second, record).is_err());
    }

    #[test]
    fn test_session_gate() {
        let mut session = Session::default();
        assert!(session.require_user().is_err());
        assert!(session.login("   ").is_err());

        session.login("alice").unwrap();
        assert_eq!(session.require_user().unwrap(), "alice");

        assert_eq!(session.logout().as_deref(), Some("alice"));
        assert!(session.require_user().is_err());
    }

    #[test]
    fn test_results_relative_to_player() {
        assert_eq!(GameResult::for_player(Color::White, Some(Color::White)), GameResult::Win);
        assert_eq!(GameResult::for_player(Color::Black, Some(Color::White)), GameResult::Loss);
        assert_eq!(GameResult::for_player(Color::Black, None), GameResult::Draw);
    }

    #[test]
    fn test_memory_stats_aggregate() {
        let mut stats = MemoryStats::new();
        for result in [GameResult::Win, GameResult::Win, GameResult::Draw] {
            stats
                .report(OutcomeEvent {
                    user_id: String::from("alice"),
                    result,
                })
                .unwrap();
        }

        let alice = stats.stats("alice").unwrap();
        assert_eq!(alice.games_played, 3);
        assert_eq!(alice.games_won, 2);
        assert_eq!(alice.games_drawn, 1);
        assert_eq!(alice.games_lost, 0);
        assert_eq!(stats.stats("bob").unwrap(), UserStats::default());
    }
}
