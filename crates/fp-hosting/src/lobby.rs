use super::code;
use fp_gameroom::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Ruleset selectable once at room creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ruleset {
    /// Every seat gets a turn each lap; written answers at the end.
    #[default]
    Fixed,
    /// Probed facts, live accusations, players guessed out of the game.
    Elimination,
}

impl Ruleset {
    fn rotation(self) -> Box<dyn Rotation> {
        match self {
            Self::Fixed => Box::new(FixedRotation::default()),
            Self::Elimination => Box::new(EliminationRotation),
        }
    }
}

impl std::str::FromStr for Ruleset {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "elimination" => Ok(Self::Elimination),
            other => Err(anyhow::anyhow!("unknown ruleset: {}", other)),
        }
    }
}

/// Manages active game rooms and their lifecycles.
///
/// Each room sits behind its own mutex so its state machine runs its
/// handlers to completion one at a time; the registry lock is only held
/// long enough to look a room up or change the set of open rooms.
pub struct Lobby {
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }
    /// Open a new room under a freshly generated code.
    pub async fn open(&self, ruleset: Ruleset) -> anyhow::Result<String> {
        let mut rooms = self.rooms.write().await;
        for _ in 0..32 {
            let code = code::generate();
            if !rooms.contains_key(&code) {
                let room = Room::new(&code, ruleset.rotation());
                rooms.insert(code.clone(), Arc::new(Mutex::new(room)));
                log::info!("[lobby] opened room {} ({:?}), {} active", code, ruleset, rooms.len());
                return Ok(code);
            }
        }
        Err(anyhow::anyhow!("room code space exhausted"))
    }
    pub async fn find(&self, code: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(code).cloned()
    }
    pub async fn count(&self) -> usize {
        self.rooms.read().await.len()
    }
    /// Close every room whose idle deadline has lapsed with nobody
    /// connected. Called periodically by the hosting server.
    pub async fn sweep(&self) {
        let now = Instant::now();
        let candidates: Vec<(String, Arc<Mutex<Room>>)> = self
            .rooms
            .read()
            .await
            .iter()
            .map(|(code, room)| (code.clone(), room.clone()))
            .collect();
        let mut closable = Vec::new();
        for (code, room) in candidates {
            if room.lock().await.should_close(now) {
                closable.push(code);
            }
        }
        if closable.is_empty() {
            return;
        }
        let mut rooms = self.rooms.write().await;
        for code in closable {
            // re-check under the write lock: a join may have raced the sweep
            let still_closable = match rooms.get(&code) {
                Some(room) => room.lock().await.should_close(now),
                None => false,
            };
            if still_closable {
                rooms.remove(&code);
                log::info!("[lobby] closed idle room {}, {} active", code, rooms.len());
            }
        }
    }
}
