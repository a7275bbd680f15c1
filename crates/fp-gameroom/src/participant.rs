use fp_core::*;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Outbound handle for one player's live connection.
/// Carries serialized frames; the WebSocket bridge drains the other end.
pub type Outbox = UnboundedSender<String>;

/// Per-room player record.
/// Created on first connection while the room is still waiting; once the
/// game has started a participant is never removed, only marked
/// disconnected by dropping its handle.
#[derive(Debug)]
pub struct Participant {
    id: PlayerId,
    name: String,
    outbox: Option<Outbox>,
    ready: bool,
    score: Score,
    dropped: bool,
    dropped_by: Option<PlayerId>,
}

impl Participant {
    pub fn new(id: PlayerId, name: &str, outbox: Outbox) -> Self {
        Self {
            id,
            name: name.to_string(),
            outbox: Some(outbox),
            ready: false,
            score: 0,
            dropped: false,
            dropped_by: None,
        }
    }
    pub fn id(&self) -> PlayerId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn ready(&self) -> bool {
        self.ready
    }
    pub fn set_ready(&mut self, state: bool) {
        self.ready = state;
    }
    pub fn score(&self) -> Score {
        self.score
    }
    pub fn reward(&mut self, delta: Score) {
        self.score += delta;
    }
    pub fn dropped(&self) -> bool {
        self.dropped
    }
    pub fn dropped_by(&self) -> Option<PlayerId> {
        self.dropped_by
    }
    /// Eliminate this player, recording who guessed them out.
    pub fn drop_out(&mut self, by: PlayerId) {
        self.dropped = true;
        self.dropped_by = Some(by);
    }
    /// True iff a live handle is attached and the channel is still open.
    pub fn connected(&self) -> bool {
        self.outbox.as_ref().map(|tx| !tx.is_closed()).unwrap_or(false)
    }
    /// Replace the transport handle on (re)connection.
    /// Returns the handle that was attached before, if any.
    pub fn attach(&mut self, outbox: Outbox) -> Option<Outbox> {
        self.outbox.replace(outbox)
    }
    /// Detach the transport handle on disconnect.
    pub fn detach(&mut self) -> Option<Outbox> {
        self.outbox.take()
    }
    /// Fire-and-forget delivery. Disconnected participants are skipped,
    /// send failures are absorbed.
    pub fn send(&self, frame: &str) {
        if let Some(tx) = self.outbox.as_ref() {
            if let Err(e) = tx.send(frame.to_string()) {
                log::warn!("[participant {}] send failed: {:?}", self.id, e);
            }
        }
    }
    /// Roster view shown to every player. `known_fact` is the participant's
    /// fact id once elimination has made their ownership public.
    pub fn view(&self, known_fact: Option<FactId>) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            connected: self.connected(),
            ready: self.ready,
            known_fact,
            score: self.score,
        }
    }
}

/// What the roster shows about a player.
#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub ready: bool,
    pub known_fact: Option<FactId>,
    pub score: Score,
}
