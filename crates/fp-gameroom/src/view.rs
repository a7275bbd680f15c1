use super::AnswerMap;
use super::FactView;
use super::PlayerView;
use super::Settlement;
use fp_core::*;
use serde::Serialize;

/// The current turn as one viewer is allowed to see it.
/// The probed fact id is present only in the subject's own view under a
/// probing ruleset; everyone else learns the subject's identity alone.
#[derive(Clone, Debug, Serialize)]
pub struct TurnView {
    pub player_id: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_id: Option<FactId>,
}

/// The reveal payload pushed once the room reaches its final stage.
#[derive(Clone, Debug, Serialize)]
pub struct GameResult {
    pub own_answer: Option<AnswerMap>,
    pub right_answer: Vec<(FactId, PlayerId)>,
    #[serde(flatten)]
    pub settlement: Settlement,
}

/// Personalized room snapshot: a total function of (stage, viewer).
/// Omits the viewer's own fact ownership links before the final stage,
/// and never carries another viewer's private candidate selections.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Snapshot {
    Waiting {
        room_code: String,
        leader_id: Option<PlayerId>,
        own_id: PlayerId,
        players: Vec<PlayerView>,
        ready_players: Vec<PlayerId>,
    },
    Facts {
        room_code: String,
        leader_id: Option<PlayerId>,
        own_id: PlayerId,
        players: Vec<PlayerView>,
        own_fact_id: Option<FactId>,
        facts: Vec<FactView>,
    },
    About {
        room_code: String,
        leader_id: Option<PlayerId>,
        own_id: PlayerId,
        players: Vec<PlayerView>,
        own_fact_id: Option<FactId>,
        facts: Vec<FactView>,
        current_turn: Option<TurnView>,
    },
    Turns {
        room_code: String,
        leader_id: Option<PlayerId>,
        own_id: PlayerId,
        players: Vec<PlayerView>,
        own_fact_id: Option<FactId>,
        facts: Vec<FactView>,
        current_turn: Option<TurnView>,
        candidates: Vec<(FactId, Vec<PlayerId>)>,
    },
    Answers {
        room_code: String,
        leader_id: Option<PlayerId>,
        own_id: PlayerId,
        players: Vec<PlayerView>,
        own_fact_id: Option<FactId>,
        facts: Vec<FactView>,
        candidates: Vec<(FactId, Vec<PlayerId>)>,
        answer: Option<AnswerMap>,
        answers_sent: Vec<PlayerId>,
    },
    Final {
        room_code: String,
        leader_id: Option<PlayerId>,
        own_id: PlayerId,
        players: Vec<PlayerView>,
        own_fact_id: Option<FactId>,
        facts: Vec<FactView>,
        result: GameResult,
    },
}
