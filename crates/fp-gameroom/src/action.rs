use super::AnswerMap;
use fp_core::*;
use serde::Deserialize;

/// Closed set of player-initiated operations.
/// The wire shape is `{key, data}`; an unknown key fails deserialization
/// instead of falling through a runtime handler lookup.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "key", content = "data", rename_all = "snake_case")]
pub enum Action {
    SendReadyState { state: bool },
    StartFacts {},
    FactAdd { text: String },
    FactDrop {},
    StartAbout {},
    NextTurn {},
    LeaderSkipTurn {},
    ChangeCandidates { fact_id: FactId, players: Vec<PlayerId> },
    AnswerSend { answer: AnswerMap },
    AnswerDrop {},
    FinishGame {},
    GuessOwner { player_id: PlayerId },
    PunishPlayer { player_id: PlayerId },
}

/// One inbound action frame: `{key, nonce, data}`.
/// The nonce correlates the point response back to this request.
#[derive(Clone, Debug, Deserialize)]
pub struct ActionFrame {
    pub nonce: String,
    #[serde(flatten)]
    pub action: Action,
}
