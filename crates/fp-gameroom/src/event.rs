use super::FactView;
use super::PlayerView;
use super::Snapshot;
use fp_core::*;
use serde::Serialize;

/// Server-initiated events broadcast to room participants.
/// Serialized adjacently tagged so the wire shape is `{key, data}`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "key", content = "data", rename_all = "snake_case")]
pub enum GameEvent {
    /// Full personalized snapshot, pushed on every stage transition.
    RoomStateLoad { state: Snapshot },
    /// A new player joined the waiting room.
    PlayerNew { player: PlayerView },
    /// A player toggled their ready flag.
    PlayerReadyState { player_id: PlayerId, state: bool },
    /// A player's connection dropped mid-game.
    PlayerDisconnect { player_id: PlayerId },
    /// A previously seated player came back.
    PlayerReconnect { player_id: PlayerId },
    /// A player left the waiting room and was removed from the roster.
    PlayerExclude { player_id: PlayerId },
    /// A player was guessed out of an elimination game.
    PlayerDropped {
        player_id: PlayerId,
        fact_id: FactId,
        by_player_id: PlayerId,
        score: Score,
    },
    /// The leader docked points from a stalling player.
    PlayerPunished { player_id: PlayerId, score: Score },
    /// Leadership moved to another player.
    LeaderSwitch { player_id: PlayerId },
    /// A fact was submitted.
    FactNew { fact: FactView },
    /// A fact was withdrawn by its owner.
    FactDrop { fact_id: FactId },
    /// The turn moved on. The probed fact id rides along only in the
    /// frame unicast to the new subject.
    TurnNew {
        player_id: PlayerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        fact_id: Option<FactId>,
    },
    /// A live guess missed. The true owner is not disclosed.
    AnswerMistake {
        player_id: PlayerId,
        fact_id: FactId,
        suspect_id: PlayerId,
        score: Score,
    },
    /// A player submitted their final answer (content withheld).
    AnswerSent { player_id: PlayerId },
    /// A player withdrew their final answer.
    AnswerDrop { player_id: PlayerId },
}

/// Point reply to one player action: a descriptive error, or a success
/// payload specific to the action.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    Error(String),
    Success(serde_json::Value),
}

/// Outbound wire frames.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Broadcast event, fire-and-forget.
    Event {
        #[serde(flatten)]
        event: GameEvent,
    },
    /// Point response correlated to one inbound action.
    Answer { nonce: String, data: Reply },
    /// Connection-time refusal, sent before the socket is closed.
    ErrorConnection { reason: String },
}

impl Frame {
    pub fn event(event: GameEvent) -> Self {
        Self::Event { event }
    }
    pub fn answer(nonce: String, data: Reply) -> Self {
        Self::Answer { nonce, data }
    }
    pub fn refusal(reason: &str) -> Self {
        Self::ErrorConnection {
            reason: reason.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize frame")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_frame_wire_shape() {
        let frame = Frame::event(GameEvent::FactDrop { fact_id: 2 });
        let json: serde_json::Value = serde_json::from_str(&frame.to_json()).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["key"], "fact_drop");
        assert_eq!(json["data"]["fact_id"], 2);
    }
    #[test]
    fn answer_frame_carries_nonce_and_error() {
        let frame = Frame::answer("n-1".to_string(), Reply::Error("nope".to_string()));
        let json: serde_json::Value = serde_json::from_str(&frame.to_json()).unwrap();
        assert_eq!(json["type"], "answer");
        assert_eq!(json["nonce"], "n-1");
        assert_eq!(json["data"]["error"], "nope");
    }
    #[test]
    fn turn_event_hides_absent_probe() {
        let frame = Frame::event(GameEvent::TurnNew {
            player_id: 5,
            fact_id: None,
        });
        let json: serde_json::Value = serde_json::from_str(&frame.to_json()).unwrap();
        assert!(json["data"].get("fact_id").is_none());
    }
}
