use super::*;
use fp_core::*;
use serde_json::json;

/// Dispatch layer between raw wire text and [`Room`] operations.
///
/// Every inbound frame produces exactly one point reply carrying the
/// request's nonce, whether the operation succeeded or was refused.
/// Broadcasts triggered by the operation are the room's business.
pub struct Protocol;

impl Protocol {
    /// Decode one inbound text frame, run it against the room, and
    /// return the serialized point reply for the calling player.
    pub fn apply(room: &mut Room, player: PlayerId, text: &str) -> String {
        match serde_json::from_str::<ActionFrame>(text) {
            Ok(frame) => {
                log::debug!("[protocol] player {} -> {:?}", player, frame.action);
                let reply = match Self::dispatch(room, player, frame.action) {
                    Ok(payload) => Reply::Success(payload),
                    Err(e) => Reply::Error(e.to_string()),
                };
                Frame::answer(frame.nonce, reply).to_json()
            }
            Err(e) => {
                // salvage the nonce so the client can still correlate
                let nonce = serde_json::from_str::<serde_json::Value>(text)
                    .ok()
                    .and_then(|v| v.get("nonce").and_then(|n| n.as_str()).map(String::from))
                    .unwrap_or_default();
                log::warn!("[protocol] player {} sent malformed frame: {}", player, e);
                Frame::answer(nonce, Reply::Error(format!("malformed request: {}", e))).to_json()
            }
        }
    }
    fn dispatch(
        room: &mut Room,
        player: PlayerId,
        action: Action,
    ) -> Result<serde_json::Value, RoomError> {
        match action {
            Action::SendReadyState { state } => {
                room.set_ready(player, state).map(|s| json!({ "state": s }))
            }
            Action::StartFacts {} => room.start_facts(player).map(|_| json!({})),
            Action::FactAdd { text } => {
                room.add_fact(player, &text).map(|fact| json!({ "fact": fact }))
            }
            Action::FactDrop {} => room.drop_fact(player).map(|_| json!({})),
            Action::StartAbout {} => room.start_about(player).map(|_| json!({})),
            Action::NextTurn {} => room
                .next_turn(player)
                .map(|next| json!({ "next_player_id": next })),
            Action::LeaderSkipTurn {} => room
                .leader_skip_turn(player)
                .map(|next| json!({ "next_player_id": next })),
            Action::ChangeCandidates { fact_id, players } => room
                .set_candidates(player, fact_id, players)
                .map(|_| json!({})),
            Action::AnswerSend { answer } => room.submit_answer(player, answer).map(|_| json!({})),
            Action::AnswerDrop {} => room.retract_answer(player).map(|_| json!({})),
            Action::FinishGame {} => room.finalize(player).map(|_| json!({})),
            Action::GuessOwner { player_id } => room
                .guess_owner(player, player_id)
                .map(|hit| json!({ "hit": hit })),
            Action::PunishPlayer { player_id } => room
                .punish(player, player_id)
                .map(|score| json!({ "score": score })),
        }
    }
}
