use super::*;
use fp_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use tokio::time::Instant;

/// Position in the fixed game-progression state machine.
/// Transitions are monotonic: a room never reverts to an earlier stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Waiting,
    Facts,
    About,
    Turns,
    Answers,
    Final,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Facts => "facts",
            Self::About => "about",
            Self::Turns => "turns",
            Self::Answers => "answers",
            Self::Final => "final",
        };
        write!(f, "{}", name)
    }
}

/// One isolated game session keyed by a short code.
///
/// The room validates every player action against its current stage,
/// mutates state, consults the rotation policy, and notifies affected
/// participants with personalized views. All mutation happens inside
/// single-threaded run-to-completion handlers; the hosting layer wraps
/// each room in its own mutex to preserve that discipline.
pub struct Room {
    code: String,
    stage: Stage,
    leader: Option<PlayerId>,
    participants: Vec<Participant>,
    facts: Vec<Fact>,
    fact_seq: FactId,
    current_turn: Option<PlayerId>,
    probed: Option<FactId>,
    candidates: BTreeMap<PlayerId, BTreeMap<FactId, BTreeSet<PlayerId>>>,
    answers: BTreeMap<PlayerId, AnswerMap>,
    settlement: Option<Settlement>,
    rotation: Box<dyn Rotation>,
    idle: IdleTimer,
    rng: SmallRng,
}

impl Room {
    /// Open an empty room. The vacant fuse is armed immediately so a
    /// room nobody ever joins gets swept away.
    pub fn new(code: &str, rotation: Box<dyn Rotation>) -> Self {
        let mut idle = IdleTimer::with_defaults();
        idle.arm_vacant(Instant::now());
        Self {
            code: code.to_string(),
            stage: Stage::Waiting,
            leader: None,
            participants: Vec::new(),
            facts: Vec::new(),
            fact_seq: 1,
            current_turn: None,
            probed: None,
            candidates: BTreeMap::new(),
            answers: BTreeMap::new(),
            settlement: None,
            rotation,
            idle,
            rng: SmallRng::from_os_rng(),
        }
    }
    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn stage(&self) -> Stage {
        self.stage
    }
    pub fn leader(&self) -> Option<PlayerId> {
        self.leader
    }
    /// Eligible for teardown: the idle deadline has passed and nobody is
    /// connected. Safe to poll at any time; a stale deadline is a no-op.
    pub fn should_close(&self, now: Instant) -> bool {
        self.idle.expired(now) && !self.participants.iter().any(|p| p.connected())
    }
}

/// Connection lifecycle.
impl Room {
    /// Seat a new player or re-attach a known one.
    /// New seats are only created while the room is still waiting.
    pub fn connect(&mut self, id: PlayerId, name: &str, outbox: Outbox) -> Result<(), RoomError> {
        match self.participants.iter().position(|p| p.id() == id) {
            Some(index) if self.participants[index].connected() => {
                return Err(RoomError::DuplicateSession);
            }
            Some(index) => {
                self.participants[index].attach(outbox);
                log::info!("[room {}] player {} reconnected", self.code, id);
                self.notify(
                    GameEvent::PlayerReconnect { player_id: id },
                    &Audience::except([id]),
                );
            }
            None => {
                if self.stage != Stage::Waiting {
                    return Err(RoomError::GameStarted);
                }
                let participant = Participant::new(id, name, outbox);
                let view = participant.view(None);
                self.participants.push(participant);
                log::info!("[room {}] player {} ({}) joined", self.code, id, name);
                self.notify(
                    GameEvent::PlayerNew { player: view },
                    &Audience::except([id]),
                );
            }
        }
        if self.leader.is_none() {
            self.elect_leader();
        }
        self.push_state(&Audience::only([id]));
        self.idle.clear();
        Ok(())
    }
    /// Handle a dropped connection. In the waiting stage the player is
    /// removed from the roster entirely; later stages only mark them
    /// disconnected so they can come back.
    pub fn disconnect(&mut self, id: PlayerId) {
        let Some(index) = self.participants.iter().position(|p| p.id() == id) else {
            return;
        };
        self.participants[index].detach();
        log::info!("[room {}] player {} disconnected", self.code, id);
        if self.stage == Stage::Waiting {
            self.participants.remove(index);
            self.notify(GameEvent::PlayerExclude { player_id: id }, &Audience::everyone());
        } else {
            self.notify(
                GameEvent::PlayerDisconnect { player_id: id },
                &Audience::except([id]),
            );
        }
        if self.leader == Some(id) {
            self.leader = None;
            self.elect_leader();
        }
        if matches!(self.stage, Stage::About | Stage::Turns)
            && self.rotation.exhausted(&self.participants)
        {
            self.conclude();
            self.push_state(&Audience::everyone());
        }
        if !self.participants.iter().any(|p| p.connected()) {
            self.idle.arm_abandoned(Instant::now());
        }
    }
    fn elect_leader(&mut self) {
        self.leader = self.participants.iter().find(|p| p.connected()).map(|p| p.id());
        if let Some(id) = self.leader {
            log::info!("[room {}] player {} is now leader", self.code, id);
            self.notify(GameEvent::LeaderSwitch { player_id: id }, &Audience::everyone());
        }
    }
}

/// Waiting stage.
impl Room {
    pub fn set_ready(&mut self, id: PlayerId, state: bool) -> Result<bool, RoomError> {
        if self.stage != Stage::Waiting {
            return Err(RoomError::WrongStage);
        }
        self.participants
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(RoomError::UnknownPlayer)?
            .set_ready(state);
        self.notify(
            GameEvent::PlayerReadyState { player_id: id, state },
            &Audience::except([id]),
        );
        Ok(state)
    }
    pub fn start_facts(&mut self, id: PlayerId) -> Result<(), RoomError> {
        if self.leader != Some(id) {
            return Err(RoomError::NotLeader);
        }
        if self.stage != Stage::Waiting {
            return Err(RoomError::WrongStage);
        }
        if !self.participants.iter().all(|p| p.id() == id || p.ready()) {
            return Err(RoomError::PlayersNotReady);
        }
        if self.participants.len() < MIN_PLAYERS {
            return Err(RoomError::NotEnoughPlayers);
        }
        self.enter(Stage::Facts);
        self.push_state(&Audience::everyone());
        Ok(())
    }
}

/// Facts stage.
impl Room {
    pub fn add_fact(&mut self, id: PlayerId, text: &str) -> Result<FactView, RoomError> {
        if self.stage != Stage::Facts {
            return Err(RoomError::WrongStage);
        }
        if self.facts.iter().any(|f| f.owner() == id) {
            return Err(RoomError::FactExists);
        }
        let fact = Fact::new(self.fact_seq, text.to_string(), id);
        self.fact_seq += 1;
        let view = fact.view();
        self.facts.push(fact);
        self.notify(
            GameEvent::FactNew { fact: view.clone() },
            &Audience::except([id]),
        );
        Ok(view)
    }
    pub fn drop_fact(&mut self, id: PlayerId) -> Result<(), RoomError> {
        if self.stage != Stage::Facts {
            return Err(RoomError::WrongStage);
        }
        let index = self
            .facts
            .iter()
            .position(|f| f.owner() == id)
            .ok_or(RoomError::NoFact)?;
        let fact = self.facts.remove(index);
        self.notify(
            GameEvent::FactDrop { fact_id: fact.id() },
            &Audience::except([id]),
        );
        Ok(())
    }
    pub fn start_about(&mut self, id: PlayerId) -> Result<(), RoomError> {
        if self.leader != Some(id) {
            return Err(RoomError::NotLeader);
        }
        if self.stage != Stage::Facts {
            return Err(RoomError::WrongStage);
        }
        if !self
            .participants
            .iter()
            .all(|p| self.facts.iter().any(|f| f.owner() == p.id()))
        {
            return Err(RoomError::FactsIncomplete);
        }
        self.enter(Stage::About);
        self.candidates = self
            .participants
            .iter()
            .map(|p| {
                let slate = self
                    .facts
                    .iter()
                    .filter(|f| f.owner() != p.id())
                    .map(|f| (f.id(), BTreeSet::new()))
                    .collect();
                (p.id(), slate)
            })
            .collect();
        self.rotate();
        self.push_state(&Audience::everyone());
        Ok(())
    }
}

/// Turn-based stages.
impl Room {
    pub fn next_turn(&mut self, id: PlayerId) -> Result<Option<PlayerId>, RoomError> {
        if !matches!(self.stage, Stage::About | Stage::Turns) {
            return Err(RoomError::WrongStage);
        }
        if self.current_turn != Some(id) {
            return Err(RoomError::NotYourTurn);
        }
        Ok(self.advance(id))
    }
    /// Leader override for a stalled turn.
    pub fn leader_skip_turn(&mut self, id: PlayerId) -> Result<Option<PlayerId>, RoomError> {
        if !matches!(self.stage, Stage::About | Stage::Turns) {
            return Err(RoomError::WrongStage);
        }
        if self.leader != Some(id) {
            return Err(RoomError::NotLeader);
        }
        Ok(self.advance(id))
    }
    /// Live accusation under a probing ruleset: the current subject names
    /// who they think owns the probed fact. A hit eliminates the owner
    /// and reveals their fact; a miss costs the guesser points. Either
    /// way the turn moves on, and the game ends the moment too few
    /// eligible players remain.
    pub fn guess_owner(&mut self, id: PlayerId, suspect: PlayerId) -> Result<bool, RoomError> {
        if self.stage != Stage::Turns || !self.rotation.probes() {
            return Err(RoomError::WrongStage);
        }
        if self.current_turn != Some(id) {
            return Err(RoomError::NotYourTurn);
        }
        let Some(fact_id) = self.probed else {
            return Err(RoomError::WrongStage);
        };
        let accused = self
            .participants
            .iter()
            .find(|p| p.id() == suspect)
            .ok_or(RoomError::UnknownPlayer)?;
        if accused.dropped() {
            return Err(RoomError::TargetDropped);
        }
        let owner = self.facts.iter().find(|f| f.id() == fact_id).map(|f| f.owner());
        let hit = owner == Some(suspect);
        if hit {
            if let Some(p) = self.participants.iter_mut().find(|p| p.id() == suspect) {
                p.drop_out(id);
            }
            let score = self.reward(id, GUESS_REWARD);
            log::info!(
                "[room {}] player {} guessed out {} with fact {}",
                self.code,
                id,
                suspect,
                fact_id
            );
            self.notify(
                GameEvent::PlayerDropped {
                    player_id: suspect,
                    fact_id,
                    by_player_id: id,
                    score,
                },
                &Audience::everyone(),
            );
        } else {
            let score = self.reward(id, -MISTAKE_PENALTY);
            self.notify(
                GameEvent::AnswerMistake {
                    player_id: id,
                    fact_id,
                    suspect_id: suspect,
                    score,
                },
                &Audience::everyone(),
            );
        }
        self.advance(id);
        Ok(hit)
    }
    /// Leader deducts points from the player currently holding up the game.
    /// Live score deltas only exist under a probing ruleset; the fixed
    /// ruleset settles scores once at finalization and would discard them.
    pub fn punish(&mut self, id: PlayerId, target: PlayerId) -> Result<Score, RoomError> {
        if !matches!(self.stage, Stage::About | Stage::Turns) || !self.rotation.probes() {
            return Err(RoomError::WrongStage);
        }
        if self.leader != Some(id) {
            return Err(RoomError::NotLeader);
        }
        if !self.participants.iter().any(|p| p.id() == target) {
            return Err(RoomError::UnknownPlayer);
        }
        if self.current_turn != Some(target) {
            return Err(RoomError::NotTheSubject);
        }
        let score = self.reward(target, -PUNISH_PENALTY);
        self.notify(
            GameEvent::PlayerPunished {
                player_id: target,
                score,
            },
            &Audience::everyone(),
        );
        Ok(score)
    }
    /// Record the viewer's private suspect list for one foreign fact.
    /// Pure working state: no broadcast, no side effect beyond storage.
    pub fn set_candidates(
        &mut self,
        id: PlayerId,
        fact_id: FactId,
        suspects: Vec<PlayerId>,
    ) -> Result<(), RoomError> {
        if !matches!(self.stage, Stage::Turns | Stage::Answers) {
            return Err(RoomError::WrongStage);
        }
        if self.fact_of(id).map(|f| f.id()) == Some(fact_id) {
            return Err(RoomError::OwnFact);
        }
        if !suspects
            .iter()
            .all(|s| self.participants.iter().any(|p| p.id() == *s))
        {
            return Err(RoomError::UnknownSuspect);
        }
        let slate = self
            .candidates
            .get_mut(&id)
            .and_then(|m| m.get_mut(&fact_id))
            .ok_or(RoomError::UnknownFact)?;
        *slate = suspects.into_iter().collect();
        Ok(())
    }
    fn advance(&mut self, caller: PlayerId) -> Option<PlayerId> {
        let before = self.stage;
        self.rotate();
        if before != self.stage {
            self.push_state(&Audience::everyone());
            return None;
        }
        self.announce_turn(caller);
        self.current_turn
    }
    fn rotate(&mut self) {
        self.probed = None;
        loop {
            if self.rotation.exhausted(&self.participants) {
                self.conclude();
                return;
            }
            match self.rotation.next(&self.participants, self.current_turn) {
                Some(next) => {
                    self.current_turn = Some(next);
                    if self.stage == Stage::Turns && self.rotation.probes() {
                        self.probed = self.pick_probe(next);
                        if self.probed.is_none() {
                            self.conclude();
                        }
                    }
                    return;
                }
                None => {
                    self.current_turn = None;
                    match self.stage {
                        Stage::About => self.enter(Stage::Turns),
                        Stage::Turns => match self.rotation.lap() {
                            Verdict::Continue => {}
                            Verdict::Finish => {
                                self.finish_round();
                                return;
                            }
                        },
                        _ => return,
                    }
                }
            }
        }
    }
    fn finish_round(&mut self) {
        if self.rotation.collects_answers() {
            self.enter(Stage::Answers);
        } else {
            self.conclude();
        }
    }
    /// Probe a random fact whose owner is still in the game and isn't
    /// the subject themselves.
    fn pick_probe(&mut self, subject: PlayerId) -> Option<FactId> {
        let pool: Vec<FactId> = self
            .facts
            .iter()
            .filter(|f| f.owner() != subject)
            .filter(|f| {
                self.participants
                    .iter()
                    .any(|p| p.id() == f.owner() && !p.dropped())
            })
            .map(|f| f.id())
            .collect();
        if pool.is_empty() {
            None
        } else {
            Some(pool[self.rng.random_range(0..pool.len())])
        }
    }
    fn announce_turn(&self, skip: PlayerId) {
        let Some(subject) = self.current_turn else {
            return;
        };
        if let Some(fact_id) = self.probed {
            // only the subject learns which fact is being probed
            self.notify(
                GameEvent::TurnNew {
                    player_id: subject,
                    fact_id: Some(fact_id),
                },
                &Audience::only([subject]),
            );
            self.notify(
                GameEvent::TurnNew {
                    player_id: subject,
                    fact_id: None,
                },
                &Audience::except(vec![subject, skip]),
            );
        } else {
            self.notify(
                GameEvent::TurnNew {
                    player_id: subject,
                    fact_id: None,
                },
                &Audience::except([skip]),
            );
        }
    }
}

/// Answers stage and finalization.
impl Room {
    pub fn submit_answer(&mut self, id: PlayerId, answer: AnswerMap) -> Result<(), RoomError> {
        if self.stage != Stage::Answers {
            return Err(RoomError::WrongStage);
        }
        if self.answers.contains_key(&id) {
            return Err(RoomError::AlreadyAnswered);
        }
        validate(id, &answer, &self.facts, &self.participants)?;
        self.answers.insert(id, answer);
        self.notify(GameEvent::AnswerSent { player_id: id }, &Audience::except([id]));
        Ok(())
    }
    pub fn retract_answer(&mut self, id: PlayerId) -> Result<(), RoomError> {
        if self.stage != Stage::Answers {
            return Err(RoomError::WrongStage);
        }
        if self.answers.remove(&id).is_none() {
            return Err(RoomError::NoAnswer);
        }
        self.notify(GameEvent::AnswerDrop { player_id: id }, &Audience::except([id]));
        Ok(())
    }
    pub fn finalize(&mut self, id: PlayerId) -> Result<(), RoomError> {
        if self.stage != Stage::Answers {
            return Err(RoomError::WrongStage);
        }
        if self.leader != Some(id) {
            return Err(RoomError::NotLeader);
        }
        if !self
            .participants
            .iter()
            .all(|p| self.answers.contains_key(&p.id()))
        {
            return Err(RoomError::AnswersIncomplete);
        }
        self.conclude();
        self.push_state(&Audience::everyone());
        Ok(())
    }
    /// Terminal transition: settle scores once and freeze the result.
    fn conclude(&mut self) {
        if self.stage == Stage::Final {
            return;
        }
        self.enter(Stage::Final);
        self.current_turn = None;
        self.probed = None;
        let settlement = if self.rotation.collects_answers() {
            settle(&self.facts, &self.participants, &self.answers)
        } else {
            Settlement {
                result_table: self
                    .participants
                    .iter()
                    .map(|p| (p.id(), p.score()))
                    .collect(),
                guesses: self
                    .participants
                    .iter()
                    .filter(|p| p.dropped())
                    .filter_map(|p| {
                        self.fact_of(p.id()).map(|f| GuessRecord {
                            player_id: p.id(),
                            fact_id: f.id(),
                            guessed_by: p.dropped_by().into_iter().collect(),
                        })
                    })
                    .collect(),
            }
        };
        for (id, score) in settlement.result_table.clone() {
            if let Some(p) = self.participants.iter_mut().find(|p| p.id() == id) {
                p.reward(score - p.score());
            }
        }
        self.settlement = Some(settlement);
        log::info!("[room {}] game finished", self.code);
    }
}

/// Views and delivery.
impl Room {
    /// Personalized snapshot: a total function of (stage, viewer).
    pub fn snapshot(&self, viewer: PlayerId) -> Snapshot {
        let room_code = self.code.clone();
        let leader_id = self.leader;
        let players: Vec<PlayerView> = self
            .participants
            .iter()
            .map(|p| self.player_view(p))
            .collect();
        let facts: Vec<FactView> = self.facts.iter().map(Fact::view).collect();
        let own_fact_id = self.fact_of(viewer).map(|f| f.id());
        let current_turn = self.current_turn.map(|subject| TurnView {
            player_id: subject,
            fact_id: self.probed.filter(|_| subject == viewer),
        });
        let candidates: Vec<(FactId, Vec<PlayerId>)> = self
            .candidates
            .get(&viewer)
            .map(|m| {
                m.iter()
                    .map(|(f, s)| (*f, s.iter().copied().collect()))
                    .collect()
            })
            .unwrap_or_default();
        match self.stage {
            Stage::Waiting => Snapshot::Waiting {
                room_code,
                leader_id,
                own_id: viewer,
                players,
                ready_players: self
                    .participants
                    .iter()
                    .filter(|p| p.ready())
                    .map(|p| p.id())
                    .collect(),
            },
            Stage::Facts => Snapshot::Facts {
                room_code,
                leader_id,
                own_id: viewer,
                players,
                own_fact_id,
                facts,
            },
            Stage::About => Snapshot::About {
                room_code,
                leader_id,
                own_id: viewer,
                players,
                own_fact_id,
                facts,
                current_turn,
            },
            Stage::Turns => Snapshot::Turns {
                room_code,
                leader_id,
                own_id: viewer,
                players,
                own_fact_id,
                facts,
                current_turn,
                candidates,
            },
            Stage::Answers => Snapshot::Answers {
                room_code,
                leader_id,
                own_id: viewer,
                players,
                own_fact_id,
                facts,
                candidates,
                answer: self.answers.get(&viewer).cloned(),
                answers_sent: self.answers.keys().copied().collect(),
            },
            Stage::Final => Snapshot::Final {
                room_code,
                leader_id,
                own_id: viewer,
                players,
                own_fact_id,
                facts,
                result: GameResult {
                    own_answer: self.answers.get(&viewer).cloned(),
                    right_answer: self.facts.iter().map(|f| (f.id(), f.owner())).collect(),
                    settlement: self.settlement.clone().unwrap_or_default(),
                },
            },
        }
    }
    fn player_view(&self, p: &Participant) -> PlayerView {
        let known_fact = if p.dropped() {
            self.fact_of(p.id()).map(|f| f.id())
        } else {
            None
        };
        p.view(known_fact)
    }
    fn fact_of(&self, id: PlayerId) -> Option<&Fact> {
        self.facts.iter().find(|f| f.owner() == id)
    }
    fn reward(&mut self, id: PlayerId, delta: Score) -> Score {
        match self.participants.iter_mut().find(|p| p.id() == id) {
            Some(p) => {
                p.reward(delta);
                p.score()
            }
            None => 0,
        }
    }
    fn enter(&mut self, stage: Stage) {
        debug_assert!(stage > self.stage, "stage transitions never revert");
        log::info!("[room {}] stage {} -> {}", self.code, self.stage, stage);
        self.stage = stage;
    }
    fn notify(&self, event: GameEvent, audience: &Audience) {
        log::trace!("[room {}] broadcast: {:?}", self.code, event);
        deliver(&self.participants, audience, &Frame::event(event).to_json());
    }
    fn push_state(&self, audience: &Audience) {
        targets(&self.participants, audience)
            .filter(|p| p.connected())
            .for_each(|p| {
                let frame = Frame::event(GameEvent::RoomStateLoad {
                    state: self.snapshot(p.id()),
                });
                p.send(&frame.to_json());
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn fixed_room() -> Room {
        Room::new("TEST", Box::new(FixedRotation::default()))
    }
    fn elimination_room() -> Room {
        Room::new("TEST", Box::new(EliminationRotation))
    }
    fn join(room: &mut Room, id: PlayerId) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();
        room.connect(id, &format!("p{}", id), tx).unwrap();
        rx
    }
    /// Seat four players and play through fact submission into `about`.
    fn into_about(room: &mut Room) -> Vec<UnboundedReceiver<String>> {
        let rx: Vec<_> = (1..=4).map(|id| join(room, id)).collect();
        for id in 2..=4 {
            room.set_ready(id, true).unwrap();
        }
        room.start_facts(1).unwrap();
        for id in 1..=4 {
            room.add_fact(id, &format!("fact of {}", id)).unwrap();
        }
        room.start_about(1).unwrap();
        rx
    }
    /// Run the fixed rotation until the room leaves the turn stages.
    fn into_answers(room: &mut Room) {
        let mut guard = 0;
        while matches!(room.stage(), Stage::About | Stage::Turns) {
            let subject = room.current_turn.unwrap();
            room.next_turn(subject).unwrap();
            guard += 1;
            assert!(guard < 100, "rotation failed to terminate");
        }
    }

    #[test]
    fn first_joiner_becomes_leader() {
        let mut room = fixed_room();
        let _rx = join(&mut room, 1);
        let _rx2 = join(&mut room, 2);
        assert_eq!(room.leader(), Some(1));
    }
    #[test]
    fn duplicate_session_is_rejected() {
        let mut room = fixed_room();
        let _rx = join(&mut room, 1);
        let (tx, _rx2) = unbounded_channel();
        assert_eq!(room.connect(1, "p1", tx), Err(RoomError::DuplicateSession));
    }
    #[test]
    fn unknown_player_cannot_join_started_game() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        let (tx, _rx2) = unbounded_channel();
        assert_eq!(room.connect(9, "late", tx), Err(RoomError::GameStarted));
    }
    #[test]
    fn reconnect_replaces_handle_without_duplicating_roster() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        room.disconnect(2);
        assert_eq!(room.participants.len(), 4);
        let (tx, _rx2) = unbounded_channel();
        room.connect(2, "p2", tx).unwrap();
        assert_eq!(room.participants.len(), 4);
        assert!(room.participants.iter().find(|p| p.id() == 2).unwrap().connected());
    }
    #[test]
    fn start_facts_guards() {
        let mut room = fixed_room();
        let _rx: Vec<_> = (1..=4).map(|id| join(&mut room, id)).collect();
        assert_eq!(room.start_facts(2), Err(RoomError::NotLeader));
        assert_eq!(room.start_facts(1), Err(RoomError::PlayersNotReady));
        for id in 2..=4 {
            room.set_ready(id, true).unwrap();
        }
        room.start_facts(1).unwrap();
        assert_eq!(room.stage(), Stage::Facts);
        // stage never reverts: re-running the transition is refused
        assert_eq!(room.start_facts(1), Err(RoomError::WrongStage));
    }
    #[test]
    fn start_facts_requires_four_players() {
        let mut room = fixed_room();
        let _rx: Vec<_> = (1..=3).map(|id| join(&mut room, id)).collect();
        for id in 2..=3 {
            room.set_ready(id, true).unwrap();
        }
        assert_eq!(room.start_facts(1), Err(RoomError::NotEnoughPlayers));
    }
    #[test]
    fn one_fact_per_participant() {
        let mut room = fixed_room();
        let _rx: Vec<_> = (1..=4).map(|id| join(&mut room, id)).collect();
        for id in 2..=4 {
            room.set_ready(id, true).unwrap();
        }
        room.start_facts(1).unwrap();
        room.add_fact(1, "first").unwrap();
        assert_eq!(room.add_fact(1, "second"), Err(RoomError::FactExists));
        room.drop_fact(1).unwrap();
        assert_eq!(room.drop_fact(1), Err(RoomError::NoFact));
        room.add_fact(1, "third").unwrap();
        assert_eq!(room.facts.len(), 1);
    }
    #[test]
    fn start_about_requires_all_facts() {
        let mut room = fixed_room();
        let _rx: Vec<_> = (1..=4).map(|id| join(&mut room, id)).collect();
        for id in 2..=4 {
            room.set_ready(id, true).unwrap();
        }
        room.start_facts(1).unwrap();
        room.add_fact(1, "only one").unwrap();
        assert_eq!(room.start_about(1), Err(RoomError::FactsIncomplete));
    }
    #[test]
    fn fact_count_matches_roster_after_about() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        assert_eq!(room.facts.len(), room.participants.len());
    }
    #[test]
    fn about_lap_advances_to_turns() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        assert_eq!(room.stage(), Stage::About);
        assert_eq!(room.current_turn, Some(1));
        for id in 1..=3 {
            assert_eq!(room.next_turn(id).unwrap(), Some(id + 1));
        }
        // the lap closes and the stage advances automatically
        assert_eq!(room.next_turn(4).unwrap(), None);
        assert_eq!(room.stage(), Stage::Turns);
        assert_eq!(room.current_turn, Some(1));
    }
    #[test]
    fn next_turn_rejects_non_subject() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        assert_eq!(room.next_turn(3), Err(RoomError::NotYourTurn));
    }
    #[test]
    fn leader_may_skip_any_turn() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        assert_eq!(room.leader_skip_turn(1).unwrap(), Some(2));
        assert_eq!(room.leader_skip_turn(2), Err(RoomError::NotLeader));
    }
    #[test]
    fn fixed_rotation_reaches_answers_after_all_cycles() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        into_answers(&mut room);
        assert_eq!(room.stage(), Stage::Answers);
    }
    #[test]
    fn candidates_guards() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        into_answers(&mut room);
        // own fact is untouchable
        assert_eq!(room.set_candidates(1, 1, vec![2]), Err(RoomError::OwnFact));
        assert_eq!(
            room.set_candidates(1, 2, vec![99]),
            Err(RoomError::UnknownSuspect)
        );
        assert_eq!(
            room.set_candidates(1, 99, vec![2]),
            Err(RoomError::UnknownFact)
        );
        room.set_candidates(1, 2, vec![2, 3]).unwrap();
        let slate = &room.candidates[&1][&2];
        assert_eq!(slate.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    }
    #[test]
    fn candidate_map_never_tracks_own_fact() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        for p in 1..=4 {
            assert!(!room.candidates[&p].contains_key(&(p as FactId)));
            assert_eq!(room.candidates[&p].len(), 3);
        }
    }
    #[test]
    fn duplicate_target_answer_is_rejected_without_state_change() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        into_answers(&mut room);
        let bad = vec![(2, 2), (3, 2), (4, 4)];
        assert_eq!(
            room.submit_answer(1, bad),
            Err(RoomError::DuplicateTargets)
        );
        assert!(room.answers.is_empty());
    }
    #[test]
    fn finalize_requires_every_answer() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        into_answers(&mut room);
        room.submit_answer(1, vec![(2, 2), (3, 3), (4, 4)]).unwrap();
        assert_eq!(room.finalize(1), Err(RoomError::AnswersIncomplete));
        assert_eq!(
            room.submit_answer(1, vec![(2, 2), (3, 3), (4, 4)]),
            Err(RoomError::AlreadyAnswered)
        );
    }
    #[test]
    fn retraction_before_finalization() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        into_answers(&mut room);
        room.submit_answer(1, vec![(2, 2), (3, 3), (4, 4)]).unwrap();
        room.retract_answer(1).unwrap();
        assert_eq!(room.retract_answer(1), Err(RoomError::NoAnswer));
        room.submit_answer(1, vec![(2, 2), (3, 3), (4, 4)]).unwrap();
    }
    #[test]
    fn full_fixed_game_settles_scores() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        into_answers(&mut room);
        let others = |me: PlayerId| -> AnswerMap {
            (1..=4)
                .filter(|p| *p != me)
                .map(|p| (p as FactId, p))
                .collect()
        };
        for id in 1..=4 {
            room.submit_answer(id, others(id)).unwrap();
        }
        assert_eq!(room.finalize(2), Err(RoomError::NotLeader));
        room.finalize(1).unwrap();
        assert_eq!(room.stage(), Stage::Final);
        let settlement = room.settlement.as_ref().unwrap();
        // everyone guessed everyone right and was pinned by all three others
        for (_, score) in settlement.result_table.iter() {
            assert_eq!(*score, 3 * GUESS_REWARD - 3 * GUESSED_PENALTY);
        }
    }
    #[test]
    fn waiting_disconnect_removes_and_reelects() {
        let mut room = fixed_room();
        let _rx1 = join(&mut room, 1);
        let _rx2 = join(&mut room, 2);
        assert_eq!(room.leader(), Some(1));
        room.disconnect(1);
        assert_eq!(room.participants.len(), 1);
        assert_eq!(room.leader(), Some(2));
        room.disconnect(2);
        assert!(room.participants.is_empty());
        assert_eq!(room.leader(), None);
    }
    #[test]
    fn mid_game_disconnect_keeps_the_seat() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        room.disconnect(3);
        assert_eq!(room.participants.len(), 4);
        assert!(!room.participants.iter().find(|p| p.id() == 3).unwrap().connected());
    }
    #[test]
    fn abandoned_room_closes_after_grace() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        for id in 1..=4 {
            room.disconnect(id);
        }
        let now = Instant::now();
        assert!(!room.should_close(now));
        assert!(room.should_close(now + ABANDONED_GRACE));
    }
    #[test]
    fn reconnect_disarms_the_close_deadline() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        for id in 1..=4 {
            room.disconnect(id);
        }
        let (tx, _rx2) = unbounded_channel();
        room.connect(1, "p1", tx).unwrap();
        assert!(!room.should_close(Instant::now() + ABANDONED_GRACE));
    }
    #[test]
    fn snapshot_hides_probe_from_other_viewers() {
        let mut room = elimination_room();
        let _rx = into_about(&mut room);
        let mut guard = 0;
        while room.stage() == Stage::About {
            let subject = room.current_turn.unwrap();
            room.next_turn(subject).unwrap();
            guard += 1;
            assert!(guard < 10);
        }
        assert_eq!(room.stage(), Stage::Turns);
        let subject = room.current_turn.unwrap();
        assert!(room.probed.is_some());
        let own = room.snapshot(subject);
        let foreign = room.snapshot(if subject == 1 { 2 } else { 1 });
        match (own, foreign) {
            (
                Snapshot::Turns { current_turn: Some(own), .. },
                Snapshot::Turns { current_turn: Some(foreign), .. },
            ) => {
                assert_eq!(own.fact_id, room.probed);
                assert_eq!(foreign.fact_id, None);
                assert_eq!(foreign.player_id, subject);
            }
            other => panic!("unexpected snapshots {:?}", other),
        }
    }
    #[test]
    fn elimination_probe_never_targets_subject_or_dropped() {
        let mut room = elimination_room();
        let _rx = into_about(&mut room);
        while room.stage() == Stage::About {
            let subject = room.current_turn.unwrap();
            room.next_turn(subject).unwrap();
        }
        for _ in 0..8 {
            if room.stage() != Stage::Turns {
                break;
            }
            let subject = room.current_turn.unwrap();
            let probed = room.probed.unwrap();
            let owner = room.facts.iter().find(|f| f.id() == probed).unwrap().owner();
            assert_ne!(owner, subject);
            assert!(!room.participants.iter().find(|p| p.id() == owner).unwrap().dropped());
            room.next_turn(subject).unwrap();
        }
    }
    #[test]
    fn elimination_game_ends_below_three_eligible() {
        let mut room = elimination_room();
        let _rx = into_about(&mut room);
        while room.stage() == Stage::About {
            let subject = room.current_turn.unwrap();
            room.next_turn(subject).unwrap();
        }
        let mut drops = 0;
        let mut guard = 0;
        while room.stage() == Stage::Turns {
            let subject = room.current_turn.unwrap();
            let probed = room.probed.unwrap();
            let owner = room.facts.iter().find(|f| f.id() == probed).unwrap().owner();
            assert!(room.guess_owner(subject, owner).unwrap());
            drops += 1;
            guard += 1;
            assert!(guard < 10);
        }
        assert_eq!(room.stage(), Stage::Final);
        // 4 players: the second elimination leaves 2 eligible
        assert_eq!(drops, 2);
        let settlement = room.settlement.as_ref().unwrap();
        assert_eq!(settlement.guesses.len(), 2);
    }
    #[test]
    fn wrong_guess_costs_the_guesser() {
        let mut room = elimination_room();
        let _rx = into_about(&mut room);
        while room.stage() == Stage::About {
            let subject = room.current_turn.unwrap();
            room.next_turn(subject).unwrap();
        }
        let subject = room.current_turn.unwrap();
        let probed = room.probed.unwrap();
        let owner = room.facts.iter().find(|f| f.id() == probed).unwrap().owner();
        let patsy = (1..=4).find(|p| *p != owner && *p != subject).unwrap();
        assert!(!room.guess_owner(subject, patsy).unwrap());
        let guesser = room.participants.iter().find(|p| p.id() == subject).unwrap();
        assert_eq!(guesser.score(), -MISTAKE_PENALTY);
        assert!(!room.participants.iter().any(|p| p.dropped()));
    }
    #[test]
    fn dropped_player_fact_becomes_public() {
        let mut room = elimination_room();
        let _rx = into_about(&mut room);
        while room.stage() == Stage::About {
            let subject = room.current_turn.unwrap();
            room.next_turn(subject).unwrap();
        }
        let subject = room.current_turn.unwrap();
        let probed = room.probed.unwrap();
        let owner = room.facts.iter().find(|f| f.id() == probed).unwrap().owner();
        room.guess_owner(subject, owner).unwrap();
        let viewer = room.snapshot(subject);
        let players = match viewer {
            Snapshot::Turns { players, .. } | Snapshot::Final { players, .. } => players,
            other => panic!("unexpected snapshot {:?}", other),
        };
        let dropped = players.iter().find(|p| p.id == owner).unwrap();
        assert_eq!(dropped.known_fact, Some(probed));
    }
    #[test]
    fn punish_is_refused_outside_the_probing_ruleset() {
        let mut room = fixed_room();
        let _rx = into_about(&mut room);
        let subject = room.current_turn.unwrap();
        assert_eq!(room.punish(1, subject), Err(RoomError::WrongStage));
        // no live delta to lose at settlement
        assert!(room.participants.iter().all(|p| p.score() == 0));
    }
    #[test]
    fn punish_hits_only_the_current_subject() {
        let mut room = elimination_room();
        let _rx = into_about(&mut room);
        let subject = room.current_turn.unwrap();
        let bystander = (1..=4).find(|p| *p != subject).unwrap();
        assert_eq!(room.punish(2, subject), Err(RoomError::NotLeader));
        assert_eq!(room.punish(1, bystander), Err(RoomError::NotTheSubject));
        assert_eq!(room.punish(1, subject).unwrap(), -PUNISH_PENALTY);
    }
}
