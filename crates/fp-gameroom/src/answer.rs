use super::Fact;
use super::Participant;
use super::RoomError;
use fp_core::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// A player's complete final guess: every foreign fact mapped to its
/// suspected owner. Wire format is a list of `[factId, playerId]` pairs.
pub type AnswerMap = Vec<(FactId, PlayerId)>;

/// Who was correctly pinned with a fact at the reveal.
#[derive(Clone, Debug, Serialize)]
pub struct GuessRecord {
    pub player_id: PlayerId,
    pub fact_id: FactId,
    pub guessed_by: Vec<PlayerId>,
}

/// Scores and per-fact guess records computed once at finalization.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Settlement {
    pub result_table: Vec<(PlayerId, Score)>,
    pub guesses: Vec<GuessRecord>,
}

/// Accept a submitted answer iff it is exactly a bijection from
/// "all facts except the submitter's own" onto "all participants except
/// the submitter". Any extra, missing, or duplicated entry is rejected.
pub fn validate(
    submitter: PlayerId,
    answer: &AnswerMap,
    facts: &[Fact],
    roster: &[Participant],
) -> Result<(), RoomError> {
    let listed_facts: BTreeSet<FactId> = answer.iter().map(|(f, _)| *f).collect();
    if listed_facts.len() != answer.len() {
        return Err(RoomError::DuplicateFacts);
    }
    let expected_facts: BTreeSet<FactId> = facts
        .iter()
        .filter(|f| f.owner() != submitter)
        .map(|f| f.id())
        .collect();
    if listed_facts != expected_facts {
        return Err(RoomError::MissingFacts);
    }
    let listed_targets: BTreeSet<PlayerId> = answer.iter().map(|(_, p)| *p).collect();
    if listed_targets.len() != answer.len() {
        return Err(RoomError::DuplicateTargets);
    }
    let expected_targets: BTreeSet<PlayerId> = roster
        .iter()
        .filter(|p| p.id() != submitter)
        .map(|p| p.id())
        .collect();
    if listed_targets != expected_targets {
        return Err(RoomError::MissingTargets);
    }
    Ok(())
}

/// Full O(N²) cross-reference of every answer against true ownership.
/// Score(p) = correct guesses × reward − times correctly guessed × penalty.
/// Runs exactly once per room; the result is immutable thereafter.
pub fn settle(
    facts: &[Fact],
    roster: &[Participant],
    answers: &BTreeMap<PlayerId, AnswerMap>,
) -> Settlement {
    let owner_of = |fact: FactId| facts.iter().find(|f| f.id() == fact).map(|f| f.owner());
    let fact_of = |player: PlayerId| facts.iter().find(|f| f.owner() == player).map(|f| f.id());
    let guessed_by = |player: PlayerId| -> Vec<PlayerId> {
        let fact = fact_of(player);
        roster
            .iter()
            .filter(|q| q.id() != player)
            .filter(|q| {
                answers
                    .get(&q.id())
                    .map(|a| a.iter().any(|&(f, t)| Some(f) == fact && t == player))
                    .unwrap_or(false)
            })
            .map(|q| q.id())
            .collect()
    };
    let correct = |player: PlayerId| -> Score {
        answers
            .get(&player)
            .map(|a| a.iter().filter(|&&(f, t)| owner_of(f) == Some(t)).count())
            .unwrap_or(0) as Score
    };
    Settlement {
        result_table: roster
            .iter()
            .map(|p| {
                let pinned = guessed_by(p.id()).len() as Score;
                (p.id(), correct(p.id()) * GUESS_REWARD - pinned * GUESSED_PENALTY)
            })
            .collect(),
        guesses: roster
            .iter()
            .filter_map(|p| {
                fact_of(p.id()).map(|fact_id| GuessRecord {
                    player_id: p.id(),
                    fact_id,
                    guessed_by: guessed_by(p.id()),
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn fixture() -> (Vec<Fact>, Vec<Participant>, Vec<UnboundedReceiver<String>>) {
        let (roster, rx): (Vec<_>, Vec<_>) = (1..=4)
            .map(|id| {
                let (tx, rx) = unbounded_channel();
                (Participant::new(id, &format!("p{}", id), tx), rx)
            })
            .unzip();
        let facts = (1..=4)
            .map(|i| Fact::new(i as FactId, format!("fact {}", i), i as PlayerId))
            .collect();
        (facts, roster, rx)
    }

    #[test]
    fn accepts_exact_bijection() {
        let (facts, roster, _rx) = fixture();
        let answer = vec![(2, 2), (3, 3), (4, 4)];
        assert!(validate(1, &answer, &facts, &roster).is_ok());
    }
    #[test]
    fn rejects_duplicate_facts() {
        let (facts, roster, _rx) = fixture();
        let answer = vec![(2, 2), (2, 3), (4, 4)];
        assert_eq!(
            validate(1, &answer, &facts, &roster),
            Err(RoomError::DuplicateFacts)
        );
    }
    #[test]
    fn rejects_missing_facts() {
        let (facts, roster, _rx) = fixture();
        let answer = vec![(2, 2), (3, 3)];
        assert_eq!(
            validate(1, &answer, &facts, &roster),
            Err(RoomError::MissingFacts)
        );
    }
    #[test]
    fn rejects_bogus_extra_fact_id() {
        let (facts, roster, _rx) = fixture();
        let answer = vec![(2, 2), (3, 3), (4, 4), (99, 1)];
        assert!(validate(1, &answer, &facts, &roster).is_err());
    }
    #[test]
    fn rejects_own_fact_in_answer() {
        let (facts, roster, _rx) = fixture();
        let answer = vec![(1, 2), (3, 3), (4, 4)];
        assert_eq!(
            validate(1, &answer, &facts, &roster),
            Err(RoomError::MissingFacts)
        );
    }
    #[test]
    fn rejects_duplicate_targets() {
        let (facts, roster, _rx) = fixture();
        let answer = vec![(2, 2), (3, 2), (4, 4)];
        assert_eq!(
            validate(1, &answer, &facts, &roster),
            Err(RoomError::DuplicateTargets)
        );
    }
    #[test]
    fn rejects_self_as_target() {
        let (facts, roster, _rx) = fixture();
        let answer = vec![(2, 2), (3, 3), (4, 1)];
        assert_eq!(
            validate(1, &answer, &facts, &roster),
            Err(RoomError::MissingTargets)
        );
    }
    #[test]
    fn perfect_guesser_never_guessed_scores_maximum() {
        let (facts, roster, _rx) = fixture();
        let mut answers = BTreeMap::new();
        // player 1 guesses everyone right; everyone else misses on everything
        answers.insert(1, vec![(2, 2), (3, 3), (4, 4)]);
        answers.insert(2, vec![(1, 3), (3, 4), (4, 1)]);
        answers.insert(3, vec![(1, 2), (2, 4), (4, 1)]);
        answers.insert(4, vec![(1, 2), (2, 3), (3, 1)]);
        let settlement = settle(&facts, &roster, &answers);
        let score = settlement
            .result_table
            .iter()
            .find(|(p, _)| *p == 1)
            .map(|(_, s)| *s)
            .unwrap();
        assert_eq!(score, 3 * GUESS_REWARD);
    }
    #[test]
    fn fully_exposed_non_guesser_scores_minimum() {
        let (facts, roster, _rx) = fixture();
        let mut answers = BTreeMap::new();
        // everyone pins player 1; player 1 guesses nothing right
        answers.insert(1, vec![(2, 3), (3, 4), (4, 2)]);
        answers.insert(2, vec![(1, 1), (3, 4), (4, 3)]);
        answers.insert(3, vec![(1, 1), (2, 4), (4, 2)]);
        answers.insert(4, vec![(1, 1), (2, 3), (3, 2)]);
        let settlement = settle(&facts, &roster, &answers);
        let score = settlement
            .result_table
            .iter()
            .find(|(p, _)| *p == 1)
            .map(|(_, s)| *s)
            .unwrap();
        assert_eq!(score, -3 * GUESSED_PENALTY);
    }
    #[test]
    fn guess_records_name_the_guessers() {
        let (facts, roster, _rx) = fixture();
        let mut answers = BTreeMap::new();
        answers.insert(1, vec![(2, 2), (3, 4), (4, 3)]);
        answers.insert(2, vec![(1, 1), (3, 3), (4, 4)]);
        answers.insert(3, vec![(1, 1), (2, 2), (4, 4)]);
        answers.insert(4, vec![(1, 1), (2, 2), (3, 3)]);
        let settlement = settle(&facts, &roster, &answers);
        let record = settlement
            .guesses
            .iter()
            .find(|g| g.player_id == 1)
            .unwrap();
        assert_eq!(record.fact_id, 1);
        assert_eq!(record.guessed_by, vec![2, 3, 4]);
    }
}
