use super::Participant;
use fp_core::*;

/// What a completed lap means for the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Start another lap from the top of the roster.
    Continue,
    /// The rotation has run its course; the room moves to its end stage.
    Finish,
}

/// Turn rotation policy, chosen once at room construction and fixed for
/// the room's lifetime. Implementations carry their own lap accounting;
/// subject selection itself is a pure function of the roster and the
/// current subject.
pub trait Rotation: Send {
    /// Next subject after `current`, scanning forward through the roster.
    /// `None` marks a lap boundary: every reachable subject has had a
    /// turn since the last wraparound.
    fn next(&self, roster: &[Participant], current: Option<PlayerId>) -> Option<PlayerId>;
    /// Called at each lap boundary of the turns stage.
    fn lap(&mut self) -> Verdict;
    /// True when the rotation can no longer continue regardless of whose
    /// turn it is. Checked before every advance.
    fn exhausted(&self, roster: &[Participant]) -> bool;
    /// True when this ruleset collects written final answers in a
    /// dedicated stage after the turns run out.
    fn collects_answers(&self) -> bool;
    /// True when each turn probes a hidden fact at the subject.
    fn probes(&self) -> bool;
}

/// Every participant gets exactly one turn per lap, disconnected or not.
/// After [`MAX_CYCLES`] laps of the turns stage the room moves on to
/// collecting written final answers.
#[derive(Debug, Default)]
pub struct FixedRotation {
    cycles: u8,
}

impl Rotation for FixedRotation {
    fn next(&self, roster: &[Participant], current: Option<PlayerId>) -> Option<PlayerId> {
        let start = match current {
            None => 0,
            Some(id) => roster.iter().position(|p| p.id() == id).map(|i| i + 1)?,
        };
        roster.get(start).map(|p| p.id())
    }
    fn lap(&mut self) -> Verdict {
        self.cycles += 1;
        if self.cycles > MAX_CYCLES {
            Verdict::Finish
        } else {
            Verdict::Continue
        }
    }
    fn exhausted(&self, _: &[Participant]) -> bool {
        false
    }
    fn collects_answers(&self) -> bool {
        true
    }
    fn probes(&self) -> bool {
        false
    }
}

/// Turns go to the next connected, not-yet-eliminated participant; the
/// game ends the instant fewer than [`MIN_ELIGIBLE`] such players remain.
#[derive(Debug, Default)]
pub struct EliminationRotation;

impl EliminationRotation {
    fn eligible(p: &Participant) -> bool {
        p.connected() && !p.dropped()
    }
}

impl Rotation for EliminationRotation {
    fn next(&self, roster: &[Participant], current: Option<PlayerId>) -> Option<PlayerId> {
        let start = match current {
            None => 0,
            Some(id) => roster.iter().position(|p| p.id() == id).map(|i| i + 1)?,
        };
        roster[start.min(roster.len())..]
            .iter()
            .find(|p| Self::eligible(p))
            .map(|p| p.id())
    }
    fn lap(&mut self) -> Verdict {
        Verdict::Continue
    }
    fn exhausted(&self, roster: &[Participant]) -> bool {
        roster.iter().filter(|p| Self::eligible(p)).count() < MIN_ELIGIBLE
    }
    fn collects_answers(&self) -> bool {
        false
    }
    fn probes(&self) -> bool {
        true
    }
}
