use super::Participant;
use fp_core::*;

/// Recipient filter for a broadcast: the roster intersected with
/// `include` (when given) minus `exclude` (when given). Exclusion always
/// wins, even for ids listed in both.
#[derive(Clone, Debug, Default)]
pub struct Audience {
    include: Option<Vec<PlayerId>>,
    exclude: Option<Vec<PlayerId>>,
}

impl Audience {
    /// Every participant on the roster.
    pub fn everyone() -> Self {
        Self::default()
    }
    /// Only the listed participants.
    pub fn only(ids: impl Into<Vec<PlayerId>>) -> Self {
        Self {
            include: Some(ids.into()),
            exclude: None,
        }
    }
    /// Everyone but the listed participants.
    pub fn except(ids: impl Into<Vec<PlayerId>>) -> Self {
        Self {
            include: None,
            exclude: Some(ids.into()),
        }
    }
    pub fn admits(&self, id: PlayerId) -> bool {
        let included = self.include.as_ref().map(|ids| ids.contains(&id)).unwrap_or(true);
        let excluded = self.exclude.as_ref().map(|ids| ids.contains(&id)).unwrap_or(false);
        included && !excluded
    }
}

/// Resolve an audience against the roster.
pub fn targets<'r>(
    roster: &'r [Participant],
    audience: &'r Audience,
) -> impl Iterator<Item = &'r Participant> {
    roster.iter().filter(|p| audience.admits(p.id()))
}

/// Deliver one serialized frame to every admitted, connected participant.
/// Delivery is fire-and-forget: disconnected targets are silently dropped,
/// never queued, never retried.
pub fn deliver(roster: &[Participant], audience: &Audience, frame: &str) {
    targets(roster, audience)
        .filter(|p| p.connected())
        .for_each(|p| p.send(frame));
}
