use fp_core::*;
use serde::Serialize;

/// A fact submitted by one player about themselves.
/// Ownership stays hidden from every other player until the final stage
/// reveals it through game mechanics.
#[derive(Clone, Debug)]
pub struct Fact {
    id: FactId,
    text: String,
    owner: PlayerId,
}

impl Fact {
    pub fn new(id: FactId, text: String, owner: PlayerId) -> Self {
        Self { id, text, owner }
    }
    pub fn id(&self) -> FactId {
        self.id
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn owner(&self) -> PlayerId {
        self.owner
    }
    /// Owner-stripped view safe to show any player.
    pub fn view(&self) -> FactView {
        FactView {
            id: self.id,
            text: self.text.clone(),
        }
    }
}

/// What non-owners see of a fact: the id and text, never the owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FactView {
    pub id: FactId,
    pub text: String,
}
