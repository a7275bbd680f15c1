/// Precondition violations reported back to the invoking player.
/// Every variant is recoverable: the room state is unchanged and the
/// player may retry with a corrected request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomError {
    /// A player with this id is already connected elsewhere.
    DuplicateSession,
    /// Unknown id tried to join after the game left the waiting stage.
    GameStarted,
    /// The caller is not the room leader.
    NotLeader,
    /// The requested operation is not legal in the current stage.
    WrongStage,
    /// Not every non-leader player has marked themselves ready.
    PlayersNotReady,
    /// The roster is below the minimum size to start.
    NotEnoughPlayers,
    /// Not every player has submitted a fact yet.
    FactsIncomplete,
    /// The caller already has a fact on record.
    FactExists,
    /// The caller has no fact to drop.
    NoFact,
    /// The caller is not the current turn subject.
    NotYourTurn,
    /// A viewer tried to mark suspects on their own fact.
    OwnFact,
    /// A suspect list referenced a player not on the roster.
    UnknownSuspect,
    /// The fact id is not tracked for this viewer.
    UnknownFact,
    /// The referenced player is not on the roster.
    UnknownPlayer,
    /// The accused player has already been guessed out.
    TargetDropped,
    /// The referenced player is not the one taking their turn.
    NotTheSubject,
    /// The caller already has a final answer on record.
    AlreadyAnswered,
    /// The submitted answer lists some fact more than once.
    DuplicateFacts,
    /// The submitted answer does not cover exactly the foreign facts.
    MissingFacts,
    /// The submitted answer lists some player more than once.
    DuplicateTargets,
    /// The submitted answer does not cover exactly the other players.
    MissingTargets,
    /// The caller has no answer to withdraw.
    NoAnswer,
    /// Not every player has submitted a final answer yet.
    AnswersIncomplete,
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::DuplicateSession => "a player with this id is already connected from another device",
            Self::GameStarted => "cannot join this room, the game has already started",
            Self::NotLeader => "only the room leader can do this",
            Self::WrongStage => "this action is not allowed in the current stage",
            Self::PlayersNotReady => "not all players are ready",
            Self::NotEnoughPlayers => "at least 4 players are required",
            Self::FactsIncomplete => "not every player has submitted a fact",
            Self::FactExists => "you already added a fact, drop it first",
            Self::NoFact => "nothing to drop",
            Self::NotYourTurn => "it is not your turn",
            Self::OwnFact => "you cannot mark your own fact",
            Self::UnknownSuspect => "unknown player in suspects",
            Self::UnknownFact => "no such fact",
            Self::UnknownPlayer => "no such player in this room",
            Self::TargetDropped => "that player is already out",
            Self::NotTheSubject => "that player is not taking their turn",
            Self::AlreadyAnswered => "answer already submitted",
            Self::DuplicateFacts => "duplicate facts in answer",
            Self::MissingFacts => "missing facts in answer",
            Self::DuplicateTargets => "duplicate players in answer",
            Self::MissingTargets => "missing players in answer",
            Self::NoAnswer => "answer not yet submitted",
            Self::AnswersIncomplete => "not everyone has sent their answers yet",
        };
        write!(f, "{}", reason)
    }
}

impl std::error::Error for RoomError {}
