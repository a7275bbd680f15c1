//! Core type aliases and constants for factparty.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the factparty workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Player identity, supplied by the client on connection.
pub type PlayerId = i64;
/// Fact identity, monotonic per room starting at 1.
pub type FactId = u32;
/// Accumulated or settled player score.
pub type Score = i32;

// ============================================================================
// ROSTER PARAMETERS
// ============================================================================
/// Minimum roster size before the leader can start the game.
pub const MIN_PLAYERS: usize = 4;
/// Elimination games end the moment fewer than this many eligible
/// (connected, not dropped) players remain.
pub const MIN_ELIGIBLE: usize = 3;

// ============================================================================
// TURN PARAMETERS
// ============================================================================
/// Full laps of the turns stage under the fixed rotation before the
/// room moves on to collecting written answers.
pub const MAX_CYCLES: u8 = 4;

// ============================================================================
// SCORING
// Weights for the final reveal. Only the ratios matter to the ranking.
// ============================================================================
/// Points gained per fact whose owner was guessed correctly.
pub const GUESS_REWARD: Score = 3;
/// Points lost per opponent who pinned your fact on you.
pub const GUESSED_PENALTY: Score = 1;
/// Points lost for a wrong live guess under the elimination ruleset.
pub const MISTAKE_PENALTY: Score = 1;
/// Points the leader may deduct from a stalling player.
pub const PUNISH_PENALTY: Score = 2;

// ============================================================================
// ROOM LIFECYCLE
// ============================================================================
/// Grace period before a freshly created room with no players closes.
pub const VACANT_GRACE: std::time::Duration = std::time::Duration::from_secs(60);
/// Grace period before a room with zero connected players closes.
pub const ABANDONED_GRACE: std::time::Duration = std::time::Duration::from_secs(300);
/// How often the hosting layer re-checks rooms for close eligibility.
pub const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);
/// Letters in a human-typeable room code.
pub const ROOM_CODE_LEN: usize = 4;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
