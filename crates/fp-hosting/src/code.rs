use fp_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Generate a human-typeable room code: uppercase ASCII letters only,
/// short enough to read out loud across a table.
pub fn generate() -> String {
    let mut rng = SmallRng::from_os_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| rng.random_range(b'A'..=b'Z') as char)
        .collect()
}
