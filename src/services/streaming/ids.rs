//! Per-request identifiers (conversation id and system fingerprint)

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ALPHANUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Seed used by the deterministic generator
pub const DEFAULT_SEED: u64 = 42;

/// Length of the random part of a deterministic id
pub const ID_LENGTH: usize = 10;

/// Identifiers shared by every chunk of one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamIds {
    pub conversation_id: String,
    pub system_fingerprint: String,
}

/// How stream identifiers are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum IdGenerator {
    /// Unique per request
    #[default]
    Random,

    /// Same ids for every request; used for reproducible output
    Seeded { seed: u64 },
}

impl IdGenerator {
    /// Generate the ids for one response
    #[must_use]
    pub fn generate(&self) -> StreamIds {
        match *self {
            Self::Random => StreamIds {
                conversation_id: format!("chatcmpl-{}", Uuid::new_v4().simple()),
                system_fingerprint: format!(
                    "fp_{}",
                    alphanum(&mut rand::thread_rng(), ID_LENGTH)
                ),
            },
            Self::Seeded { seed } => StreamIds {
                conversation_id: format!("chatcmpl-{}", random_alphanum(seed, ID_LENGTH)),
                system_fingerprint: format!("fp_{}", random_alphanum(seed, ID_LENGTH)),
            },
        }
    }
}

/// Deterministic lowercase alphanumeric string for `seed`
#[must_use]
pub fn random_alphanum(seed: u64, length: usize) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    alphanum(&mut rng, length)
}

fn alphanum<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(ALPHANUM[rng.gen_range(0..ALPHANUM.len())]))
        .collect()
}
