//! Provably-fair crash-point generation.
//!
//! The crash point for a round is fixed before betting opens: a keyed
//! HMAC-SHA256 over a per-round seed is reduced to a 32-bit value and mapped
//! onto the multiplier domain [1.00, 10000.00]. The seed mixes the round id,
//! wall-clock time and a random component so clients cannot precompute the
//! outcome during the betting window; the HMAC key stays server-side.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// One-in-33 derived values crash instantly at 1.00, giving the house a
/// structural ~3% edge.
const INSTANT_CRASH_MODULUS: u32 = 33;

/// Deterministic crash-point generator.
pub struct FairnessEngine {
    secret_key: Vec<u8>,
    max_crash_point: f64,
}

impl FairnessEngine {
    pub fn new(secret_key: &str, max_crash_point: f64) -> Self {
        Self {
            secret_key: secret_key.as_bytes().to_vec(),
            max_crash_point,
        }
    }

    /// Compose a fresh, unpredictable seed for a round.
    pub fn compose_seed(&self, round_id: u64) -> String {
        let now_ms = chrono::Utc::now().timestamp_millis();
        format!("{}_{}_{}", round_id, now_ms, rand::random::<f64>())
    }

    /// Generate the crash point for a seed. Pure: equal seeds always yield
    /// equal outputs for the same secret key.
    pub fn generate_crash_point(&self, seed: &str) -> f64 {
        let mut mac = HmacSha256::new_from_slice(&self.secret_key)
            .expect("HMAC accepts keys of any length");
        mac.update(seed.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());

        // First 32 bits of the hex digest as an unsigned integer.
        let val = u32::from_str_radix(&digest[..8], 16)
            .expect("8 hex chars always fit in u32");

        self.crash_point_from_val(val)
    }

    /// Map a 32-bit value onto the crash-point domain.
    pub fn crash_point_from_val(&self, val: u32) -> f64 {
        if val % INSTANT_CRASH_MODULUS == 0 {
            return 1.0;
        }
        let ratio = val as f64 / u32::MAX as f64;
        let result = (100.0 / (1.0 - ratio)) / 100.0;
        round2(result.min(self.max_crash_point))
    }
}

/// Round to 2 decimal places (displayed multiplier precision).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 4 decimal places (winnings precision).
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
