//! Seed pair, nonce and the committed draw derivation
//!
//! The base value of a round is `HMAC-SHA256(server_seed, "{client_seed}:{nonce}")`
//! folded into `[0, 1)`. Every further decision for that round uses a sub-draw
//! `SHA-256(base || index)`, so nothing outside the committed base value can
//! move the economics.

use crate::errors::GameError;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Server seed entropy in bytes (hex encoded to 64 chars)
pub const SERVER_SEED_BYTES: usize = 32;
/// Generated client seed entropy in bytes (hex encoded to 16 chars)
pub const CLIENT_SEED_BYTES: usize = 8;

const MIN_CLIENT_SEED_HEX: usize = 16;
const MAX_CLIENT_SEED_HEX: usize = 128;
const FOLD_SCALE: f64 = 4_294_967_296.0; // 2^32

/// Named sub-draw indexes.
///
/// Each decision owns a fixed index (or a disjoint index range) so adding a
/// new cosmetic draw can never shift an economic one.
pub mod draw {
    pub const BONUS_TRIGGER: u64 = 1;
    pub const BONUS_MULTIPLIER: u64 = 2;
    pub const CLOSURE_TEMPLATE: u64 = 10;
    pub const BONUS_OBJECT_DEPTH: u64 = 11;
    pub const BONUS_OBJECT_X: u64 = 12;
    /// One index per collectible kind
    pub const COLLECTIBLE_COUNT_BASE: u64 = 100_000;
    /// Three indexes per obstacle row: gap width, gap offset, obstacle kind
    pub const ROW_BASE: u64 = 200_000;
    pub const ROW_STRIDE: u64 = 3;
    /// Three indexes per decoration: depth, x, variant
    pub const DECORATION_BASE: u64 = 1_000_000;
    /// Three indexes per cosmetic collectible: depth, x, variant
    pub const COSMETIC_COLLECTIBLE_BASE: u64 = 2_000_000;
    pub const SCATTER_STRIDE: u64 = 3;
}

fn fold(digest: &[u8]) -> f64 {
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    word as f64 / FOLD_SCALE
}

/// Derive the committed base value in `[0, 1)` for one nonce
pub fn derive_base(server_seed: &str, client_seed: &str, nonce: u64) -> f64 {
    let mut mac = match HmacSha256::new_from_slice(server_seed.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(format!("{}:{}", client_seed, nonce).as_bytes());
    fold(&mac.finalize().into_bytes())
}

/// Derive the named sub-draw `index` from a base value
pub fn derive_sub(base: f64, index: u64) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_bits().to_be_bytes());
    hasher.update(index.to_be_bytes());
    fold(&hasher.finalize())
}

/// Hex SHA-256 of the server seed, published before play
pub fn commitment(server_seed: &str) -> String {
    hex::encode(Sha256::digest(server_seed.as_bytes()))
}

/// Check a revealed server seed against an earlier commitment
pub fn verify_commitment(server_seed: &str, expected_hash: &str) -> bool {
    commitment(server_seed).eq_ignore_ascii_case(expected_hash)
}

/// Sub-draw accessor bound to one base value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubDraws {
    base: f64,
}

impl SubDraws {
    pub fn new(base: f64) -> Self {
        Self { base }
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn draw(&self, index: u64) -> f64 {
        derive_sub(self.base, index)
    }

    /// Sub-draw scaled into `[lo, hi)`
    pub fn between(&self, index: u64, lo: f64, hi: f64) -> f64 {
        lo + self.draw(index) * (hi - lo)
    }
}

/// Source of fresh seeds; injected so tests can pin them
pub trait SeedSource: Send + Sync {
    fn server_seed(&self) -> String;
    fn client_seed(&self) -> String;
}

/// Seeds from the operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn server_seed(&self) -> String {
        let mut bytes = [0u8; SERVER_SEED_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn client_seed(&self) -> String {
        let mut bytes = [0u8; CLIENT_SEED_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Server and client seed of one session
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedPair {
    server_seed: String,
    client_seed: String,
}

impl fmt::Debug for SeedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedPair")
            .field("server_seed", &"<secret>")
            .field("client_seed", &self.client_seed)
            .finish()
    }
}

impl SeedPair {
    /// Validate and pair two hex seeds
    pub fn new(server_seed: String, client_seed: String) -> Result<Self, GameError> {
        validate_server_seed(&server_seed)?;
        validate_client_seed(&client_seed)?;
        Ok(Self { server_seed, client_seed })
    }

    /// Fresh server seed from `source`; the client seed is used when supplied
    pub fn generate(source: &dyn SeedSource, client_seed: Option<String>) -> Result<Self, GameError> {
        let client_seed = client_seed.unwrap_or_else(|| source.client_seed());
        Self::new(source.server_seed(), client_seed)
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn server_seed_hash(&self) -> String {
        commitment(&self.server_seed)
    }

    /// Expose the secret seed; only the session-end path calls this
    pub fn reveal_server_seed(&self) -> &str {
        &self.server_seed
    }

    pub fn derive_base(&self, nonce: u64) -> f64 {
        derive_base(&self.server_seed, &self.client_seed, nonce)
    }
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn validate_server_seed(seed: &str) -> Result<(), GameError> {
    if seed.len() != SERVER_SEED_BYTES * 2 || !is_hex(seed) {
        return Err(GameError::InvalidSeed(format!(
            "server seed must be {} hex characters",
            SERVER_SEED_BYTES * 2
        )));
    }
    Ok(())
}

fn validate_client_seed(seed: &str) -> Result<(), GameError> {
    let len_ok = (MIN_CLIENT_SEED_HEX..=MAX_CLIENT_SEED_HEX).contains(&seed.len()) && seed.len() % 2 == 0;
    if !len_ok || !is_hex(seed) {
        return Err(GameError::InvalidSeed(format!(
            "client seed must be an even number of hex characters between {} and {}",
            MIN_CLIENT_SEED_HEX, MAX_CLIENT_SEED_HEX
        )));
    }
    Ok(())
}

/// A session's seed pair together with its monotonic nonce
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedChain {
    seeds: SeedPair,
    nonce: u64,
}

impl SeedChain {
    pub fn new(seeds: SeedPair, nonce_start: u64) -> Self {
        Self { seeds, nonce: nonce_start }
    }

    pub fn seeds(&self) -> &SeedPair {
        &self.seeds
    }

    /// The nonce the next round will use
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Hand out the current nonce and advance past it
    pub fn next_nonce(&mut self) -> u64 {
        let nonce = self.nonce;
        self.nonce += 1;
        nonce
    }

    pub fn derive_base(&self, nonce: u64) -> f64 {
        self.seeds.derive_base(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "5f2b8c1d9e0a47b3c6d8e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6";
    const CLIENT: &str = "a1b2c3d4e5f60718";

    #[test]
    fn test_base_value_is_deterministic() {
        let first = derive_base(SERVER, CLIENT, 42);
        let second = derive_base(SERVER, CLIENT, 42);
        assert_eq!(first.to_bits(), second.to_bits());
        assert!((0.0..1.0).contains(&first));
    }

    #[test]
    fn test_base_value_changes_with_each_input() {
        let base = derive_base(SERVER, CLIENT, 0);
        assert_ne!(base, derive_base(SERVER, CLIENT, 1));
        assert_ne!(base, derive_base(SERVER, "a1b2c3d4e5f60719", 0));
        assert_ne!(
            base,
            derive_base("6f2b8c1d9e0a47b3c6d8e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6", CLIENT, 0)
        );
    }

    #[test]
    fn test_sub_draws_are_pure_and_distinct() {
        let draws = SubDraws::new(0.37);
        assert_eq!(draws.draw(draw::BONUS_TRIGGER), derive_sub(0.37, draw::BONUS_TRIGGER));
        assert_ne!(draws.draw(draw::BONUS_TRIGGER), draws.draw(draw::BONUS_MULTIPLIER));

        for index in 0..1_000 {
            let value = draws.draw(index);
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_between_scales_into_range() {
        let draws = SubDraws::new(0.81);
        for index in 0..200 {
            let v = draws.between(index, 300.0, 700.0);
            assert!((300.0..700.0).contains(&v));
        }
    }

    #[test]
    fn test_commitment_round_trip() {
        let seeds = SeedPair::new(SERVER.to_string(), CLIENT.to_string()).unwrap();
        let hash = seeds.server_seed_hash();
        assert_eq!(hash.len(), 64);
        assert!(verify_commitment(SERVER, &hash));
        assert!(!verify_commitment(CLIENT, &hash));
    }

    #[test]
    fn test_rejects_malformed_seeds() {
        assert!(matches!(
            SeedPair::new("abc".to_string(), CLIENT.to_string()),
            Err(GameError::InvalidSeed(_))
        ));
        assert!(SeedPair::new(SERVER.to_string(), "not-hex-at-all!!".to_string()).is_err());
        assert!(SeedPair::new(SERVER.to_string(), "abc".to_string()).is_err());
        assert!(SeedPair::new(SERVER.to_string(), "a1b2c3d4e5f6071".to_string()).is_err());
    }

    #[test]
    fn test_generated_seeds_are_well_formed() {
        let seeds = SeedPair::generate(&OsSeedSource, None).unwrap();
        assert_eq!(seeds.reveal_server_seed().len(), 64);
        assert_eq!(seeds.client_seed().len(), 16);

        let other = SeedPair::generate(&OsSeedSource, None).unwrap();
        assert_ne!(seeds.reveal_server_seed(), other.reveal_server_seed());
    }

    #[test]
    fn test_debug_hides_server_seed() {
        let seeds = SeedPair::new(SERVER.to_string(), CLIENT.to_string()).unwrap();
        let rendered = format!("{:?}", seeds);
        assert!(!rendered.contains(SERVER));
        assert!(rendered.contains(CLIENT));
    }

    #[test]
    fn test_nonce_strictly_increases() {
        let seeds = SeedPair::new(SERVER.to_string(), CLIENT.to_string()).unwrap();
        let mut chain = SeedChain::new(seeds, 0);
        assert_eq!(chain.next_nonce(), 0);
        assert_eq!(chain.next_nonce(), 1);
        assert_eq!(chain.nonce(), 2);
        assert_eq!(chain.derive_base(1), derive_base(SERVER, CLIENT, 1));
    }
}
