//! Signal-group hashing. The hash names normalization and preprocessing
//! artifacts on disk, so it must be stable across runs and machines.

use dp_types::Signal;
use sha2::{Digest, Sha256};

pub trait SignalHasher {
    fn hash_signals(&self, signals: &[Signal]) -> u128;
}

/// SHA-256 over the sorted signal descriptions, each terminated by a NUL
/// byte, truncated to 120 bits.
/// The top byte stays clear so doubling the hash cannot overflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256SignalHasher;

impl SignalHasher for Sha256SignalHasher {
    fn hash_signals(&self, signals: &[Signal]) -> u128 {
        let mut descriptions: Vec<&str> = signals.iter().map(|s| s.description.as_str()).collect();
        descriptions.sort_unstable();

        let mut hasher = Sha256::new();
        for description in descriptions {
            hasher.update(description.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        tracing::debug!("Signal group digest: {}", hex::encode(digest));

        let mut bytes = [0u8; 16];
        bytes[1..].copy_from_slice(&digest[..15]);
        u128::from_be_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dp_types::Machine;

    fn sig(description: &str) -> Signal {
        Signal::scalar(description, &[Machine::D3d])
    }

    #[test]
    fn order_independent_and_stable() {
        let hasher = Sha256SignalHasher;
        let a = hasher.hash_signals(&[sig("plasma current"), sig("q95 safety factor")]);
        let b = hasher.hash_signals(&[sig("q95 safety factor"), sig("plasma current")]);
        assert_eq!(a, b);
        assert_eq!(a, hasher.hash_signals(&[sig("plasma current"), sig("q95 safety factor")]));
    }

    #[test]
    fn different_groups_differ() {
        let hasher = Sha256SignalHasher;
        let a = hasher.hash_signals(&[sig("plasma current")]);
        let b = hasher.hash_signals(&[sig("stored energy")]);
        assert_ne!(a, b);
    }

    #[test]
    fn description_boundaries_matter() {
        let hasher = Sha256SignalHasher;
        let a = hasher.hash_signals(&[sig("ab"), sig("c")]);
        let b = hasher.hash_signals(&[sig("a"), sig("bc")]);
        assert_ne!(a, b);
    }

    #[test]
    fn doubling_never_overflows() {
        let hash = Sha256SignalHasher.hash_signals(&[sig("Locked mode amplitude")]);
        assert!(hash.checked_mul(2).is_some());
        assert_eq!(hash >> 120, 0);
    }
}
