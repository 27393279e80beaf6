//! Content digests.
//!
//! A digest is the fingerprint stored next to the XOR of contents in every
//! bucket. It is what lets the decoder tell a bucket holding exactly one item
//! apart from a bucket where several items happen to sum to a count of one.

use std::fmt;

/// A pure, deterministic function from content to a fingerprint.
///
/// Both peers of a reconciliation must use equivalent digesters. Digesters
/// are configuration and are never transmitted.
pub trait Digester: Send + Sync {
    /// Compute the digest of `content`.
    fn digest(&self, content: &[u8]) -> Vec<u8>;
}

impl<F> Digester for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn digest(&self, content: &[u8]) -> Vec<u8> {
        self(content)
    }
}

/// Blake3 digester, optionally keyed.
#[derive(Clone, Default)]
pub struct Blake3Digester {
    key: Option<[u8; 32]>,
}

impl Blake3Digester {
    /// Plain Blake3.
    pub const fn new() -> Self {
        Self { key: None }
    }

    /// Keyed Blake3. Peers must share the key out of band.
    pub const fn keyed(key: [u8; 32]) -> Self {
        Self { key: Some(key) }
    }
}

impl Digester for Blake3Digester {
    fn digest(&self, content: &[u8]) -> Vec<u8> {
        let hash = match &self.key {
            Some(key) => blake3::keyed_hash(key, content),
            None => blake3::hash(content),
        };
        hash.as_bytes().to_vec()
    }
}

impl fmt::Debug for Blake3Digester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.debug_struct("Blake3Digester")
            .field("keyed", &self.key.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_deterministic() {
        let d = Blake3Digester::new();
        assert_eq!(d.digest(b"item"), d.digest(b"item"));
        assert_ne!(d.digest(b"item"), d.digest(b"other"));
        assert_eq!(d.digest(b"item").len(), 32);
    }

    #[test]
    fn test_keyed_differs_from_plain() {
        let plain = Blake3Digester::new();
        let keyed = Blake3Digester::keyed([0x42; 32]);
        assert_ne!(plain.digest(b"item"), keyed.digest(b"item"));
    }

    #[test]
    fn test_debug_hides_key() {
        let keyed = Blake3Digester::keyed([0x42; 32]);
        let debug = format!("{:?}", keyed);
        assert!(debug.contains("keyed: true"));
        assert!(!debug.contains("66"));
    }

    #[test]
    fn test_closure_digester() {
        let d = |content: &[u8]| content.iter().rev().copied().collect::<Vec<u8>>();
        assert_eq!(Digester::digest(&d, &[1, 2, 3]), vec![3, 2, 1]);
    }
}
